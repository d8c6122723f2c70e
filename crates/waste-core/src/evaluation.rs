use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};

/// Accuracy of a forecast against observed values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    /// Mean absolute error, in the metric's unit.
    pub mae: f64,
    /// Root mean squared error, in the metric's unit.
    pub rmse: f64,
    /// Mean absolute percentage error, in percent.
    pub mape: f64,
    /// Number of paired values evaluated.
    pub samples: usize,
}

/// Compute MAE, RMSE and MAPE over paired `actual` / `predicted` values.
///
/// Fails when the slices differ in length, are empty, or when an actual
/// value of zero makes the percentage error undefined.
pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Result<EvaluationMetrics> {
    if actual.len() != predicted.len() {
        return Err(DashboardError::LengthMismatch {
            left: actual.len(),
            right: predicted.len(),
        });
    }
    if actual.is_empty() {
        return Err(DashboardError::EmptyTable("paired values".to_string()));
    }

    let n = actual.len() as f64;
    let mut abs_sum = 0.0;
    let mut sq_sum = 0.0;
    let mut pct_sum = 0.0;

    for (i, (&a, &p)) in actual.iter().zip(predicted).enumerate() {
        if a == 0.0 {
            return Err(DashboardError::DivisionByZero { index: i });
        }
        let err = a - p;
        abs_sum += err.abs();
        sq_sum += err * err;
        pct_sum += (err / a).abs();
    }

    Ok(EvaluationMetrics {
        mae: abs_sum / n,
        rmse: (sq_sum / n).sqrt(),
        mape: pct_sum / n * 100.0,
        samples: actual.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_forecast() {
        let m = evaluate(&[10.0, 20.0], &[10.0, 20.0]).unwrap();
        assert_eq!(m.mae, 0.0);
        assert_eq!(m.rmse, 0.0);
        assert_eq!(m.mape, 0.0);
        assert_eq!(m.samples, 2);
    }

    #[test]
    fn test_known_errors() {
        // errors: +1, -3 → MAE 2, RMSE sqrt(5), MAPE (10% + 15%) / 2
        let m = evaluate(&[10.0, 20.0], &[9.0, 23.0]).unwrap();
        assert!((m.mae - 2.0).abs() < 1e-12);
        assert!((m.rmse - 5.0_f64.sqrt()).abs() < 1e-12);
        assert!((m.mape - 12.5).abs() < 1e-9, "mape = {}", m.mape);
    }

    #[test]
    fn test_rmse_not_below_mae() {
        let m = evaluate(&[5.0, 8.0, 13.0, 21.0], &[6.0, 4.0, 13.5, 30.0]).unwrap();
        assert!(m.rmse >= m.mae);
    }

    #[test]
    fn test_length_mismatch() {
        let err = evaluate(&[1.0, 2.0], &[1.0]).unwrap_err();
        assert!(matches!(
            err,
            DashboardError::LengthMismatch { left: 2, right: 1 }
        ));
    }

    #[test]
    fn test_empty_input() {
        let err = evaluate(&[], &[]).unwrap_err();
        assert!(matches!(err, DashboardError::EmptyTable(_)));
    }

    #[test]
    fn test_zero_actual_fails() {
        let err = evaluate(&[4.0, 0.0], &[4.0, 1.0]).unwrap_err();
        assert!(matches!(err, DashboardError::DivisionByZero { index: 1 }));
    }
}
