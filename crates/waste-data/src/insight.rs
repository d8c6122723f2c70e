//! Summary statistics and automatic insights over a metric column.
//!
//! Rows whose metric cell is missing are skipped. Sequence measures (trend,
//! growth) read values in date order. Nothing is rounded here.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;
use waste_core::error::{DashboardError, Result};
use waste_core::models::{DatedRecord, Record, Table};

// ── SummaryStats ──────────────────────────────────────────────────────────────

/// The mean/max/min metric cards of a page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    pub mean: f64,
    pub max: f64,
    pub min: f64,
    pub count: usize,
}

/// Mean, maximum and minimum of `metric`.
///
/// Fails with [`DashboardError::EmptyTable`] when the column holds no
/// values.
pub fn summary_stats<R: Record>(table: &Table<R>, metric: &str) -> Result<SummaryStats> {
    let values = table.values(metric)?;
    if values.is_empty() {
        return Err(DashboardError::EmptyTable(metric.to_string()));
    }

    let mut sum = 0.0;
    let mut max = f64::NEG_INFINITY;
    let mut min = f64::INFINITY;
    for &(_, v) in &values {
        sum += v;
        max = max.max(v);
        min = min.min(v);
    }

    // Summation error can push the mean of equal values one ulp outside
    // the observed range.
    let mean = (sum / values.len() as f64).clamp(min, max);

    Ok(SummaryStats {
        mean,
        max,
        min,
        count: values.len(),
    })
}

// ── Peak ──────────────────────────────────────────────────────────────────────

/// Row holding the maximum of `metric`; the earliest such row on ties.
pub fn peak_record<'a, R: Record>(table: &'a Table<R>, metric: &str) -> Result<&'a R> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in table.values(metric)? {
        match best {
            Some((_, top)) if v <= top => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| &table.rows()[i])
        .ok_or_else(|| DashboardError::EmptyTable(metric.to_string()))
}

// ── Trend ─────────────────────────────────────────────────────────────────────

/// Direction of the average day-to-day change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    Flat,
}

impl Trend {
    /// Label shown on the insight panel.
    pub fn label(self) -> &'static str {
        match self {
            Trend::Rising => "Naik",
            Trend::Falling => "Turun",
            Trend::Flat => "Datar",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `(row index, value)` pairs of `metric` ordered by date; rows sharing a
/// date keep table order.
fn values_by_date<R: DatedRecord>(table: &Table<R>, metric: &str) -> Result<Vec<(usize, f64)>> {
    let mut values = table.values(metric)?;
    values.sort_by_key(|&(i, _)| table.rows()[i].date());
    Ok(values)
}

fn require_two<T>(values: &[T]) -> Result<()> {
    if values.len() < 2 {
        return Err(DashboardError::InsufficientData {
            required: 2,
            actual: values.len(),
        });
    }
    Ok(())
}

/// Mean of successive differences of `metric` in date order.
pub fn mean_difference<R: DatedRecord>(table: &Table<R>, metric: &str) -> Result<f64> {
    let values = values_by_date(table, metric)?;
    require_two(&values)?;
    let total: f64 = values.windows(2).map(|w| w[1].1 - w[0].1).sum();
    Ok(total / (values.len() - 1) as f64)
}

/// Classify the mean successive difference as rising, falling or flat.
pub fn trend_direction<R: DatedRecord>(table: &Table<R>, metric: &str) -> Result<Trend> {
    let mean = mean_difference(table, metric)?;
    Ok(match mean.partial_cmp(&0.0) {
        Some(Ordering::Greater) => Trend::Rising,
        Some(Ordering::Less) => Trend::Falling,
        _ => Trend::Flat,
    })
}

// ── Growth rate ───────────────────────────────────────────────────────────────

/// Mean of successive fractional changes `(v[i] - v[i-1]) / v[i-1]` in
/// date order, the same sequence [`trend_direction`] classifies.
///
/// A zero previous value fails with [`DashboardError::DivisionByZero`]
/// carrying the row index of that value.
pub fn growth_rate<R: DatedRecord>(table: &Table<R>, metric: &str) -> Result<f64> {
    let values = values_by_date(table, metric)?;
    require_two(&values)?;

    let mut total = 0.0;
    for pair in values.windows(2) {
        let (prev_idx, prev) = pair[0];
        let (_, next) = pair[1];
        if prev == 0.0 {
            return Err(DashboardError::DivisionByZero { index: prev_idx });
        }
        total += (next - prev) / prev;
    }
    Ok(total / (values.len() - 1) as f64)
}
