//! Page dispatch: maps the selected dashboard page to its handler.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;
use waste_core::error::{DashboardError, Result};
use waste_core::inference::{FeatureVector, Forecaster};
use waste_core::settings::Settings;
use waste_data::analysis::{
    evaluate_forecast, forecast_insight, historical_overview, EvaluationReport, ForecastInsight,
    HistoricalReport,
};
use waste_data::filters::filter_by_date_range;

use crate::data_manager::DataManager;

// ── Page ──────────────────────────────────────────────────────────────────────

/// A dashboard page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Historical,
    Forecast,
    Evaluation,
    Predict,
}

impl Page {
    pub fn as_str(self) -> &'static str {
        match self {
            Page::Historical => "historical",
            Page::Forecast => "forecast",
            Page::Evaluation => "evaluation",
            Page::Predict => "predict",
        }
    }

    /// Page heading.
    pub fn title(self) -> &'static str {
        match self {
            Page::Historical => "Data Historis & Analisis",
            Page::Forecast => "Prediksi & Insight Otomatis",
            Page::Evaluation => "Evaluasi Model",
            Page::Predict => "Prediksi Harian",
        }
    }
}

impl FromStr for Page {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "historical" => Ok(Page::Historical),
            "forecast" => Ok(Page::Forecast),
            "evaluation" => Ok(Page::Evaluation),
            "predict" => Ok(Page::Predict),
            other => Err(DashboardError::Config(format!("unknown page \"{other}\""))),
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Output ────────────────────────────────────────────────────────────────────

/// Result of a single-point inference.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub date: NaiveDate,
    pub features: FeatureVector,
    /// Estimated daily waste volume in m³.
    pub estimate: f64,
}

/// What a page handler produced.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "page", content = "report", rename_all = "lowercase")]
pub enum PageOutput {
    Historical(HistoricalReport),
    Forecast(ForecastInsight),
    Evaluation(EvaluationReport),
    Predict(Prediction),
}

// ── Dispatch ──────────────────────────────────────────────────────────────────

/// Run the handler for `page`.
pub fn run_page(page: Page, settings: &Settings, data: &mut DataManager) -> Result<PageOutput> {
    info!(%page, "rendering page");
    match page {
        Page::Historical => historical(settings, data).map(PageOutput::Historical),
        Page::Forecast => forecast(settings, data).map(PageOutput::Forecast),
        Page::Evaluation => evaluation(data).map(PageOutput::Evaluation),
        Page::Predict => predict(settings).map(PageOutput::Predict),
    }
}

fn historical(settings: &Settings, data: &mut DataManager) -> Result<HistoricalReport> {
    let waste = data.waste()?;
    let weather = data.weather()?;
    let socio = data.socio_economic()?;
    historical_overview(
        &waste,
        &weather,
        &socio,
        settings.year,
        settings.weather_year,
        settings.weather_variable.as_deref(),
    )
}

/// Forecast insight, optionally limited to `--start`/`--end`. A missing
/// bound defaults to the table's own first or last date.
fn forecast(settings: &Settings, data: &mut DataManager) -> Result<ForecastInsight> {
    let table = data.forecast()?;
    let Some((first, last)) = table.date_span() else {
        return forecast_insight(&table);
    };

    let (start, end) = match (settings.start, settings.end) {
        (None, None) => return forecast_insight(&table),
        (Some(start), Some(end)) => (start, end),
        (Some(start), None) if start > last => {
            return Err(DashboardError::Config(format!(
                "--start {start} is after the last forecast date {last} (--end defaults to it)"
            )));
        }
        (None, Some(end)) if end < first => {
            return Err(DashboardError::Config(format!(
                "--end {end} is before the first forecast date {first} (--start defaults to it)"
            )));
        }
        (start, end) => (start.unwrap_or(first), end.unwrap_or(last)),
    };
    forecast_insight(&filter_by_date_range(&table, start, end)?)
}

fn evaluation(data: &mut DataManager) -> Result<EvaluationReport> {
    let waste = data.waste()?;
    let forecast = data.forecast()?;
    evaluate_forecast(&waste, &forecast)
}

fn predict(settings: &Settings) -> Result<Prediction> {
    let date = settings
        .date
        .ok_or_else(|| DashboardError::Config("--date is required for the predict page".into()))?;
    let model = required_path(&settings.model, "--model")?;
    let feature_scaler = required_path(&settings.feature_scaler, "--feature-scaler")?;
    let target_scaler = required_path(&settings.target_scaler, "--target-scaler")?;

    let forecaster = Forecaster::from_files(model, feature_scaler, target_scaler)?;
    let features = FeatureVector::from_date(date, settings.holiday, settings.trend);
    let estimate = forecaster.predict_one(&features)?;

    Ok(Prediction {
        date,
        features,
        estimate,
    })
}

fn required_path<'a>(
    path: &'a Option<std::path::PathBuf>,
    flag: &str,
) -> Result<&'a std::path::Path> {
    path.as_deref()
        .ok_or_else(|| DashboardError::Config(format!("{flag} is required for the predict page")))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
