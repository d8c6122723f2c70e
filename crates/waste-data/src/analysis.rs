//! Page-level analysis pipeline.
//!
//! Each function assembles everything one dashboard page shows from
//! already-loaded tables, returning a serialisable report ready for the
//! rendering layer.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, warn};
use waste_core::error::{DashboardError, Result};
use waste_core::evaluation::{evaluate, EvaluationMetrics};
use waste_core::models::{
    ForecastRecord, SocioEconomicRecord, Table, WasteRecord, WeatherRecord, TOTAL_VOLUME,
};
use waste_core::time_utils::month_year_label;

use crate::aggregator::{monthly_average, pivot_monthly_by_year, yearly_average, MonthYearPivot};
use crate::filters::filter_by_year;
use crate::insight::{
    growth_rate, mean_difference, peak_record, summary_stats, trend_direction, SummaryStats,
    Trend,
};

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside every report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// ISO-8601 timestamp when this report was generated.
    pub generated_at: String,
    /// Total number of rows the report was computed from.
    pub rows_processed: usize,
    /// Wall-clock seconds spent computing the report.
    pub elapsed_seconds: f64,
}

impl ReportMetadata {
    fn finish(started: Instant, rows_processed: usize) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            rows_processed,
            elapsed_seconds: started.elapsed().as_secs_f64(),
        }
    }
}

/// One point of a dated line series; `value` is `None` for an empty cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// The weather panel for one variable and year.
#[derive(Debug, Clone, Serialize)]
pub struct WeatherPanel {
    pub variable: String,
    /// Every numeric weather column, in source order.
    pub variables: Vec<String>,
    /// Selected weather year; `None` when the weather table is empty.
    pub year: Option<i32>,
    /// Years with weather data, ascending.
    pub available_years: Vec<i32>,
    /// Readings of `variable` in `year`; days without a reading are left out.
    pub series: Vec<SeriesPoint>,
}

/// Everything the historical-data page shows.
#[derive(Debug, Clone, Serialize)]
pub struct HistoricalReport {
    pub year: i32,
    /// Years with waste data, ascending.
    pub available_years: Vec<i32>,
    /// Mean/max/min cards for the selected year.
    pub waste_stats: SummaryStats,
    pub waste_series: Vec<SeriesPoint>,
    /// `None` when the weather source has no numeric columns.
    pub weather: Option<WeatherPanel>,
    /// Socio-economic indicators ordered by year.
    pub socio_economic: Vec<SocioEconomicRecord>,
    /// Month×year pivot of the waste volume across all years.
    pub pivot: MonthYearPivot,
    pub yearly_averages: BTreeMap<i32, f64>,
    pub metadata: ReportMetadata,
}

/// Everything the forecast and insight page shows.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastInsight {
    pub stats: SummaryStats,
    pub peak_date: NaiveDate,
    /// `"<Month> <Year>"` of the peak day.
    pub peak_label: String,
    /// `None` when fewer than two forecast days are present.
    pub trend: Option<Trend>,
    /// Mean day-to-day change the trend is classified from.
    pub mean_daily_change: Option<f64>,
    /// Mean fractional change; `None` when a zero volume makes it undefined.
    pub growth_rate: Option<f64>,
    pub series: Vec<SeriesPoint>,
    pub pivot: MonthYearPivot,
    pub yearly_averages: BTreeMap<i32, f64>,
    pub metadata: ReportMetadata,
}

/// Forecast accuracy over the days both tables cover.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub metrics: EvaluationMetrics,
    /// First and last paired date.
    pub period: (NaiveDate, NaiveDate),
    pub metadata: ReportMetadata,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Build the historical-data page.
///
/// `year` defaults to the latest year with waste data and `weather_variable`
/// to the first numeric weather column. `weather_year` defaults to the waste
/// year when the weather source covers it, otherwise to the latest weather
/// year.
pub fn historical_overview(
    waste: &Table<WasteRecord>,
    weather: &Table<WeatherRecord>,
    socio: &Table<SocioEconomicRecord>,
    year: Option<i32>,
    weather_year: Option<i32>,
    weather_variable: Option<&str>,
) -> Result<HistoricalReport> {
    let started = Instant::now();

    let available_years = waste.distinct_years();
    let year = match year.or_else(|| available_years.last().copied()) {
        Some(y) => y,
        None => return Err(DashboardError::EmptyTable(TOTAL_VOLUME.to_string())),
    };

    let waste_year = filter_by_year(waste, year);
    let waste_stats = summary_stats(&waste_year, TOTAL_VOLUME)?;
    let waste_series = waste_year
        .iter()
        .map(|r| SeriesPoint {
            date: r.date,
            value: r.total_volume_m3,
        })
        .collect();

    let weather = weather_panel(weather, weather_year, year, weather_variable)?;

    let mut socio_economic = socio.rows().to_vec();
    socio_economic.sort_by_key(|r| r.year);

    let pivot = pivot_monthly_by_year(&monthly_average(waste, TOTAL_VOLUME)?);
    let yearly_averages = yearly_average(waste, TOTAL_VOLUME)?;

    let rows_processed = waste.len() + weather_rows(weather.as_ref()) + socio.len();
    debug!(year, rows = rows_processed, "historical overview built");

    Ok(HistoricalReport {
        year,
        available_years,
        waste_stats,
        waste_series,
        weather,
        socio_economic,
        pivot,
        yearly_averages,
        metadata: ReportMetadata::finish(started, rows_processed),
    })
}

/// Build the forecast and insight page from a (possibly range-filtered)
/// forecast table.
pub fn forecast_insight(forecast: &Table<ForecastRecord>) -> Result<ForecastInsight> {
    let started = Instant::now();

    let stats = summary_stats(forecast, TOTAL_VOLUME)?;
    let peak = peak_record(forecast, TOTAL_VOLUME)?;
    let (trend, mean_daily_change) = match (
        trend_direction(forecast, TOTAL_VOLUME),
        mean_difference(forecast, TOTAL_VOLUME),
    ) {
        (Ok(trend), Ok(change)) => (Some(trend), Some(change)),
        (Err(DashboardError::InsufficientData { actual, .. }), _) => {
            debug!(values = actual, "trend undefined: fewer than two forecast days");
            (None, None)
        }
        (Err(e), _) | (_, Err(e)) => return Err(e),
    };

    let growth_rate = match growth_rate(forecast, TOTAL_VOLUME) {
        Ok(rate) => Some(rate),
        Err(DashboardError::DivisionByZero { index }) => {
            warn!(row = index, "growth rate undefined: zero forecast volume");
            None
        }
        Err(DashboardError::InsufficientData { .. }) => None,
        Err(e) => return Err(e),
    };

    let series = forecast
        .iter()
        .map(|r| SeriesPoint {
            date: r.date,
            value: r.total_volume_m3,
        })
        .collect();

    debug!(rows = forecast.len(), ?trend, "forecast insight built");

    Ok(ForecastInsight {
        stats,
        peak_date: peak.date,
        peak_label: month_year_label(peak.date),
        trend,
        mean_daily_change,
        growth_rate,
        series,
        pivot: pivot_monthly_by_year(&monthly_average(forecast, TOTAL_VOLUME)?),
        yearly_averages: yearly_average(forecast, TOTAL_VOLUME)?,
        metadata: ReportMetadata::finish(started, forecast.len()),
    })
}

/// Compare forecast volumes with historical volumes on the dates both
/// tables contain. When a date repeats in the historical table its first
/// row is used.
pub fn evaluate_forecast(
    waste: &Table<WasteRecord>,
    forecast: &Table<ForecastRecord>,
) -> Result<EvaluationReport> {
    let started = Instant::now();

    let mut observed: BTreeMap<NaiveDate, Option<f64>> = BTreeMap::new();
    for r in waste {
        observed.entry(r.date).or_insert(r.total_volume_m3);
    }

    // Days where either side has an empty cell are not paired.
    let mut pairs: Vec<(NaiveDate, f64, f64)> = forecast
        .iter()
        .filter_map(|r| {
            let actual = (*observed.get(&r.date)?)?;
            Some((r.date, actual, r.total_volume_m3?))
        })
        .collect();
    pairs.sort_by_key(|&(date, _, _)| date);

    let actual: Vec<f64> = pairs.iter().map(|&(_, a, _)| a).collect();
    let predicted: Vec<f64> = pairs.iter().map(|&(_, _, p)| p).collect();
    let metrics = evaluate(&actual, &predicted)?;

    let period = match (pairs.first(), pairs.last()) {
        (Some(first), Some(last)) => (first.0, last.0),
        _ => return Err(DashboardError::EmptyTable("paired values".to_string())),
    };
    debug!(pairs = pairs.len(), mae = metrics.mae, "forecast evaluated");

    Ok(EvaluationReport {
        metrics,
        period,
        metadata: ReportMetadata::finish(started, waste.len() + forecast.len()),
    })
}

// ── Private helpers ───────────────────────────────────────────────────────────

fn weather_panel(
    weather: &Table<WeatherRecord>,
    year: Option<i32>,
    waste_year: i32,
    variable: Option<&str>,
) -> Result<Option<WeatherPanel>> {
    let variables: Vec<String> = weather
        .numeric_columns()
        .into_iter()
        .map(str::to_string)
        .collect();

    let variable = match variable {
        Some(v) => {
            weather.require_numeric(v)?;
            v.to_string()
        }
        None => match variables.first() {
            Some(v) => v.clone(),
            None => {
                warn!(table = weather.name(), "weather source has no numeric columns");
                return Ok(None);
            }
        },
    };

    let available_years = weather.distinct_years();
    let year = year.or_else(|| {
        if available_years.contains(&waste_year) {
            Some(waste_year)
        } else {
            available_years.last().copied()
        }
    });

    let series: Vec<SeriesPoint> = match year {
        Some(y) => filter_by_year(weather, y)
            .iter()
            .filter_map(|r| {
                r.values.get(&variable).map(|&value| SeriesPoint {
                    date: r.date,
                    value: Some(value),
                })
            })
            .collect(),
        None => Vec::new(),
    };
    if series.is_empty() {
        warn!(?year, variable = %variable, "no weather readings for the selected year");
    }

    Ok(Some(WeatherPanel {
        variable,
        variables,
        year,
        available_years,
        series,
    }))
}

fn weather_rows(panel: Option<&WeatherPanel>) -> usize {
    panel.map(|p| p.series.len()).unwrap_or(0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use waste_core::models::{Column, ColumnKind, GDP_PER_CAPITA, POPULATION};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn volume_columns() -> Vec<Column> {
        vec![
            Column::new("Tanggal", ColumnKind::Date),
            Column::new(TOTAL_VOLUME, ColumnKind::Float),
        ]
    }

    fn waste() -> Table<WasteRecord> {
        Table::new(
            "data_sampah",
            volume_columns(),
            vec![
                WasteRecord::new(d(2023, 1, 10), 100.0),
                WasteRecord::new(d(2023, 2, 10), 120.0),
                WasteRecord::new(d(2024, 1, 10), 200.0),
                WasteRecord::new(d(2024, 1, 11), 220.0),
            ],
        )
    }

    fn weather() -> Table<WeatherRecord> {
        let row = |date, rain: Option<f64>| {
            let mut values = BTreeMap::new();
            if let Some(r) = rain {
                values.insert("Curah Hujan (mm)".to_string(), r);
            }
            values.insert("Suhu (°C)".to_string(), 28.0);
            WeatherRecord::new(date, values)
        };
        Table::new(
            "data_cuaca",
            vec![
                Column::new("Tanggal", ColumnKind::Date),
                Column::new("Curah Hujan (mm)", ColumnKind::Float),
                Column::new("Suhu (°C)", ColumnKind::Float),
            ],
            vec![
                row(d(2023, 5, 1), Some(3.0)),
                row(d(2024, 5, 1), Some(7.5)),
                row(d(2024, 5, 2), None),
            ],
        )
    }

    fn socio() -> Table<SocioEconomicRecord> {
        Table::new(
            "data_sosial_ekonomi",
            vec![
                Column::new("Tahun", ColumnKind::Year),
                Column::new(POPULATION, ColumnKind::Integer),
                Column::new(GDP_PER_CAPITA, ColumnKind::Float),
            ],
            vec![
                SocioEconomicRecord {
                    year: 2024,
                    population: 2_000,
                    gdp_per_capita: 60.0,
                },
                SocioEconomicRecord {
                    year: 2023,
                    population: 1_900,
                    gdp_per_capita: 55.0,
                },
            ],
        )
    }

    fn forecast(rows: &[(NaiveDate, f64)]) -> Table<ForecastRecord> {
        Table::new(
            "prediksi_sampah_2025_2030",
            volume_columns(),
            rows.iter()
                .map(|&(date, v)| ForecastRecord::new(date, v))
                .collect(),
        )
    }

    // ── historical_overview ───────────────────────────────────────────────

    #[test]
    fn test_historical_overview_defaults_to_latest_year() {
        let report = historical_overview(&waste(), &weather(), &socio(), None, None, None).unwrap();
        assert_eq!(report.year, 2024);
        assert_eq!(report.available_years, vec![2023, 2024]);
        assert_eq!(report.waste_stats.mean, 210.0);
        assert_eq!(report.waste_series.len(), 2);
    }

    #[test]
    fn test_historical_overview_weather_panel() {
        let report =
            historical_overview(&waste(), &weather(), &socio(), Some(2024), None, None).unwrap();
        let panel = report.weather.unwrap();
        assert_eq!(panel.variable, "Curah Hujan (mm)");
        assert_eq!(panel.variables, vec!["Curah Hujan (mm)", "Suhu (°C)"]);
        assert_eq!(panel.year, Some(2024));
        assert_eq!(panel.available_years, vec![2023, 2024]);
        // The 2024-05-02 row has no rainfall reading.
        assert_eq!(
            panel.series,
            vec![SeriesPoint {
                date: d(2024, 5, 1),
                value: Some(7.5)
            }]
        );
    }

    #[test]
    fn test_historical_overview_explicit_weather_year() {
        let report =
            historical_overview(&waste(), &weather(), &socio(), Some(2024), Some(2023), None)
                .unwrap();
        assert_eq!(report.year, 2024);
        let panel = report.weather.unwrap();
        assert_eq!(panel.year, Some(2023));
        assert_eq!(
            panel.series,
            vec![SeriesPoint {
                date: d(2023, 5, 1),
                value: Some(3.0)
            }]
        );
    }

    #[test]
    fn test_historical_overview_weather_year_falls_back_to_latest() {
        // Weather only covers 2023 while the waste cards default to 2024.
        let only_2023 = Table::new(
            "data_cuaca",
            weather().columns().to_vec(),
            weather()
                .rows()
                .iter()
                .filter(|r| r.year == 2023)
                .cloned()
                .collect(),
        );
        let report =
            historical_overview(&waste(), &only_2023, &socio(), None, None, None).unwrap();
        assert_eq!(report.year, 2024);
        let panel = report.weather.unwrap();
        assert_eq!(panel.year, Some(2023));
        assert_eq!(panel.available_years, vec![2023]);
        assert_eq!(panel.series.len(), 1);
    }

    #[test]
    fn test_historical_overview_waste_series_keeps_empty_cells() {
        let mut rows = waste().rows().to_vec();
        rows.push(WasteRecord::new(d(2024, 1, 12), None));
        let t = Table::new("data_sampah", volume_columns(), rows);
        let report = historical_overview(&t, &weather(), &socio(), None, None, None).unwrap();
        assert_eq!(report.waste_series.len(), 3);
        assert_eq!(report.waste_series[2].value, None);
        assert_eq!(report.waste_stats.count, 2);
    }

    #[test]
    fn test_historical_overview_unknown_weather_variable() {
        let err = historical_overview(&waste(), &weather(), &socio(), None, None, Some("Angin"))
            .unwrap_err();
        assert!(matches!(err, DashboardError::UnknownColumn(_)));
    }

    #[test]
    fn test_historical_overview_pivot_and_socio_order() {
        let report =
            historical_overview(&waste(), &weather(), &socio(), Some(2023), None, None).unwrap();
        assert_eq!(report.pivot.cell(1, 2024), Some(210.0));
        assert_eq!(report.pivot.cell(2, 2024), None);
        let years: Vec<_> = report.socio_economic.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2023, 2024]);
        assert_eq!(report.yearly_averages[&2023], 110.0);
    }

    #[test]
    fn test_historical_overview_year_without_data() {
        let err = historical_overview(&waste(), &weather(), &socio(), Some(1999), None, None)
            .unwrap_err();
        assert!(matches!(err, DashboardError::EmptyTable(_)));
    }

    #[test]
    fn test_historical_overview_serialises() {
        let report =
            historical_overview(&waste(), &weather(), &socio(), None, None, None).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["year"], 2024);
        assert_eq!(json["pivot"]["rows"].as_array().unwrap().len(), 12);
        assert!(json["metadata"]["generated_at"].is_string());
    }

    // ── forecast_insight ──────────────────────────────────────────────────

    #[test]
    fn test_forecast_insight_peak_and_trend() {
        let f = forecast(&[
            (d(2025, 1, 1), 300.0),
            (d(2025, 3, 15), 420.0),
            (d(2025, 6, 1), 360.0),
            (d(2025, 9, 1), 480.0),
        ]);
        let insight = forecast_insight(&f).unwrap();
        assert_eq!(insight.peak_date, d(2025, 9, 1));
        assert_eq!(insight.peak_label, "September 2025");
        assert_eq!(insight.trend, Some(Trend::Rising));
        assert!((insight.mean_daily_change.unwrap() - 60.0).abs() < 1e-12);
        assert!(insight.growth_rate.is_some());
        assert_eq!(insight.stats.count, 4);
        assert_eq!(insight.metadata.rows_processed, 4);
    }

    #[test]
    fn test_forecast_insight_zero_volume_has_no_growth_rate() {
        let f = forecast(&[(d(2025, 1, 1), 0.0), (d(2025, 1, 2), 10.0)]);
        let insight = forecast_insight(&f).unwrap();
        assert_eq!(insight.growth_rate, None);
        assert_eq!(insight.trend, Some(Trend::Rising));
    }

    #[test]
    fn test_forecast_insight_single_day_has_no_trend() {
        let insight = forecast_insight(&forecast(&[(d(2025, 2, 1), 310.0)])).unwrap();
        assert_eq!(insight.trend, None);
        assert_eq!(insight.mean_daily_change, None);
        assert_eq!(insight.growth_rate, None);
        assert_eq!(insight.stats.mean, 310.0);
        assert_eq!(insight.peak_label, "February 2025");
    }

    #[test]
    fn test_forecast_insight_empty_table() {
        let err = forecast_insight(&forecast(&[])).unwrap_err();
        assert!(matches!(err, DashboardError::EmptyTable(_)));
    }

    // ── evaluate_forecast ─────────────────────────────────────────────────

    #[test]
    fn test_evaluate_forecast_pairs_by_date() {
        let f = forecast(&[
            (d(2024, 1, 11), 242.0),
            (d(2024, 1, 10), 180.0),
            (d(2030, 1, 1), 999.0),
        ]);
        let report = evaluate_forecast(&waste(), &f).unwrap();
        assert_eq!(report.metrics.samples, 2);
        assert!((report.metrics.mae - 21.0).abs() < 1e-9);
        assert_eq!(report.period, (d(2024, 1, 10), d(2024, 1, 11)));
    }

    #[test]
    fn test_evaluate_forecast_skips_empty_cells() {
        let mut rows = waste().rows().to_vec();
        rows.push(WasteRecord::new(d(2024, 1, 12), None));
        let t = Table::new("data_sampah", volume_columns(), rows);
        let f = Table::new(
            "prediksi_sampah_2025_2030",
            volume_columns(),
            vec![
                ForecastRecord::new(d(2024, 1, 10), 180.0),
                ForecastRecord::new(d(2024, 1, 11), None),
                ForecastRecord::new(d(2024, 1, 12), 230.0),
            ],
        );
        let report = evaluate_forecast(&t, &f).unwrap();
        assert_eq!(report.metrics.samples, 1);
        assert_eq!(report.period, (d(2024, 1, 10), d(2024, 1, 10)));
    }

    #[test]
    fn test_evaluate_forecast_without_overlap() {
        let f = forecast(&[(d(2030, 1, 1), 1.0)]);
        let err = evaluate_forecast(&waste(), &f).unwrap_err();
        assert!(matches!(err, DashboardError::EmptyTable(_)));
    }
}
