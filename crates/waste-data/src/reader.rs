//! CSV source discovery and loading.
//!
//! Reads the four dashboard sources into typed [`Table`]s. Date columns are
//! resolved here and only here: every row must parse or the whole load
//! fails. Calendar fields are always derived from the date; raw
//! `TAHUN`/`Tahun`/`Bulan` columns in dated sources are ignored.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::{debug, warn};
use waste_core::error::{DashboardError, Result};
use waste_core::models::{
    Column, ColumnKind, ForecastRecord, SocioEconomicRecord, Table, WasteRecord, WeatherRecord,
    GDP_PER_CAPITA, POPULATION, TOTAL_VOLUME,
};
use waste_core::time_utils::parse_date;

/// Accepted names of the date column (compared case-insensitively).
const DATE_COLUMNS: &[&str] = &["Tanggal", "Date"];
/// Calendar columns some sources carry; never read for dated tables.
const YEAR_COLUMNS: &[&str] = &["Tahun", "Year"];
const MONTH_COLUMNS: &[&str] = &["Bulan", "Month"];
const VOLUME_COLUMNS: &[&str] = &[TOTAL_VOLUME, "Total Volume Sampah", "total_volume_m3"];
const POPULATION_COLUMNS: &[&str] = &[POPULATION, "population"];
const GDP_COLUMNS: &[&str] = &[GDP_PER_CAPITA, "PDRB Per Kapita", "gdp_per_capita"];

// ── Source discovery ──────────────────────────────────────────────────────────

/// The four tabular sources of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    Waste,
    Weather,
    SocioEconomic,
    Forecast,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Waste,
        SourceKind::Weather,
        SourceKind::SocioEconomic,
        SourceKind::Forecast,
    ];

    /// File stem the source is exported under.
    pub fn file_stem(self) -> &'static str {
        match self {
            SourceKind::Waste => "data_sampah",
            SourceKind::Weather => "data_cuaca",
            SourceKind::SocioEconomic => "data_sosial_ekonomi",
            SourceKind::Forecast => "prediksi_sampah_2025_2030",
        }
    }
}

/// Resolved location of each source, if known.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourcePaths {
    paths: BTreeMap<SourceKind, PathBuf>,
    data_dir: PathBuf,
}

impl SourcePaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            paths: BTreeMap::new(),
            data_dir: data_dir.into(),
        }
    }

    pub fn get(&self, kind: SourceKind) -> Option<&Path> {
        self.paths.get(&kind).map(PathBuf::as_path)
    }

    pub fn set(&mut self, kind: SourceKind, path: impl Into<PathBuf>) {
        self.paths.insert(kind, path.into());
    }

    /// Path of `kind`, or [`DashboardError::DataPathNotFound`] naming the
    /// file that was expected in the data directory.
    pub fn require(&self, kind: SourceKind) -> Result<&Path> {
        self.get(kind).ok_or_else(|| {
            DashboardError::DataPathNotFound(
                self.data_dir.join(format!("{}.csv", kind.file_stem())),
            )
        })
    }
}

/// Locate the four CSV sources under `data_dir` (one level of nesting is
/// searched). The lexically first match wins when a stem appears twice.
pub fn discover_sources(data_dir: &Path) -> SourcePaths {
    let mut sources = SourcePaths::new(data_dir);
    if !data_dir.exists() {
        warn!("Data path does not exist: {}", data_dir.display());
        return sources;
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_dir)
        .max_depth(2)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();
    files.sort();

    for kind in SourceKind::ALL {
        let found = files.iter().find(|p| {
            p.file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.eq_ignore_ascii_case(kind.file_stem()))
                .unwrap_or(false)
        });
        match found {
            Some(path) => sources.set(kind, path.clone()),
            None => debug!("no {}.csv under {}", kind.file_stem(), data_dir.display()),
        }
    }

    sources
}

// ── Loaders ───────────────────────────────────────────────────────────────────

/// Load the daily historical waste volumes.
pub fn load_waste_data(path: &Path) -> Result<Table<WasteRecord>> {
    load_volume_table(path, |date, volume| WasteRecord::new(date, volume))
}

/// Load the forecast table; `month` is derived alongside `year`.
pub fn load_forecast_data(path: &Path) -> Result<Table<ForecastRecord>> {
    load_volume_table(path, |date, volume| ForecastRecord::new(date, volume))
}

/// Load weather observations. Every column other than the date and raw
/// calendar columns whose non-empty cells all parse as numbers becomes a
/// selectable variable.
pub fn load_weather_data(path: &Path) -> Result<Table<WeatherRecord>> {
    let raw = RawTable::read(path)?;
    let date_idx = raw.date_column()?;
    let dates = raw.parse_dates(date_idx)?;

    let skipped: Vec<usize> = [Some(date_idx), raw.find(YEAR_COLUMNS), raw.find(MONTH_COLUMNS)]
        .into_iter()
        .flatten()
        .collect();

    let numeric: Vec<usize> = (0..raw.headers.len())
        .filter(|i| !skipped.contains(i))
        .filter(|&i| {
            let is_numeric = raw.is_numeric_column(i);
            if !is_numeric {
                debug!(column = %raw.headers[i], "skipping non-numeric weather column");
            }
            is_numeric
        })
        .collect();

    let rows: Vec<WeatherRecord> = raw
        .rows
        .iter()
        .zip(dates)
        .map(|(record, date)| {
            let values = numeric
                .iter()
                .filter_map(|&i| {
                    parse_number(record.get(i).unwrap_or(""))
                        .map(|v| (raw.headers[i].clone(), v))
                })
                .collect();
            WeatherRecord::new(date, values)
        })
        .collect();

    let mut columns = vec![Column::new(raw.headers[date_idx].clone(), ColumnKind::Date)];
    columns.extend(
        numeric
            .iter()
            .map(|&i| Column::new(raw.headers[i].clone(), ColumnKind::Float)),
    );

    debug!(
        source = %raw.name,
        rows = rows.len(),
        variables = numeric.len(),
        "loaded weather data"
    );
    Ok(Table::new(raw.name, columns, rows))
}

/// Load yearly socio-economic indicators. The year column is required.
pub fn load_socio_economic_data(path: &Path) -> Result<Table<SocioEconomicRecord>> {
    let raw = RawTable::read(path)?;
    let year_idx = raw.find(YEAR_COLUMNS).ok_or_else(|| {
        DashboardError::Schema(format!("{}: missing year column (Tahun/Year)", raw.name))
    })?;
    let pop_idx = raw.require(POPULATION_COLUMNS)?;
    let gdp_idx = raw.require(GDP_COLUMNS)?;

    let mut rows = Vec::with_capacity(raw.rows.len());
    for (i, record) in raw.rows.iter().enumerate() {
        let year = raw.whole_number(i, record, year_idx)?;
        let year = i32::try_from(year)
            .map_err(|_| raw.cell_error(i, year_idx, record, "year out of range"))?;
        let population = raw.whole_number(i, record, pop_idx)?;
        let population = u64::try_from(population)
            .map_err(|_| raw.cell_error(i, pop_idx, record, "negative population"))?;
        let gdp_per_capita = raw.number(i, record, gdp_idx)?;
        rows.push(SocioEconomicRecord {
            year,
            population,
            gdp_per_capita,
        });
    }

    let columns = vec![
        Column::new(raw.headers[year_idx].clone(), ColumnKind::Year),
        Column::new(POPULATION, ColumnKind::Integer),
        Column::new(GDP_PER_CAPITA, ColumnKind::Float),
    ];
    debug!(source = %raw.name, rows = rows.len(), "loaded socio-economic data");
    Ok(Table::new(raw.name, columns, rows))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Shared loader for the date + volume sources.
/// Empty volume cells load as `None`; non-empty cells must parse.
fn load_volume_table<R>(
    path: &Path,
    make: impl Fn(NaiveDate, Option<f64>) -> R,
) -> Result<Table<R>> {
    let raw = RawTable::read(path)?;
    let date_idx = raw.date_column()?;
    let volume_idx = raw.require(VOLUME_COLUMNS)?;
    let dates = raw.parse_dates(date_idx)?;

    let mut rows = Vec::with_capacity(raw.rows.len());
    for (i, (record, date)) in raw.rows.iter().zip(dates).enumerate() {
        rows.push(make(date, raw.optional_number(i, record, volume_idx)?));
    }

    let columns = vec![
        Column::new(raw.headers[date_idx].clone(), ColumnKind::Date),
        Column::new(TOTAL_VOLUME, ColumnKind::Float),
    ];
    debug!(source = %raw.name, rows = rows.len(), "loaded volume data");
    Ok(Table::new(raw.name, columns, rows))
}

/// Header and records of a CSV file, as strings.
struct RawTable {
    name: String,
    headers: Vec<String>,
    rows: Vec<StringRecord>,
}

impl RawTable {
    fn read(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| DashboardError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(file);

        let headers = reader.headers()?.iter().map(str::to_string).collect();
        let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("source")
            .to_string();

        Ok(Self {
            name,
            headers,
            rows,
        })
    }

    /// Index of the first header matching one of `aliases`.
    fn find(&self, aliases: &[&str]) -> Option<usize> {
        aliases.iter().find_map(|alias| {
            self.headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(alias))
        })
    }

    fn require(&self, aliases: &[&str]) -> Result<usize> {
        self.find(aliases).ok_or_else(|| {
            DashboardError::Schema(format!("{}: missing column \"{}\"", self.name, aliases[0]))
        })
    }

    fn date_column(&self) -> Result<usize> {
        self.find(DATE_COLUMNS).ok_or_else(|| {
            DashboardError::Parse(format!("{}: missing date column (Tanggal/Date)", self.name))
        })
    }

    fn parse_dates(&self, idx: usize) -> Result<Vec<NaiveDate>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let cell = record.get(idx).unwrap_or("");
                parse_date(cell).ok_or_else(|| self.cell_error(i, idx, record, "invalid date"))
            })
            .collect()
    }

    fn is_numeric_column(&self, idx: usize) -> bool {
        let mut seen = false;
        for record in &self.rows {
            let cell = record.get(idx).unwrap_or("");
            if cell.is_empty() {
                continue;
            }
            if parse_number(cell).is_none() {
                return false;
            }
            seen = true;
        }
        seen
    }

    /// `None` for an empty cell, an error for a non-numeric one.
    fn optional_number(
        &self,
        row: usize,
        record: &StringRecord,
        idx: usize,
    ) -> Result<Option<f64>> {
        if record.get(idx).unwrap_or("").is_empty() {
            return Ok(None);
        }
        self.number(row, record, idx).map(Some)
    }

    fn number(&self, row: usize, record: &StringRecord, idx: usize) -> Result<f64> {
        parse_number(record.get(idx).unwrap_or(""))
            .ok_or_else(|| self.cell_error(row, idx, record, "invalid number"))
    }

    /// A number that must be integral, e.g. `2020` or `2020.0`.
    fn whole_number(&self, row: usize, record: &StringRecord, idx: usize) -> Result<i64> {
        let value = self.number(row, record, idx)?;
        if value.fract() != 0.0 {
            return Err(self.cell_error(row, idx, record, "expected a whole number"));
        }
        Ok(value as i64)
    }

    /// Parse error pointing at the 1-based file line of data row `row`.
    fn cell_error(&self, row: usize, idx: usize, record: &StringRecord, what: &str) -> DashboardError {
        DashboardError::Parse(format!(
            "{}: line {}: {} in column \"{}\": \"{}\"",
            self.name,
            row + 2,
            what,
            self.headers.get(idx).map(String::as_str).unwrap_or("?"),
            record.get(idx).unwrap_or("")
        ))
    }
}

fn parse_number(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
