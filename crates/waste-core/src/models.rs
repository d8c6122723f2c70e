use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};

/// Metric column holding the daily waste volume in cubic metres.
pub const TOTAL_VOLUME: &str = "Total Volume Sampah (m³)";
/// Socio-economic column holding the population count.
pub const POPULATION: &str = "Jumlah Penduduk";
/// Socio-economic column holding GDP per capita in rupiah.
pub const GDP_PER_CAPITA: &str = "PDRB Per Kapita (Rp)";

// ── Schema ────────────────────────────────────────────────────────────────────

/// Type of a column in a loaded table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Calendar date column the derived fields are computed from.
    Date,
    /// Calendar year key (socio-economic table only).
    Year,
    /// Whole-number metric.
    Integer,
    /// Floating-point metric.
    Float,
}

impl ColumnKind {
    /// Whether the column can be used as a metric.
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Float)
    }
}

/// A named, typed column of a [`Table`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

// ── Record traits ─────────────────────────────────────────────────────────────

/// A row of a table that belongs to a calendar year and exposes numeric
/// metric values by column name.
pub trait Record {
    /// Derived (or, for yearly tables, keyed) calendar year.
    fn year(&self) -> i32;
    /// Value of `column` for this row, `None` when the cell is missing or
    /// the column does not belong to this record type.
    fn value(&self, column: &str) -> Option<f64>;
}

/// A record carrying a calendar date from which year and month derive.
pub trait DatedRecord: Record {
    fn date(&self) -> NaiveDate;

    /// Calendar month, 1-12.
    fn month(&self) -> u32 {
        self.date().month()
    }
}

// ── Records ───────────────────────────────────────────────────────────────────

/// One day of historical waste volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteRecord {
    pub date: NaiveDate,
    /// `None` when the source cell is empty.
    pub total_volume_m3: Option<f64>,
    /// Always derived from `date`.
    pub year: i32,
}

impl WasteRecord {
    pub fn new(date: NaiveDate, total_volume_m3: impl Into<Option<f64>>) -> Self {
        Self {
            date,
            total_volume_m3: total_volume_m3.into(),
            year: date.year(),
        }
    }
}

impl Record for WasteRecord {
    fn year(&self) -> i32 {
        self.year
    }

    fn value(&self, column: &str) -> Option<f64> {
        if column == TOTAL_VOLUME {
            self.total_volume_m3
        } else {
            None
        }
    }
}

impl DatedRecord for WasteRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// One day of weather observations from a single station.
///
/// The set of variables is data-driven; a missing cell is simply absent
/// from `values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub date: NaiveDate,
    pub year: i32,
    pub values: BTreeMap<String, f64>,
}

impl WeatherRecord {
    pub fn new(date: NaiveDate, values: BTreeMap<String, f64>) -> Self {
        Self {
            date,
            year: date.year(),
            values,
        }
    }
}

impl Record for WeatherRecord {
    fn year(&self) -> i32 {
        self.year
    }

    fn value(&self, column: &str) -> Option<f64> {
        self.values.get(column).copied()
    }
}

impl DatedRecord for WeatherRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Yearly population and GDP-per-capita indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocioEconomicRecord {
    pub year: i32,
    pub population: u64,
    pub gdp_per_capita: f64,
}

impl Record for SocioEconomicRecord {
    fn year(&self) -> i32 {
        self.year
    }

    fn value(&self, column: &str) -> Option<f64> {
        match column {
            POPULATION => Some(self.population as f64),
            GDP_PER_CAPITA => Some(self.gdp_per_capita),
            _ => None,
        }
    }
}

/// One forecast day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub date: NaiveDate,
    pub total_volume_m3: Option<f64>,
    pub year: i32,
    pub month: u32,
}

impl ForecastRecord {
    pub fn new(date: NaiveDate, total_volume_m3: impl Into<Option<f64>>) -> Self {
        Self {
            date,
            total_volume_m3: total_volume_m3.into(),
            year: date.year(),
            month: date.month(),
        }
    }
}

impl Record for ForecastRecord {
    fn year(&self) -> i32 {
        self.year
    }

    fn value(&self, column: &str) -> Option<f64> {
        if column == TOTAL_VOLUME {
            self.total_volume_m3
        } else {
            None
        }
    }
}

impl DatedRecord for ForecastRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn month(&self) -> u32 {
        self.month
    }
}

// ── Table ─────────────────────────────────────────────────────────────────────

/// An ordered, immutable sequence of records with a typed column schema.
///
/// Filters and aggregations never mutate a table; they build a new one via
/// [`Table::derive`].
#[derive(Debug, Clone, Serialize)]
pub struct Table<R> {
    name: String,
    columns: Vec<Column>,
    rows: Vec<R>,
}

impl<R> Table<R> {
    pub fn new(name: impl Into<String>, columns: Vec<Column>, rows: Vec<R>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    /// Source label the table was loaded from.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.rows.iter()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Names of all columns usable as metrics, in schema order.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.kind.is_numeric())
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Fail with [`DashboardError::UnknownColumn`] unless `name` is a
    /// numeric column of this table.
    pub fn require_numeric(&self, name: &str) -> Result<()> {
        match self.column(name) {
            Some(c) if c.kind.is_numeric() => Ok(()),
            _ => Err(DashboardError::UnknownColumn(name.to_string())),
        }
    }

    /// Build a new table with the same name and schema over `rows`.
    pub fn derive(&self, rows: Vec<R>) -> Table<R> {
        Table {
            name: self.name.clone(),
            columns: self.columns.clone(),
            rows,
        }
    }
}

impl<R: Record> Table<R> {
    /// `(row index, value)` pairs of a metric column in row order, skipping
    /// rows where the cell is missing.
    pub fn values(&self, column: &str) -> Result<Vec<(usize, f64)>> {
        self.require_numeric(column)?;
        Ok(self
            .rows
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.value(column).map(|v| (i, v)))
            .collect())
    }

    /// Distinct years present, ascending.
    pub fn distinct_years(&self) -> Vec<i32> {
        self.rows
            .iter()
            .map(Record::year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl<R: DatedRecord> Table<R> {
    /// Earliest and latest date in the table, `None` when empty.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.rows.iter().map(DatedRecord::date).min()?;
        let max = self.rows.iter().map(DatedRecord::date).max()?;
        Some((min, max))
    }
}

impl<'a, R> IntoIterator for &'a Table<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
