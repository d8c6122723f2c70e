//! Monthly and yearly averages and the month×year pivot.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use waste_core::error::Result;
use waste_core::models::{DatedRecord, Record, Table};
use waste_core::time_utils::MONTH_LABELS;

/// Mean of a metric per `(year, month)`; only months with data are present.
pub type MonthlyAverages = BTreeMap<(i32, u32), f64>;

// ── Running mean ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
struct MeanAcc {
    sum: f64,
    count: usize,
}

impl MeanAcc {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(self) -> f64 {
        self.sum / self.count as f64
    }
}

fn finish<K: Ord>(groups: BTreeMap<K, MeanAcc>) -> BTreeMap<K, f64> {
    groups.into_iter().map(|(k, acc)| (k, acc.mean())).collect()
}

// ── Averages ──────────────────────────────────────────────────────────────────

/// Average `metric` per calendar month of each year.
pub fn monthly_average<R: DatedRecord>(table: &Table<R>, metric: &str) -> Result<MonthlyAverages> {
    table.require_numeric(metric)?;
    let mut groups: BTreeMap<(i32, u32), MeanAcc> = BTreeMap::new();
    for row in table {
        if let Some(v) = row.value(metric) {
            groups.entry((row.year(), row.month())).or_default().add(v);
        }
    }
    Ok(finish(groups))
}

/// Average `metric` per year, ascending by year. Works for yearly tables too.
pub fn yearly_average<R: Record>(table: &Table<R>, metric: &str) -> Result<BTreeMap<i32, f64>> {
    table.require_numeric(metric)?;
    let mut groups: BTreeMap<i32, MeanAcc> = BTreeMap::new();
    for row in table {
        if let Some(v) = row.value(metric) {
            groups.entry(row.year()).or_default().add(v);
        }
    }
    Ok(finish(groups))
}

// ── Pivot ─────────────────────────────────────────────────────────────────────

/// One calendar month of a [`MonthYearPivot`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow {
    /// 1-12.
    pub month: u32,
    pub label: &'static str,
    /// One cell per pivot year; `None` where that month has no data.
    pub cells: Vec<Option<f64>>,
}

/// Monthly averages laid out with months as rows and years as columns.
///
/// Always has exactly twelve rows in calendar order, even when some months
/// have no data in any year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthYearPivot {
    years: Vec<i32>,
    rows: Vec<PivotRow>,
}

impl MonthYearPivot {
    /// Column years, ascending.
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn rows(&self) -> &[PivotRow] {
        &self.rows
    }

    /// Average for `month` (1-12) of `year`, if present.
    pub fn cell(&self, month: u32, year: i32) -> Option<f64> {
        let col = self.years.iter().position(|&y| y == year)?;
        let row = self.rows.get(month.checked_sub(1)? as usize)?;
        row.cells.get(col).copied().flatten()
    }
}

/// Reshape monthly averages into a month×year grid.
pub fn pivot_monthly_by_year(averages: &MonthlyAverages) -> MonthYearPivot {
    let years: Vec<i32> = averages
        .keys()
        .map(|&(year, _)| year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let rows = MONTH_LABELS
        .iter()
        .zip(1u32..)
        .map(|(&label, month)| PivotRow {
            month,
            label,
            cells: years
                .iter()
                .map(|&year| averages.get(&(year, month)).copied())
                .collect(),
        })
        .collect();

    MonthYearPivot { years, rows }
}
