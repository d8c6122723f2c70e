//! Row filters over loaded tables. Every filter returns a new table and
//! leaves its input untouched.

use chrono::NaiveDate;
use tracing::debug;
use waste_core::error::{DashboardError, Result};
use waste_core::models::{DatedRecord, Record, Table};

/// Rows whose derived year equals `year`. An empty result is valid.
pub fn filter_by_year<R: Record + Clone>(table: &Table<R>, year: i32) -> Table<R> {
    let rows: Vec<R> = table.iter().filter(|r| r.year() == year).cloned().collect();
    debug!(table = table.name(), year, kept = rows.len(), "filter_by_year");
    table.derive(rows)
}

/// Rows with `start <= date <= end`, in their original order.
pub fn filter_by_date_range<R: DatedRecord + Clone>(
    table: &Table<R>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Table<R>> {
    if start > end {
        return Err(DashboardError::InvalidRange { start, end });
    }
    let rows: Vec<R> = table
        .iter()
        .filter(|r| (start..=end).contains(&r.date()))
        .cloned()
        .collect();
    debug!(
        table = table.name(),
        %start,
        %end,
        kept = rows.len(),
        "filter_by_date_range"
    );
    Ok(table.derive(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use waste_core::models::{Column, ColumnKind, WasteRecord, TOTAL_VOLUME};
    use waste_core::time_utils::year_bounds;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn table() -> Table<WasteRecord> {
        Table::new(
            "data_sampah",
            vec![
                Column::new("Tanggal", ColumnKind::Date),
                Column::new(TOTAL_VOLUME, ColumnKind::Float),
            ],
            vec![
                WasteRecord::new(d(2020, 12, 31), 10.0),
                WasteRecord::new(d(2021, 1, 1), 11.0),
                WasteRecord::new(d(2021, 6, 15), 12.0),
                WasteRecord::new(d(2021, 12, 31), 13.0),
                WasteRecord::new(d(2022, 1, 1), 14.0),
            ],
        )
    }

    #[test]
    fn test_filter_by_year_keeps_only_that_year() {
        let out = filter_by_year(&table(), 2021);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|r| r.year == 2021));
        assert_eq!(out.name(), "data_sampah");
    }

    #[test]
    fn test_filter_by_year_partitions_table() {
        let t = table();
        let total: usize = t
            .distinct_years()
            .into_iter()
            .map(|y| filter_by_year(&t, y).len())
            .sum();
        assert_eq!(total, t.len());
    }

    #[test]
    fn test_filter_by_year_absent_year_is_empty() {
        let out = filter_by_year(&table(), 1990);
        assert!(out.is_empty());
        assert_eq!(out.columns().len(), 2);
    }

    #[test]
    fn test_filter_by_date_range_inclusive_bounds() {
        let out = filter_by_date_range(&table(), d(2021, 1, 1), d(2021, 12, 31)).unwrap();
        let dates: Vec<_> = out.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![d(2021, 1, 1), d(2021, 6, 15), d(2021, 12, 31)]);
    }

    #[test]
    fn test_filter_by_date_range_single_day() {
        let out = filter_by_date_range(&table(), d(2021, 6, 15), d(2021, 6, 15)).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_filter_by_date_range_rejects_inverted_range() {
        let err = filter_by_date_range(&table(), d(2022, 1, 1), d(2021, 1, 1)).unwrap_err();
        assert!(matches!(err, DashboardError::InvalidRange { .. }));
    }

    #[test]
    fn test_filter_by_date_range_is_monotonic() {
        let t = table();
        let narrow = filter_by_date_range(&t, d(2021, 3, 1), d(2021, 9, 1)).unwrap();
        let wide = filter_by_date_range(&t, d(2021, 1, 1), d(2021, 12, 31)).unwrap();
        assert!(narrow.len() <= wide.len());
        assert!(narrow.iter().all(|r| wide.rows().contains(r)));
    }

    #[test]
    fn test_year_filter_matches_full_year_range() {
        let t = table();
        let (start, end) = year_bounds(2021).unwrap();
        let by_year = filter_by_year(&t, 2021);
        let by_range = filter_by_date_range(&t, start, end).unwrap();
        assert_eq!(by_year.rows(), by_range.rows());
    }

    #[test]
    fn test_filter_leaves_input_untouched() {
        let t = table();
        let _ = filter_by_year(&t, 2021);
        assert_eq!(t.len(), 5);
    }
}
