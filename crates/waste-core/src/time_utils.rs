use chrono::{DateTime, NaiveDate, NaiveDateTime};

// ── Date parsing ──────────────────────────────────────────────────────────────

/// Date-only layouts accepted in source files, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Date-time layouts whose time part is dropped.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

/// Parse a source cell into a calendar date.
///
/// Accepts ISO dates, ISO date-times (spreadsheet exports usually carry a
/// `00:00:00` suffix), RFC 3339 timestamps and the day-first layouts used
/// by Indonesian spreadsheets. Returns `None` for empty or unrecognised
/// input.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use waste_core::time_utils::parse_date;
///
/// let d = NaiveDate::from_ymd_opt(2023, 4, 9).unwrap();
/// assert_eq!(parse_date("2023-04-09"), Some(d));
/// assert_eq!(parse_date("2023-04-09 00:00:00"), Some(d));
/// assert_eq!(parse_date("09/04/2023"), Some(d));
/// assert_eq!(parse_date("not a date"), None);
/// ```
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    None
}

// ── Calendar helpers ──────────────────────────────────────────────────────────

/// Short month labels, January first.
pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "Mei", "Jun", "Jul", "Agu", "Sep", "Okt", "Nov", "Des",
];

/// Short label for a 1-based month number; `None` outside 1-12.
pub fn month_label(month: u32) -> Option<&'static str> {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_LABELS.get(i as usize).copied())
}

/// First and last day of `year`.
pub fn year_bounds(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    Some((
        NaiveDate::from_ymd_opt(year, 1, 1)?,
        NaiveDate::from_ymd_opt(year, 12, 31)?,
    ))
}

/// `"<Month> <Year>"` label used for peak insights, e.g. `"March 2027"`.
pub fn month_year_label(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}
