//! Display-time formatting for metric cards and tables.
//!
//! Rounding happens here and only here; engine values are never rounded.

/// Format a number with `,` thousands separators and a fixed number of
/// decimal places.
///
/// # Examples
///
/// ```
/// use waste_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5, 1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: usize) -> String {
    grouped(value, decimals, ',', '.')
}

/// Format a waste volume as shown on the metric cards.
///
/// # Examples
///
/// ```
/// use waste_core::formatting::format_volume;
///
/// assert_eq!(format_volume(312.456), "312.46 m³");
/// assert_eq!(format_volume(1520.0), "1,520.00 m³");
/// ```
pub fn format_volume(value: f64) -> String {
    format!("{} m³", format_number(value, 2))
}

/// Format a rupiah amount with Indonesian grouping (`.` thousands, no
/// decimals).
///
/// # Examples
///
/// ```
/// use waste_core::formatting::format_rupiah;
///
/// assert_eq!(format_rupiah(45_250_000.0), "Rp 45.250.000");
/// ```
pub fn format_rupiah(value: f64) -> String {
    format!("Rp {}", grouped(value, 0, '.', ','))
}

/// Format a fractional rate (`0.0123`) as a signed percentage (`+1.23%`).
pub fn format_rate(rate: f64) -> String {
    let pct = rate * 100.0;
    if pct > 0.0 {
        format!("+{:.2}%", pct)
    } else {
        format!("{:.2}%", pct)
    }
}

/// Format an optional pivot cell; missing cells render as `-`.
pub fn format_cell(value: Option<f64>) -> String {
    value
        .map(|v| format_number(v, 2))
        .unwrap_or_else(|| "-".to_string())
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn grouped(value: f64, decimals: usize, thousands: char, point: char) -> String {
    let fixed = format!("{:.prec$}", value.abs(), prec = decimals);
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    // `-0.00` would otherwise appear for tiny negatives.
    if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    let lead = int_part.len() % 3;
    for (i, c) in int_part.chars().enumerate() {
        if i != 0 && i % 3 == lead {
            out.push(thousands);
        }
        out.push(c);
    }
    if let Some(frac) = frac_part {
        out.push(point);
        out.push_str(frac);
    }
    out
}
