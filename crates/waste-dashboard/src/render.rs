//! Plain-text and JSON rendering of page outputs.
//!
//! Text output is a heading, metric cards and column-aligned tables. Widths
//! are measured in terminal columns so labels such as `m³` or `°C` line up.

use std::fmt::Write as _;

use unicode_width::UnicodeWidthStr;
use waste_core::formatting::{format_cell, format_number, format_rate, format_rupiah, format_volume};
use waste_core::models::{GDP_PER_CAPITA, POPULATION};
use waste_data::aggregator::MonthYearPivot;
use waste_data::analysis::{EvaluationReport, ForecastInsight, HistoricalReport, SeriesPoint};
use waste_data::insight::SummaryStats;
use waste_runtime::pages::{Page, PageOutput, Prediction};

/// Render `output` as pretty JSON or as text.
///
/// `show_raw` appends the daily rows of the historical and forecast pages
/// to the text output. JSON always carries them.
pub fn render(output: &PageOutput, json: bool, show_raw: bool) -> anyhow::Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(output)?);
    }
    let mut out = match output {
        PageOutput::Historical(r) => historical(r),
        PageOutput::Forecast(r) => forecast(r),
        PageOutput::Evaluation(r) => evaluation(r),
        PageOutput::Predict(p) => prediction(p),
    };
    if show_raw {
        let rows = match output {
            PageOutput::Historical(r) => Some(&r.waste_series),
            PageOutput::Forecast(r) => Some(&r.series),
            PageOutput::Evaluation(_) | PageOutput::Predict(_) => None,
        };
        if let Some(rows) = rows {
            let _ = writeln!(out, "\nData Mentah ({} baris)", rows.len());
            out.push_str(&raw_table(rows));
        }
    }
    Ok(out)
}

// ── TextTable ─────────────────────────────────────────────────────────────────

/// A table whose first column is left-aligned and the rest right-aligned.
struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.width()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.width());
                }
            }
        }
        widths
    }

    fn render(&self) -> String {
        let widths = self.widths();
        let mut out = String::new();
        push_line(&mut out, &self.headers, &widths);
        let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
        push_line(&mut out, &rule, &widths);
        for row in &self.rows {
            push_line(&mut out, row, &widths);
        }
        out
    }
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (i, (cell, &w)) in cells.iter().zip(widths).enumerate() {
        let pad = " ".repeat(w.saturating_sub(cell.width()));
        if i == 0 {
            line.push_str(cell);
            line.push_str(&pad);
        } else {
            line.push_str("  ");
            line.push_str(&pad);
            line.push_str(cell);
        }
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

// ── Pages ─────────────────────────────────────────────────────────────────────

fn heading(out: &mut String, page: Page) {
    let title = page.title();
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "=".repeat(title.width()));
}

fn cards(out: &mut String, stats: &SummaryStats) {
    let _ = writeln!(
        out,
        "Rata-rata: {}   Maksimum: {}   Minimum: {}",
        format_volume(stats.mean),
        format_volume(stats.max),
        format_volume(stats.min)
    );
}

fn pivot_table(pivot: &MonthYearPivot) -> String {
    let mut table = TextTable::new(
        std::iter::once("Bulan".to_string()).chain(pivot.years().iter().map(|y| y.to_string())),
    );
    for row in pivot.rows() {
        let mut cells = vec![row.label.to_string()];
        cells.extend(row.cells.iter().map(|&c| format_cell(c)));
        table.row(cells);
    }
    table.render()
}

fn raw_table(series: &[SeriesPoint]) -> String {
    let mut table = TextTable::new(["Tanggal", "Volume (m³)"]);
    for point in series {
        table.row(vec![point.date.to_string(), format_cell(point.value)]);
    }
    table.render()
}

fn yearly_table(averages: &std::collections::BTreeMap<i32, f64>) -> String {
    let mut table = TextTable::new(["Tahun", "Rata-rata (m³)"]);
    for (year, avg) in averages {
        table.row(vec![year.to_string(), format_number(*avg, 2)]);
    }
    table.render()
}

fn historical(r: &HistoricalReport) -> String {
    let mut out = String::new();
    heading(&mut out, Page::Historical);

    let years: Vec<String> = r.available_years.iter().map(|y| y.to_string()).collect();
    let _ = writeln!(out, "\nData Sampah Harian, tahun {} (tersedia: {})", r.year, years.join(", "));
    cards(&mut out, &r.waste_stats);
    let _ = writeln!(out, "{} hari tercatat", r.waste_series.len());

    match &r.weather {
        Some(panel) => {
            let year = panel
                .year
                .map_or_else(|| "-".to_string(), |y| y.to_string());
            let _ = writeln!(
                out,
                "\nData Cuaca: {}, tahun {} ({} titik; variabel: {})",
                panel.variable,
                year,
                panel.series.len(),
                panel.variables.join(", ")
            );
        }
        None => {
            let _ = writeln!(out, "\nData Cuaca: tidak ada variabel numerik");
        }
    }

    let _ = writeln!(out, "\nData Sosial Ekonomi");
    let mut socio = TextTable::new(["Tahun", POPULATION, GDP_PER_CAPITA]);
    for rec in &r.socio_economic {
        socio.row(vec![
            rec.year.to_string(),
            format_number(rec.population as f64, 0),
            format_rupiah(rec.gdp_per_capita),
        ]);
    }
    out.push_str(&socio.render());

    let _ = writeln!(out, "\nRata-rata Bulanan per Tahun (m³)");
    out.push_str(&pivot_table(&r.pivot));
    let _ = writeln!(out, "\nRata-rata Tahunan");
    out.push_str(&yearly_table(&r.yearly_averages));
    out
}

fn forecast(r: &ForecastInsight) -> String {
    let mut out = String::new();
    heading(&mut out, Page::Forecast);
    let _ = writeln!(
        out,
        "\nRata-Rata: {}   Maksimum: {}",
        format_volume(r.stats.mean),
        format_volume(r.stats.max)
    );

    let _ = writeln!(out, "\nInsight Otomatis");
    let _ = writeln!(out, "- Lonjakan terbesar: {} ({})", r.peak_label, r.peak_date);
    match (r.trend, r.mean_daily_change) {
        (Some(trend), Some(change)) => {
            let _ = writeln!(
                out,
                "- Tren rata-rata harian: {} ({} m³/hari)",
                trend,
                format_number(change, 2)
            );
        }
        _ => {
            let _ = writeln!(out, "- Tren rata-rata harian: tidak terdefinisi");
        }
    }
    match r.growth_rate {
        Some(rate) => {
            let _ = writeln!(out, "- Pertumbuhan rata-rata: {}", format_rate(rate));
        }
        None => {
            let _ = writeln!(out, "- Pertumbuhan rata-rata: tidak terdefinisi");
        }
    }

    let _ = writeln!(out, "\nRata-rata Bulanan per Tahun (m³)");
    out.push_str(&pivot_table(&r.pivot));
    let _ = writeln!(out, "\nRata-rata Tahunan");
    out.push_str(&yearly_table(&r.yearly_averages));
    out
}

fn evaluation(r: &EvaluationReport) -> String {
    let mut out = String::new();
    heading(&mut out, Page::Evaluation);
    let (start, end) = r.period;
    let _ = writeln!(
        out,
        "\n{} hari berpasangan, {} s/d {}",
        r.metrics.samples, start, end
    );
    let mut table = TextTable::new(["Metrik", "Nilai"]);
    table.row(vec!["MAE".into(), format_number(r.metrics.mae, 2)]);
    table.row(vec!["RMSE".into(), format_number(r.metrics.rmse, 2)]);
    table.row(vec!["MAPE".into(), format!("{}%", format_number(r.metrics.mape, 2))]);
    out.push_str(&table.render());
    out
}

fn prediction(p: &Prediction) -> String {
    let mut out = String::new();
    heading(&mut out, Page::Predict);
    let f = &p.features;
    let _ = writeln!(
        out,
        "\nTanggal: {} (hari ke-{}, bulan {}, libur: {}, tren: {})",
        p.date,
        f.day_of_year,
        f.month,
        if f.is_holiday { "ya" } else { "tidak" },
        format_number(f.trend_value, 2)
    );
    let _ = writeln!(out, "Estimasi volume: {}", format_volume(p.estimate));
    out
}
