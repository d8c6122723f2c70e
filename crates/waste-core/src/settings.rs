use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Waste volume dashboard: historical data, forecast insight and model evaluation
#[derive(Parser, Debug, Clone)]
#[command(
    name = "waste-dashboard",
    about = "Waste volume dashboard: historical data, forecast insight and model evaluation",
    version
)]
pub struct Settings {
    /// Dashboard page
    #[arg(long, default_value = "historical", value_parser = ["historical", "forecast", "evaluation", "predict"])]
    pub page: String,

    /// Directory holding the CSV sources
    #[arg(long, default_value = ".")]
    pub data_dir: PathBuf,

    /// Historical waste volume CSV (overrides discovery in --data-dir)
    #[arg(long)]
    pub waste_file: Option<PathBuf>,

    /// Weather observations CSV
    #[arg(long)]
    pub weather_file: Option<PathBuf>,

    /// Socio-economic indicators CSV
    #[arg(long)]
    pub socio_file: Option<PathBuf>,

    /// Forecast table CSV
    #[arg(long)]
    pub forecast_file: Option<PathBuf>,

    /// Year shown on the historical page (latest year when omitted)
    #[arg(long)]
    pub year: Option<i32>,

    /// Weather year shown on the historical page (the --year value when the
    /// weather source covers it, otherwise its latest year)
    #[arg(long)]
    pub weather_year: Option<i32>,

    /// Weather variable shown on the historical page (first numeric column when omitted)
    #[arg(long)]
    pub weather_variable: Option<String>,

    /// First day of the forecast range
    #[arg(long, value_parser = parse_date_arg)]
    pub start: Option<NaiveDate>,

    /// Last day of the forecast range
    #[arg(long, value_parser = parse_date_arg)]
    pub end: Option<NaiveDate>,

    /// Output format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Also print the daily rows behind the historical or forecast page
    #[arg(long)]
    pub show_raw: bool,

    /// Date to estimate on the predict page
    #[arg(long, value_parser = parse_date_arg)]
    pub date: Option<NaiveDate>,

    /// Mark the predicted date as a public holiday
    #[arg(long)]
    pub holiday: bool,

    /// Trend component fed to the model
    #[arg(long, default_value = "0.0")]
    pub trend: f64,

    /// Exported model parameters (JSON)
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Fitted feature scaler (JSON)
    #[arg(long)]
    pub feature_scaler: Option<PathBuf>,

    /// Fitted target scaler (JSON)
    #[arg(long)]
    pub target_scaler: Option<PathBuf>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Configuration file (defaults to ~/.waste-dashboard/config.json)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn parse_date_arg(s: &str) -> std::result::Result<NaiveDate, String> {
    crate::time_utils::parse_date(s).ok_or_else(|| format!("invalid date: {s}"))
}

// ── FileConfig ─────────────────────────────────────────────────────────────────

/// Optional defaults read from a JSON configuration file.
///
/// Any value given explicitly on the command line wins over the file.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waste_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socio_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_scaler: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_scaler: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl FileConfig {
    /// `~/.waste-dashboard/config.json`.
    pub fn default_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// The config path rooted at `base_dir`.
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".waste-dashboard").join("config.json")
    }

    /// Load the file at `path`. A missing file yields the default; a file
    /// that exists but does not parse is a configuration error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| DashboardError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content)
            .map_err(|e| DashboardError::Config(format!("{}: {}", path.display(), e)))
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments and merge the configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from_args(std::env::args_os().collect(), &FileConfig::default_path())
    }

    /// Same as [`Settings::load`] with an explicit argument list and default
    /// config path, so tests can redirect both.
    pub fn load_from_args(args: Vec<std::ffi::OsString>, default_config: &Path) -> Result<Self> {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        let config_path = settings
            .config
            .clone()
            .unwrap_or_else(|| default_config.to_path_buf());
        let file = FileConfig::load_from(&config_path)?;
        tracing::debug!(path = %config_path.display(), "configuration file merged");

        // NOTE: clap stores the arg id using the field name (underscores).
        if !is_arg_explicitly_set(&matches, "data_dir") {
            if let Some(v) = file.data_dir {
                settings.data_dir = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "format") {
            if let Some(v) = file.format {
                settings.format = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "log_level") {
            if let Some(v) = file.log_level {
                settings.log_level = v;
            }
        }
        settings.waste_file = settings.waste_file.or(file.waste_file);
        settings.weather_file = settings.weather_file.or(file.weather_file);
        settings.socio_file = settings.socio_file.or(file.socio_file);
        settings.forecast_file = settings.forecast_file.or(file.forecast_file);
        settings.model = settings.model.or(file.model);
        settings.feature_scaler = settings.feature_scaler.or(file.feature_scaler);
        settings.target_scaler = settings.target_scaler.or(file.target_scaler);
        settings.log_file = settings.log_file.or(file.log_file);

        if !["text", "json"].contains(&settings.format.as_str()) {
            return Err(DashboardError::Config(format!(
                "unknown output format \"{}\"",
                settings.format
            )));
        }

        // --debug overrides log level.
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        Ok(settings)
    }

    /// Whether output should be rendered as JSON.
    pub fn json_output(&self) -> bool {
        self.format == "json"
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(list: &[&str]) -> Vec<std::ffi::OsString> {
        list.iter().map(|s| std::ffi::OsString::from(*s)).collect()
    }

    fn write_config(tmp: &TempDir, config: &FileConfig) -> PathBuf {
        let path = FileConfig::config_path_in(tmp.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, serde_json::to_string_pretty(config).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["waste-dashboard"]);

        assert_eq!(settings.page, "historical");
        assert_eq!(settings.data_dir, PathBuf::from("."));
        assert!(settings.year.is_none());
        assert!(settings.weather_year.is_none());
        assert!(settings.weather_variable.is_none());
        assert_eq!(settings.format, "text");
        assert!(!settings.show_raw);
        assert!(!settings.holiday);
        assert_eq!(settings.trend, 0.0);
        assert_eq!(settings.log_level, "INFO");
        assert!(!settings.debug);
    }

    #[test]
    fn test_settings_cli_dates() {
        let settings = Settings::parse_from([
            "waste-dashboard",
            "--page",
            "forecast",
            "--start",
            "2026-01-01",
            "--end",
            "31/12/2026",
        ]);
        assert_eq!(settings.page, "forecast");
        assert_eq!(settings.start, NaiveDate::from_ymd_opt(2026, 1, 1));
        assert_eq!(settings.end, NaiveDate::from_ymd_opt(2026, 12, 31));
    }

    #[test]
    fn test_settings_historical_selection() {
        let settings = Settings::parse_from([
            "waste-dashboard",
            "--year",
            "2024",
            "--weather-year",
            "2023",
            "--show-raw",
        ]);
        assert_eq!(settings.year, Some(2024));
        assert_eq!(settings.weather_year, Some(2023));
        assert!(settings.show_raw);
    }

    #[test]
    fn test_settings_rejects_bad_date() {
        let result = Settings::try_parse_from(["waste-dashboard", "--start", "soon"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_file_config_missing_is_default() {
        let tmp = TempDir::new().expect("tempdir");
        let loaded = FileConfig::load_from(&FileConfig::config_path_in(tmp.path())).unwrap();
        assert_eq!(loaded, FileConfig::default());
    }

    #[test]
    fn test_file_config_malformed_is_error() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = FileConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, DashboardError::Config(_)));
    }

    #[test]
    fn test_load_merges_file_values() {
        let tmp = TempDir::new().expect("tempdir");
        let path = write_config(
            &tmp,
            &FileConfig {
                data_dir: Some(PathBuf::from("/srv/sampah")),
                format: Some("json".to_string()),
                model: Some(PathBuf::from("/srv/model.json")),
                ..Default::default()
            },
        );

        let settings = Settings::load_from_args(args(&["waste-dashboard"]), &path).unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("/srv/sampah"));
        assert!(settings.json_output());
        assert_eq!(settings.model, Some(PathBuf::from("/srv/model.json")));
    }

    #[test]
    fn test_load_cli_overrides_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path = write_config(
            &tmp,
            &FileConfig {
                data_dir: Some(PathBuf::from("/srv/sampah")),
                waste_file: Some(PathBuf::from("/srv/old.csv")),
                ..Default::default()
            },
        );

        let settings = Settings::load_from_args(
            args(&[
                "waste-dashboard",
                "--data-dir",
                "/tmp/data",
                "--waste-file",
                "/tmp/new.csv",
            ]),
            &path,
        )
        .unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("/tmp/data"));
        assert_eq!(settings.waste_file, Some(PathBuf::from("/tmp/new.csv")));
    }

    #[test]
    fn test_load_explicit_config_flag() {
        let tmp = TempDir::new().expect("tempdir");
        let custom = tmp.path().join("custom.json");
        std::fs::write(&custom, r#"{"log_level": "WARNING"}"#).unwrap();

        let settings = Settings::load_from_args(
            args(&["waste-dashboard", "--config", custom.to_str().unwrap()]),
            &tmp.path().join("unused.json"),
        )
        .unwrap();
        assert_eq!(settings.log_level, "WARNING");
    }

    #[test]
    fn test_load_rejects_unknown_format_from_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path = write_config(
            &tmp,
            &FileConfig {
                format: Some("xml".to_string()),
                ..Default::default()
            },
        );
        let err = Settings::load_from_args(args(&["waste-dashboard"]), &path).unwrap_err();
        assert!(matches!(err, DashboardError::Config(_)));
    }

    #[test]
    fn test_load_debug_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let settings = Settings::load_from_args(
            args(&["waste-dashboard", "--debug"]),
            &FileConfig::config_path_in(tmp.path()),
        )
        .unwrap();
        assert_eq!(settings.log_level, "DEBUG");
    }
}
