//! Shared foundations for the waste volume dashboard.
//!
//! Error taxonomy, the typed record/table model, date and formatting
//! helpers, settings, forecast evaluation metrics and single-point
//! inference.

pub mod error;
pub mod evaluation;
pub mod formatting;
pub mod inference;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{DashboardError, Result};
