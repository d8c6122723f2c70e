//! Data layer for the waste dashboard.
//!
//! Loads the CSV sources into typed tables, filters and aggregates them,
//! derives insights and assembles the per-page reports.

pub mod aggregator;
pub mod analysis;
pub mod filters;
pub mod insight;
pub mod reader;

pub use waste_core as core;
