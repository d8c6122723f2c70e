//! Runtime layer for the waste dashboard.
//!
//! Holds the session table cache and dispatches the selected page to its
//! handler.

pub mod data_manager;
pub mod pages;

pub use waste_core as core;
pub use waste_data as data;
