//! Common test utilities module
//!
//! Provides shared fixtures for the integration tests:
//! - A small two-factor dose/response data set as CSV text
//! - Providers preloaded with that data
//! - Logger setup

pub mod fixtures;

pub use fixtures::{init_logger, memory_fs, tooth_growth, TempWorkspace, TOOTH_GROWTH_CSV};
