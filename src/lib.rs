//! Institution usage reports for AI services
//!
//! Turns pre-aggregated warehouse rows into monthly or daily pivot tables
//! with a total row and a year-over-year change-rate row, for display,
//! JSON output or workbook export.

pub mod cli;
pub mod config;
pub mod logging;
pub mod render;
pub mod services;
pub mod sources;
pub mod tui;
pub mod types;
