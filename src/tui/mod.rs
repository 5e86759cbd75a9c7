//! Terminal viewer for a finished report

mod app;
pub mod theme;
pub mod widgets;

pub use app::{run, App};
