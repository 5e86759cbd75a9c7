//! TUI widgets

pub mod help;
pub mod pivot;
pub mod tabs;
