//! Type definitions for unireport

mod error;
mod report;
mod usage;

pub use error::*;
pub use report::*;
pub use usage::*;

pub(crate) use usage::zero_if_null;
