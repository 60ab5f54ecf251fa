//! Diagnostic chart rendering.

pub mod charts;

pub use charts::*;
