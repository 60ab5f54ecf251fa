//! Input/output helpers.
//!
//! - CSV table ingest + validation (`ingest`)
//! - JSON run-summary export (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
