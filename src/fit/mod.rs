//! Chi-squared model fitting.
//!
//! - `simplex`: gradient-free Nelder-Mead minimizer
//! - `fitter`: the sinusoidal radial-velocity objective and the two typed
//!   fit operations (free phase vs pinned phase)

pub mod fitter;
pub mod simplex;

pub use fitter::*;
