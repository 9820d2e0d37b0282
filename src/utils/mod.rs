//! Numerical helpers shared by the stationarity test and the models.

pub mod ols;
pub mod optimization;
pub mod stats;

pub use ols::{ols_fit, OLSResult};
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use stats::{cdf_normal, quantile_normal};
