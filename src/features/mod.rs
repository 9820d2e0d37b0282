//! Serial correlation features used by the diagnostic plots.

pub mod autocorrelation;

pub use autocorrelation::{acf, autocorrelation, pacf, partial_autocorrelation, Correlogram};
