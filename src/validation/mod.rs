//! Stationarity diagnostics.
//!
//! # Example
//!
//! ```
//! use forecast_dialog::validation::{adf_test, differencing_order};
//!
//! let series: Vec<f64> = (0..120).map(|i| ((i * 37 + 11) % 23) as f64).collect();
//! let adf = adf_test(&series, None).unwrap();
//! assert!(adf.p_value >= 0.0 && adf.p_value <= 1.0);
//!
//! match differencing_order(&series) {
//!     Ok(d) => println!("difference {d} times"),
//!     Err(err) => println!("no stationary transform: {err}"),
//! }
//! ```

pub mod stationarity;

pub use stationarity::{
    adf_test, differencing_order, differencing_order_with, mackinnon_p_value, AdfResult,
    CriticalValues, DEFAULT_SIGNIFICANCE,
};
