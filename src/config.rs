//! Runtime settings for the dialogue and the forecasting pipeline.

use crate::error::{PipelineError, Result};
use std::path::PathBuf;

/// Environment variable prefix read by [`Settings::from_env`].
pub const ENV_PREFIX: &str = "FORECAST_DIALOG_";

/// Settings shared by the dispatcher and the state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Root directory; each session stores uploads and artifacts below it.
    pub data_dir: PathBuf,
    /// Largest accepted forecast horizon in days.
    pub max_horizon: usize,
    /// Seed for forecast noise. `None` draws from entropy.
    pub noise_seed: Option<u64>,
    /// Significance level of the unit-root test.
    pub significance: f64,
    /// Maximum AR order searched.
    pub max_p: usize,
    /// Maximum MA order searched.
    pub max_q: usize,
    /// Number of lags shown on the ACF/PACF plot.
    pub acf_lags: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            max_horizon: 3650,
            noise_seed: None,
            significance: 0.05,
            max_p: 5,
            max_q: 5,
            acf_lags: 20,
        }
    }
}

impl Settings {
    /// Set the data directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Set the maximum forecast horizon.
    pub fn with_max_horizon(mut self, max_horizon: usize) -> Self {
        self.max_horizon = max_horizon;
        self
    }

    /// Seed the forecast noise for reproducible output.
    pub fn with_noise_seed(mut self, seed: u64) -> Self {
        self.noise_seed = Some(seed);
        self
    }

    /// Set maximum AR/MA orders for the order search.
    pub fn with_max_orders(mut self, max_p: usize, max_q: usize) -> Self {
        self.max_p = max_p;
        self.max_q = max_q;
        self
    }

    /// Build settings from `FORECAST_DIALOG_*` variables, falling back to defaults.
    ///
    /// Recognised: `DATA_DIR`, `MAX_HORIZON`, `NOISE_SEED`, `SIGNIFICANCE`,
    /// `MAX_P`, `MAX_Q`, `ACF_LAGS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(format!("{ENV_PREFIX}{key}")).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(dir) = lookup("DATA_DIR") {
            settings.data_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("MAX_HORIZON") {
            settings.max_horizon = parse_var("MAX_HORIZON", &raw)?;
        }
        if let Some(raw) = lookup("NOISE_SEED") {
            settings.noise_seed = Some(parse_var("NOISE_SEED", &raw)?);
        }
        if let Some(raw) = lookup("SIGNIFICANCE") {
            settings.significance = parse_var("SIGNIFICANCE", &raw)?;
        }
        if let Some(raw) = lookup("MAX_P") {
            settings.max_p = parse_var("MAX_P", &raw)?;
        }
        if let Some(raw) = lookup("MAX_Q") {
            settings.max_q = parse_var("MAX_Q", &raw)?;
        }
        if let Some(raw) = lookup("ACF_LAGS") {
            settings.acf_lags = parse_var("ACF_LAGS", &raw)?;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.max_horizon == 0 {
            return Err(PipelineError::InvalidParameter(
                "max_horizon must be positive".into(),
            ));
        }
        if !(self.significance > 0.0 && self.significance < 1.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "significance must lie in (0, 1), got {}",
                self.significance
            )));
        }
        if self.acf_lags == 0 {
            return Err(PipelineError::InvalidParameter(
                "acf_lags must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| {
        PipelineError::InvalidParameter(format!("{ENV_PREFIX}{key}: cannot parse '{raw}'"))
    })
}
