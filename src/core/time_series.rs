//! Daily series data structure.

use crate::error::{PipelineError, Result};
use chrono::{Duration, NaiveDate};

/// Policy for cells that hold a missing-value marker.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MissingValuePolicy {
    /// Drop observations with missing values.
    #[default]
    Drop,
    /// Forward fill (use previous valid value).
    ForwardFill,
    /// Return error if missing values found.
    Error,
}

/// A univariate series of date-stamped observations.
///
/// Dates are strictly increasing and every value is finite. The series is
/// immutable once built; transformations return new vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    name: String,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl Series {
    /// Create a series, validating ordering and values.
    pub fn new(name: impl Into<String>, dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(PipelineError::InvalidParameter(format!(
                "dimension mismatch: {} dates, {} values",
                dates.len(),
                values.len()
            )));
        }

        for w in dates.windows(2) {
            if w[1] <= w[0] {
                return Err(PipelineError::TimestampError(format!(
                    "dates must be strictly increasing ({} follows {})",
                    w[1], w[0]
                )));
            }
        }

        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(PipelineError::InvalidData(format!(
                "non-finite value at {}",
                dates[pos]
            )));
        }

        Ok(Self {
            name: name.into(),
            dates,
            values,
        })
    }

    /// Build a daily series starting at `start`.
    pub fn daily(name: impl Into<String>, start: NaiveDate, values: Vec<f64>) -> Result<Self> {
        let dates = (0..values.len())
            .map(|i| start + Duration::days(i as i64))
            .collect();
        Self::new(name, dates, values)
    }

    /// Column name the series was loaded from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Observation dates.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Observation values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// First observation date.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    /// Last observation date, the origin of any forecast.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Iterate over (date, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// `count` consecutive calendar days following the last observation.
    pub fn future_dates(&self, count: usize) -> Result<Vec<NaiveDate>> {
        let last = self.last_date().ok_or(PipelineError::EmptyData)?;
        Ok((1..=count as i64).map(|i| last + Duration::days(i)).collect())
    }
}
