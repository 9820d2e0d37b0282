//! CSV loading for date-indexed columns.

use super::time_series::{MissingValuePolicy, Series};
use crate::error::{PipelineError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%m/%d/%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];
const MISSING_MARKERS: &[&str] = &["", "null", "nan", "na", "n/a"];

/// Parse a calendar date in one of the accepted formats.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

fn is_missing(cell: &str) -> bool {
    let cell = cell.trim();
    MISSING_MARKERS.iter().any(|m| cell.eq_ignore_ascii_case(m))
}

/// Reads one numeric column of a CSV file into a [`Series`].
///
/// The date column is `Date` (case-insensitive) unless configured; failing
/// that, the first other column whose first cell parses as a date is used.
#[derive(Debug, Clone, Default)]
pub struct CsvLoader {
    date_column: Option<String>,
    missing: MissingValuePolicy,
}

impl CsvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit date column.
    pub fn with_date_column(mut self, name: impl Into<String>) -> Self {
        self.date_column = Some(name.into());
        self
    }

    /// Set the policy for missing-value markers.
    pub fn with_missing_policy(mut self, policy: MissingValuePolicy) -> Self {
        self.missing = policy;
        self
    }

    /// Load `column` from the file at `path`.
    pub fn load(&self, path: &Path, column: &str) -> Result<Series> {
        let file = std::fs::File::open(path)?;
        self.read(file, column)
    }

    /// Load `column` from any CSV reader.
    pub fn read<R: Read>(&self, reader: R, column: &str) -> Result<Series> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let column = column.trim();
        let value_idx = headers
            .iter()
            .position(|h| h == column)
            .or_else(|| headers.iter().position(|h| h.eq_ignore_ascii_case(column)))
            .ok_or_else(|| PipelineError::ColumnNotFound(column.to_string()))?;

        let records = rdr.records().collect::<std::result::Result<Vec<_>, _>>()?;
        if records.is_empty() {
            return Err(PipelineError::EmptyData);
        }

        let date_idx = self.locate_date_column(&headers, &records[0], value_idx)?;
        debug!(
            date_column = &headers[date_idx],
            value_column = &headers[value_idx],
            rows = records.len(),
            "reading csv"
        );

        let mut rows: Vec<(NaiveDate, f64)> = Vec::with_capacity(records.len());
        let mut dropped = 0usize;
        let mut last_valid: Option<f64> = None;

        for (i, record) in records.iter().enumerate() {
            // Header is line 1.
            let line = i + 2;
            let date_cell = record.get(date_idx).unwrap_or("");
            let date = parse_date(date_cell).ok_or_else(|| {
                PipelineError::InvalidData(format!("line {line}: '{date_cell}' is not a date"))
            })?;

            let cell = record.get(value_idx).unwrap_or("");
            let value = if is_missing(cell) {
                match self.missing {
                    MissingValuePolicy::Drop => {
                        dropped += 1;
                        continue;
                    }
                    MissingValuePolicy::ForwardFill => match last_valid {
                        Some(v) => v,
                        None => {
                            dropped += 1;
                            continue;
                        }
                    },
                    MissingValuePolicy::Error => {
                        return Err(PipelineError::InvalidData(format!(
                            "line {line}: missing value in column '{column}'"
                        )))
                    }
                }
            } else {
                cell.parse::<f64>().ok().filter(|v| v.is_finite()).ok_or_else(|| {
                    PipelineError::InvalidData(format!(
                        "line {line}: '{cell}' in column '{column}' is not numeric"
                    ))
                })?
            };

            last_valid = Some(value);
            rows.push((date, value));
        }

        if dropped > 0 {
            warn!(dropped, column, "dropped rows with missing values");
        }
        if rows.is_empty() {
            return Err(PipelineError::EmptyData);
        }

        rows.sort_by_key(|(date, _)| *date);
        let (dates, values): (Vec<_>, Vec<_>) = rows.into_iter().unzip();
        Series::new(headers[value_idx].to_string(), dates, values)
    }

    fn locate_date_column(
        &self,
        headers: &csv::StringRecord,
        first: &csv::StringRecord,
        value_idx: usize,
    ) -> Result<usize> {
        if let Some(name) = &self.date_column {
            return headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| PipelineError::ColumnNotFound(name.clone()));
        }

        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case("date"))
            .or_else(|| {
                (0..headers.len())
                    .filter(|&i| i != value_idx)
                    .find(|&i| first.get(i).and_then(parse_date).is_some())
            })
            .ok_or_else(|| PipelineError::InvalidData("no date column found".into()))
    }
}

/// Load `column` from `path` with default loader settings.
pub fn load_series(path: &Path, column: &str) -> Result<Series> {
    CsvLoader::new().load(path, column)
}
