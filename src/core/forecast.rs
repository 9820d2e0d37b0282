//! Forecast result structure.

use chrono::NaiveDate;

/// One future period of a forecast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    /// Calendar day of the forecast.
    pub date: NaiveDate,
    /// Point forecast with multiplicative noise applied.
    pub value: f64,
    /// Model point forecast before noise.
    pub point: f64,
    /// Lower confidence bound.
    pub lower: f64,
    /// Upper confidence bound.
    pub upper: f64,
}

/// One observed period with its in-sample fitted value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedPoint {
    pub date: NaiveDate,
    pub actual: f64,
    pub fitted: f64,
}

/// Output of the forecast engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    /// Last observed date; the forecast starts the day after.
    pub origin: NaiveDate,
    /// Confidence level of `lower`/`upper`.
    pub level: f64,
    /// Historical volatility used to scale the noise.
    pub volatility: f64,
    /// Selected model order (p, d, q).
    pub order: (usize, usize, usize),
    /// Observed values alongside in-sample fitted values.
    pub history: Vec<FittedPoint>,
    /// Future periods.
    pub points: Vec<ForecastPoint>,
}

impl ForecastResult {
    /// Number of forecast periods.
    pub fn horizon(&self) -> usize {
        self.points.len()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// Noise-perturbed forecast values.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Unperturbed model forecasts.
    pub fn point_forecasts(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.point).collect()
    }

    pub fn lower(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.lower).collect()
    }

    pub fn upper(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.upper).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_follow_points() {
        let origin = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let points: Vec<ForecastPoint> = (1..=3)
            .map(|i| ForecastPoint {
                date: origin + chrono::Duration::days(i),
                value: i as f64 + 0.1,
                point: i as f64,
                lower: i as f64 - 1.0,
                upper: i as f64 + 1.0,
            })
            .collect();
        let result = ForecastResult {
            origin,
            level: 0.95,
            volatility: 0.01,
            order: (1, 1, 0),
            history: vec![],
            points,
        };

        assert_eq!(result.horizon(), 3);
        assert_eq!(result.point_forecasts(), vec![1.0, 2.0, 3.0]);
        assert_eq!(result.lower(), vec![0.0, 1.0, 2.0]);
        assert_eq!(result.upper(), vec![2.0, 3.0, 4.0]);
        assert_eq!(
            result.dates()[0],
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
        );
    }
}
