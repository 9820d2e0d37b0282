//! Backend-independent description of a chart.
//!
//! A [`Figure`] is a stack of [`Panel`]s; each panel carries labeled lines,
//! shaded bands and vertical markers in data coordinates. Dates are encoded as
//! day offsets from the axis origin so every backend works on `f64` pairs.

use chrono::{Duration, NaiveDate};

use crate::core::{ForecastResult, Series};
use crate::features::Correlogram;

/// Named colors used by the charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Blue,
    Orange,
    Green,
    Red,
    Gray,
    Black,
}

impl Color {
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Color::Blue => (31, 119, 180),
            Color::Orange => (255, 127, 14),
            Color::Green => (44, 160, 44),
            Color::Red => (214, 39, 40),
            Color::Gray => (127, 127, 127),
            Color::Black => (0, 0, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
    /// Vertical stems from zero, as in a correlogram.
    Stem,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub label: String,
    pub color: Color,
    pub style: LineStyle,
    pub points: Vec<(f64, f64)>,
}

/// Shaded region between two curves: `(x, lower, upper)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub label: String,
    pub color: Color,
    pub points: Vec<(f64, f64, f64)>,
}

/// Vertical dashed line at `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub label: String,
    pub color: Color,
    pub x: f64,
}

/// How x values are labeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XAxis {
    /// x is a day offset from `origin`.
    Dates { origin: NaiveDate },
    /// x is a lag count.
    Lags,
}

impl XAxis {
    pub fn format(&self, x: f64) -> String {
        match self {
            XAxis::Dates { origin } => (*origin + Duration::days(x.round() as i64))
                .format("%Y-%m-%d")
                .to_string(),
            XAxis::Lags => format!("{}", x.round() as i64),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            XAxis::Dates { .. } => "Date",
            XAxis::Lags => "Lag",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: String,
    pub x_axis: XAxis,
    pub y_label: String,
    pub lines: Vec<Line>,
    pub bands: Vec<Band>,
    pub markers: Vec<Marker>,
}

impl Panel {
    pub fn new(title: impl Into<String>, x_axis: XAxis, y_label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_axis,
            y_label: y_label.into(),
            lines: Vec::new(),
            bands: Vec::new(),
            markers: Vec::new(),
        }
    }

    pub fn line(
        mut self,
        label: impl Into<String>,
        color: Color,
        style: LineStyle,
        points: Vec<(f64, f64)>,
    ) -> Self {
        self.lines.push(Line {
            label: label.into(),
            color,
            style,
            points,
        });
        self
    }

    pub fn band(
        mut self,
        label: impl Into<String>,
        color: Color,
        points: Vec<(f64, f64, f64)>,
    ) -> Self {
        self.bands.push(Band {
            label: label.into(),
            color,
            points,
        });
        self
    }

    pub fn marker(mut self, label: impl Into<String>, color: Color, x: f64) -> Self {
        self.markers.push(Marker {
            label: label.into(),
            color,
            x,
        });
        self
    }

    fn x_values(&self) -> impl Iterator<Item = f64> + '_ {
        let lines = self.lines.iter().flat_map(|l| l.points.iter().map(|p| p.0));
        let bands = self.bands.iter().flat_map(|b| b.points.iter().map(|p| p.0));
        let markers = self.markers.iter().map(|m| m.x);
        lines.chain(bands).chain(markers)
    }

    fn y_values(&self) -> impl Iterator<Item = f64> + '_ {
        let lines = self.lines.iter().flat_map(|l| {
            let stems = (l.style == LineStyle::Stem).then_some(0.0);
            l.points.iter().map(|p| p.1).chain(stems)
        });
        let bands = self
            .bands
            .iter()
            .flat_map(|b| b.points.iter().flat_map(|p| [p.1, p.2]));
        lines.chain(bands)
    }

    /// Data extent over finite x values, or `None` for an empty panel.
    pub fn x_range(&self) -> Option<(f64, f64)> {
        extent(self.x_values())
    }

    /// Data extent over finite y values, padded so that flat data still has
    /// a visible range.
    pub fn y_range(&self) -> Option<(f64, f64)> {
        let (lo, hi) = extent(self.y_values())?;
        let pad = ((hi - lo) * 0.05).max(lo.abs().max(hi.abs()) * 1e-3).max(1e-9);
        Some((lo - pad, hi + pad))
    }
}

fn extent(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub title: String,
    pub panels: Vec<Panel>,
    /// Pixel size (width, height).
    pub size: (u32, u32),
}

impl Figure {
    pub fn new(title: impl Into<String>, panels: Vec<Panel>) -> Self {
        let height = 500 * panels.len().max(1) as u32;
        Self {
            title: title.into(),
            panels,
            size: (1000, height),
        }
    }

    /// Raw series against its dates.
    pub fn time_series(series: &Series) -> Self {
        let axis = date_axis(series.first_date());
        let panel = Panel::new(format!("Time series: {}", series.name()), axis, series.name())
            .line(series.name(), Color::Blue, LineStyle::Solid, dated(&axis, series.iter()));
        Self::new(format!("Time series: {}", series.name()), vec![panel])
    }

    /// History, in-sample fit, future path, interval band and origin marker.
    pub fn forecast(column: &str, result: &ForecastResult) -> Self {
        let first = result.history.first().map(|h| h.date).or(Some(result.origin));
        let axis = date_axis(first);
        let x = |date: NaiveDate| offset(&axis, date);

        let title = format!("Forecast for {}: {} days", column, result.horizon());
        let panel = Panel::new(title.clone(), axis, column)
            .band(
                format!("{:.0}% interval", result.level * 100.0),
                Color::Green,
                result.points.iter().map(|p| (x(p.date), p.lower, p.upper)).collect(),
            )
            .line(
                "Actual",
                Color::Blue,
                LineStyle::Solid,
                result.history.iter().map(|h| (x(h.date), h.actual)).collect(),
            )
            .line(
                "Fitted",
                Color::Orange,
                LineStyle::Solid,
                result.history.iter().map(|h| (x(h.date), h.fitted)).collect(),
            )
            .line(
                "Forecast",
                Color::Green,
                LineStyle::Solid,
                result.points.iter().map(|p| (x(p.date), p.value)).collect(),
            )
            .marker("Forecast origin", Color::Red, x(result.origin));
        Self::new(title, vec![panel])
    }

    /// ACF and PACF stacked, each with its significance band.
    pub fn correlogram(column: &str, correlogram: &Correlogram) -> Self {
        let stems = |values: &[f64]| -> Vec<(f64, f64)> {
            values
                .iter()
                .enumerate()
                .map(|(lag, v)| (lag as f64, *v))
                .collect()
        };
        let band: Vec<(f64, f64, f64)> = (0..=correlogram.nlags())
            .map(|lag| (lag as f64, -correlogram.band, correlogram.band))
            .collect();

        let acf = Panel::new(format!("ACF: {column}"), XAxis::Lags, "Autocorrelation")
            .band("95% band", Color::Gray, band.clone())
            .line("ACF", Color::Blue, LineStyle::Stem, stems(&correlogram.acf));
        let pacf = Panel::new(format!("PACF: {column}"), XAxis::Lags, "Partial autocorrelation")
            .band("95% band", Color::Gray, band)
            .line("PACF", Color::Blue, LineStyle::Stem, stems(&correlogram.pacf));
        Self::new(format!("ACF and PACF: {column}"), vec![acf, pacf])
    }

    /// Model residuals against the original dates with a zero line.
    pub fn residuals(series: &Series, residuals: &[f64]) -> Self {
        let axis = date_axis(series.first_date());
        let points = dated(
            &axis,
            series.dates().iter().copied().zip(residuals.iter().copied()),
        );
        let zero = match (points.first(), points.last()) {
            (Some(first), Some(last)) => vec![(first.0, 0.0), (last.0, 0.0)],
            _ => Vec::new(),
        };
        let title = format!("Model residuals: {}", series.name());
        let panel = Panel::new(title.clone(), axis, "Residual")
            .line("Zero", Color::Black, LineStyle::Dashed, zero)
            .line("Residuals", Color::Blue, LineStyle::Solid, points);
        Self::new(title, vec![panel])
    }
}

fn date_axis(origin: Option<NaiveDate>) -> XAxis {
    XAxis::Dates {
        origin: origin.unwrap_or_default(),
    }
}

fn offset(axis: &XAxis, date: NaiveDate) -> f64 {
    match axis {
        XAxis::Dates { origin } => (date - *origin).num_days() as f64,
        XAxis::Lags => 0.0,
    }
}

fn dated(axis: &XAxis, pairs: impl Iterator<Item = (NaiveDate, f64)>) -> Vec<(f64, f64)> {
    pairs.map(|(date, value)| (offset(axis, date), value)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FittedPoint, ForecastPoint};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_axis_formats_offsets() {
        let axis = XAxis::Dates {
            origin: date(2024, 2, 27),
        };
        assert_eq!(axis.format(3.0), "2024-03-01");
        assert_eq!(XAxis::Lags.format(7.2), "7");
    }

    #[test]
    fn time_series_figure_uses_day_offsets() {
        let series = Series::new(
            "Price",
            vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 10)],
            vec![1.0, 2.0, 3.0],
        )
        .unwrap();
        let figure = Figure::time_series(&series);
        let points = &figure.panels[0].lines[0].points;
        assert_eq!(points, &vec![(0.0, 1.0), (1.0, 2.0), (9.0, 3.0)]);
        assert_eq!(figure.panels[0].x_range(), Some((0.0, 9.0)));
    }

    #[test]
    fn forecast_figure_layers() {
        let origin = date(2024, 1, 3);
        let result = ForecastResult {
            origin,
            level: 0.95,
            volatility: 0.0,
            order: (0, 1, 0),
            history: (1..=3)
                .map(|d| FittedPoint {
                    date: date(2024, 1, d),
                    actual: d as f64,
                    fitted: d as f64,
                })
                .collect(),
            points: vec![ForecastPoint {
                date: date(2024, 1, 4),
                value: 3.0,
                point: 3.0,
                lower: 1.0,
                upper: 5.0,
            }],
        };

        let figure = Figure::forecast("Price", &result);
        let panel = &figure.panels[0];
        let labels: Vec<_> = panel.lines.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(labels, vec!["Actual", "Fitted", "Forecast"]);
        assert_eq!(panel.bands[0].points, vec![(3.0, 1.0, 5.0)]);
        assert_eq!(panel.markers[0].x, 2.0);
        assert_eq!(panel.markers[0].color, Color::Red);
        let (lo, hi) = panel.y_range().unwrap();
        assert!(lo < 1.0 && hi > 5.0);
    }

    #[test]
    fn correlogram_figure_has_two_panels() {
        let correlogram = Correlogram {
            acf: vec![1.0, 0.5, 0.2],
            pacf: vec![1.0, 0.5, -0.1],
            band: 0.2,
        };
        let figure = Figure::correlogram("Price", &correlogram);
        assert_eq!(figure.panels.len(), 2);
        assert_eq!(figure.size, (1000, 1000));
        assert_eq!(figure.panels[1].lines[0].style, LineStyle::Stem);
        assert_eq!(figure.panels[0].bands[0].points[2], (2.0, -0.2, 0.2));
    }

    #[test]
    fn flat_data_still_has_a_range() {
        let panel = Panel::new("flat", XAxis::Lags, "y").line(
            "c",
            Color::Blue,
            LineStyle::Solid,
            vec![(0.0, 5.0), (1.0, 5.0)],
        );
        let (lo, hi) = panel.y_range().unwrap();
        assert!(lo < 5.0 && hi > 5.0);
        assert_eq!(Panel::new("empty", XAxis::Lags, "y").x_range(), None);
    }
}
