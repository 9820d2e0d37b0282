//! Rendering backends for [`Figure`]s.

use std::fmt::Display;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

use super::figure::{Color as FigureColor, Figure, LineStyle, Panel};
use crate::error::{PipelineError, Result};

/// Turns a figure into an image file.
pub trait Renderer {
    /// Write `figure` to `dest`, replacing any existing file.
    fn render(&self, figure: &Figure, dest: &Path) -> Result<()>;
}

/// PNG output through the `plotters` bitmap backend.
#[derive(Debug, Clone)]
pub struct PlottersRenderer {
    font: String,
}

impl Default for PlottersRenderer {
    fn default() -> Self {
        Self {
            font: "sans-serif".to_string(),
        }
    }
}

impl PlottersRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different font family for titles and labels.
    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        self.font = font.into();
        self
    }

    fn draw_panel<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        panel: &Panel,
    ) -> Result<()> {
        let missing =
            |what: &str| PipelineError::Render(format!("panel '{}' has {what}", panel.title));
        let (x0, x1) = panel.x_range().ok_or_else(|| missing("no data"))?;
        let (x0, x1) = if x1 > x0 { (x0, x1) } else { (x0 - 1.0, x1 + 1.0) };
        let (y0, y1) = panel.y_range().ok_or_else(|| missing("no finite values"))?;

        let mut chart = ChartBuilder::on(area)
            .caption(&panel.title, (self.font.as_str(), 20))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x0..x1, y0..y1)
            .map_err(render_error)?;

        let axis = panel.x_axis;
        let format_x = |x: &f64| axis.format(*x);
        chart
            .configure_mesh()
            .x_desc(axis.description())
            .y_desc(panel.y_label.as_str())
            .x_labels(8)
            .x_label_formatter(&format_x)
            .draw()
            .map_err(render_error)?;

        for band in &panel.bands {
            if band.points.is_empty() {
                continue;
            }
            let fill = rgb(band.color).mix(0.2).filled();
            let outline: Vec<(f64, f64)> = band
                .points
                .iter()
                .map(|&(x, _, upper)| (x, upper))
                .chain(band.points.iter().rev().map(|&(x, lower, _)| (x, lower)))
                .collect();
            chart
                .draw_series(std::iter::once(Polygon::new(outline, fill)))
                .map_err(render_error)?
                .label(band.label.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], fill));
        }

        for line in &panel.lines {
            let color = rgb(line.color);
            let stroke = color.stroke_width(2);
            let drawn = match line.style {
                LineStyle::Solid => chart
                    .draw_series(LineSeries::new(line.points.iter().copied(), stroke))
                    .map_err(render_error)?,
                LineStyle::Dashed => chart
                    .draw_series(DashedLineSeries::new(
                        line.points.iter().copied(),
                        6,
                        4,
                        color.stroke_width(1),
                    ))
                    .map_err(render_error)?,
                LineStyle::Stem => chart
                    .draw_series(
                        line.points
                            .iter()
                            .map(|&(x, y)| PathElement::new(vec![(x, 0.0), (x, y)], stroke)),
                    )
                    .map_err(render_error)?,
            };
            drawn
                .label(line.label.as_str())
                .legend(move |(x, y)| legend_stroke(x, y, stroke));
        }

        for marker in &panel.markers {
            let stroke = rgb(marker.color).stroke_width(2);
            chart
                .draw_series(DashedLineSeries::new(
                    vec![(marker.x, y0), (marker.x, y1)],
                    8,
                    4,
                    stroke,
                ))
                .map_err(render_error)?
                .label(marker.label.as_str())
                .legend(move |(x, y)| legend_stroke(x, y, stroke));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(render_error)?;
        Ok(())
    }
}

impl Renderer for PlottersRenderer {
    #[tracing::instrument(skip(self, figure), fields(title = %figure.title))]
    fn render(&self, figure: &Figure, dest: &Path) -> Result<()> {
        if figure.panels.is_empty() {
            return Err(PipelineError::Render("figure has no panels".into()));
        }
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let root = BitMapBackend::new(dest, figure.size).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;

        for (area, panel) in root
            .split_evenly((figure.panels.len(), 1))
            .iter()
            .zip(&figure.panels)
        {
            self.draw_panel(area, panel)?;
        }

        root.present().map_err(render_error)?;
        tracing::debug!(path = %dest.display(), "figure written");
        Ok(())
    }
}

fn rgb(color: FigureColor) -> RGBColor {
    let (r, g, b) = color.rgb();
    RGBColor(r, g, b)
}

/// Short horizontal legend sample.
fn legend_stroke(x: i32, y: i32, style: ShapeStyle) -> PathElement<(i32, i32)> {
    PathElement::new(vec![(x, y), (x + 20, y)], style)
}

fn render_error(err: impl Display) -> PipelineError {
    PipelineError::Render(err.to_string())
}
