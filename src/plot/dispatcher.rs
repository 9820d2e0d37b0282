//! Maps requested plots to the computations they need and renders them.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::figure::Figure;
use super::kinds::PlotKind;
use super::render::Renderer;
use crate::config::Settings;
use crate::core::{load_series, Series};
use crate::error::{PipelineError, Result};
use crate::features::Correlogram;
use crate::forecast::{ForecastEngine, DEFAULT_LEVEL};
use crate::models::arima::{build_model_with, AutoARIMA, AutoARIMAConfig};
use crate::models::Forecaster;

/// Outcome of one requested plot.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub kind: PlotKind,
    /// Caption to deliver with the image.
    pub caption: String,
    /// Path of the written image, or the reason it was not produced.
    pub result: Result<PathBuf>,
}

impl Artifact {
    pub fn path(&self) -> Option<&Path> {
        self.result.as_ref().ok().map(PathBuf::as_path)
    }

    pub fn error(&self) -> Option<&PipelineError> {
        self.result.as_ref().err()
    }
}

/// Per-artifact outcomes of a dispatch, in delivery order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    pub artifacts: Vec<Artifact>,
}

impl DispatchReport {
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Artifacts that were written.
    pub fn delivered(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter().filter(|a| a.result.is_ok())
    }

    /// Artifacts that failed.
    pub fn failures(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter().filter(|a| a.result.is_err())
    }
}

/// Series and model for one dispatch, loaded on first use.
///
/// Failures are cached too, so every artifact depending on a failed step
/// reports the same error.
struct Inputs<'a> {
    source: &'a Path,
    column: &'a str,
    config: AutoARIMAConfig,
    series: Option<Result<Series>>,
    model: Option<Result<AutoARIMA>>,
}

impl<'a> Inputs<'a> {
    fn new(source: &'a Path, column: &'a str, config: AutoARIMAConfig) -> Self {
        Self {
            source,
            column,
            config,
            series: None,
            model: None,
        }
    }

    fn series(&mut self) -> Result<&Series> {
        let (source, column) = (self.source, self.column);
        self.series
            .get_or_insert_with(|| load_series(source, column))
            .as_ref()
            .map_err(Clone::clone)
    }

    fn model(&mut self) -> Result<(&Series, &AutoARIMA)> {
        if self.model.is_none() {
            let config = self.config.clone();
            let fitted = self
                .series()
                .and_then(|series| build_model_with(series, config))
                .map(|(model, _)| model);
            self.model = Some(fitted);
        }
        match (&self.series, &self.model) {
            (Some(Ok(series)), Some(Ok(model))) => Ok((series, model)),
            (_, Some(Err(e))) | (Some(Err(e)), _) => Err(e.clone()),
            _ => Err(PipelineError::FitRequired),
        }
    }
}

/// Produces the requested plots for one uploaded file and column.
#[derive(Debug)]
pub struct PlotDispatcher<R> {
    renderer: R,
    engine: ForecastEngine,
    settings: Settings,
}

impl<R: Renderer> PlotDispatcher<R> {
    pub fn new(renderer: R, settings: Settings) -> Self {
        Self {
            renderer,
            engine: ForecastEngine::from_settings(&settings),
            settings,
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Render every plot in `selection` for `column` of the CSV at `source`.
    ///
    /// Images are written next to `source`. Each kind is attempted
    /// independently; a forecast without `period` fails with `InvalidPeriod`.
    #[tracing::instrument(
        skip(self, source, selection),
        fields(source = %source.display(), plots = selection.len())
    )]
    pub fn dispatch(
        &mut self,
        source: &Path,
        column: &str,
        selection: &BTreeSet<PlotKind>,
        period: Option<usize>,
    ) -> DispatchReport {
        let out_dir = source.parent().unwrap_or_else(|| Path::new("."));
        let config = AutoARIMAConfig::default()
            .with_max_orders(self.settings.max_p, self.settings.max_q)
            .with_significance(self.settings.significance);
        let mut inputs = Inputs::new(source, column, config);

        let artifacts = selection
            .iter()
            .map(|&kind| {
                let result = self.figure(kind, &mut inputs, period).and_then(|figure| {
                    let dest = out_dir.join(kind.file_name());
                    self.renderer.render(&figure, &dest)?;
                    Ok(dest)
                });
                match &result {
                    Ok(path) => info!(plot = %kind, path = %path.display(), "plot rendered"),
                    Err(e) => warn!(plot = %kind, error = %e, "plot failed"),
                }
                Artifact {
                    kind,
                    caption: kind.caption(period),
                    result,
                }
            })
            .collect();

        DispatchReport { artifacts }
    }

    fn figure(
        &mut self,
        kind: PlotKind,
        inputs: &mut Inputs<'_>,
        period: Option<usize>,
    ) -> Result<Figure> {
        match kind {
            PlotKind::TimeSeries => Ok(Figure::time_series(inputs.series()?)),
            PlotKind::Forecast => {
                let horizon = period.ok_or_else(|| {
                    PipelineError::InvalidPeriod("forecast requires a period".into())
                })?;
                if horizon == 0 || horizon > self.settings.max_horizon {
                    return Err(PipelineError::InvalidPeriod(format!(
                        "{horizon} is outside 1..={}",
                        self.settings.max_horizon
                    )));
                }
                let (series, model) = inputs.model()?;
                let result = self.engine.forecast(model, series, horizon)?;
                Ok(Figure::forecast(series.name(), &result))
            }
            PlotKind::AcfPacf => {
                let series = inputs.series()?;
                let correlogram =
                    Correlogram::compute(series.values(), self.settings.acf_lags, DEFAULT_LEVEL)?;
                Ok(Figure::correlogram(series.name(), &correlogram))
            }
            PlotKind::Residuals => {
                let (series, model) = inputs.model()?;
                let residuals = model.residuals().ok_or(PipelineError::FitRequired)?;
                Ok(Figure::residuals(series, residuals))
            }
        }
    }
}
