//! Plot vocabulary, figure model, rendering and dispatch.
//!
//! A dispatch turns a set of [`PlotKind`]s into image files:
//!
//! ```no_run
//! use std::collections::BTreeSet;
//! use std::path::Path;
//! use forecast_dialog::config::Settings;
//! use forecast_dialog::plot::{PlotDispatcher, PlotKind, PlottersRenderer};
//!
//! let mut dispatcher = PlotDispatcher::new(PlottersRenderer::new(), Settings::default());
//! let selection: BTreeSet<_> = [PlotKind::TimeSeries, PlotKind::Forecast].into();
//! let report = dispatcher.dispatch(Path::new("data/1/prices.csv"), "Close", &selection, Some(30));
//! for artifact in report.failures() {
//!     eprintln!("{}: {:?}", artifact.caption, artifact.error());
//! }
//! ```

mod dispatcher;
mod figure;
mod kinds;
mod render;

pub use dispatcher::{Artifact, DispatchReport, PlotDispatcher};
pub use figure::{Band, Color, Figure, Line, LineStyle, Marker, Panel, XAxis};
pub use kinds::{MenuChoice, PlotKind, Selection};
pub use render::{PlottersRenderer, Renderer};
