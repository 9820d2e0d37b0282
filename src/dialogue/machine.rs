//! The conversation state machine.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use super::messages::{self, artifact_failed};
use super::session::{SessionId, SessionRegistry, Stage};
use super::transport::{Attachment, Command, Incoming, Transport, BEGIN_ACTION};
use crate::config::Settings;
use crate::error::{PipelineError, Result};
use crate::plot::{DispatchReport, MenuChoice, PlotDispatcher, PlotKind, Renderer, Selection};

/// Parse a forecast period in days, accepting `1..=max`.
///
/// ```
/// use forecast_dialog::dialogue::parse_period;
///
/// assert_eq!(parse_period(" 30 ", 365).unwrap(), 30);
/// assert!(parse_period("abc", 365).is_err());
/// assert!(parse_period("0", 365).is_err());
/// ```
pub fn parse_period(text: &str, max: usize) -> Result<usize> {
    let text = text.trim();
    let days: i64 = text.parse().map_err(|_| {
        PipelineError::InvalidPeriod(format!("'{text}' is not a whole number of days"))
    })?;
    if days <= 0 {
        let reason = format!("{days} is not a positive number of days");
        return Err(PipelineError::InvalidPeriod(reason));
    }
    match usize::try_from(days) {
        Ok(days) if days <= max => Ok(days),
        _ => {
            let reason = format!("{days} days exceeds the limit of {max}");
            Err(PipelineError::InvalidPeriod(reason))
        }
    }
}

/// Drives every session through file intake, column choice, plot selection
/// and optional period entry.
///
/// Messages are handled one at a time and each runs to completion,
/// including model fitting and rendering.
pub struct Dialogue<T, R> {
    transport: T,
    dispatcher: PlotDispatcher<R>,
    sessions: SessionRegistry,
    data_dir: PathBuf,
    max_horizon: usize,
}

impl<T: Transport, R: Renderer> Dialogue<T, R> {
    pub fn new(transport: T, renderer: R, settings: Settings) -> Self {
        Self {
            transport,
            data_dir: settings.data_dir.clone(),
            max_horizon: settings.max_horizon,
            dispatcher: PlotDispatcher::new(renderer, settings),
            sessions: SessionRegistry::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn dispatcher(&self) -> &PlotDispatcher<R> {
        &self.dispatcher
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Current stage of a session, if it exists.
    pub fn stage(&self, id: SessionId) -> Option<Stage> {
        self.sessions.get(id).map(|s| s.stage)
    }

    /// Forget a session entirely.
    pub fn reset(&mut self, id: SessionId) {
        self.sessions.clear(id);
    }

    /// Handle one message and return the resulting stage.
    ///
    /// Invalid user input is answered with a re-prompt and then returned as
    /// `InputValidation` or `InvalidPeriod`; the stage does not change.
    ///
    /// # Errors
    /// Transport and filesystem failures propagate unchanged.
    #[tracing::instrument(skip(self, message), fields(session = %id))]
    pub fn handle(&mut self, id: SessionId, message: Incoming) -> Result<Stage> {
        let before = self.sessions.get_or_create(id).stage;
        let outcome = self.step(id, before, message);
        let after = self.stage(id).unwrap_or_default();

        match outcome {
            Ok(()) => {
                if after != before {
                    info!(from = %before, to = %after, "stage changed");
                }
                Ok(after)
            }
            Err(e) if e.is_user_error() => {
                debug!(error = %e, stage = %after, "re-prompting");
                let text = format!("{e}\n{}", messages::prompt(after));
                self.transport.send_text(id, &text)?;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Handle one message, logging instead of returning failures.
    ///
    /// Unexpected errors are also reported to the user when the transport
    /// still works.
    pub fn process(&mut self, id: SessionId, message: Incoming) -> Stage {
        match self.handle(id, message) {
            Ok(stage) => stage,
            Err(e) if e.is_user_error() => self.stage(id).unwrap_or_default(),
            Err(e) => {
                error!(session = %id, error = %e, "message handling failed");
                let notice = format!("Something went wrong: {e}");
                if let Err(notify) = self.transport.send_text(id, &notice) {
                    warn!(session = %id, error = %notify, "could not report failure");
                }
                self.stage(id).unwrap_or_default()
            }
        }
    }

    /// Process a sequence of messages in order.
    pub fn run<I>(&mut self, messages: I)
    where
        I: IntoIterator<Item = (SessionId, Incoming)>,
    {
        for (id, message) in messages {
            self.process(id, message);
        }
    }

    fn step(&mut self, id: SessionId, stage: Stage, message: Incoming) -> Result<()> {
        match (stage, message) {
            (_, Incoming::Command(Command::Start | Command::Help)) => self.introduce(id),
            (_, Incoming::Command(Command::Begin)) => self.begin(id),
            (_, Incoming::Action(action)) => {
                self.transport.answer_action(id, &action)?;
                if action == BEGIN_ACTION {
                    self.begin(id)
                } else {
                    warn!(%action, "unknown action");
                    self.introduce(id)
                }
            }
            (Stage::Idle, _) => self.introduce(id),
            (Stage::AwaitingFile, Incoming::Document(attachment)) => {
                self.receive_file(id, &attachment)
            }
            (Stage::AwaitingFile, Incoming::Text(_)) => {
                Err(PipelineError::InputValidation(messages::NO_FILE.into()))
            }
            (Stage::AwaitingColumn, Incoming::Text(text)) => self.receive_column(id, &text),
            (Stage::AwaitingPlotSelection, Incoming::Text(text)) => {
                self.receive_selection(id, &text)
            }
            (Stage::AwaitingPeriod, Incoming::Text(text)) => self.receive_period(id, &text),
            (
                Stage::AwaitingColumn | Stage::AwaitingPlotSelection | Stage::AwaitingPeriod,
                Incoming::Document(_),
            ) => Err(PipelineError::InputValidation("Please answer with text.".into())),
            (Stage::Ended, Incoming::Text(text))
                if MenuChoice::from_token(&text) == Some(MenuChoice::Reupload) =>
            {
                self.begin(id)
            }
            (Stage::Ended, _) => self.introduce(id),
        }
    }

    fn introduce(&mut self, id: SessionId) -> Result<()> {
        self.transport
            .offer_action(id, messages::INTRO, messages::BEGIN_LABEL, BEGIN_ACTION)
    }

    /// Start over with an empty session.
    fn begin(&mut self, id: SessionId) -> Result<()> {
        self.sessions.create(id);
        self.request_file(id)
    }

    /// Drop everything the session collected and mark it finished.
    fn end(&mut self, id: SessionId) -> Result<()> {
        self.sessions.create(id).stage = Stage::Ended;
        self.transport.send_text(id, messages::FAREWELL)
    }

    fn request_file(&mut self, id: SessionId) -> Result<()> {
        self.set_stage(id, Stage::AwaitingFile);
        self.transport.send_text(id, messages::ASK_FILE)
    }

    fn receive_file(&mut self, id: SessionId, attachment: &Attachment) -> Result<()> {
        let name = Path::new(&attachment.file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if !name.ends_with(".csv") {
            return Err(PipelineError::InputValidation(messages::NOT_CSV.into()));
        }

        let dir = self.sessions.get_or_create(id).directory(&self.data_dir);
        std::fs::create_dir_all(&dir)?;
        let dest = dir.join(name);
        self.transport.download(attachment, &dest)?;
        info!(path = %dest.display(), "file stored");

        self.sessions.update(id, |s| {
            s.file = Some(dest);
            s.stage = Stage::AwaitingColumn;
        });
        self.transport.send_text(id, messages::ASK_COLUMN)
    }

    fn receive_column(&mut self, id: SessionId, text: &str) -> Result<()> {
        let column = text.trim();
        if column.is_empty() {
            return Err(PipelineError::InputValidation("The column name is empty.".into()));
        }
        self.sessions.update(id, |s| {
            s.column = Some(column.to_string());
            s.stage = Stage::AwaitingPlotSelection;
        });
        self.transport.send_text(id, messages::MENU)
    }

    fn receive_selection(&mut self, id: SessionId, text: &str) -> Result<()> {
        let selection = Selection::parse(text);
        if selection.is_empty() {
            return Err(PipelineError::InputValidation(format!(
                "'{}' contains no menu number.",
                text.trim()
            )));
        }

        if selection.end {
            return self.end(id);
        }
        if selection.reupload {
            return self.request_file(id);
        }
        if selection.wants_forecast() {
            self.sessions.update(id, |s| {
                s.selection = selection.plots;
                s.stage = Stage::AwaitingPeriod;
            });
            return self.transport.send_text(id, messages::ASK_PERIOD);
        }

        self.run_batch(id, &selection.plots, None)
    }

    fn receive_period(&mut self, id: SessionId, text: &str) -> Result<()> {
        let period = parse_period(text, self.max_horizon)?;
        let plots = self
            .sessions
            .update(id, |s| {
                s.period = Some(period);
                s.selection.clone()
            })
            .unwrap_or_default();
        self.run_batch(id, &plots, Some(period))
    }

    /// Render `plots`, deliver them, and return to the menu.
    fn run_batch(
        &mut self,
        id: SessionId,
        plots: &BTreeSet<PlotKind>,
        period: Option<usize>,
    ) -> Result<()> {
        let (file, column) = self
            .sessions
            .get(id)
            .and_then(|s| Some((s.file.clone()?, s.column.clone()?)))
            .ok_or_else(|| {
                PipelineError::InputValidation("Upload a file and choose a column first.".into())
            })?;

        self.set_stage(id, Stage::AwaitingPlotSelection);
        let report = self.dispatcher.dispatch(&file, &column, plots, period);
        self.deliver(id, &report)?;
        self.transport.send_text(id, messages::MENU)
    }

    fn deliver(&mut self, id: SessionId, report: &DispatchReport) -> Result<()> {
        for artifact in &report.artifacts {
            match &artifact.result {
                Ok(path) => self.transport.send_image(id, path, &artifact.caption)?,
                Err(e) => self
                    .transport
                    .send_text(id, &artifact_failed(&artifact.caption, e))?,
            }
        }
        info!(
            delivered = report.delivered().count(),
            failed = report.failures().count(),
            "batch delivered"
        );
        Ok(())
    }

    fn set_stage(&mut self, id: SessionId, stage: Stage) {
        self.sessions.update(id, |s| s.stage = stage);
    }
}
