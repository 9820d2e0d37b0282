//! Per-user conversation state.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::plot::PlotKind;

/// Identifies one conversation, usually the chat or user id of the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub i64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SessionId {
    fn from(id: i64) -> Self {
        SessionId(id)
    }
}

/// Where a conversation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Stage {
    /// No dialogue started yet; only the begin action moves on.
    #[default]
    Idle,
    AwaitingFile,
    AwaitingColumn,
    AwaitingPlotSelection,
    AwaitingPeriod,
    Ended,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::AwaitingFile => "awaiting-file",
            Stage::AwaitingColumn => "awaiting-column",
            Stage::AwaitingPlotSelection => "awaiting-plot-selection",
            Stage::AwaitingPeriod => "awaiting-period",
            Stage::Ended => "ended",
        };
        f.write_str(name)
    }
}

/// State carried between the messages of one conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub stage: Stage,
    /// Local copy of the uploaded CSV.
    pub file: Option<PathBuf>,
    pub column: Option<String>,
    /// Plots waiting for a forecast period.
    pub selection: BTreeSet<PlotKind>,
    pub period: Option<usize>,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            stage: Stage::Idle,
            file: None,
            column: None,
            selection: BTreeSet::new(),
            period: None,
        }
    }

    /// Directory holding this session's uploads and plots.
    pub fn directory(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(self.id.to_string())
    }
}

/// In-memory store of sessions keyed by [`SessionId`].
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh session, replacing any existing one with the same id.
    pub fn create(&mut self, id: SessionId) -> &mut Session {
        let slot = self.get_or_create(id);
        *slot = Session::new(id);
        slot
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn get_or_create(&mut self, id: SessionId) -> &mut Session {
        self.sessions.entry(id).or_insert_with(|| Session::new(id))
    }

    /// Apply `f` to an existing session.
    pub fn update<F, T>(&mut self, id: SessionId, f: F) -> Option<T>
    where
        F: FnOnce(&mut Session) -> T,
    {
        self.sessions.get_mut(&id).map(f)
    }

    /// Remove a session, returning its last state.
    pub fn clear(&mut self, id: SessionId) -> Option<Session> {
        self.sessions.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
