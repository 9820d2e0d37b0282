//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use forecast_dialog::dialogue::{Attachment, SessionId, Transport};
use forecast_dialog::plot::{Figure, Renderer};
use forecast_dialog::{PipelineError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Everything a dialogue sent, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text(SessionId, String),
    Image(SessionId, PathBuf, String),
    Answered(SessionId, String),
}

/// Transport double: records outgoing messages and serves attachments from
/// local paths stored in `file_id`.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub sent: Vec<Sent>,
    /// Session whose image uploads are refused.
    pub refuse_images: Option<SessionId>,
}

impl RecordingTransport {
    pub fn texts(&self, session: SessionId) -> Vec<&str> {
        self.sent
            .iter()
            .filter_map(|s| match s {
                Sent::Text(id, text) if *id == session => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn images(&self, session: SessionId) -> Vec<(&Path, &str)> {
        self.sent
            .iter()
            .filter_map(|s| match s {
                Sent::Image(id, path, caption) if *id == session => {
                    Some((path.as_path(), caption.as_str()))
                }
                _ => None,
            })
            .collect()
    }

    pub fn last_text(&self, session: SessionId) -> Option<&str> {
        self.texts(session).last().copied()
    }
}

impl Transport for RecordingTransport {
    fn send_text(&mut self, session: SessionId, text: &str) -> Result<()> {
        self.sent.push(Sent::Text(session, text.to_string()));
        Ok(())
    }

    fn send_image(&mut self, session: SessionId, path: &Path, caption: &str) -> Result<()> {
        if self.refuse_images == Some(session) {
            return Err(PipelineError::Transport(format!(
                "upload of {} refused",
                path.display()
            )));
        }
        self.sent
            .push(Sent::Image(session, path.to_path_buf(), caption.to_string()));
        Ok(())
    }

    fn download(&mut self, attachment: &Attachment, dest: &Path) -> Result<()> {
        std::fs::copy(&attachment.file_id, dest)?;
        Ok(())
    }

    fn answer_action(&mut self, session: SessionId, action: &str) -> Result<()> {
        self.sent.push(Sent::Answered(session, action.to_string()));
        Ok(())
    }
}

/// Renderer double: writes a placeholder file and keeps the figure.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub figures: RefCell<Vec<(Figure, PathBuf)>>,
}

impl RecordingRenderer {
    pub fn titles(&self) -> Vec<String> {
        self.figures.borrow().iter().map(|(f, _)| f.title.clone()).collect()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&self, figure: &Figure, dest: &Path) -> Result<()> {
        std::fs::write(dest, b"\x89PNG")?;
        self.figures
            .borrow_mut()
            .push((figure.clone(), dest.to_path_buf()));
        Ok(())
    }
}

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 1).unwrap()
}

/// Upward-trending random walk with positive values.
pub fn trending_prices(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut value = 100.0;
    (0..n)
        .map(|_| {
            value += 0.5 + rng.gen_range(-1.0..1.0);
            value
        })
        .collect()
}

/// Write a `Date,<column>` CSV with daily rows and return its path.
pub fn write_csv(dir: &Path, name: &str, column: &str, values: &[f64]) -> PathBuf {
    let mut csv = format!("Date,{column}\n");
    for (i, value) in values.iter().enumerate() {
        let date = start_date() + Duration::days(i as i64);
        writeln!(csv, "{date},{value:.4}").unwrap();
    }
    let path = dir.join(name);
    std::fs::write(&path, csv).unwrap();
    path
}
