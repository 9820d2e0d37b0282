//! Messaging boundary of the dialogue.

use std::path::Path;

use super::session::SessionId;
use crate::error::Result;

/// Callback data of the button that starts a dialogue.
pub const BEGIN_ACTION: &str = "make_graphic";

/// A file attached to an incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Name as supplied by the sender.
    pub file_name: String,
    /// Transport-specific handle used to fetch the content.
    pub file_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    /// Same as pressing the begin button.
    Begin,
}

/// Something a user sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Command(Command),
    /// Button press carrying callback data.
    Action(String),
    Document(Attachment),
    Text(String),
}

impl Incoming {
    /// Classify free text, recognising `/start`, `/help` and `/begin`.
    pub fn from_text(text: &str) -> Self {
        match text.trim() {
            "/start" => Incoming::Command(Command::Start),
            "/help" => Incoming::Command(Command::Help),
            "/begin" => Incoming::Command(Command::Begin),
            _ => Incoming::Text(text.to_string()),
        }
    }
}

/// Outgoing side of a chat service.
pub trait Transport {
    fn send_text(&mut self, session: SessionId, text: &str) -> Result<()>;

    /// Send text together with a button that fires `action` when pressed.
    fn offer_action(
        &mut self,
        session: SessionId,
        text: &str,
        label: &str,
        action: &str,
    ) -> Result<()> {
        let _ = (label, action);
        self.send_text(session, text)
    }

    fn send_image(&mut self, session: SessionId, path: &Path, caption: &str) -> Result<()>;

    /// Store the content of `attachment` at `dest`.
    fn download(&mut self, attachment: &Attachment, dest: &Path) -> Result<()>;

    /// Acknowledge a button press.
    fn answer_action(&mut self, session: SessionId, action: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_recognised() {
        assert_eq!(Incoming::from_text(" /start "), Incoming::Command(Command::Start));
        assert_eq!(Incoming::from_text("/help"), Incoming::Command(Command::Help));
        assert_eq!(Incoming::from_text("/begin"), Incoming::Command(Command::Begin));
        assert_eq!(Incoming::from_text("1,3"), Incoming::Text("1,3".into()));
    }
}
