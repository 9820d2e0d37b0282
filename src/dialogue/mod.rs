//! Conversational front end.
//!
//! A [`Dialogue`] owns the [`SessionRegistry`], a [`Transport`] for talking
//! to users and a plot dispatcher. Each session moves through
//! [`Stage::AwaitingFile`], [`Stage::AwaitingColumn`],
//! [`Stage::AwaitingPlotSelection`] and, when a forecast is requested,
//! [`Stage::AwaitingPeriod`] before returning to the menu.

mod machine;
pub mod messages;
mod session;
mod transport;

pub use machine::{parse_period, Dialogue};
pub use session::{Session, SessionId, SessionRegistry, Stage};
pub use transport::{Attachment, Command, Incoming, Transport, BEGIN_ACTION};
