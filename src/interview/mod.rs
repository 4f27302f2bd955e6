//! Interview domain: difficulty levels, the question bank, and the per-connection
//! session state machine.
//!
//! Everything in here is synchronous and transport-agnostic. The WebSocket
//! protocol in `crate::server::protocol` drives these types one turn at a time.

pub mod level;
pub mod questions;
pub mod session;

pub use level::{Category, Level};
pub use questions::{BankError, Question, QuestionBank};
pub use session::{Score, Session, SessionStats, Transition};
