//! Adaptive mock-interview server.
//!
//! Candidates connect over WebSocket, answer investment-banking questions, and
//! get each answer scored 1-5 by a language model. Consecutive strong or weak
//! answers move the session between the easy, medium and hard levels.

pub mod cli;
pub mod error;
pub mod interview;
pub mod scoring;
pub mod server;
pub mod settings;

pub use error::{InterviewError, Result};
