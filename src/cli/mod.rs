//! Command-line entry point for the interview server.
//!
//! `Args` describes the flags; `initialize` merges them with the settings
//! file and builds the question bank and scoring oracle.

mod args;
mod bootstrap;

pub use args::Args;
pub use bootstrap::{initialize, load_args, ServerContext};
