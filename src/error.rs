use thiserror::Error;

use crate::interview::BankError;

#[derive(Debug, Error)]
pub enum InterviewError {
    #[error("Question bank error: {0}")]
    Bank(#[from] BankError),

    #[error("Connection limit ({0}) reached")]
    ConnectionLimit(usize),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, InterviewError>;
