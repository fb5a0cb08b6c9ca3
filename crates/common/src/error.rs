//! Error types for Switchboard.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SwitchboardError {
    /// The routing classifier call failed. Fatal to the current turn;
    /// the orchestrator propagates it without touching conversation state.
    #[error("Classification error: {0}")]
    Classification(String),

    /// A user id passed resolution but is absent from the directory.
    /// Indicates a resolver/directory inconsistency; never swallowed.
    #[error("Unknown user: {0}")]
    UnknownUser(String),

    /// A domain agent call failed. Caught by the orchestrator and
    /// degraded to a user-visible message.
    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SwitchboardError>;
