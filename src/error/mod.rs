//! Error handling module for the encode supervisor

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::model::Severity;

/// Main error type for supervisor operations
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// Encoder executable missing or not runnable
    #[error("There was an error starting the encoder. Please make sure that '{}' exists and is runnable: {source}", path.display())]
    Launch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Replay script could not be written
    #[error("There was an error creating the re-encoding script '{}'. Please check your file permissions: {source}", path.display())]
    Record {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Video player missing or not runnable
    #[error("There was an error starting the previewer. Please make sure that '{}' exists and is runnable: {source}", path.display())]
    PreviewLaunch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Extended player wrapper is not installed next to the player
    #[error("The extended video player '{}' is not available. Please make sure it is installed into the same directory as the encoder", path.display())]
    MissingAsset { path: PathBuf },

    /// Audio or subtitle slot index outside 0..capacity
    #[error("Track slot {index} is out of range (0..{capacity})")]
    SlotOutOfRange { index: usize, capacity: usize },

    /// A session is already running on this supervisor
    #[error("An encode session is already active")]
    SessionActive,

    /// Encode job file is malformed
    #[error("Invalid encode job: {message}")]
    InvalidJob { message: String },

    /// Configuration could not be loaded or is inconsistent
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SupervisorError {
    /// How loudly the failure should be surfaced to a user
    pub fn severity(&self) -> Severity {
        match self {
            SupervisorError::Record { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// Result type alias for supervisor operations
pub type SupervisorResult<T> = std::result::Result<T, SupervisorError>;

/// Outcome of a failed kill attempt. The process is gone either way, so callers
/// are free to drop it.
#[derive(Error, Debug)]
pub enum TerminationFailure {
    /// The waiter already observed the exit
    #[error("process already exited")]
    AlreadyExited,

    /// The OS refused the kill request
    #[error("kill request failed: {0}")]
    Kill(#[from] std::io::Error),
}
