//! Encode Supervisor Library
//!
//! Drives an external video encoder as a child process: builds its argument
//! line, records a replay script, classifies its output into progress and
//! heartbeat signals, and cancels it when asked or when it stops responding.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use app::{AppContainer, EncodeInteractor, SessionReport};
pub use domain::model::{
    AudioTrack, EncodeEvent, EncodeParameters, ExitReason, Framerate, StallDecision,
    SurroundChannels,
};
pub use engine::supervisor::{Cancellation, ProcessSupervisor, SupervisorSettings};
pub use error::{SupervisorError, SupervisorResult};
