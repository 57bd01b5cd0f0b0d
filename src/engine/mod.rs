//! Encoder supervision engine
//!
//! Spawns the external encoder, watches its heartbeat and turns its output
//! into session events.

pub mod command;
pub mod heartbeat;
pub mod preview;
pub mod supervisor;

pub use heartbeat::{HeartbeatCheck, HeartbeatMonitor, HeartbeatSettings, MonitorPhase};
pub use preview::Previewer;
pub use supervisor::{Cancellation, ProcessSupervisor, SessionInfo, SupervisorSettings};
