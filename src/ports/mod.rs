// Ports - Interface definitions (contracts)

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::model::{EncodeEvent, StallDecision};
use crate::error::SupervisorResult;

/// Port receiving everything a session reports.
///
/// Called from reader and watchdog tasks; implementations must not block and
/// must not call back into the supervisor synchronously.
pub trait EventSink: Send + Sync {
    /// Deliver one event
    fn publish(&self, event: EncodeEvent);
}

impl<F> EventSink for F
where
    F: Fn(EncodeEvent) + Send + Sync,
{
    fn publish(&self, event: EncodeEvent) {
        self(event)
    }
}

/// Port asked what to do when the encoder stops sending heartbeats
#[async_trait]
pub trait StallHandler: Send + Sync {
    /// Decide whether to cancel after `silent_for` without a heartbeat
    async fn on_stall(&self, silent_for: Duration) -> StallDecision;
}

/// Port persisting a reproducible invocation of an encode
#[async_trait]
pub trait InvocationRecorder: Send + Sync {
    /// Record `arguments` run through `executable` next to `output`.
    /// Returns the path written.
    async fn record(
        &self,
        output: &Path,
        executable: &Path,
        arguments: &str,
    ) -> SupervisorResult<PathBuf>;
}
