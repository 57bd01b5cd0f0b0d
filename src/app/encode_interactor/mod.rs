// Encode interactor - Drives one supervised encode from start to exit

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::adapters::job_file::load_job;
use crate::domain::model::{EncodeEvent, EncodeParameters, ExitReason, OutputStream};
use crate::domain::protocol::clamp_percent;
use crate::engine::supervisor::{Cancellation, ProcessSupervisor, SessionInfo};
use crate::error::{SupervisorError, SupervisorResult};

/// Summary of a finished session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub session: u64,
    pub pid: Option<u32>,
    pub arguments: String,
    pub replay_script: Option<PathBuf>,
    /// `None` until the encoder has exited
    pub reason: Option<ExitReason>,
    /// Last reported progress, clamped to 0..=100
    pub last_progress: u8,
    pub stdout_lines: usize,
    pub stderr_lines: usize,
    pub stalls: usize,
    pub notices: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl SessionReport {
    pub fn new(info: SessionInfo, started_at: DateTime<Utc>) -> Self {
        Self {
            session: info.id,
            pid: info.pid,
            arguments: info.arguments,
            replay_script: info.replay_script,
            reason: None,
            last_progress: 0,
            stdout_lines: 0,
            stderr_lines: 0,
            stalls: 0,
            notices: Vec::new(),
            started_at,
            finished_at: None,
        }
    }

    /// Fold one event into the report
    pub fn observe(&mut self, event: &EncodeEvent) {
        match event {
            EncodeEvent::Started { .. } => {}
            EncodeEvent::Progress { percent } => self.last_progress = clamp_percent(*percent),
            EncodeEvent::Output { stream, .. } => match stream {
                OutputStream::Stdout => self.stdout_lines += 1,
                OutputStream::Stderr => self.stderr_lines += 1,
            },
            EncodeEvent::Stalled { .. } => self.stalls += 1,
            EncodeEvent::Notice { message, .. } => self.notices.push(message.clone()),
            EncodeEvent::Exited { reason } => {
                self.reason = Some(*reason);
                self.finished_at = Some(Utc::now());
            }
        }
    }

    pub fn succeeded(&self) -> bool {
        self.reason.map_or(false, |reason| reason.is_success())
    }
}

/// Interactor for the encode use case
pub struct EncodeInteractor {
    supervisor: ProcessSupervisor,
    events: mpsc::UnboundedReceiver<EncodeEvent>,
    cancel_on_interrupt: bool,
}

impl EncodeInteractor {
    /// Create an interactor reading the events `supervisor` publishes
    pub fn new(supervisor: ProcessSupervisor, events: mpsc::UnboundedReceiver<EncodeEvent>) -> Self {
        Self {
            supervisor,
            events,
            cancel_on_interrupt: false,
        }
    }

    /// Cancel the encode on Ctrl-C
    pub fn with_interrupt_cancel(mut self) -> Self {
        self.cancel_on_interrupt = true;
        self
    }

    pub fn supervisor(&self) -> &ProcessSupervisor {
        &self.supervisor
    }

    /// Read encode parameters from a job file
    pub async fn load(&self, path: &Path) -> SupervisorResult<EncodeParameters> {
        load_job(path).await
    }

    /// Open `file` in the configured player
    pub fn preview(&self, file: &str, extended: bool) -> SupervisorResult<Option<u32>> {
        self.supervisor.preview(file, extended)
    }

    /// Start the encoder and follow it until it exits.
    ///
    /// `observe` sees every event in publication order, including the final
    /// `Exited`.
    pub async fn run<F>(mut self, params: &EncodeParameters, mut observe: F) -> SupervisorResult<SessionReport>
    where
        F: FnMut(&EncodeEvent),
    {
        let started_at = Utc::now();
        let info = self.supervisor.start(params).await?;
        info!("Encode session {} started: {}", info.id, params.output);
        let mut report = SessionReport::new(info, started_at);
        let mut interrupted = false;

        loop {
            tokio::select! {
                event = self.events.recv() => {
                    let Some(event) = event else {
                        return Err(SupervisorError::Io(io::Error::new(
                            io::ErrorKind::BrokenPipe,
                            "event channel closed before the encoder exited",
                        )));
                    };
                    report.observe(&event);
                    observe(&event);
                    if matches!(event, EncodeEvent::Exited { .. }) {
                        break;
                    }
                }
                signal = tokio::signal::ctrl_c(), if self.cancel_on_interrupt && !interrupted => {
                    interrupted = true;
                    match signal {
                        Ok(()) => {
                            warn!("Interrupted, cancelling encode");
                            if self.supervisor.cancel() == Cancellation::NoSession {
                                warn!("No encode running to cancel");
                            }
                        }
                        Err(err) => warn!(error = %err, "cannot listen for Ctrl-C"),
                    }
                }
            }
        }

        if let Some(reason) = report.reason {
            info!("Encode session {} finished: {}", report.session, reason);
        }
        Ok(report)
    }
}
