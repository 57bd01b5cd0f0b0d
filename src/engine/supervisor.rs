//! Encoder process supervision
//!
//! One [`ProcessSupervisor`] owns at most one encoder process. Two reader tasks
//! route stdout and stderr through the line classifier, a watchdog task polls
//! the heartbeat monitor, and a waiter task owns the child and reports its exit.
//! `start` and `cancel` only issue requests; results arrive through the
//! [`EventSink`].

use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::domain::arguments::build_arguments;
use crate::domain::model::{
    ClassifiedLine, EncodeEvent, EncodeParameters, ExitReason, OutputStream, StallDecision,
};
use crate::domain::protocol::classify;
use crate::engine::command::command_with_line;
use crate::engine::heartbeat::{HeartbeatCheck, HeartbeatMonitor, HeartbeatSettings};
use crate::engine::preview::Previewer;
use crate::error::{SupervisorError, SupervisorResult, TerminationFailure};
use crate::ports::{EventSink, InvocationRecorder, StallHandler};

/// How long readers may keep draining after the process is gone
pub const READER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Supervisor configuration
#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    /// Encoder executable, already resolved
    pub encoder: PathBuf,
    pub heartbeat: HeartbeatSettings,
    /// Write a replay script next to the output on start
    pub record_replay: bool,
    /// Player used by `preview`
    pub previewer: Option<Previewer>,
}

impl SupervisorSettings {
    pub fn new(encoder: impl Into<PathBuf>) -> Self {
        Self {
            encoder: encoder.into(),
            heartbeat: HeartbeatSettings::default(),
            record_replay: true,
            previewer: None,
        }
    }
}

/// What `start` hands back once the process is running
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInfo {
    pub id: u64,
    pub pid: Option<u32>,
    pub arguments: String,
    pub replay_script: Option<PathBuf>,
}

/// Outcome of a `cancel` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cancellation {
    /// Termination requested and completion reported
    Requested,
    /// A previous call already cancelled this session
    AlreadyCancelled,
    /// Nothing running
    NoSession,
}

/// Cancellation flag that also orders events: output published under the
/// gate can never land after the completion published by `cancel_with`.
#[derive(Debug, Default)]
struct CancelGate {
    cancelled: Mutex<bool>,
}

impl CancelGate {
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.cancelled
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_cancelled(&self) -> bool {
        *self.lock()
    }

    /// Run `publish` unless the session was cancelled
    fn unless_cancelled(&self, publish: impl FnOnce()) {
        let cancelled = self.lock();
        if !*cancelled {
            publish();
        }
    }

    /// Mark cancelled and run `publish`. False when already cancelled.
    fn cancel_with(&self, publish: impl FnOnce()) -> bool {
        let mut cancelled = self.lock();
        if *cancelled {
            return false;
        }
        *cancelled = true;
        publish();
        true
    }
}

struct Session {
    id: u64,
    monitor: HeartbeatMonitor,
    gate: Arc<CancelGate>,
    kill: Option<oneshot::Sender<()>>,
}

struct Launched {
    id: u64,
    child: Child,
    monitor: HeartbeatMonitor,
    gate: Arc<CancelGate>,
    kill: oneshot::Receiver<()>,
}

struct Shared {
    settings: SupervisorSettings,
    sink: Arc<dyn EventSink>,
    stall_handler: Arc<dyn StallHandler>,
    recorder: Arc<dyn InvocationRecorder>,
    session: Mutex<Option<Session>>,
    next_id: AtomicU64,
}

/// Owner of the encoder process and its session state
#[derive(Clone)]
pub struct ProcessSupervisor {
    shared: Arc<Shared>,
}

impl ProcessSupervisor {
    /// Create a supervisor with injected ports
    pub fn new(
        settings: SupervisorSettings,
        sink: Arc<dyn EventSink>,
        stall_handler: Arc<dyn StallHandler>,
        recorder: Arc<dyn InvocationRecorder>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                settings,
                sink,
                stall_handler,
                recorder,
                session: Mutex::new(None),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn settings(&self) -> &SupervisorSettings {
        &self.shared.settings
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<Session>> {
        self.shared
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Id of the running session, if any
    pub fn active_session(&self) -> Option<u64> {
        self.lock_session().as_ref().map(|session| session.id)
    }

    /// Launch the encoder for `params`.
    ///
    /// Fails with [`SupervisorError::Launch`] when the executable cannot be
    /// started; nothing else happens in that case. A replay script failure is
    /// published as a warning notice and does not stop the encode.
    pub async fn start(&self, params: &EncodeParameters) -> SupervisorResult<SessionInfo> {
        let arguments = build_arguments(params);
        let launched = self.launch(&arguments)?;
        let Launched {
            id,
            mut child,
            monitor,
            gate,
            kill,
        } = launched;
        let pid = child.id();

        info!(session = id, pid = ?pid, encoder = %self.shared.settings.encoder.display(), "encoder started");
        self.shared.sink.publish(EncodeEvent::Started {
            session: id,
            pid,
            arguments: arguments.clone(),
        });

        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            let router = self.router(id, OutputStream::Stdout, &monitor, &gate);
            readers.push(tokio::spawn(pump_lines(stdout, router)));
        }
        if let Some(stderr) = child.stderr.take() {
            let router = self.router(id, OutputStream::Stderr, &monitor, &gate);
            readers.push(tokio::spawn(pump_lines(stderr, router)));
        }

        tokio::spawn(self.clone().watch_heartbeat(id, monitor));
        tokio::spawn(self.clone().await_exit(id, child, kill, readers));

        let replay_script = if self.shared.settings.record_replay {
            self.record(params, &arguments).await
        } else {
            None
        };

        Ok(SessionInfo {
            id,
            pid,
            arguments,
            replay_script,
        })
    }

    fn launch(&self, arguments: &str) -> SupervisorResult<Launched> {
        let mut slot = self.lock_session();
        if slot.is_some() {
            return Err(SupervisorError::SessionActive);
        }

        let encoder = &self.shared.settings.encoder;
        let mut command = command_with_line(encoder, arguments);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(encoder = %encoder.display(), arguments, "spawning encoder");
        let child = command.spawn().map_err(|source| SupervisorError::Launch {
            path: encoder.clone(),
            source,
        })?;

        let id = self.shared.next_id.fetch_add(1, Ordering::SeqCst);
        let monitor = HeartbeatMonitor::new(self.shared.settings.heartbeat.timeout);
        monitor.start();
        let gate = Arc::new(CancelGate::default());
        let (kill_tx, kill_rx) = oneshot::channel();

        *slot = Some(Session {
            id,
            monitor: monitor.clone(),
            gate: Arc::clone(&gate),
            kill: Some(kill_tx),
        });

        Ok(Launched {
            id,
            child,
            monitor,
            gate,
            kill: kill_rx,
        })
    }

    fn router(
        &self,
        session: u64,
        stream: OutputStream,
        monitor: &HeartbeatMonitor,
        gate: &Arc<CancelGate>,
    ) -> LineRouter {
        LineRouter {
            session,
            stream,
            monitor: monitor.clone(),
            gate: Arc::clone(gate),
            sink: Arc::clone(&self.shared.sink),
        }
    }

    async fn record(&self, params: &EncodeParameters, arguments: &str) -> Option<PathBuf> {
        let result = self
            .shared
            .recorder
            .record(Path::new(&params.output), &self.shared.settings.encoder, arguments)
            .await;

        match result {
            Ok(path) => {
                info!(path = %path.display(), "replay script written");
                Some(path)
            }
            Err(err) => {
                warn!(error = %err, "could not write replay script");
                self.shared.sink.publish(EncodeEvent::Notice {
                    severity: err.severity(),
                    message: err.to_string(),
                });
                None
            }
        }
    }

    /// Cancel the running encode.
    ///
    /// Idempotent: only the first call per session stops monitoring, requests
    /// termination and publishes the final `Progress { percent: 100 }`.
    pub fn cancel(&self) -> Cancellation {
        self.cancel_session(None)
    }

    fn cancel_session(&self, only: Option<u64>) -> Cancellation {
        let (id, kill) = {
            let mut slot = self.lock_session();
            let Some(session) = slot
                .as_mut()
                .filter(|session| only.map_or(true, |id| session.id == id))
            else {
                return Cancellation::NoSession;
            };
            let sink = &self.shared.sink;
            if !session
                .gate
                .cancel_with(|| sink.publish(EncodeEvent::Progress { percent: 100 }))
            {
                return Cancellation::AlreadyCancelled;
            }
            session.monitor.stop();
            (session.id, session.kill.take())
        };

        info!(session = id, "cancelling encode");

        let requested = match kill {
            Some(tx) => tx.send(()).map_err(|_| TerminationFailure::AlreadyExited),
            None => Err(TerminationFailure::AlreadyExited),
        };
        if let Err(failure) = requested {
            debug!(session = id, error = %failure, "termination request not delivered");
        }

        Cancellation::Requested
    }

    /// Launch the video player on `file`
    pub fn preview(&self, file: &str, extended: bool) -> SupervisorResult<Option<u32>> {
        match &self.shared.settings.previewer {
            Some(previewer) => previewer.preview(file, extended),
            None => Err(SupervisorError::Config {
                message: "no video player configured".to_string(),
            }),
        }
    }

    async fn watch_heartbeat(self, id: u64, monitor: HeartbeatMonitor) {
        let mut ticker = tokio::time::interval(self.shared.settings.heartbeat.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick fires immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match monitor.check() {
                HeartbeatCheck::Idle => break,
                HeartbeatCheck::Alive => {}
                HeartbeatCheck::Stalled { silent_for } => {
                    warn!(
                        session = id,
                        silent_ms = silent_for.as_millis() as u64,
                        "encoder does not seem to be responding"
                    );
                    self.shared.sink.publish(EncodeEvent::stalled(silent_for));

                    match self.shared.stall_handler.on_stall(silent_for).await {
                        StallDecision::Cancel => {
                            self.cancel_session(Some(id));
                            break;
                        }
                        StallDecision::KeepWaiting => {
                            if !monitor.resume() {
                                break;
                            }
                            debug!(session = id, "heartbeat window re-armed");
                        }
                    }
                }
            }
        }

        debug!(session = id, "heartbeat watchdog stopped");
    }

    async fn await_exit(
        self,
        id: u64,
        mut child: Child,
        mut kill: oneshot::Receiver<()>,
        readers: Vec<JoinHandle<()>>,
    ) {
        let mut killed = false;
        let status = tokio::select! {
            status = child.wait() => status,
            Ok(()) = &mut kill => {
                match terminate(&mut child) {
                    Ok(()) => killed = true,
                    Err(failure) => {
                        debug!(session = id, error = %failure, "termination attempt failed");
                    }
                }
                child.wait().await
            }
        };

        for mut reader in readers {
            if timeout(READER_DRAIN_TIMEOUT, &mut reader).await.is_err() {
                warn!(session = id, "encoder output still open after exit; dropping the rest");
                reader.abort();
            }
        }

        self.finish(id, killed, status);
        // `child` drops here, releasing the process handle
    }

    fn finish(&self, id: u64, killed: bool, status: io::Result<ExitStatus>) {
        let session = {
            let mut slot = self.lock_session();
            if slot.as_ref().map(|session| session.id) == Some(id) {
                slot.take()
            } else {
                None
            }
        };
        let Some(session) = session else {
            return;
        };

        session.monitor.stop();
        let cancelled = session.gate.is_cancelled();
        let reason = exit_reason(killed, &status);
        info!(session = id, %reason, "encoder exited");

        // Cancel already reported completion
        if !cancelled {
            self.shared
                .sink
                .publish(EncodeEvent::Progress { percent: 100 });
        }
        self.shared.sink.publish(EncodeEvent::Exited { reason });
    }
}

/// Only a kill we delivered makes a session `Cancelled`; a process that
/// exited before the kill keeps its own status.
fn exit_reason(killed: bool, status: &io::Result<ExitStatus>) -> ExitReason {
    if killed {
        return ExitReason::Cancelled;
    }
    match status {
        Ok(status) if status.success() => ExitReason::Completed,
        Ok(status) => ExitReason::Failed(status.code()),
        Err(err) => {
            warn!(error = %err, "could not collect encoder exit status");
            ExitReason::Failed(None)
        }
    }
}

/// Best-effort kill. The error only says why no kill was sent.
fn terminate(child: &mut Child) -> Result<(), TerminationFailure> {
    if let Ok(Some(_)) = child.try_wait() {
        return Err(TerminationFailure::AlreadyExited);
    }
    child.start_kill()?;
    Ok(())
}

/// Per-stream dispatch of classified lines
struct LineRouter {
    session: u64,
    stream: OutputStream,
    monitor: HeartbeatMonitor,
    gate: Arc<CancelGate>,
    sink: Arc<dyn EventSink>,
}

impl LineRouter {
    fn route(&self, line: &str) {
        let event = match classify(line) {
            None => return,
            Some(ClassifiedLine::Heartbeat) => {
                self.monitor.refresh();
                return;
            }
            Some(ClassifiedLine::Progress(percent)) => {
                debug!(session = self.session, percent, "progress");
                EncodeEvent::Progress { percent }
            }
            Some(ClassifiedLine::PassThrough(line)) => EncodeEvent::Output {
                stream: self.stream,
                line,
            },
        };

        self.gate.unless_cancelled(|| self.sink.publish(event));
    }
}

async fn pump_lines<R>(reader: R, router: LineRouter)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::with_capacity(256);

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf);
                router.route(text.trim_end_matches(['\r', '\n']));
            }
            Err(err) => {
                warn!(
                    session = router.session,
                    stream = %router.stream,
                    error = %err,
                    "failed reading encoder output"
                );
                break;
            }
        }
    }
}
