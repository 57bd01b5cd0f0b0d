//! Heartbeat liveness tracking
//!
//! The monitor only detects silence. Whether a silent encoder gets cancelled is
//! decided by whoever polls it.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

/// Silence after which the encoder counts as stalled
pub const DEFAULT_HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(12);

/// Cadence of the liveness check
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Timing knobs for the monitor and its watchdog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatSettings {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for HeartbeatSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_HEARTBEAT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Monitor phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorPhase {
    /// No encode running
    Idle,
    /// Encode running, checks active
    Monitoring,
    /// Stall reported, waiting for the caller's decision
    Suspended,
}

/// Result of one periodic check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatCheck {
    /// Monitoring stopped; the watchdog should exit
    Idle,
    /// Still inside the window, or waiting on a decision
    Alive,
    /// Window exceeded. Reported once; the monitor suspends until `resume`.
    Stalled { silent_for: Duration },
}

#[derive(Debug)]
struct HeartbeatState {
    last_alive: Instant,
    phase: MonitorPhase,
}

/// Guarded last-alive timestamp shared by output readers and the watchdog
#[derive(Debug, Clone)]
pub struct HeartbeatMonitor {
    state: Arc<Mutex<HeartbeatState>>,
    timeout: Duration,
}

impl HeartbeatMonitor {
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(HeartbeatState {
                last_alive: Instant::now(),
                phase: MonitorPhase::Idle,
            })),
            timeout,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HeartbeatState> {
        // The state stays consistent even if a holder panicked
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn phase(&self) -> MonitorPhase {
        self.lock().phase
    }

    /// Begin monitoring with a fresh timestamp
    pub fn start(&self) {
        let mut state = self.lock();
        state.last_alive = Instant::now();
        state.phase = MonitorPhase::Monitoring;
    }

    /// Stop monitoring for good
    pub fn stop(&self) {
        self.lock().phase = MonitorPhase::Idle;
    }

    /// Record a heartbeat
    pub fn refresh(&self) {
        self.lock().last_alive = Instant::now();
    }

    /// Re-arm after a stall the caller chose to sit out. Returns false when
    /// monitoring was stopped in the meantime.
    pub fn resume(&self) -> bool {
        let mut state = self.lock();
        if state.phase != MonitorPhase::Suspended {
            return false;
        }
        state.last_alive = Instant::now();
        state.phase = MonitorPhase::Monitoring;
        true
    }

    /// Periodic liveness check
    pub fn check(&self) -> HeartbeatCheck {
        let mut state = self.lock();
        match state.phase {
            MonitorPhase::Idle => HeartbeatCheck::Idle,
            MonitorPhase::Suspended => HeartbeatCheck::Alive,
            MonitorPhase::Monitoring => {
                let silent_for = state.last_alive.elapsed();
                if silent_for < self.timeout {
                    HeartbeatCheck::Alive
                } else {
                    state.phase = MonitorPhase::Suspended;
                    HeartbeatCheck::Stalled { silent_for }
                }
            }
        }
    }
}
