// Stall prompt adapter - Decides what happens when the encoder goes quiet

use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::warn;

use crate::domain::model::StallDecision;
use crate::ports::StallHandler;

/// Question shown when the encoder stops sending heartbeats
pub const STALL_QUESTION: &str = "The encoder does not seem to be responding. Cancel encoding?";

/// Always answers the same way
#[derive(Debug, Clone, Copy)]
pub struct FixedStallPolicy(pub StallDecision);

#[async_trait]
impl StallHandler for FixedStallPolicy {
    async fn on_stall(&self, _silent_for: Duration) -> StallDecision {
        self.0
    }
}

/// Asks the user a yes/no question on the terminal
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt;

/// Interpret a yes/no answer; anything but yes keeps waiting
pub fn parse_answer(answer: &str) -> StallDecision {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => StallDecision::Cancel,
        _ => StallDecision::KeepWaiting,
    }
}

fn ask(silent_for: Duration) -> io::Result<String> {
    let mut stderr = io::stderr().lock();
    write!(
        stderr,
        "{} (silent for {}s) [y/N] ",
        STALL_QUESTION,
        silent_for.as_secs()
    )?;
    stderr.flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer)
}

/// Ask on a detached thread; an unanswered prompt must not hold the runtime
/// open at shutdown.
fn ask_detached(silent_for: Duration) -> io::Result<oneshot::Receiver<io::Result<String>>> {
    let (tx, rx) = oneshot::channel();
    thread::Builder::new()
        .name("stall-prompt".to_string())
        .spawn(move || {
            // Receiver gone means the session ended first
            let _ = tx.send(ask(silent_for));
        })?;
    Ok(rx)
}

#[async_trait]
impl StallHandler for TerminalPrompt {
    async fn on_stall(&self, silent_for: Duration) -> StallDecision {
        let answer = match ask_detached(silent_for) {
            Ok(rx) => rx,
            Err(err) => {
                warn!(error = %err, "could not start stall prompt, keeping the encode running");
                return StallDecision::KeepWaiting;
            }
        };

        match answer.await {
            Ok(Ok(answer)) => parse_answer(&answer),
            Ok(Err(err)) => {
                warn!(error = %err, "could not read stall answer, keeping the encode running");
                StallDecision::KeepWaiting
            }
            Err(_) => {
                warn!("stall prompt thread ended without an answer");
                StallDecision::KeepWaiting
            }
        }
    }
}
