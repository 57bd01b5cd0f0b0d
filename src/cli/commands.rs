//! Command implementations

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::adapters::job_file::load_job;
use crate::adapters::{FixedStallPolicy, SupervisorConfig, TerminalPrompt};
use crate::app::{AppContainer, SessionReport};
use crate::cli::args::{ArgsArgs, EncodeArgs, ParameterArgs, PreviewArgs, StallAction};
use crate::cli::Cli;
use crate::domain::arguments::{build_arguments, build_replay_line};
use crate::domain::model::{EncodeEvent, OutputStream, StallDecision};
use crate::domain::protocol::clamp_percent;
use crate::ports::StallHandler;
use crate::utils::logging::progress_bar;
use crate::utils::path::absolutize;

/// Resolved configuration and where it came from
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: SupervisorConfig,
    pub source: Option<PathBuf>,
    pub env_overrides: usize,
}

impl LoadedConfig {
    /// Report the configuration origin; call once logging is initialized
    pub fn log_summary(&self) {
        match &self.source {
            Some(path) => info!("Loaded configuration from: {}", path.display()),
            None => info!("No configuration file found, using defaults"),
        }
        if self.env_overrides > 0 {
            info!("Applied {} environment variable overrides", self.env_overrides);
        }
    }
}

/// Resolve configuration: file, then `ENCSUP_*` environment, then CLI flags
pub fn load_config(cli: &Cli) -> Result<LoadedConfig> {
    let source = SupervisorConfig::locate(cli.config.as_deref());
    let mut config = match &source {
        Some(path) => SupervisorConfig::read(path).context("Failed to load configuration")?,
        None => SupervisorConfig::default(),
    };
    let env_overrides = config
        .apply_env()
        .context("Invalid environment override")?;

    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if cli.json_logs {
        config.logging.json = true;
    }
    Ok(LoadedConfig {
        config,
        source,
        env_overrides,
    })
}

fn stall_handler(action: StallAction) -> Arc<dyn StallHandler> {
    match action {
        StallAction::Prompt => Arc::new(TerminalPrompt),
        StallAction::Cancel => Arc::new(FixedStallPolicy(StallDecision::Cancel)),
        StallAction::Wait => Arc::new(FixedStallPolicy(StallDecision::KeepWaiting)),
    }
}

fn job_path(params: &ParameterArgs) -> Result<&Path> {
    params
        .job
        .as_deref()
        .context("Either --job or --input/--output/--bitrate is required")
}

/// Execute the encode command
pub async fn encode(container: &AppContainer, args: EncodeArgs) -> Result<SessionReport> {
    let interactor = container
        .encode_interactor(stall_handler(args.on_stall))
        .with_interrupt_cancel();
    let params = match args.params.to_parameters()? {
        Some(params) => params,
        None => {
            let job = job_path(&args.params)?;
            interactor
                .load(job)
                .await
                .with_context(|| format!("Failed to load job file {}", job.display()))?
        }
    };
    info!("Input: {}", params.input_video);
    info!("Output: {}", params.output);
    info!("Bitrate: {} kbps", params.bitrate_kbps);

    let printer = EventPrinter::new(args.json);
    let report = interactor
        .run(&params, |event| printer.print(event))
        .await
        .context("Encode failed to start")?;

    printer.print_report(&report)?;
    Ok(report)
}

/// Execute the preview command
pub fn preview(container: &AppContainer, args: PreviewArgs) -> Result<()> {
    info!("Previewing: {}", args.file);
    let pid = container
        .encode_interactor(Arc::new(FixedStallPolicy(StallDecision::KeepWaiting)))
        .preview(&args.file, args.extended)
        .with_context(|| format!("Failed to preview {}", args.file))?;

    match pid {
        Some(pid) => println!("Player started (pid {})", pid),
        None => println!("Player started"),
    }
    Ok(())
}

/// Execute the args command
pub async fn args(container: &AppContainer, args: ArgsArgs) -> Result<()> {
    let params = match args.params.to_parameters()? {
        Some(params) => params,
        None => {
            let job = job_path(&args.params)?;
            load_job(job)
                .await
                .with_context(|| format!("Failed to load job file {}", job.display()))?
        }
    };
    let arguments = build_arguments(&params);

    if args.replay {
        let encoder = absolutize(&container.tools().encoder)
            .context("Cannot resolve the encoder path")?;
        println!("{}", build_replay_line(&encoder, &arguments));
    } else {
        println!("{}", arguments);
    }
    Ok(())
}

/// Renders session events on the console
pub struct EventPrinter {
    json: bool,
}

impl EventPrinter {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn print(&self, event: &EncodeEvent) {
        if self.json {
            match serde_json::to_string(event) {
                Ok(line) => println!("{}", line),
                Err(err) => tracing::warn!(error = %err, "cannot serialize event"),
            }
            return;
        }

        if let Some(line) = Self::render(event) {
            match event {
                EncodeEvent::Output {
                    stream: OutputStream::Stderr,
                    ..
                } => eprintln!("{}", line),
                _ => println!("{}", line),
            }
        }
    }

    /// Text form of an event; `None` for events with nothing to show
    pub fn render(event: &EncodeEvent) -> Option<String> {
        match event {
            EncodeEvent::Started { pid: Some(pid), .. } => Some(format!("Encoder started (pid {})", pid)),
            EncodeEvent::Started { pid: None, .. } => Some("Encoder started".to_string()),
            EncodeEvent::Progress { percent } => Some(progress_bar(clamp_percent(*percent))),
            EncodeEvent::Output { line, .. } => Some(line.clone()),
            EncodeEvent::Stalled { silent_for_ms } => Some(format!(
                "Encoder silent for {:.1}s",
                *silent_for_ms as f64 / 1000.0
            )),
            EncodeEvent::Notice { severity, message } => Some(format!("{:?}: {}", severity, message)),
            EncodeEvent::Exited { .. } => None,
        }
    }

    pub fn print_report(&self, report: &SessionReport) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        if self.json {
            let line = serde_json::to_string(report).context("Cannot serialize session report")?;
            writeln!(stdout, "{}", line)?;
            return Ok(());
        }

        let reason = report
            .reason
            .map_or_else(|| "unknown".to_string(), |reason| reason.to_string());
        writeln!(stdout, "Encode {} at {}%", reason, report.last_progress)?;
        if let Some(script) = &report.replay_script {
            writeln!(stdout, "Replay script: {}", script.display())?;
        }
        if report.stalls > 0 {
            writeln!(stdout, "Stalls: {}", report.stalls)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ExitReason, Severity};

    #[test]
    fn test_render_events() {
        assert_eq!(
            EventPrinter::render(&EncodeEvent::Progress { percent: 250 }).as_deref(),
            Some("[####################] 100%")
        );
        assert_eq!(
            EventPrinter::render(&EncodeEvent::Stalled { silent_for_ms: 12_500 }).as_deref(),
            Some("Encoder silent for 12.5s")
        );
        assert_eq!(
            EventPrinter::render(&EncodeEvent::Notice {
                severity: Severity::Warning,
                message: "x".to_string()
            })
            .as_deref(),
            Some("Warning: x")
        );
        assert_eq!(
            EventPrinter::render(&EncodeEvent::Exited {
                reason: ExitReason::Completed
            }),
            None
        );
    }
}
