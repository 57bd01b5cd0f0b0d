//! Logging setup and console formatting

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::{SupervisorError, SupervisorResult};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable text format
    Pretty,
    /// JSON format for structured logging
    Json,
}

impl LogFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Logging system manager
///
/// Logs always go to stderr so that stdout stays free for event output.
#[derive(Debug, Clone)]
pub struct LoggingSystem {
    level: String,
    format: LogFormat,
}

impl LoggingSystem {
    pub fn new(level: impl Into<String>, format: LogFormat) -> Self {
        Self {
            level: level.into(),
            format,
        }
    }

    /// Filter built from `RUST_LOG` when set, otherwise from the configured level
    pub fn filter(&self) -> SupervisorResult<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.level).map_err(|e| SupervisorError::Config {
                message: format!("invalid log level '{}': {}", self.level, e),
            }),
        }
    }

    /// Install the global subscriber
    pub fn initialize(&self) -> SupervisorResult<()> {
        let filter = self.filter()?;
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false);

        let installed = match self.format {
            LogFormat::Pretty => builder.try_init(),
            LogFormat::Json => builder.json().try_init(),
        };
        installed.map_err(|e| SupervisorError::Config {
            message: format!("failed to install log subscriber: {}", e),
        })?;

        tracing::debug!(
            "Logging system initialized with level: {}, format: {:?}",
            self.level,
            self.format
        );
        Ok(())
    }

    /// Log system information
    pub fn log_system_info(&self) {
        tracing::info!("=== Encode Supervisor ===");
        tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));

        #[cfg(target_os = "macos")]
        tracing::info!("Platform: macOS");
        #[cfg(target_os = "linux")]
        tracing::info!("Platform: Linux");
        #[cfg(target_os = "windows")]
        tracing::info!("Platform: Windows");
    }
}

/// Render a percentage as a fixed-width text bar
pub fn progress_bar(percent: u8) -> String {
    const BAR_LENGTH: usize = 20;
    let filled = usize::from(percent.min(100)) * BAR_LENGTH / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(BAR_LENGTH - filled),
        percent
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0), "[--------------------]   0%");
        assert_eq!(progress_bar(50), "[##########----------]  50%");
        assert_eq!(progress_bar(100), "[####################] 100%");
    }

    #[test]
    fn test_format_from_flag() {
        assert_eq!(LogFormat::from_json_flag(true), LogFormat::Json);
        assert_eq!(LogFormat::from_json_flag(false), LogFormat::Pretty);
    }

    #[test]
    fn test_invalid_level_is_config_error() {
        let system = LoggingSystem::new("encode_supervisor=loudest", LogFormat::Pretty);
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(matches!(system.filter(), Err(SupervisorError::Config { .. })));
        }
    }
}
