// TOML config adapter - Supervisor configuration from file, environment and defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::adapters::replay_script::DEFAULT_REPLAY_EXTENSION;
use crate::engine::heartbeat::HeartbeatSettings;
use crate::error::{SupervisorError, SupervisorResult};
use crate::utils::path::{executable_dir, resolve_tool};

/// Files tried, in order, when no explicit config path is given
pub const CONFIG_SEARCH_PATHS: [&str; 2] = ["encsup.toml", "config/encsup.toml"];

/// Complete supervisor configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SupervisorConfig {
    pub tools: ToolsConfig,
    pub heartbeat: HeartbeatConfig,
    pub replay: ReplayConfig,
    pub logging: LoggingConfig,
}

/// External executables and assets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    /// Directory tools are resolved against; the executable's own directory when unset
    pub base_dir: Option<PathBuf>,
    pub encoder: String,
    pub player: String,
    pub player_wrapper: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            encoder: "medianoche.exe".to_string(),
            player: "GFxMediaPlayer.exe".to_string(),
            player_wrapper: "VideoPlayer.swf".to_string(),
        }
    }
}

/// Heartbeat timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeartbeatConfig {
    pub timeout_secs: u64,
    pub poll_interval_ms: u64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 12,
            poll_interval_ms: 500,
        }
    }
}

/// Replay script settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplayConfig {
    pub enabled: bool,
    pub extension: String,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            extension: DEFAULT_REPLAY_EXTENSION.to_string(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Fully resolved tool locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub encoder: PathBuf,
    pub player: PathBuf,
    pub player_wrapper: PathBuf,
}

impl SupervisorConfig {
    /// Parse a TOML document
    pub fn from_toml(content: &str) -> SupervisorResult<Self> {
        toml::from_str(content).map_err(|e| SupervisorError::Config {
            message: format!("failed to parse TOML config: {}", e),
        })
    }

    /// The explicit `path`, or the first search path that exists
    pub fn locate(path: Option<&Path>) -> Option<PathBuf> {
        match path {
            Some(path) => Some(path.to_path_buf()),
            None => CONFIG_SEARCH_PATHS
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists()),
        }
    }

    /// Read and parse one config file
    pub fn read(path: &Path) -> SupervisorResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SupervisorError::Config {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml(&content)
    }

    /// Load from `path`, or the first search path that exists, or defaults
    pub fn load(path: Option<&Path>) -> SupervisorResult<Self> {
        match Self::locate(path) {
            Some(candidate) => Self::read(&candidate),
            None => Ok(Self::default()),
        }
    }

    /// Apply `ENCSUP_*` overrides from the process environment
    pub fn apply_env(&mut self) -> SupervisorResult<usize> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `ENCSUP_*` overrides from any variable source, returning how many applied
    pub fn apply_overrides<F>(&mut self, lookup: F) -> SupervisorResult<usize>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut overrides = 0;

        if let Some(value) = lookup("ENCSUP_BASE_DIR") {
            self.tools.base_dir = Some(PathBuf::from(value));
            overrides += 1;
        }
        if let Some(value) = lookup("ENCSUP_ENCODER") {
            self.tools.encoder = value;
            overrides += 1;
        }
        if let Some(value) = lookup("ENCSUP_PLAYER") {
            self.tools.player = value;
            overrides += 1;
        }
        if let Some(value) = lookup("ENCSUP_PLAYER_WRAPPER") {
            self.tools.player_wrapper = value;
            overrides += 1;
        }
        if let Some(value) = lookup("ENCSUP_HEARTBEAT_TIMEOUT_SECS") {
            self.heartbeat.timeout_secs = parse_number("ENCSUP_HEARTBEAT_TIMEOUT_SECS", &value)?;
            overrides += 1;
        }
        if let Some(value) = lookup("ENCSUP_HEARTBEAT_POLL_MS") {
            self.heartbeat.poll_interval_ms = parse_number("ENCSUP_HEARTBEAT_POLL_MS", &value)?;
            overrides += 1;
        }
        if let Some(value) = lookup("ENCSUP_REPLAY_EXTENSION") {
            self.replay.extension = value;
            overrides += 1;
        }
        if let Some(value) = lookup("ENCSUP_LOG_LEVEL") {
            self.logging.level = value;
            overrides += 1;
        }

        Ok(overrides)
    }

    /// Reject values the supervisor cannot run with
    pub fn validate(&self) -> SupervisorResult<()> {
        let invalid = |message: &str| {
            Err(SupervisorError::Config {
                message: message.to_string(),
            })
        };

        if self.tools.encoder.trim().is_empty() {
            return invalid("tools.encoder must not be empty");
        }
        if self.heartbeat.timeout_secs == 0 {
            return invalid("heartbeat.timeout_secs must be greater than zero");
        }
        if self.heartbeat.poll_interval_ms == 0 {
            return invalid("heartbeat.poll_interval_ms must be greater than zero");
        }
        if self.replay.enabled && self.replay.extension.trim_start_matches('.').is_empty() {
            return invalid("replay.extension must not be empty");
        }
        Ok(())
    }

    pub fn heartbeat_settings(&self) -> HeartbeatSettings {
        HeartbeatSettings {
            timeout: Duration::from_secs(self.heartbeat.timeout_secs),
            poll_interval: Duration::from_millis(self.heartbeat.poll_interval_ms),
        }
    }

    /// Resolve tools against `base_dir` or the running executable's directory
    pub fn tool_paths(&self) -> SupervisorResult<ToolPaths> {
        let base = match &self.tools.base_dir {
            Some(dir) => dir.clone(),
            None => executable_dir()?,
        };
        Ok(ToolPaths {
            encoder: resolve_tool(&base, &self.tools.encoder),
            player: resolve_tool(&base, &self.tools.player),
            player_wrapper: resolve_tool(&base, &self.tools.player_wrapper),
        })
    }
}

fn parse_number(key: &str, value: &str) -> SupervisorResult<u64> {
    value.trim().parse().map_err(|_| SupervisorError::Config {
        message: format!("{} must be a whole number, got '{}'", key, value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_encoder_contract() {
        let config = SupervisorConfig::default();
        assert_eq!(config.heartbeat.timeout_secs, 12);
        assert_eq!(config.heartbeat.poll_interval_ms, 500);
        assert_eq!(config.replay.extension, "bat");
        assert!(config.replay.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = SupervisorConfig::from_toml(
            r#"
            [tools]
            base_dir = "/opt/encoder"

            [heartbeat]
            timeout_secs = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.heartbeat.timeout_secs, 30);
        assert_eq!(config.heartbeat.poll_interval_ms, 500);
        assert_eq!(config.tools.encoder, "medianoche.exe");

        let tools = config.tool_paths().unwrap();
        assert_eq!(tools.encoder, Path::new("/opt/encoder").join("medianoche.exe"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = SupervisorConfig::from_toml("[heartbeat]\ntimeout = 3\n").unwrap_err();
        assert!(matches!(err, SupervisorError::Config { .. }));
    }

    #[test]
    fn test_env_overrides_win_over_file() {
        let mut config = SupervisorConfig::from_toml("[tools]\nencoder = \"from-file\"\n").unwrap();
        let env: HashMap<&str, &str> = [
            ("ENCSUP_ENCODER", "from-env"),
            ("ENCSUP_HEARTBEAT_TIMEOUT_SECS", "20"),
        ]
        .into_iter()
        .collect();

        let applied = config
            .apply_overrides(|key| env.get(key).map(|value| value.to_string()))
            .unwrap();
        assert_eq!(applied, 2);
        assert_eq!(config.tools.encoder, "from-env");
        assert_eq!(config.heartbeat_settings().timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_env_sets_player_wrapper_and_poll_interval() {
        let mut config = SupervisorConfig::default();
        let env: HashMap<&str, &str> = [
            ("ENCSUP_PLAYER_WRAPPER", "Wrapper.swf"),
            ("ENCSUP_HEARTBEAT_POLL_MS", "250"),
        ]
        .into_iter()
        .collect();

        let applied = config
            .apply_overrides(|key| env.get(key).map(|value| value.to_string()))
            .unwrap();
        assert_eq!(applied, 2);
        assert_eq!(config.tools.player_wrapper, "Wrapper.swf");
        assert_eq!(config.heartbeat_settings().poll_interval, Duration::from_millis(250));

        let result = config.apply_overrides(|key| {
            (key == "ENCSUP_HEARTBEAT_POLL_MS").then(|| "fast".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_locate_prefers_explicit_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[replay]\nextension = \"cmd\"\n").unwrap();

        assert_eq!(SupervisorConfig::locate(Some(&path)), Some(path.clone()));
        let config = SupervisorConfig::read(&path).unwrap();
        assert_eq!(config.replay.extension, "cmd");
        assert!(SupervisorConfig::read(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_bad_env_number() {
        let mut config = SupervisorConfig::default();
        let result = config.apply_overrides(|key| {
            (key == "ENCSUP_HEARTBEAT_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_zero_poll() {
        let mut config = SupervisorConfig::default();
        config.heartbeat.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }
}
