use std::sync::Arc;

use crate::adapters::toml_config::ToolPaths;
use crate::adapters::{ChannelSink, ReplayScriptRecorder, SupervisorConfig};
use crate::app::encode_interactor::EncodeInteractor;
use crate::engine::preview::Previewer;
use crate::engine::supervisor::{ProcessSupervisor, SupervisorSettings};
use crate::error::SupervisorResult;
use crate::ports::{EventSink, InvocationRecorder, StallHandler};

/// Wires configuration into supervisors and interactors
pub struct AppContainer {
    config: SupervisorConfig,
    tools: ToolPaths,
}

impl AppContainer {
    /// Validate `config` and resolve tool locations
    pub fn new(config: SupervisorConfig) -> SupervisorResult<Self> {
        config.validate()?;
        let tools = config.tool_paths()?;
        Ok(Self { config, tools })
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolPaths {
        &self.tools
    }

    pub fn previewer(&self) -> Previewer {
        Previewer::new(self.tools.player.clone(), self.tools.player_wrapper.clone())
    }

    pub fn supervisor_settings(&self) -> SupervisorSettings {
        SupervisorSettings {
            encoder: self.tools.encoder.clone(),
            heartbeat: self.config.heartbeat_settings(),
            record_replay: self.config.replay.enabled,
            previewer: Some(self.previewer()),
        }
    }

    pub fn recorder(&self) -> ReplayScriptRecorder {
        ReplayScriptRecorder::new(self.config.replay.extension.clone())
    }

    /// Interactor whose events arrive on its own channel
    pub fn encode_interactor(&self, stall_handler: Arc<dyn StallHandler>) -> EncodeInteractor {
        let (sink, events) = ChannelSink::new();
        let supervisor = ProcessSupervisor::new(
            self.supervisor_settings(),
            Arc::new(sink) as Arc<dyn EventSink>,
            stall_handler,
            Arc::new(self.recorder()) as Arc<dyn InvocationRecorder>,
        );
        EncodeInteractor::new(supervisor, events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::FixedStallPolicy;
    use crate::domain::model::StallDecision;
    use std::path::Path;
    use std::time::Duration;

    fn config(base: &Path) -> SupervisorConfig {
        let mut config = SupervisorConfig::default();
        config.tools.base_dir = Some(base.to_path_buf());
        config.heartbeat.timeout_secs = 3;
        config
    }

    #[test]
    fn test_settings_follow_config() {
        let container = AppContainer::new(config(Path::new("/opt/tools"))).unwrap();
        let settings = container.supervisor_settings();

        assert_eq!(settings.encoder, Path::new("/opt/tools").join("medianoche.exe"));
        assert_eq!(settings.heartbeat.timeout, Duration::from_secs(3));
        assert!(settings.record_replay);
        assert!(settings.previewer.is_some());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = config(Path::new("/opt/tools"));
        config.heartbeat.timeout_secs = 0;
        assert!(AppContainer::new(config).is_err());
    }

    #[tokio::test]
    async fn test_interactor_starts_idle() {
        let container = AppContainer::new(config(Path::new("/opt/tools"))).unwrap();
        let interactor = container.encode_interactor(Arc::new(FixedStallPolicy(StallDecision::KeepWaiting)));
        assert_eq!(interactor.supervisor().active_session(), None);
    }
}
