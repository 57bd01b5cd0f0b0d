// Replay script adapter - Writes a standalone re-encode script next to the output

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::arguments::build_replay_line;
use crate::error::{SupervisorError, SupervisorResult};
use crate::ports::InvocationRecorder;
use crate::utils::path::{absolutize, replay_script_path};

/// Default replay script extension
pub const DEFAULT_REPLAY_EXTENSION: &str = "bat";

#[cfg(windows)]
const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
const LINE_ENDING: &str = "\n";

/// Filesystem-backed invocation recorder
pub struct ReplayScriptRecorder {
    extension: String,
}

impl ReplayScriptRecorder {
    /// Create a recorder writing `<output stem>.<extension>`
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    /// Where the script for `output` goes
    pub fn script_path(&self, output: &Path) -> PathBuf {
        replay_script_path(output, &self.extension)
    }
}

impl Default for ReplayScriptRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_REPLAY_EXTENSION)
    }
}

#[async_trait]
impl InvocationRecorder for ReplayScriptRecorder {
    async fn record(
        &self,
        output: &Path,
        executable: &Path,
        arguments: &str,
    ) -> SupervisorResult<PathBuf> {
        let path = self.script_path(output);
        let record_error = |source| SupervisorError::Record {
            path: path.clone(),
            source,
        };

        let executable = absolutize(executable).map_err(record_error)?;
        let mut contents = build_replay_line(&executable, arguments);
        contents.push_str(LINE_ENDING);

        debug!(path = %path.display(), "writing replay script");
        tokio::fs::write(&path, contents)
            .await
            .map_err(record_error)?;

        Ok(path)
    }
}
