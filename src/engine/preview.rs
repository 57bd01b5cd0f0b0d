//! Video player launcher for previewing encoded files

use std::path::PathBuf;
use std::process::Stdio;

use tracing::info;

use crate::engine::command::command_with_line;
use crate::error::{SupervisorError, SupervisorResult};
use crate::utils::path::{absolutize, quoted};

/// Launches the player, optionally through the extended player wrapper
#[derive(Debug, Clone)]
pub struct Previewer {
    player: PathBuf,
    wrapper: PathBuf,
}

impl Previewer {
    /// Create a previewer for `player`, with `wrapper` as the extended asset
    pub fn new(player: impl Into<PathBuf>, wrapper: impl Into<PathBuf>) -> Self {
        Self {
            player: player.into(),
            wrapper: wrapper.into(),
        }
    }

    pub fn player(&self) -> &PathBuf {
        &self.player
    }

    /// Player argument line for `file`. Fails before anything is launched when
    /// the extended wrapper is requested but not installed.
    pub fn preview_arguments(&self, file: &str, extended: bool) -> SupervisorResult<String> {
        if !extended {
            return Ok(quoted(file));
        }

        if !self.wrapper.exists() {
            return Err(SupervisorError::MissingAsset {
                path: self.wrapper.clone(),
            });
        }
        let wrapper = absolutize(&self.wrapper)?;
        Ok(format!(
            "{} -arg {}",
            quoted(&wrapper.display().to_string()),
            quoted(file)
        ))
    }

    /// Start the player detached. Returns its pid when the OS reports one.
    pub fn preview(&self, file: &str, extended: bool) -> SupervisorResult<Option<u32>> {
        let arguments = self.preview_arguments(file, extended)?;
        let player = absolutize(&self.player)?;

        let mut command = command_with_line(&player, &arguments);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let child = command
            .spawn()
            .map_err(|source| SupervisorError::PreviewLaunch {
                path: player.clone(),
                source,
            })?;

        let pid = child.id();
        info!(pid = ?pid, file, extended, "previewer started");
        Ok(pid)
    }
}
