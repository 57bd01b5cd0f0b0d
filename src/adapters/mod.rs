// Adapters - External system implementations

pub mod channel_sink;
pub mod job_file;
pub mod replay_script;
pub mod stall_prompt;
pub mod toml_config;

// Re-export adapters
pub use channel_sink::ChannelSink;
pub use replay_script::ReplayScriptRecorder;
pub use stall_prompt::{FixedStallPolicy, TerminalPrompt};
pub use toml_config::SupervisorConfig;
