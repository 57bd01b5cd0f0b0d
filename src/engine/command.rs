//! Process command construction from a flattened argument line

use std::path::Path;

use tokio::process::Command;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Command for `program` carrying `line` as its arguments.
///
/// Windows receives the line untouched; elsewhere it is split the way the
/// Windows C runtime would split it.
pub fn command_with_line(program: &Path, line: &str) -> Command {
    let mut command = Command::new(program);

    #[cfg(windows)]
    {
        command.raw_arg(line);
        command.creation_flags(CREATE_NO_WINDOW);
    }
    #[cfg(not(windows))]
    {
        command.args(crate::domain::arguments::split_argument_line(line));
    }

    command
}
