//! Path helpers shared by the argument builder, recorder and launchers

use std::path::{Path, PathBuf};

/// Wrap a value in double quotes
pub fn quoted(value: &str) -> String {
    format!("\"{}\"", value)
}

/// Sibling of `output` with its extension swapped for `extension`
pub fn replay_script_path(output: &Path, extension: &str) -> PathBuf {
    output.with_extension(extension.trim_start_matches('.'))
}

/// Make `path` absolute against the current directory without touching the
/// filesystem.
pub fn absolutize(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Directory holding the running executable
pub fn executable_dir() -> std::io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}

/// Resolve a tool path against `base`; absolute paths pass through
pub fn resolve_tool(base: &Path, tool: &str) -> PathBuf {
    let tool = Path::new(tool);
    if tool.is_absolute() {
        tool.to_path_buf()
    } else {
        base.join(tool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_keeps_spaces() {
        assert_eq!(quoted("C:\\My Movies\\a.avi"), "\"C:\\My Movies\\a.avi\"");
    }

    #[test]
    fn test_replay_script_path_swaps_extension() {
        let path = replay_script_path(Path::new("out/movie.usm"), "bat");
        assert_eq!(path, PathBuf::from("out/movie.bat"));

        let path = replay_script_path(Path::new("out/movie"), ".sh");
        assert_eq!(path, PathBuf::from("out/movie.sh"));
    }

    #[test]
    fn test_absolutize_relative() {
        let path = absolutize(Path::new("movie.usm")).unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("movie.usm"));
    }

    #[test]
    fn test_resolve_tool() {
        let base = Path::new("/opt/encoder");
        assert_eq!(resolve_tool(base, "medianoche.exe"), base.join("medianoche.exe"));
        #[cfg(unix)]
        assert_eq!(resolve_tool(base, "/usr/bin/enc"), PathBuf::from("/usr/bin/enc"));
    }
}
