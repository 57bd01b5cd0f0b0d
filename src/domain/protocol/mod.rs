// Encoder line protocol - progress, heartbeat or free text

use crate::domain::model::ClassifiedLine;

/// Line the encoder prints to prove it is alive
pub const HEARTBEAT_MARKER: &str = ".";

/// Classify one raw output line.
///
/// Returns `None` for empty lines, which are never forwarded. Progress values
/// are not clamped; display code is expected to do that.
pub fn classify(line: &str) -> Option<ClassifiedLine> {
    if line.is_empty() {
        return None;
    }

    let trimmed = line.trim();
    if let Ok(percent) = trimmed.parse::<i32>() {
        return Some(ClassifiedLine::Progress(percent));
    }
    if trimmed == HEARTBEAT_MARKER {
        return Some(ClassifiedLine::Heartbeat);
    }

    Some(ClassifiedLine::PassThrough(line.to_string()))
}

/// Clamp a raw progress value into 0..=100 for display
pub fn clamp_percent(percent: i32) -> u8 {
    percent.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_lines() {
        assert_eq!(classify("42"), Some(ClassifiedLine::Progress(42)));
        assert_eq!(classify("  7 "), Some(ClassifiedLine::Progress(7)));
        assert_eq!(classify("0"), Some(ClassifiedLine::Progress(0)));
    }

    #[test]
    fn test_progress_is_not_clamped() {
        assert_eq!(classify("-5"), Some(ClassifiedLine::Progress(-5)));
        assert_eq!(classify("250"), Some(ClassifiedLine::Progress(250)));
    }

    #[test]
    fn test_heartbeat_lines() {
        assert_eq!(classify("."), Some(ClassifiedLine::Heartbeat));
        assert_eq!(classify("   .   "), Some(ClassifiedLine::Heartbeat));
        assert_eq!(classify(".\r"), Some(ClassifiedLine::Heartbeat));
    }

    #[test]
    fn test_pass_through_is_verbatim() {
        assert_eq!(
            classify("encoding frame 10"),
            Some(ClassifiedLine::PassThrough("encoding frame 10".to_string()))
        );
        assert_eq!(
            classify("  ..  "),
            Some(ClassifiedLine::PassThrough("  ..  ".to_string()))
        );
        assert_eq!(
            classify("12.5"),
            Some(ClassifiedLine::PassThrough("12.5".to_string()))
        );
    }

    #[test]
    fn test_empty_line_is_dropped() {
        assert_eq!(classify(""), None);
    }

    #[test]
    fn test_clamp_percent() {
        assert_eq!(clamp_percent(-3), 0);
        assert_eq!(clamp_percent(55), 55);
        assert_eq!(clamp_percent(1000), 100);
    }
}
