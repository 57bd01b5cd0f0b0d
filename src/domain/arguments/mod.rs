//! Encoder argument line construction
//!
//! The encoder takes one flat argument line. Every file path is wrapped in
//! double quotes so embedded spaces survive; nothing else is escaped, so a path
//! that itself contains a `"` produces a broken line.

use std::path::Path;

use crate::domain::model::{AudioTrack, EncodeParameters};
use crate::utils::path::quoted;

/// Keeps the encoder from opening its own window
pub const GUI_MODE_FLAG: &str = "-gui_mode";
/// Disables the encoder's preview pane
pub const PREVIEW_OFF_FLAG: &str = "-preview=off";
/// Makes the encoder print heartbeat markers
pub const HEARTBEAT_FLAG: &str = "-heartbeat";

/// Flags that only make sense under supervision
pub const ORCHESTRATION_FLAGS: [&str; 3] = [GUI_MODE_FLAG, PREVIEW_OFF_FLAG, HEARTBEAT_FLAG];

const GOP_FLAGS: &str = "-gop_closed=on -gop_i=1 -gop_p=4 -gop_b=2";

/// Build the encoder argument line for one encode
pub fn build_arguments(params: &EncodeParameters) -> String {
    let mut line = String::with_capacity(256);

    // Fixed prefix
    line.push_str(GUI_MODE_FLAG);
    line.push(' ');
    line.push_str(PREVIEW_OFF_FLAG);
    line.push(' ');
    line.push_str(HEARTBEAT_FLAG);
    line.push(' ');
    line.push_str(GOP_FLAGS);
    line.push_str(&format!(" -video00={}", quoted(&params.input_video)));
    line.push_str(&format!(" -output={}", quoted(&params.output)));
    line.push_str(&format!(" -bitrate={}", params.bitrate_kbps.saturating_mul(1000)));

    // Optional video settings
    if let Some(rate) = params.framerate.filter(|rate| rate.is_usable()) {
        line.push_str(&format!(" -framerate={},{}", rate.numerator, rate.denominator));
    }
    if let Some(hca) = params.hca {
        line.push_str(" -hca=on");
        line.push_str(&format!(" -hca_quality={}", hca.quality));
    }
    if let Some(size) = params.resize {
        line.push_str(&format!(" -scale={},{}", size.width, size.height));
    }
    if params.ps2_target {
        line.push_str(" -ps2=on");
    }
    if params.alpha_channel {
        line.push_str(&format!(" -alpha00={}", quoted(&params.input_video)));
    }

    // Audio slots
    for (slot, track) in params.audio_tracks.iter() {
        match track {
            AudioTrack::MonoOrStereo(path) => {
                line.push_str(&format!(" -audio{:02}={}", slot, quoted(path)));
            }
            AudioTrack::MultiChannel(channels) => {
                for (channel, path) in channels.ordered().iter().enumerate() {
                    line.push_str(&format!(" -mca{:02}_{:02}={}", slot, channel, quoted(path)));
                }
            }
        }
    }

    // Subtitle slots
    for (slot, path) in params.subtitles.iter() {
        if !path.is_empty() {
            line.push_str(&format!(" -subtitle{:02}={}", slot, quoted(path)));
        }
    }

    if let Some(cue_points) = params.cue_points.as_deref().filter(|path| !path.is_empty()) {
        line.push_str(&format!(" -cuepoint={}", quoted(cue_points)));
    }

    line
}

/// Standalone invocation line: quoted executable followed by the argument line
/// with the supervision-only flags removed.
pub fn build_replay_line(executable: &Path, arguments: &str) -> String {
    let kept: Vec<&str> = tokenize(arguments)
        .into_iter()
        .filter(|token| !ORCHESTRATION_FLAGS.contains(token))
        .collect();

    let program = quoted(&executable.display().to_string());
    if kept.is_empty() {
        program
    } else {
        format!("{} {}", program, kept.join(" "))
    }
}

/// Split an argument line on whitespace outside double quotes. Tokens keep
/// their quotes.
pub fn tokenize(line: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    let mut in_quotes = false;

    for (index, ch) in line.char_indices() {
        if ch == '"' {
            in_quotes = !in_quotes;
            start.get_or_insert(index);
        } else if ch.is_whitespace() && !in_quotes {
            if let Some(begin) = start.take() {
                tokens.push(&line[begin..index]);
            }
        } else {
            start.get_or_insert(index);
        }
    }
    if let Some(begin) = start {
        tokens.push(&line[begin..]);
    }

    tokens
}

/// Argument vector the way a Windows C runtime would see the line
pub fn split_argument_line(line: &str) -> Vec<String> {
    tokenize(line)
        .into_iter()
        .map(|token| token.replace('"', ""))
        .collect()
}

#[cfg(test)]
mod tests;
