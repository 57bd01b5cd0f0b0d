// Domain models - Encode parameters, protocol lines and session events

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SupervisorError, SupervisorResult};

/// Number of audio and subtitle slots the encoder understands
pub const TRACK_SLOT_COUNT: usize = 32;

/// Fixed-length ordered sequence of optional track entries, indexed 0..32
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSlots<T> {
    slots: Vec<Option<T>>,
}

impl<T> TrackSlots<T> {
    /// Create a sequence with every slot empty
    pub fn new() -> Self {
        Self {
            slots: (0..TRACK_SLOT_COUNT).map(|_| None).collect(),
        }
    }

    fn check_index(index: usize) -> SupervisorResult<()> {
        if index >= TRACK_SLOT_COUNT {
            return Err(SupervisorError::SlotOutOfRange {
                index,
                capacity: TRACK_SLOT_COUNT,
            });
        }
        Ok(())
    }

    /// Place a track into a slot, replacing whatever was there
    pub fn set(&mut self, index: usize, track: T) -> SupervisorResult<()> {
        Self::check_index(index)?;
        self.slots[index] = Some(track);
        Ok(())
    }

    /// Empty a slot, returning its previous content
    pub fn clear(&mut self, index: usize) -> SupervisorResult<Option<T>> {
        Self::check_index(index)?;
        Ok(self.slots[index].take())
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Occupied slots in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|track| (index, track)))
    }

    /// First empty slot, if any
    pub fn first_free(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.occupied() == 0
    }
}

impl<T> Default for TrackSlots<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Six discrete channel files of a 5.1 track, in encoder channel order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurroundChannels {
    pub left: String,
    pub right: String,
    pub left_surround: String,
    pub right_surround: String,
    pub center: String,
    pub lfe: String,
}

impl SurroundChannels {
    /// Channel files in the order `mcaNN_00..05` expects
    pub fn ordered(&self) -> [&str; 6] {
        [
            &self.left,
            &self.right,
            &self.left_surround,
            &self.right_surround,
            &self.center,
            &self.lfe,
        ]
    }
}

/// One audio slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioTrack {
    /// A single mono or stereo file
    MonoOrStereo(String),
    /// Six separate channel files
    MultiChannel(SurroundChannels),
}

/// Explicit output framerate as base over scale; either may be fractional
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Framerate {
    pub numerator: f64,
    pub denominator: f64,
}

impl Framerate {
    pub fn new(numerator: f64, denominator: f64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Parse `N/D`, `N,D` or a bare rate such as `29.97`
    pub fn parse(text: &str) -> SupervisorResult<Self> {
        let invalid = || SupervisorError::InvalidJob {
            message: format!("invalid framerate '{}', expected N/D", text),
        };
        let component = |value: &str| -> SupervisorResult<f64> {
            let value: f64 = value.trim().parse().map_err(|_| invalid())?;
            if value.is_finite() && value >= 0.0 {
                Ok(value)
            } else {
                Err(invalid())
            }
        };

        let trimmed = text.trim();
        let (num, den) = match trimmed.split_once(['/', ',']) {
            Some((num, den)) => (num, den),
            None => (trimmed, "1"),
        };
        Ok(Self::new(component(num)?, component(den)?))
    }

    /// Both components non-zero
    pub fn is_usable(&self) -> bool {
        self.numerator != 0.0 && self.denominator != 0.0
    }
}

/// Resize target in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resize {
    pub width: u32,
    pub height: u32,
}

impl Resize {
    /// Parse `WxH`
    pub fn parse(text: &str) -> SupervisorResult<Self> {
        let invalid = || SupervisorError::InvalidJob {
            message: format!("invalid size '{}', expected WIDTHxHEIGHT", text),
        };
        let (w, h) = text
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(invalid)?;
        Ok(Self {
            width: w.trim().parse().map_err(|_| invalid())?,
            height: h.trim().parse().map_err(|_| invalid())?,
        })
    }
}

/// HCA audio codec settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HcaSettings {
    pub quality: u8,
}

/// Everything the encoder needs to know about one encode
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeParameters {
    pub input_video: String,
    pub output: String,
    /// Target bitrate in kbps
    pub bitrate_kbps: u64,
    /// `None` keeps the input's native framerate
    pub framerate: Option<Framerate>,
    pub resize: Option<Resize>,
    pub hca: Option<HcaSettings>,
    pub alpha_channel: bool,
    pub ps2_target: bool,
    pub audio_tracks: TrackSlots<AudioTrack>,
    pub subtitles: TrackSlots<String>,
    pub cue_points: Option<String>,
}

impl EncodeParameters {
    /// Create parameters with only the mandatory fields set
    pub fn new(input_video: impl Into<String>, output: impl Into<String>, bitrate_kbps: u64) -> Self {
        Self {
            input_video: input_video.into(),
            output: output.into(),
            bitrate_kbps,
            framerate: None,
            resize: None,
            hca: None,
            alpha_channel: false,
            ps2_target: false,
            audio_tracks: TrackSlots::new(),
            subtitles: TrackSlots::new(),
            cue_points: None,
        }
    }
}

/// Result of classifying one encoder output line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedLine {
    /// Percent complete, unclamped
    Progress(i32),
    /// Liveness marker
    Heartbeat,
    /// Anything else, verbatim
    PassThrough(String),
}

/// Which encoder pipe a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputStream::Stdout => write!(f, "stdout"),
            OutputStream::Stderr => write!(f, "stderr"),
        }
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Exit status zero
    Completed,
    /// Non-zero exit; `None` when the process died from a signal
    Failed(Option<i32>),
    /// Ended after `cancel`
    Cancelled,
}

impl ExitReason {
    pub fn is_success(&self) -> bool {
        matches!(self, ExitReason::Completed)
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Completed => write!(f, "completed"),
            ExitReason::Failed(Some(code)) => write!(f, "failed with exit code {}", code),
            ExitReason::Failed(None) => write!(f, "failed without an exit code"),
            ExitReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Hard error vs warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// Everything a caller can observe about a session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EncodeEvent {
    /// Process launched
    Started {
        session: u64,
        pid: Option<u32>,
        arguments: String,
    },
    /// Progress line or forced completion
    Progress { percent: i32 },
    /// Free-form output line
    Output { stream: OutputStream, line: String },
    /// No heartbeat within the timeout window
    Stalled { silent_for_ms: u64 },
    /// Non-fatal problem worth showing the user
    Notice { severity: Severity, message: String },
    /// Process gone, handles released
    Exited { reason: ExitReason },
}

impl EncodeEvent {
    pub fn stalled(silent_for: Duration) -> Self {
        EncodeEvent::Stalled {
            silent_for_ms: u64::try_from(silent_for.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Caller's answer when the encoder goes quiet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallDecision {
    /// Kill the encoder
    Cancel,
    /// Re-arm the heartbeat window and keep going
    KeepWaiting,
}
