//! Command-line argument definitions

use std::path::PathBuf;

use clap::{Args, ValueEnum};

use crate::domain::model::{
    AudioTrack, EncodeParameters, Framerate, HcaSettings, Resize, SurroundChannels,
};
use crate::error::{SupervisorError, SupervisorResult};

/// Encode parameters given on the command line
#[derive(Args, Debug, Clone, Default)]
pub struct ParameterArgs {
    /// Input video file path
    #[arg(short, long, required_unless_present = "job")]
    pub input: Option<String>,

    /// Output file path
    #[arg(short, long, required_unless_present = "job")]
    pub output: Option<String>,

    /// Target bitrate in kbps
    #[arg(short, long, required_unless_present = "job")]
    pub bitrate: Option<u64>,

    /// Explicit framerate as N/D or a decimal rate (default: keep the input's framerate)
    #[arg(long, value_parser = parse_framerate)]
    pub framerate: Option<Framerate>,

    /// Resize to WIDTHxHEIGHT
    #[arg(long, value_parser = parse_resize)]
    pub scale: Option<Resize>,

    /// Encode audio with HCA at this quality
    #[arg(long)]
    pub hca_quality: Option<u8>,

    /// Target PS2 playback
    #[arg(long)]
    pub ps2: bool,

    /// Encode the input's alpha channel
    #[arg(long)]
    pub alpha: bool,

    /// Mono or stereo audio file, one slot per flag
    #[arg(long = "audio", value_name = "PATH")]
    pub audio: Vec<String>,

    /// 5.1 audio as L,R,LS,RS,C,LFE files, placed after the --audio slots
    #[arg(long = "mca", value_name = "L,R,LS,RS,C,LFE", value_parser = parse_surround)]
    pub multichannel: Vec<SurroundChannels>,

    /// Subtitle file, one slot per flag
    #[arg(long = "subtitle", value_name = "PATH")]
    pub subtitles: Vec<String>,

    /// Cue point file
    #[arg(long)]
    pub cuepoint: Option<String>,

    /// Read parameters from a TOML job file instead
    #[arg(long, conflicts_with_all = ["input", "output", "bitrate"])]
    pub job: Option<PathBuf>,
}

impl ParameterArgs {
    /// Build parameters from flags. `None` when a job file was given instead.
    pub fn to_parameters(&self) -> SupervisorResult<Option<EncodeParameters>> {
        if self.job.is_some() {
            return Ok(None);
        }

        let missing = |flag: &str| SupervisorError::InvalidJob {
            message: format!("--{} is required without --job", flag),
        };
        let input = self.input.clone().ok_or_else(|| missing("input"))?;
        let output = self.output.clone().ok_or_else(|| missing("output"))?;
        let bitrate = self.bitrate.ok_or_else(|| missing("bitrate"))?;

        let mut params = EncodeParameters::new(input, output, bitrate);
        params.framerate = self.framerate;
        params.resize = self.scale;
        params.hca = self.hca_quality.map(|quality| HcaSettings { quality });
        params.ps2_target = self.ps2;
        params.alpha_channel = self.alpha;
        params.cue_points = self.cuepoint.clone();

        let tracks = self
            .audio
            .iter()
            .cloned()
            .map(AudioTrack::MonoOrStereo)
            .chain(self.multichannel.iter().cloned().map(AudioTrack::MultiChannel));
        for (slot, track) in tracks.enumerate() {
            params.audio_tracks.set(slot, track)?;
        }
        for (slot, path) in self.subtitles.iter().enumerate() {
            params.subtitles.set(slot, path.clone())?;
        }

        Ok(Some(params))
    }
}

fn parse_framerate(value: &str) -> Result<Framerate, String> {
    Framerate::parse(value).map_err(|e| e.to_string())
}

fn parse_resize(value: &str) -> Result<Resize, String> {
    Resize::parse(value).map_err(|e| e.to_string())
}

fn parse_surround(value: &str) -> Result<SurroundChannels, String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [left, right, left_surround, right_surround, center, lfe] => Ok(SurroundChannels {
            left: left.to_string(),
            right: right.to_string(),
            left_surround: left_surround.to_string(),
            right_surround: right_surround.to_string(),
            center: center.to_string(),
            lfe: lfe.to_string(),
        }),
        _ => Err(format!(
            "expected six comma-separated channel files, got {}",
            parts.len()
        )),
    }
}

/// What to do when the encoder stops sending heartbeats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallAction {
    /// Ask on the terminal
    Prompt,
    /// Cancel the encode
    Cancel,
    /// Keep waiting
    Wait,
}

/// Arguments for the encode command
#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub params: ParameterArgs,

    /// Stall handling
    #[arg(long, value_enum, default_value = "prompt")]
    pub on_stall: StallAction,

    /// Print events and the final report as JSON lines
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the preview command
#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Encoded file to play
    #[arg(short, long)]
    pub file: String,

    /// Play through the extended player wrapper
    #[arg(long)]
    pub extended: bool,
}

/// Arguments for the args command
#[derive(Args, Debug)]
pub struct ArgsArgs {
    #[command(flatten)]
    pub params: ParameterArgs,

    /// Print the replay script line instead
    #[arg(long)]
    pub replay: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ParameterArgs {
        ParameterArgs {
            input: Some("in.avi".to_string()),
            output: Some("out.usm".to_string()),
            bitrate: Some(2000),
            ..ParameterArgs::default()
        }
    }

    #[test]
    fn test_audio_slots_follow_flag_order() {
        let mut args = base();
        args.audio = vec!["en.wav".to_string(), "fr.wav".to_string()];
        args.multichannel = vec![parse_surround("L,R,LS,RS,C,LFE").unwrap()];

        let params = args.to_parameters().unwrap().unwrap();
        assert_eq!(
            params.audio_tracks.get(1),
            Some(&AudioTrack::MonoOrStereo("fr.wav".to_string()))
        );
        assert!(matches!(params.audio_tracks.get(2), Some(AudioTrack::MultiChannel(_))));
    }

    #[test]
    fn test_job_wins() {
        let args = ParameterArgs {
            job: Some(PathBuf::from("job.toml")),
            ..ParameterArgs::default()
        };
        assert_eq!(args.to_parameters().unwrap(), None);
    }

    #[test]
    fn test_too_many_subtitles() {
        let mut args = base();
        args.subtitles = (0..33).map(|i| format!("s{}.txt", i)).collect();
        assert!(matches!(
            args.to_parameters(),
            Err(SupervisorError::SlotOutOfRange { index: 32, .. })
        ));
    }

    #[test]
    fn test_parse_surround_needs_six() {
        assert!(parse_surround("L,R").is_err());
        assert_eq!(parse_surround("a, b,c,d,e,f").unwrap().right, "b");
    }
}
