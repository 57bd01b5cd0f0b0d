// Job file adapter - Loads encode parameters from a TOML job description

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::domain::model::{
    AudioTrack, EncodeParameters, Framerate, HcaSettings, Resize, SurroundChannels,
};
use crate::error::{SupervisorError, SupervisorResult};

/// On-disk shape of an encode job
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncodeJob {
    pub input: String,
    pub output: String,
    /// kbps
    pub bitrate: u64,
    #[serde(default)]
    pub framerate: Option<Framerate>,
    #[serde(default)]
    pub resize: Option<Resize>,
    #[serde(default)]
    pub hca: Option<HcaSettings>,
    #[serde(default)]
    pub alpha: bool,
    #[serde(default)]
    pub ps2: bool,
    #[serde(default)]
    pub cuepoint: Option<String>,
    #[serde(default)]
    pub audio: Vec<AudioEntry>,
    #[serde(default)]
    pub subtitle: Vec<SubtitleEntry>,
}

/// `[[audio]]` table: either `path` or `[audio.multichannel]`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AudioEntry {
    pub slot: usize,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub multichannel: Option<SurroundChannels>,
}

/// `[[subtitle]]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubtitleEntry {
    pub slot: usize,
    pub path: String,
}

fn invalid(message: String) -> SupervisorError {
    SupervisorError::InvalidJob { message }
}

impl TryFrom<EncodeJob> for EncodeParameters {
    type Error = SupervisorError;

    fn try_from(job: EncodeJob) -> SupervisorResult<Self> {
        if job.input.trim().is_empty() {
            return Err(invalid("input must not be empty".to_string()));
        }
        if job.output.trim().is_empty() {
            return Err(invalid("output must not be empty".to_string()));
        }

        let mut params = EncodeParameters::new(job.input, job.output, job.bitrate);
        params.framerate = job.framerate;
        params.resize = job.resize;
        params.hca = job.hca;
        params.alpha_channel = job.alpha;
        params.ps2_target = job.ps2;
        params.cue_points = job.cuepoint;

        let mut seen = BTreeSet::new();
        for entry in job.audio {
            if !seen.insert(entry.slot) {
                return Err(invalid(format!("audio slot {} given twice", entry.slot)));
            }
            let track = match (entry.path, entry.multichannel) {
                (Some(path), None) => AudioTrack::MonoOrStereo(path),
                (None, Some(channels)) => AudioTrack::MultiChannel(channels),
                _ => {
                    return Err(invalid(format!(
                        "audio slot {} needs exactly one of path or multichannel",
                        entry.slot
                    )))
                }
            };
            params.audio_tracks.set(entry.slot, track)?;
        }

        let mut seen = BTreeSet::new();
        for entry in job.subtitle {
            if !seen.insert(entry.slot) {
                return Err(invalid(format!("subtitle slot {} given twice", entry.slot)));
            }
            params.subtitles.set(entry.slot, entry.path)?;
        }

        Ok(params)
    }
}

/// Parse a job document into encode parameters
pub fn parse_job(content: &str) -> SupervisorResult<EncodeParameters> {
    let job: EncodeJob =
        toml::from_str(content).map_err(|e| invalid(format!("failed to parse job: {}", e)))?;
    EncodeParameters::try_from(job)
}

/// Load a job file from disk
pub async fn load_job(path: &Path) -> SupervisorResult<EncodeParameters> {
    info!("Loading encode job from: {}", path.display());
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| invalid(format!("cannot read {}: {}", path.display(), e)))?;
    parse_job(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_JOB: &str = r#"
        input = "C:/clips/intro.avi"
        output = "C:/out/intro.usm"
        bitrate = 2500
        alpha = true
        cuepoint = "C:/clips/cues.txt"

        [framerate]
        numerator = 30000
        denominator = 1001

        [hca]
        quality = 4

        [[audio]]
        slot = 0
        path = "C:/clips/en.wav"

        [[audio]]
        slot = 3
        [audio.multichannel]
        left = "L.wav"
        right = "R.wav"
        left_surround = "LS.wav"
        right_surround = "RS.wav"
        center = "C.wav"
        lfe = "LFE.wav"

        [[subtitle]]
        slot = 1
        path = "C:/clips/fr.txt"
    "#;

    #[test]
    fn test_parse_full_job() {
        let params = parse_job(FULL_JOB).unwrap();
        assert_eq!(params.bitrate_kbps, 2500);
        assert_eq!(params.framerate, Some(Framerate::new(30000.0, 1001.0)));
        assert_eq!(params.hca, Some(HcaSettings { quality: 4 }));
        assert!(params.alpha_channel);
        assert!(!params.ps2_target);
        assert_eq!(params.audio_tracks.occupied(), 2);
        assert!(matches!(params.audio_tracks.get(3), Some(AudioTrack::MultiChannel(_))));
        assert_eq!(params.subtitles.get(1).map(String::as_str), Some("C:/clips/fr.txt"));
        assert_eq!(params.cue_points.as_deref(), Some("C:/clips/cues.txt"));
    }

    #[test]
    fn test_slot_out_of_range() {
        let err = parse_job("input='a'\noutput='b'\nbitrate=1\n[[subtitle]]\nslot=32\npath='x'\n")
            .unwrap_err();
        assert!(matches!(err, SupervisorError::SlotOutOfRange { index: 32, .. }));
    }

    #[test]
    fn test_duplicate_slot() {
        let err = parse_job(
            "input='a'\noutput='b'\nbitrate=1\n[[audio]]\nslot=0\npath='x'\n[[audio]]\nslot=0\npath='y'\n",
        )
        .unwrap_err();
        assert!(matches!(err, SupervisorError::InvalidJob { .. }));
    }

    #[test]
    fn test_audio_needs_one_source() {
        let err = parse_job("input='a'\noutput='b'\nbitrate=1\n[[audio]]\nslot=0\n").unwrap_err();
        assert!(matches!(err, SupervisorError::InvalidJob { .. }));
    }

    #[test]
    fn test_missing_bitrate() {
        assert!(parse_job("input='a'\noutput='b'\n").is_err());
    }

    #[tokio::test]
    async fn test_load_job_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("job.toml");
        std::fs::write(&path, "input='in.avi'\noutput='out.usm'\nbitrate=800\n").unwrap();

        let params = load_job(&path).await.unwrap();
        assert_eq!(params, EncodeParameters::new("in.avi", "out.usm", 800));
    }
}
