// Unit tests for the argument builder

use std::path::Path;

use super::*;
use crate::domain::model::*;

fn count(haystack: &str, needle: &str) -> usize {
    tokenize(haystack)
        .into_iter()
        .filter(|token| token.starts_with(needle))
        .count()
}

fn surround(prefix: &str) -> SurroundChannels {
    SurroundChannels {
        left: format!("{}_L.wav", prefix),
        right: format!("{}_R.wav", prefix),
        left_surround: format!("{}_LS.wav", prefix),
        right_surround: format!("{}_RS.wav", prefix),
        center: format!("{}_C.wav", prefix),
        lfe: format!("{}_LFE.wav", prefix),
    }
}

#[test]
fn test_minimal_parameters() {
    let params = EncodeParameters::new("in.avi", "out.usm", 2000);
    assert_eq!(
        build_arguments(&params),
        "-gui_mode -preview=off -heartbeat -gop_closed=on -gop_i=1 -gop_p=4 -gop_b=2 \
         -video00=\"in.avi\" -output=\"out.usm\" -bitrate=2000000"
    );
}

#[test]
fn test_single_mono_track_scenario() {
    let mut params = EncodeParameters::new("C:\\clips\\intro movie.avi", "C:\\out\\intro.usm", 2000);
    params.audio_tracks
        .set(0, AudioTrack::MonoOrStereo("C:\\clips\\intro audio.wav".into()))
        .unwrap();

    let line = build_arguments(&params);
    assert!(line.contains("-bitrate=2000000"));
    assert!(line.contains("-audio00=\"C:\\clips\\intro audio.wav\""));
    for absent in ["-hca", "-scale", "-ps2", "-alpha00", "-framerate", "-mca", "-subtitle", "-cuepoint"] {
        assert_eq!(count(&line, absent), 0, "unexpected {}", absent);
    }
}

#[test]
fn test_build_is_deterministic() {
    let mut params = EncodeParameters::new("a.avi", "b.usm", 500);
    params.hca = Some(HcaSettings { quality: 3 });
    params.subtitles.set(4, "subs.txt".into()).unwrap();
    assert_eq!(build_arguments(&params), build_arguments(&params.clone()));
}

#[test]
fn test_unconditional_flags_appear_once() {
    let mut params = EncodeParameters::new("a.avi", "b.usm", 1);
    params.alpha_channel = true;
    params.ps2_target = true;
    params.hca = Some(HcaSettings { quality: 1 });
    params.resize = Some(Resize { width: 320, height: 240 });
    params.framerate = Some(Framerate::new(30.0, 1.0));

    let line = build_arguments(&params);
    for flag in [
        "-gui_mode",
        "-preview=off",
        "-heartbeat",
        "-gop_closed=on",
        "-gop_i=1",
        "-gop_p=4",
        "-gop_b=2",
        "-video00=",
        "-output=",
        "-bitrate=",
        "-framerate=",
        "-hca=on",
        "-hca_quality=",
        "-scale=",
        "-ps2=on",
        "-alpha00=",
    ] {
        assert_eq!(count(&line, flag), 1, "flag {} in {}", flag, line);
    }
}

#[test]
fn test_optional_flag_values() {
    let mut params = EncodeParameters::new("a b.avi", "b.usm", 1500);
    params.framerate = Some(Framerate::new(30000.0, 1001.0));
    params.hca = Some(HcaSettings { quality: 4 });
    params.resize = Some(Resize { width: 1280, height: 720 });
    params.alpha_channel = true;

    let line = build_arguments(&params);
    assert!(line.contains(" -framerate=30000,1001"));
    assert!(line.contains(" -hca=on -hca_quality=4"));
    assert!(line.contains(" -scale=1280,720"));
    assert!(line.contains(" -alpha00=\"a b.avi\""));
}

#[test]
fn test_fractional_framerate_keeps_decimals() {
    let mut params = EncodeParameters::new("a.avi", "b.usm", 1);
    params.framerate = Some(Framerate::new(29.97, 1.0));
    assert!(build_arguments(&params).contains(" -framerate=29.97,1 "));
}

#[test]
fn test_framerate_needs_both_components() {
    let mut params = EncodeParameters::new("a.avi", "b.usm", 1);
    params.framerate = Some(Framerate::new(30.0, 0.0));
    assert_eq!(count(&build_arguments(&params), "-framerate"), 0);

    params.framerate = Some(Framerate::new(0.0, 1.0));
    assert_eq!(count(&build_arguments(&params), "-framerate"), 0);
}

#[test]
fn test_multichannel_slot_emits_six_flags_in_order() {
    let mut params = EncodeParameters::new("a.avi", "b.usm", 1);
    params.audio_tracks
        .set(5, AudioTrack::MultiChannel(surround("en")))
        .unwrap();

    let line = build_arguments(&params);
    let mca: Vec<&str> = tokenize(&line)
        .into_iter()
        .filter(|token| token.starts_with("-mca05_"))
        .collect();
    assert_eq!(
        mca,
        vec![
            "-mca05_00=\"en_L.wav\"",
            "-mca05_01=\"en_R.wav\"",
            "-mca05_02=\"en_LS.wav\"",
            "-mca05_03=\"en_RS.wav\"",
            "-mca05_04=\"en_C.wav\"",
            "-mca05_05=\"en_LFE.wav\"",
        ]
    );
    assert_eq!(count(&line, "-audio"), 0);
}

#[test]
fn test_audio_slots_follow_index_order() {
    let mut params = EncodeParameters::new("a.avi", "b.usm", 1);
    params.audio_tracks.set(31, AudioTrack::MonoOrStereo("z.wav".into())).unwrap();
    params.audio_tracks.set(1, AudioTrack::MultiChannel(surround("jp"))).unwrap();
    params.audio_tracks.set(0, AudioTrack::MonoOrStereo("a.wav".into())).unwrap();

    let line = build_arguments(&params);
    let audio00 = line.find("-audio00=").unwrap();
    let mca01 = line.find("-mca01_00=").unwrap();
    let audio31 = line.find("-audio31=").unwrap();
    assert!(audio00 < mca01 && mca01 < audio31);
    assert_eq!(count(&line, "-audio"), 2);
    assert_eq!(count(&line, "-mca01_"), 6);
}

#[test]
fn test_subtitles_skip_empty_paths() {
    let mut params = EncodeParameters::new("a.avi", "b.usm", 1);
    params.subtitles.set(0, "en.txt".into()).unwrap();
    params.subtitles.set(1, String::new()).unwrap();
    params.subtitles.set(12, "fr.txt".into()).unwrap();

    let line = build_arguments(&params);
    assert!(line.contains(" -subtitle00=\"en.txt\""));
    assert!(line.contains(" -subtitle12=\"fr.txt\""));
    assert_eq!(count(&line, "-subtitle"), 2);
}

#[test]
fn test_cuepoint_is_last() {
    let mut params = EncodeParameters::new("a.avi", "b.usm", 1);
    params.subtitles.set(0, "en.txt".into()).unwrap();
    params.cue_points = Some("cues.txt".into());
    assert!(build_arguments(&params).ends_with(" -cuepoint=\"cues.txt\""));

    params.cue_points = Some(String::new());
    assert_eq!(count(&build_arguments(&params), "-cuepoint"), 0);
}

#[test]
fn test_replay_line_strips_orchestration_flags() {
    let mut params = EncodeParameters::new("my clip.avi", "out.usm", 2000);
    params.ps2_target = true;
    let line = build_arguments(&params);

    let replay = build_replay_line(Path::new("/tools/medianoche.exe"), &line);
    assert_eq!(
        replay,
        "\"/tools/medianoche.exe\" -gop_closed=on -gop_i=1 -gop_p=4 -gop_b=2 \
         -video00=\"my clip.avi\" -output=\"out.usm\" -bitrate=2000000 -ps2=on"
    );
}

#[test]
fn test_replay_line_leaves_paths_containing_flag_text() {
    let line = "-heartbeat -video00=\"C:\\x -heartbeat\\a.avi\"";
    let replay = build_replay_line(Path::new("enc.exe"), line);
    assert_eq!(replay, "\"enc.exe\" -video00=\"C:\\x -heartbeat\\a.avi\"");
}

#[test]
fn test_tokenize_respects_quotes() {
    let tokens = tokenize("  -a=\"x y\"   -b  -c=\"\" ");
    assert_eq!(tokens, vec!["-a=\"x y\"", "-b", "-c=\"\""]);
}

#[test]
fn test_split_argument_line_removes_quotes() {
    let args = split_argument_line("-video00=\"in put.avi\" -bitrate=1000");
    assert_eq!(args, vec!["-video00=in put.avi".to_string(), "-bitrate=1000".to_string()]);
}
