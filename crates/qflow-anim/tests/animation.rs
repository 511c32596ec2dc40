use std::fs;

use qflow_anim::encode::frame_path;
use qflow_anim::{render_frames, run_animation, AnimationConfig, ExitKind, ParticlePhase};

const LOG: &str = "\
0.0 1 1.0 1.0 1.2 0 0.3
0.0 2 12.0 2.5 -1.1 0 0.4
0.5 1 1.6 1.0 1.2 0 0.3
0.5 2 15.0 2.5 -1.1 0 0.4
not a row
1.0 1 15.9 1.0 1.2 0 0.3
1.0 3 nan 1.0 1.0 0 0.2
1.5 1 3.0 1.0 1.2 0 0.3
";

#[test]
fn frames_are_written_per_distinct_time() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("output_Qin_2.00_1.txt");
    fs::write(&input, LOG).unwrap();
    let frames_dir = dir.path().join("frames");

    let (state, frames) =
        render_frames(&input, &AnimationConfig::default(), &frames_dir).unwrap();

    assert_eq!(frames, 4);
    for index in 0..4 {
        assert!(frame_path(&frames_dir, index).exists());
    }
    assert!(!frame_path(&frames_dir, 4).exists());

    // particle 1 crossed the soft margin at t = 1.0 and stays gone
    assert_eq!(state.phase(1), Some(&ParticlePhase::Done(ExitKind::Soft)));
    // particle 2 is backward-heading and never reached x <= 0.25
    assert!(matches!(state.phase(2), Some(ParticlePhase::Active { .. })));
    assert_eq!(state.done_count(), 1);
}

#[test]
fn rerender_into_same_dir_drops_stale_frames() {
    let dir = tempfile::tempdir().unwrap();
    let frames_dir = dir.path().join("frames");
    let config = AnimationConfig::default();

    let long = dir.path().join("long.txt");
    fs::write(&long, LOG).unwrap();
    let (_, frames) = render_frames(&long, &config, &frames_dir).unwrap();
    assert_eq!(frames, 4);

    let short = dir.path().join("short.txt");
    fs::write(&short, "0.0 1 1.0 1.0 1.2 0 0.3\n").unwrap();
    let (_, frames) = render_frames(&short, &config, &frames_dir).unwrap();
    assert_eq!(frames, 1);

    assert!(frame_path(&frames_dir, 0).exists());
    for stale in 1..4 {
        assert!(!frame_path(&frames_dir, stale).exists(), "frame {stale} left behind");
    }
    assert_eq!(fs::read_dir(&frames_dir).unwrap().count(), 1);
}

#[test]
fn encoding_failure_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("log.txt");
    fs::write(&input, LOG).unwrap();

    let config = AnimationConfig {
        output: dir.path().join("animation.mp4"),
        ffmpeg: "qflow-no-such-ffmpeg".to_string(),
        ..AnimationConfig::default()
    };
    assert!(run_animation(&input, &config).is_err());
    // frames stay behind for inspection when encoding fails
    assert!(frame_path(&config.frames_dir(), 0).exists());
}

#[test]
fn empty_log_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("empty.txt");
    fs::write(&input, "\n").unwrap();
    assert!(render_frames(&input, &AnimationConfig::default(), &dir.path().join("f")).is_err());
}
