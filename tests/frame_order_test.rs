use hexglobe::flow::run_frame;
use instant::Duration;

use crate::common::test_utils::{AcquireFailed, Recorder, Stage};

mod common;

#[test]
fn composited_pass_runs_before_overlay() {
    let mut recorder = Recorder::new();
    run_frame(&mut recorder, Duration::from_millis(16)).unwrap();

    assert_eq!(
        recorder.stages(),
        &[
            Stage::Controls,
            Stage::Acquire,
            Stage::Composited,
            Stage::Overlay,
            Stage::Present
        ]
    );
}

#[test]
fn every_frame_repeats_the_same_order() {
    let mut recorder = Recorder::new();
    for _ in 0..3 {
        run_frame(&mut recorder, Duration::from_millis(16)).unwrap();
    }

    assert_eq!(recorder.presented_frames(), 3);
    for frame in recorder.stages().chunks(5) {
        assert_eq!(frame[0], Stage::Controls);
        assert_eq!(frame[2], Stage::Composited);
        assert_eq!(frame[3], Stage::Overlay);
    }
    assert_eq!(recorder.elapsed(), Duration::from_millis(48));
}

#[test]
fn failed_acquire_skips_rendering() {
    let mut recorder = Recorder::failing();
    let result = run_frame(&mut recorder, Duration::from_millis(16));

    assert_eq!(result, Err(AcquireFailed));
    assert_eq!(recorder.stages(), &[Stage::Controls, Stage::Acquire]);
    assert_eq!(recorder.presented_frames(), 0);
}
