use std::f32::consts::TAU;

use cgmath::{EuclideanSpace, MetricSpace, Point3, Rad};
use hexglobe::camera::{Camera, ControlsConfig, OrbitControls, Spherical};
use instant::Duration;
use winit::event::TouchPhase;

fn still_config() -> ControlsConfig {
    ControlsConfig {
        auto_rotate: false,
        ..ControlsConfig::default()
    }
}

fn controls(config: ControlsConfig) -> OrbitControls {
    OrbitControls::new(config, 800, 600, Rad(50f32.to_radians()))
}

fn camera_at(distance: f32) -> Camera {
    Camera::new(Point3::new(0.0, 0.0, distance), Point3::origin())
}

fn distance(camera: &Camera) -> f32 {
    camera.position.distance(camera.target)
}

fn azimuth(camera: &Camera) -> f32 {
    Spherical::from_offset(camera.position - camera.target).theta
}

#[test]
fn distance_is_clamped_to_limits() {
    let mut controls = controls(still_config());

    let mut far = camera_at(1000.0);
    controls.update(&mut far, Duration::from_millis(16), |_| {});
    assert!((distance(&far) - 500.0).abs() < 1e-3);

    let mut near = camera_at(120.0);
    controls.update(&mut near, Duration::from_millis(16), |_| {});
    assert!((distance(&near) - 200.0).abs() < 1e-3);
}

#[test]
fn zoom_is_ignored_when_disabled() {
    let mut controls = controls(still_config());
    let mut camera = camera_at(300.0);

    controls.wheel(5.0);
    let moved = controls.update(&mut camera, Duration::from_millis(16), |_| {});

    assert!(!moved);
    assert!((distance(&camera) - 300.0).abs() < 1e-3);
}

#[test]
fn zoom_moves_the_camera_when_enabled() {
    let mut controls = controls(ControlsConfig {
        enable_zoom: true,
        ..still_config()
    });
    let mut camera = camera_at(300.0);

    controls.wheel(1.0);
    controls.update(&mut camera, Duration::from_millis(16), |_| {});

    assert!(distance(&camera) < 300.0);
}

#[test]
fn pan_is_ignored_when_disabled() {
    let mut controls = controls(still_config());
    let mut camera = camera_at(300.0);

    controls.pointer_down(100.0, 100.0, true);
    assert!(!controls.is_dragging());
    controls.pointer_move(300.0, 200.0);
    controls.pointer_up();
    let moved = controls.update(&mut camera, Duration::from_millis(16), |_| {});

    assert!(!moved);
    assert_eq!(camera.target, Point3::origin());
}

#[test]
fn damping_decays_rotation_over_frames() {
    let mut controls = controls(still_config());
    let mut camera = camera_at(300.0);

    controls.pointer_down(400.0, 300.0, false);
    controls.pointer_move(500.0, 300.0);
    controls.pointer_up();

    let mut steps = Vec::new();
    for _ in 0..4 {
        let before = azimuth(&camera);
        controls.update(&mut camera, Duration::from_millis(16), |_| {});
        steps.push((azimuth(&camera) - before).abs());
    }

    assert!(steps[0] > 0.0);
    for pair in steps.windows(2) {
        let ratio = pair[1] / pair[0];
        assert!((ratio - 0.95).abs() < 1e-3, "ratio {ratio}");
    }
}

#[test]
fn auto_rotate_turns_half_speed_per_minute() {
    let mut controls = controls(ControlsConfig {
        enable_damping: false,
        ..ControlsConfig::default()
    });
    let mut camera = camera_at(300.0);

    controls.update(&mut camera, Duration::from_secs(1), |_| {});

    let expected = TAU / 60.0 * 0.5;
    assert!((azimuth(&camera).abs() - expected).abs() < 1e-4);
    assert!((distance(&camera) - 300.0).abs() < 1e-3);
}

#[test]
fn change_is_reported_only_when_the_camera_moves() {
    let mut controls = controls(still_config());
    let mut camera = camera_at(300.0);
    let mut notified = 0;

    controls.update(&mut camera, Duration::from_millis(16), |_| notified += 1);
    assert_eq!(notified, 0);

    controls.pointer_down(400.0, 300.0, false);
    controls.pointer_move(450.0, 320.0);
    let mut seen = None;
    let moved = controls.update(&mut camera, Duration::from_millis(16), |c| {
        notified += 1;
        seen = Some(c.position);
    });

    assert!(moved);
    assert_eq!(notified, 1);
    let seen = seen.expect("notified with the camera");
    assert!(seen.distance(camera.position) < 1e-6);
}

#[test]
fn touch_drag_rotates_like_a_mouse_drag() {
    let mut touch = controls(still_config());
    let mut mouse = controls(still_config());
    let mut touched = camera_at(300.0);
    let mut clicked = camera_at(300.0);

    assert!(touch.touch(7, TouchPhase::Started, 400.0, 300.0));
    assert!(touch.is_dragging());
    assert!(touch.touch(7, TouchPhase::Moved, 480.0, 300.0));
    assert!(touch.touch(7, TouchPhase::Ended, 480.0, 300.0));
    assert!(!touch.is_dragging());

    mouse.pointer_down(400.0, 300.0, false);
    mouse.pointer_move(480.0, 300.0);
    mouse.pointer_up();

    assert!(touch.update(&mut touched, Duration::from_millis(16), |_| {}));
    mouse.update(&mut clicked, Duration::from_millis(16), |_| {});
    assert!(touched.position.distance(clicked.position) < 1e-4);
}

#[test]
fn second_finger_is_ignored_during_a_touch_drag() {
    let mut controls = controls(still_config());
    let mut camera = camera_at(300.0);

    controls.touch(1, TouchPhase::Started, 400.0, 300.0);
    assert!(!controls.touch(2, TouchPhase::Started, 100.0, 100.0));
    assert!(!controls.touch(2, TouchPhase::Moved, 700.0, 100.0));
    assert!(!controls.touch(2, TouchPhase::Ended, 700.0, 100.0));
    assert!(controls.is_dragging());

    let moved = controls.update(&mut camera, Duration::from_millis(16), |_| {});
    assert!(!moved);

    assert!(controls.touch(1, TouchPhase::Cancelled, 400.0, 300.0));
    assert!(!controls.is_dragging());
}
