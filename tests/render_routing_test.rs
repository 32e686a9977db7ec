use hexglobe::{
    pipelines::bloom::{self, BloomConfig},
    render::{PassOutput, PassRoute, Slot, Viewport, route_passes},
};

#[test]
fn single_pass_writes_the_primary_target() {
    assert_eq!(
        route_passes(1),
        vec![PassRoute {
            input: None,
            output: PassOutput::Primary
        }]
    );
}

#[test]
fn scene_then_bloom_go_through_one_buffer() {
    let routes = route_passes(2);
    assert_eq!(routes[0].input, None);
    assert_eq!(routes[0].output, PassOutput::Buffer(Slot::A));
    assert_eq!(routes[1].input, Some(Slot::A));
    assert_eq!(routes[1].output, PassOutput::Primary);
}

#[test]
fn longer_chains_ping_pong() {
    let routes = route_passes(4);
    assert_eq!(routes[1].output, PassOutput::Buffer(Slot::B));
    assert_eq!(routes[2].input, Some(Slot::B));
    assert_eq!(routes[2].output, PassOutput::Buffer(Slot::A));
    assert_eq!(routes[3].input, Some(Slot::A));
    assert_eq!(routes[3].output, PassOutput::Primary);
}

#[test]
fn no_passes_no_routes() {
    assert!(route_passes(0).is_empty());
}

#[test]
fn minimised_windows_keep_a_drawable_viewport() {
    assert_eq!(Viewport::new(1280, 720).size(), [1280, 720]);
    assert_eq!(Viewport::new(640, 0).size(), [640, 1]);
}

#[test]
fn bloom_factors_are_mixed_by_radius() {
    let factors = bloom::mix_bloom_factors(BloomConfig::default().radius);
    let expected = [0.92, 0.76, 0.6, 0.44, 0.28];
    for (factor, expected) in factors.iter().zip(expected) {
        assert!((factor - expected).abs() < 1e-5, "{factor} vs {expected}");
    }
}

#[test]
fn bloom_mips_halve_from_half_resolution() {
    let sizes = bloom::mip_sizes(1280, 720);
    assert_eq!(sizes[0], [640, 360]);
    assert_eq!(sizes[1], [320, 180]);
    assert_eq!(sizes[4], [40, 23]);

    for [w, h] in bloom::mip_sizes(3, 1) {
        assert!(w >= 1 && h >= 1);
    }
}
