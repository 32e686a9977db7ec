use hexglobe::{
    data_structures::dataset::{ArcRecord, Datasets, MarkerRecord},
    decorator::{self, ArcStyle, GlobeStyle},
    pipelines::arcs,
    resources::mesh,
};

fn arc(order: f32, status: bool) -> ArcRecord {
    ArcRecord {
        order,
        status,
        arc_alt: 0.2,
        start_lat: 6.5,
        start_lng: 3.4,
        end_lat: 51.5,
        end_lng: -0.1,
    }
}

fn datasets(arcs: Vec<ArcRecord>, markers: usize) -> Datasets {
    Datasets {
        arcs,
        markers: (0..markers)
            .map(|i| MarkerRecord {
                lat: i as f32,
                lng: i as f32 * 2.0,
            })
            .collect(),
        ..Datasets::default()
    }
}

#[test]
fn empty_datasets_give_a_bare_globe() {
    let globe = decorator::decorate(&Datasets::default(), &GlobeStyle::default());

    assert!(globe.hex_cells.is_empty());
    assert!(globe.arcs.is_empty());
    assert!(globe.points.is_empty());
    assert!(globe.markers.is_empty());
    assert!(globe.atmosphere.is_some());
    assert_eq!(globe.material, GlobeStyle::default().material);
}

#[test]
fn one_record_of_each_kind() {
    let globe = decorator::decorate(&datasets(vec![arc(1.0, true)], 1), &GlobeStyle::default());

    assert_eq!(globe.arcs.len(), 1);
    assert_eq!(globe.points.len(), 1);
    assert_eq!(globe.markers.len(), 1);
    assert_eq!(globe.points[0].lat, globe.markers[0].lat);
    assert_eq!(globe.points[0].lng, globe.markers[0].lng);
}

#[test]
fn many_records_keep_their_order() {
    let arcs = (0..5).map(|i| arc(i as f32, i % 2 == 0)).collect();
    let globe = decorator::decorate(&datasets(arcs, 7), &GlobeStyle::default());

    assert_eq!(globe.arcs.len(), 5);
    assert_eq!(globe.markers.len(), 7);
    for (i, descriptor) in globe.arcs.iter().enumerate() {
        assert_eq!(descriptor.record.order, i as f32);
    }
    for (i, marker) in globe.markers.iter().enumerate() {
        assert_eq!(marker.lat, i as f32);
    }
}

#[test]
fn arc_properties_come_from_the_record() {
    let style = GlobeStyle::default();
    let globe = decorator::decorate(&datasets(vec![arc(3.0, true), arc(2.0, false)], 0), &style);

    let active = &globe.arcs[0];
    assert_eq!(active.altitude, 0.2);
    assert_eq!(active.stroke, style.arcs.stroke_active);
    assert_eq!(active.dash_length, style.arcs.dash_length);
    assert_eq!(active.dash_gap, style.arcs.dash_gap);
    assert_eq!(active.dash_animate_ms, style.arcs.dash_animate_ms);
    assert_eq!(active.transition_ms, style.arcs.transition_ms);

    let inactive = &globe.arcs[1];
    assert_eq!(inactive.stroke, style.arcs.stroke_inactive);
}

#[test]
fn arc_colour_is_constant_across_status() {
    let style = ArcStyle::default();
    assert_eq!(
        decorator::arc_colour(&style, &arc(1.0, true)),
        decorator::arc_colour(&style, &arc(1.0, false))
    );
}

#[test]
fn initial_gap_grows_linearly_with_order() {
    let style = ArcStyle::default();
    let gaps: Vec<f32> = [0.0, 1.0, 2.0, 4.0]
        .iter()
        .map(|&order| decorator::arc_dash_initial_gap(&style, &arc(order, true)))
        .collect();

    assert_eq!(gaps[0], 0.0);
    assert_eq!(gaps[2], 2.0 * gaps[1]);
    assert_eq!(gaps[3], 4.0 * gaps[1]);
}

#[test]
fn stroke_follows_status() {
    let style = ArcStyle::default();
    assert_eq!(decorator::arc_stroke(&style, &arc(1.0, true)), 0.5);
    assert_eq!(decorator::arc_stroke(&style, &arc(1.0, false)), 0.3);
}

#[test]
fn arcs_start_on_the_surface_and_lift() {
    let globe = decorator::decorate(&datasets(vec![arc(1.0, true)], 0), &GlobeStyle::default());
    let descriptor = &globe.arcs[0];

    assert!(descriptor.altitude > 0.0);
    assert_eq!(descriptor.transition_progress(0.0), 0.0);
    assert!((descriptor.transition_progress(descriptor.transition_ms) - 1.0).abs() < 1e-6);
}

#[test]
fn dashes_wait_for_their_initial_gap() {
    let globe = decorator::decorate(&datasets(vec![arc(2.0, true)], 0), &GlobeStyle::default());
    let descriptor = &globe.arcs[0];

    let style = &globe.style.arcs;
    let period = style.dash_length + style.dash_gap;
    let tube = mesh::arc_tube(descriptor, style.curve_segments, style.radial_segments);
    let end = tube.vertices.last().expect("tube has vertices");
    let phase = |elapsed_ms: f64| {
        end.rel_distance
            + arcs::dash_translate(elapsed_ms, style.dash_animate_ms, period, descriptor.dash_initial_gap)
            - end.initial_gap
    };

    // The end of the arc has relative distance zero, so it lights up only once
    // the animation has moved the dashes by the whole initial gap.
    assert_eq!(end.rel_distance, 0.0);
    assert_eq!(end.initial_gap, descriptor.dash_initial_gap);
    assert!(phase(0.0) < 0.0);
    assert!(phase(1.9 * style.dash_animate_ms as f64) < 0.0);
    assert!(phase(2.5 * style.dash_animate_ms as f64) > 0.0);
}
