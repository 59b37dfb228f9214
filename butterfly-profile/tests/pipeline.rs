use butterfly_profile::ev::{RoadClass, RouteNetwork};
use butterfly_profile::{
    CollectingSink, DiagnosticKind, Direction, Mode, Profile, ProfileConfig, SharedSink, TracingSink, WayTags,
};
use chrono::NaiveDate;
use std::sync::Arc;

fn config() -> ProfileConfig {
    ProfileConfig::default().with_reference_date(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
}

fn sample_ways() -> Vec<WayTags> {
    vec![
        WayTags::new(1).with_tag("highway", "motorway").with_tag("maxspeed", "120"),
        WayTags::new(2)
            .with_tag("highway", "residential")
            .with_tag("oneway", "-1")
            .with_tag("surface", "cobblestone"),
        WayTags::new(3)
            .with_tag("highway", "path")
            .with_tag("sac_scale", "alpine_hiking")
            .with_tag("access:conditional", "no @ (Dec-Apr)"),
        WayTags::new(4).with_tag("route", "ferry"),
        WayTags::new(5)
            .with_tag("highway", "primary")
            .with_tag("maxspeed", "fast")
            .with_tag("toll", "yes"),
        WayTags::new(6),
    ]
}

#[test]
fn test_pipeline_is_deterministic() {
    let profile = Profile::build(config(), Arc::new(butterfly_profile::NullSink)).unwrap();
    let ways = sample_ways();

    let mut first = profile.new_store(ways.len());
    let mut second = profile.new_store(ways.len());
    profile.pipeline().handle_edges_par(&mut first, &ways, None).unwrap();
    profile.pipeline().handle_edges_par(&mut second, &ways, None).unwrap();
    assert_eq!(first.as_slice(), second.as_slice());

    let mut sequential = profile.new_store(ways.len());
    for (i, way) in ways.iter().enumerate() {
        let edge = i as u32;
        profile
            .pipeline()
            .handle_way_tags(edge, sequential.edge_mut(edge), way, &[])
            .unwrap();
    }
    assert_eq!(first, sequential);
}

#[test]
fn test_standard_values_from_tags() {
    let profile = Profile::build(config(), Arc::new(butterfly_profile::NullSink)).unwrap();
    let ways = sample_ways();
    let mut store = profile.new_store(ways.len());
    profile.pipeline().handle_edges_par(&mut store, &ways, None).unwrap();
    let values = profile.values();
    let car = values.mode(Mode::Car).unwrap();

    let motorway = store.edge(0);
    assert_eq!(
        values.road_class.get_enum(motorway, Direction::Forward),
        RoadClass::Motorway.index()
    );
    assert_eq!(values.max_speed.get_decimal(motorway, Direction::Backward), 120.0);
    assert_eq!(car.average_speed.get_decimal(motorway, Direction::Forward), 110.0);

    let reversed = store.edge(1);
    assert!(!car.access.get_bool(reversed, Direction::Forward));
    assert!(car.access.get_bool(reversed, Direction::Backward));

    let trail = store.edge(2);
    assert!(values.construction_restriction.get_bool(trail, Direction::Forward));
    assert_eq!(values.hike_rating.get_int(trail, Direction::Forward), 4);

    let ferry = store.edge(3);
    assert_eq!(car.average_speed.get_decimal(ferry, Direction::Forward), 20.0);

    let untagged = store.edge(5);
    assert_eq!(values.max_speed.get_decimal(untagged, Direction::Forward), f64::INFINITY);
    assert_eq!(car.average_speed.get_decimal(untagged, Direction::Forward), 0.0);
    assert!(!car.access.get_bool(untagged, Direction::Forward));
}

#[test]
fn test_malformed_tags_are_reported_not_fatal() {
    let collecting = Arc::new(CollectingSink::new());
    let sink: SharedSink = collecting.clone();
    let profile = Profile::build(config(), sink).unwrap();
    let ways = sample_ways();
    let mut store = profile.new_store(ways.len());
    profile.pipeline().handle_edges_par(&mut store, &ways, None).unwrap();

    let malformed: Vec<_> = collecting
        .snapshot()
        .into_iter()
        .filter(|d| d.kind == DiagnosticKind::MalformedTag)
        .collect();
    assert!(!malformed.is_empty());
    assert!(malformed.iter().all(|d| d.edge_id == Some(4)));
    assert_eq!(
        profile.values().max_speed.get_decimal(store.edge(4), Direction::Forward),
        f64::INFINITY
    );
}

#[test]
fn test_relation_flags_feed_foot_network() {
    let profile = Profile::build(config(), Arc::new(butterfly_profile::NullSink)).unwrap();
    let ways = vec![
        WayTags::new(1).with_tag("highway", "path"),
        WayTags::new(2).with_tag("highway", "path"),
    ];
    let mut relations = profile.new_relation_store(ways.len());
    profile
        .relation_values()
        .foot_network
        .set_enum(relations.edge_mut(0), Direction::Forward, RouteNetwork::Regional.index())
        .unwrap();

    let mut store = profile.new_store(ways.len());
    profile
        .pipeline()
        .handle_edges_par(&mut store, &ways, Some(&relations))
        .unwrap();
    let network = profile.values().foot_network;
    assert_eq!(
        network.get_enum(store.edge(0), Direction::Forward),
        RouteNetwork::Regional.index()
    );
    assert_eq!(
        network.get_enum(store.edge(1), Direction::Forward),
        RouteNetwork::Missing.index()
    );
}

#[test]
fn test_tracing_sink_under_test_subscriber() {
    let subscriber = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    tracing::subscriber::with_default(subscriber, || {
        let profile = Profile::build(config(), Arc::new(TracingSink)).unwrap();
        let mut store = profile.new_store(1);
        let ways = [WayTags::new(1)
            .with_tag("highway", "residential")
            .with_tag("access:conditional", "no @ (sometimes)")];
        profile.pipeline().handle_edges_par(&mut store, &ways, None).unwrap();
        assert!(!profile
            .values()
            .construction_restriction
            .get_bool(store.edge(0), Direction::Forward));
    });
}
