//! Scenarios driving the whole engine through a recording surface.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use approx::assert_abs_diff_eq;
use assert_matches::assert_matches;
use wayfarer_types::{LngLat, ScreenPoint};
use web_time::Instant;

use crate::feature::{encode_localized, FeatureProperties};
use crate::interaction::tests::site;
use crate::layout::Breakpoint;
use crate::surface::{
    CameraCall, ClusterInfo, Cursor, LayerId, MapSurface, MotionOrigin, RecordingSurface,
    RenderedFeature, ScriptedCluster, SourceId,
};
use crate::{
    InputMode, LayerEvent, LocationCollection, LocationSource, MapConfig, MapEngine, MapError,
    MapEvent, PopupState, Readiness, TourStop, ViewKind,
};

#[derive(Debug, Clone, Default)]
struct RecordingSource {
    requests: Arc<Mutex<Vec<String>>>,
}

impl LocationSource for RecordingSource {
    fn request_locations(&mut self, url: &str) {
        self.requests.lock().expect("lock").push(url.to_string());
    }
}

struct Fixture {
    engine: MapEngine,
    start: Instant,
    elapsed: Duration,
    navigations: Arc<Mutex<Vec<String>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl Fixture {
    fn new() -> Self {
        Self::with_config(MapConfig::default())
    }

    fn with_config(config: MapConfig) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let start = Instant::now();
        let navigations = Arc::new(Mutex::new(vec![]));
        let source = RecordingSource::default();
        let requests = source.requests.clone();

        let recorded = navigations.clone();
        let mut engine = MapEngine::builder()
            .with_config(config)
            .with_navigator(move |path: &str| {
                recorded.lock().expect("lock").push(path.to_string())
            })
            .with_location_source(source)
            .with_start_time(start)
            .build()
            .expect("default config is valid");
        engine.init(Box::new(RecordingSurface::new(4.0, 1280.0)));

        Self {
            engine,
            start,
            elapsed: Duration::ZERO,
            navigations,
            requests,
        }
    }

    fn ready() -> Self {
        let mut fixture = Self::new();
        fixture.make_ready();
        fixture
    }

    fn make_ready(&mut self) {
        self.engine.handle_event(MapEvent::StyleLoaded);
        self.engine.on_locations_loaded(Ok(locations()));
        self.advance(200);
        assert!(self.engine.is_ready());
    }

    fn advance(&mut self, millis: u64) {
        self.elapsed += Duration::from_millis(millis);
        self.engine.advance(self.start + self.elapsed);
    }

    fn surface(&self) -> &RecordingSurface {
        self.engine
            .surface()
            .and_then(|surface| surface.as_any().downcast_ref())
            .expect("recording surface")
    }

    fn surface_mut(&mut self) -> &mut RecordingSurface {
        self.engine
            .surface_mut()
            .and_then(|surface| surface.as_any_mut().downcast_mut())
            .expect("recording surface")
    }

    fn sorted_ids(&self, source: SourceId) -> Vec<String> {
        let mut ids = self.surface().source_ids(source);
        ids.sort();
        ids
    }

    fn visible_view_count(&self) -> usize {
        let surface = self.surface();
        let clustered = [LayerId::Clusters, LayerId::ClusterCount, LayerId::ClusteredPoints]
            .into_iter()
            .any(|layer| surface.is_layer_visible(layer));
        let unclustered = surface.is_layer_visible(LayerId::UnclusteredPoints);
        usize::from(clustered) + usize::from(unclustered)
    }

    fn hover(&mut self, feature: crate::PointFeature) {
        self.engine.handle_event(MapEvent::Layer {
            layer: LayerId::ClusteredPoints,
            event: LayerEvent::Enter(RenderedFeature::Point(feature)),
        });
    }

    fn click(&mut self, layer: LayerId, feature: Option<RenderedFeature>) {
        self.engine.handle_event(MapEvent::Layer {
            layer,
            event: LayerEvent::Click {
                point: ScreenPoint::new(640.0, 400.0),
                feature,
            },
        });
    }

    fn navigations(&self) -> Vec<String> {
        self.navigations.lock().expect("lock").clone()
    }

    fn request_count(&self) -> usize {
        self.requests.lock().expect("lock").len()
    }
}

fn locations() -> LocationCollection {
    (1..=5)
        .map(|i| site(&format!("loc-{i}"), i as f64, i as f64 * 10.0))
        .collect()
}

#[test]
fn becomes_ready_after_both_signals_and_settling() {
    let mut fixture = Fixture::new();
    assert_eq!(fixture.request_count(), 1);

    fixture.engine.on_locations_loaded(Ok(locations()));
    assert_matches!(
        fixture.engine.readiness(),
        Readiness::Waiting {
            style_loaded: false,
            data_loaded: true
        }
    );

    fixture.engine.handle_event(MapEvent::StyleLoaded);
    assert_eq!(fixture.engine.readiness(), Readiness::Settling);
    assert_eq!(fixture.engine.current_view(), Some(ViewKind::Clustered));

    fixture.advance(99);
    assert!(!fixture.engine.is_ready());
    fixture.advance(1);
    assert!(fixture.engine.is_ready());
    assert!(fixture.surface().is_layer_visible(LayerId::ClusteredPoints));
    assert_eq!(fixture.surface().source_ids(SourceId::Clustered).len(), 5);
}

#[test]
fn queued_jobs_run_in_request_order() {
    let mut fixture = Fixture::new();
    fixture.engine.set_tour_path(vec![LngLat::new(1.0, 1.0), LngLat::new(2.0, 2.0)]);
    fixture.engine.clear_tour();
    fixture.engine.set_tour_stops(vec![TourStop {
        feature: site("loc-1", 1.0, 1.0),
        number: 1,
        highlight: true,
    }]);
    fixture.engine.set_highlights(vec![site("loc-1", 1.0, 1.0)]);
    fixture.engine.clear_highlights();
    assert_eq!(fixture.engine.pending_jobs(), 5);

    fixture.make_ready();
    assert_eq!(fixture.engine.pending_jobs(), 0);

    let surface = fixture.surface();
    assert!(!surface.has_source(SourceId::TourPath));
    assert_eq!(surface.source_ids(SourceId::TourStops), vec!["loc-1"]);
    assert!(!surface.has_source(SourceId::Highlights));
}

#[test]
fn jobs_queued_while_settling_still_run() {
    let mut fixture = Fixture::new();
    fixture.engine.handle_event(MapEvent::StyleLoaded);
    fixture.engine.on_locations_loaded(Ok(locations()));

    fixture.engine.set_highlights(vec![site("loc-3", 3.0, 30.0)]);
    assert_eq!(fixture.engine.pending_jobs(), 1);

    fixture.advance(100);
    assert_eq!(fixture.engine.pending_jobs(), 0);
    assert_eq!(fixture.surface().source_ids(SourceId::Highlights).len(), 2);
}

#[test]
fn cleared_jobs_never_run() {
    let mut fixture = Fixture::new();
    fixture.engine.set_highlights(vec![site("loc-1", 1.0, 1.0)]);
    fixture.engine.clear_onload_jobs();

    fixture.make_ready();
    assert!(!fixture.surface().has_source(SourceId::Highlights));
}

#[test]
fn last_view_requested_before_ready_wins() {
    let mut fixture = Fixture::new();
    fixture.engine.set_view(ViewKind::Unclustered);
    fixture.engine.set_view(ViewKind::Clustered);
    fixture.engine.set_view(ViewKind::Unclustered);

    fixture.make_ready();
    fixture.advance(200);
    assert_eq!(fixture.engine.current_view(), Some(ViewKind::Unclustered));
    assert!(fixture.surface().is_layer_visible(LayerId::UnclusteredPoints));
    assert_eq!(fixture.visible_view_count(), 1);
}

#[test]
fn views_are_mutually_exclusive() {
    let mut fixture = Fixture::ready();
    let sequence = [
        ViewKind::Unclustered,
        ViewKind::Clustered,
        ViewKind::Clustered,
        ViewKind::Unclustered,
        ViewKind::Clustered,
    ];

    for kind in sequence {
        fixture.engine.set_view(kind);
        assert!(fixture.visible_view_count() <= 1);
        fixture.advance(20);
        assert!(fixture.visible_view_count() <= 1);
    }

    fixture.advance(100);
    assert_eq!(fixture.visible_view_count(), 1);
    assert!(fixture.engine.is_view_visible(ViewKind::Clustered));
    assert!(!fixture.engine.is_view_visible(ViewKind::Unclustered));
}

#[test]
fn setting_the_active_view_again_does_nothing() {
    let mut fixture = Fixture::ready();
    fixture.engine.set_view(ViewKind::Unclustered);
    fixture.advance(50);
    let layer_adds = fixture.surface().layer_add_count();

    fixture.engine.set_view(ViewKind::Unclustered);
    fixture.advance(100);
    assert_eq!(fixture.surface().layer_add_count(), layer_adds);
}

#[test]
fn filtered_data_round_trip() {
    let mut fixture = Fixture::ready();

    fixture.engine.set_filtered_view_data(&["loc-2", "loc-4"]);
    assert_eq!(fixture.sorted_ids(SourceId::Clustered), vec!["loc-2", "loc-4"]);

    fixture.engine.fit_to_current_view_bounds();
    let (bounds, options) = match fixture.surface().camera_calls().last() {
        Some(CameraCall::Fit(bounds, options)) => (*bounds, options.clone()),
        other => panic!("expected a fit, got {other:?}"),
    };
    assert_eq!(bounds.south_west(), LngLat::new(2.0, 20.0));
    assert_eq!(bounds.north_east(), LngLat::new(4.0, 40.0));
    assert_abs_diff_eq!(options.max_zoom, 15.0);
    assert_eq!(options.padding, Breakpoint::Desktop.padding(false));
    assert_eq!(options.origin, MotionOrigin::Programmatic);

    fixture.engine.set_filtered_view_data::<&str>(&[]);
    assert!(fixture.surface().source_ids(SourceId::Clustered).is_empty());

    let all: Vec<String> = (1..=5).map(|i| format!("loc-{i}")).collect();
    fixture.engine.set_filtered_view_data(&all);
    assert_eq!(fixture.surface().source_ids(SourceId::Clustered).len(), 5);

    fixture.engine.set_filtered_view_data(&["loc-1"]);
    fixture.engine.set_current_view_data(None);
    assert_eq!(fixture.surface().source_ids(SourceId::Clustered).len(), 5);
}

#[test]
fn out_of_world_points_are_drawn_but_not_framed() {
    let mut fixture = Fixture::new();
    fixture.engine.handle_event(MapEvent::StyleLoaded);
    let mut data: Vec<_> = locations().iter().cloned().collect();
    data.push(site("loc-6", 0.0, 89.0));
    fixture
        .engine
        .on_locations_loaded(Ok(LocationCollection::new(data)));
    fixture.advance(200);

    assert_eq!(fixture.surface().source_ids(SourceId::Clustered).len(), 6);
    let bounds = fixture.engine.current_bounds().expect("bounds exist");
    assert_eq!(bounds.south_west(), LngLat::new(1.0, 10.0));
    assert_eq!(bounds.north_east(), LngLat::new(5.0, 50.0));
}

#[test]
fn fitting_an_empty_view_does_nothing() {
    let mut fixture = Fixture::ready();
    fixture.engine.set_filtered_view_data::<&str>(&[]);
    fixture.engine.fit_to_current_view_bounds();
    assert!(fixture.surface().camera_calls().is_empty());
}

#[test]
fn hovering_the_same_point_attaches_one_popup() {
    let mut fixture = Fixture::ready();
    fixture.hover(site("loc-1", 1.0, 10.0));
    fixture.advance(5);
    fixture.hover(site("loc-1", 1.0, 10.0));
    fixture.advance(20);

    assert_eq!(fixture.surface().popup_attach_count(), 1);
    assert_eq!(fixture.engine.popup_state(), PopupState::Shown);
    assert_eq!(fixture.surface().cursor(), Cursor::Pointer);

    let (spec, visible) = fixture.surface().popup().expect("popup is attached");
    assert!(visible);
    assert_eq!(spec.content.title, "Old Mill");
    assert_eq!(spec.content.details_label.as_deref(), Some("View details"));
    assert_eq!(spec.content.close_label, None);
}

#[test]
fn leaving_a_point_fades_the_popup_out() {
    let mut fixture = Fixture::ready();
    fixture.hover(site("loc-1", 1.0, 10.0));
    fixture.advance(20);

    fixture.engine.handle_event(MapEvent::Layer {
        layer: LayerId::ClusteredPoints,
        event: LayerEvent::Leave,
    });
    assert_eq!(fixture.surface().cursor(), Cursor::Default);

    fixture.advance(100);
    fixture.engine.handle_event(MapEvent::PopupEnter);
    fixture.advance(500);
    assert_eq!(fixture.engine.popup_state(), PopupState::Shown);

    fixture.engine.handle_event(MapEvent::PopupLeave);
    fixture.advance(350);
    assert_eq!(fixture.engine.popup_state(), PopupState::Hidden);
    assert!(fixture.surface().popup().is_none());
}

#[test]
fn pointer_click_navigates() {
    let mut fixture = Fixture::ready();
    fixture.click(
        LayerId::ClusteredPoints,
        Some(RenderedFeature::Point(site("loc-1", 1.0, 10.0))),
    );
    assert_eq!(fixture.navigations(), vec!["/en/locations/old-mill"]);
}

#[test]
fn touch_tap_opens_popup_with_details_and_close() {
    let mut fixture = Fixture::ready();
    fixture.engine.set_input_mode(InputMode::Touch);

    fixture.hover(site("loc-1", 1.0, 10.0));
    assert!(fixture.surface().popup().is_none());

    fixture.click(
        LayerId::ClusteredPoints,
        Some(RenderedFeature::Point(site("loc-1", 1.0, 10.0))),
    );
    fixture.advance(20);
    assert!(fixture.navigations().is_empty());

    let (spec, _) = fixture.surface().popup().expect("popup is attached");
    assert_eq!(spec.content.close_label.as_deref(), Some("Close"));

    fixture.engine.handle_event(MapEvent::PopupViewDetails);
    assert_eq!(fixture.navigations(), vec!["/en/locations/old-mill"]);
    assert_eq!(fixture.engine.popup_state(), PopupState::Hiding);
}

#[test]
fn events_of_hidden_views_are_ignored() {
    let mut fixture = Fixture::ready();
    fixture.click(
        LayerId::UnclusteredPoints,
        Some(RenderedFeature::Point(site("loc-1", 1.0, 10.0))),
    );
    assert!(fixture.navigations().is_empty());
}

#[test]
fn popup_is_muted_while_camera_moves() {
    let mut fixture = Fixture::ready();
    fixture.engine.handle_event(MapEvent::MoveStart {
        origin: MotionOrigin::Programmatic,
    });
    assert!(fixture.engine.is_animating());

    fixture.hover(site("loc-1", 1.0, 10.0));
    assert!(fixture.surface().popup().is_none());

    fixture.engine.handle_event(MapEvent::MoveEnd {
        origin: MotionOrigin::Programmatic,
    });
    assert!(!fixture.engine.is_animating());
    fixture.hover(site("loc-1", 1.0, 10.0));
    assert!(fixture.surface().popup().is_some());
}

#[test]
fn zooming_away_hides_popup() {
    let mut fixture = Fixture::ready();
    fixture.hover(site("loc-1", 1.0, 10.0));
    fixture.advance(20);

    fixture.surface_mut().set_zoom(4.8);
    fixture.engine.handle_event(MapEvent::Zoom);
    assert_eq!(fixture.engine.popup_state(), PopupState::Shown);

    fixture.surface_mut().set_zoom(5.5);
    fixture.engine.handle_event(MapEvent::Zoom);
    assert_eq!(fixture.engine.popup_state(), PopupState::Hiding);
}

#[test]
fn user_zoom_is_clamped_below_max() {
    let mut fixture = Fixture::ready();
    fixture.surface_mut().set_zoom(18.5);
    fixture.engine.handle_event(MapEvent::MoveEnd {
        origin: MotionOrigin::Programmatic,
    });
    assert!(fixture.surface().camera_calls().is_empty());

    fixture.engine.handle_event(MapEvent::MoveEnd {
        origin: MotionOrigin::User,
    });
    assert_matches!(
        fixture.surface().camera_calls(),
        [CameraCall::Ease(camera)] if camera.zoom == Some(18.0) && camera.origin == MotionOrigin::Programmatic
    );
}

#[test]
fn pan_ignores_invalid_coordinates() {
    let mut fixture = Fixture::ready();
    fixture.engine.pan_to(f64::NAN, 10.0, true);
    fixture.engine.pan_to(10.0, f64::INFINITY, false);
    assert!(fixture.surface().camera_calls().is_empty());
}

#[test]
fn pan_offsets_for_the_drawer() {
    let mut fixture = Fixture::ready();
    fixture.surface_mut().set_container_width(500.0);
    fixture.engine.set_drawer_open(true);

    fixture.engine.pan_to(3.0, 4.0, true);
    fixture.engine.pan_to(3.0, 4.0, false);

    let calls = fixture.surface().camera_calls();
    assert_matches!(&calls[0], CameraCall::Ease(camera) => {
        assert_eq!(camera.center, Some(LngLat::new(3.0, 4.0)));
        assert_eq!(camera.offset, Breakpoint::Mobile.pan_offset(true));
        assert_eq!(camera.origin, MotionOrigin::Programmatic);
    });
    assert_matches!(&calls[1], CameraCall::Ease(camera) => {
        assert_eq!(camera.offset, Breakpoint::Mobile.pan_offset(false));
    });
}

fn script_cluster(fixture: &mut Fixture, children: Vec<RenderedFeature>, expansion_zoom: f64) {
    let info = ClusterInfo {
        id: 42,
        point_count: 3,
        position: LngLat::new(2.0, 20.0),
    };
    let leaves = (1..=3)
        .map(|i| site(&format!("loc-{i}"), 2.0, 20.0))
        .collect();

    let surface = fixture.surface_mut();
    surface.script_rendered(LayerId::Clusters, RenderedFeature::Cluster(info));
    surface.script_cluster(
        42,
        ScriptedCluster {
            children,
            expansion_zoom,
            leaves,
        },
    );
}

#[test]
fn cluster_of_clusters_zooms_in() {
    let mut fixture = Fixture::ready();
    script_cluster(
        &mut fixture,
        vec![RenderedFeature::Cluster(ClusterInfo {
            id: 43,
            point_count: 2,
            position: LngLat::new(2.0, 20.0),
        })],
        9.0,
    );

    fixture.click(LayerId::Clusters, None);
    assert_matches!(
        fixture.surface().camera_calls(),
        [CameraCall::Ease(camera)] if camera.zoom == Some(9.0) && camera.center == Some(LngLat::new(2.0, 20.0))
    );
    assert!(fixture.surface().markers().is_empty());
}

#[test]
fn leaf_cluster_spiderfies_and_collapses() {
    let mut fixture = Fixture::ready();
    script_cluster(
        &mut fixture,
        vec![RenderedFeature::Point(site("loc-1", 2.0, 20.0))],
        17.0,
    );

    fixture.click(LayerId::Clusters, None);
    assert_matches!(
        fixture.surface().camera_calls(),
        [CameraCall::Ease(camera)] if camera.zoom == Some(17.0)
    );
    assert!(fixture.engine.is_cluster_open());
    assert_eq!(fixture.surface().markers().len(), 3);

    fixture.advance(10);
    assert!(fixture.surface().markers().iter().all(|(_, _, visible)| *visible));

    let (marker, leg) = {
        let markers = fixture.surface().markers();
        (markers[0].0, markers[0].1.offset)
    };
    fixture.engine.handle_event(MapEvent::MarkerEnter(marker));
    let (spec, _) = fixture.surface().popup().expect("popup is attached");
    assert_eq!(spec.offset, leg);

    fixture.engine.handle_event(MapEvent::MarkerClick(marker));
    assert_eq!(fixture.navigations(), vec!["/en/locations/old-mill"]);

    fixture.advance(300);
    fixture.surface_mut().set_zoom(14.0);
    fixture.engine.handle_event(MapEvent::MoveEnd {
        origin: MotionOrigin::User,
    });
    assert!(!fixture.engine.is_cluster_open());

    fixture.advance(250);
    assert!(fixture.surface().markers().is_empty());
}

fn named_site(id: &str, title: &str, slug: &str) -> crate::PointFeature {
    crate::PointFeature::new(
        id,
        LngLat::new(2.0, 20.0),
        FeatureProperties {
            color: "#336699".to_string(),
            title: encode_localized([("en", title)]),
            slug: encode_localized([("en", slug)]),
            ..Default::default()
        },
    )
}

#[test]
fn legs_sharing_a_position_show_their_own_popup() {
    let mut fixture = Fixture::ready();
    fixture.engine.set_input_mode(InputMode::Touch);
    script_cluster(&mut fixture, vec![], 18.0);
    fixture.surface_mut().script_cluster(
        42,
        ScriptedCluster {
            children: vec![],
            expansion_zoom: 18.0,
            leaves: vec![
                named_site("loc-1", "Alpha", "alpha"),
                named_site("loc-2", "Beta", "beta"),
            ],
        },
    );
    fixture.click(LayerId::Clusters, None);
    fixture.advance(300);

    let markers: Vec<_> = fixture
        .surface()
        .markers()
        .into_iter()
        .map(|(marker, _, _)| marker)
        .collect();
    assert_eq!(markers.len(), 2);

    fixture.engine.handle_event(MapEvent::MarkerClick(markers[0]));
    fixture.advance(20);
    fixture.engine.handle_event(MapEvent::MarkerClick(markers[1]));
    fixture.advance(20);

    let (spec, visible) = fixture.surface().popup().expect("popup is attached");
    assert!(visible);
    assert_eq!(spec.content.title, "Beta");
    assert_eq!(fixture.surface().popup_attach_count(), 2);

    fixture.engine.handle_event(MapEvent::PopupViewDetails);
    assert_eq!(fixture.navigations(), vec!["/en/locations/beta"]);
}

#[test]
fn ignored_cluster_click_keeps_the_camera() {
    let mut fixture = Fixture::ready();
    script_cluster(&mut fixture, vec![], 18.0);

    fixture.click(LayerId::Clusters, None);
    fixture.click(LayerId::Clusters, None);
    assert_eq!(fixture.surface().camera_calls().len(), 1);

    fixture.advance(300);
    fixture.click(LayerId::Clusters, None);
    assert_eq!(fixture.surface().camera_calls().len(), 1);
    assert!(fixture.engine.is_cluster_open());
}

#[test]
fn overlays_stay_above_the_points_after_a_view_switch() {
    let mut fixture = Fixture::ready();
    fixture.engine.set_highlights(vec![site("loc-1", 1.0, 10.0)]);
    fixture.engine.set_tour_path(vec![LngLat::new(1.0, 1.0), LngLat::new(2.0, 2.0)]);

    fixture.engine.set_view(ViewKind::Unclustered);
    fixture.advance(100);
    fixture.engine.set_view(ViewKind::Clustered);
    fixture.advance(100);

    let order = fixture.surface().layer_ids();
    let position = |id| {
        order
            .iter()
            .position(|layer| *layer == id)
            .expect("layer is on the map")
    };
    assert!(position(LayerId::HighlightPoints) > position(LayerId::UnclusteredPoints));
    assert!(position(LayerId::HighlightPoints) > position(LayerId::ClusteredPoints));
    assert!(position(LayerId::TourPath) > position(LayerId::HighlightPoints));
}

#[test]
fn idle_host_advancing_before_an_event_keeps_the_hide_delay() {
    let mut fixture = Fixture::ready();
    fixture.hover(site("loc-1", 1.0, 10.0));
    fixture.advance(20);
    assert_eq!(fixture.engine.next_deadline(), None);

    fixture.advance(10_000);
    fixture.engine.handle_event(MapEvent::Layer {
        layer: LayerId::ClusteredPoints,
        event: LayerEvent::Leave,
    });
    assert_eq!(
        fixture.engine.next_deadline(),
        Some(fixture.start + fixture.elapsed + Duration::from_millis(150))
    );

    fixture.advance(100);
    assert_eq!(fixture.surface().popup().map(|(_, visible)| visible), Some(true));
}

#[test]
fn data_change_collapses_spiderfied_cluster() {
    let mut fixture = Fixture::ready();
    script_cluster(&mut fixture, vec![], 18.0);
    fixture.click(LayerId::Clusters, None);
    fixture.advance(300);
    assert!(fixture.engine.is_cluster_open());

    fixture.engine.set_filtered_view_data(&["loc-1"]);
    assert!(!fixture.engine.is_cluster_open());
    fixture.advance(250);
    assert!(fixture.surface().markers().is_empty());
}

#[test]
fn failed_fetch_is_retried_with_backoff() {
    let mut fixture = Fixture::new();
    fixture.engine.handle_event(MapEvent::StyleLoaded);
    assert_eq!(fixture.request_count(), 1);

    fixture
        .engine
        .on_locations_loaded(Err(MapError::Io("offline".to_string())));
    fixture.advance(999);
    assert_eq!(fixture.request_count(), 1);
    fixture.advance(1);
    assert_eq!(fixture.request_count(), 2);

    fixture
        .engine
        .on_locations_loaded(Err(MapError::Io("offline".to_string())));
    fixture.advance(2000);
    assert_eq!(fixture.request_count(), 3);

    fixture
        .engine
        .on_locations_loaded(Err(MapError::Io("offline".to_string())));
    fixture.advance(60_000);
    assert_eq!(fixture.request_count(), 3);
    assert!(!fixture.engine.is_ready());

    fixture.engine.on_locations_loaded(Ok(locations()));
    fixture.advance(100);
    assert!(fixture.engine.is_ready());
}

#[test]
fn navigation_needs_a_slug() {
    let mut fixture = Fixture::ready();
    assert_eq!(fixture.engine.on_map_point_navigate(""), None);
    assert_eq!(
        fixture.engine.on_map_point_navigate("old-mill").as_deref(),
        Some("/en/locations/old-mill")
    );
    assert_eq!(fixture.navigations(), vec!["/en/locations/old-mill"]);
}

#[test]
fn path_template_comes_from_config() {
    let mut config = MapConfig::default();
    config.navigation.path_template = "/{lang}/sites/{slug}/".to_string();
    let mut fixture = Fixture::with_config(config);
    fixture.make_ready();

    assert_eq!(
        fixture.engine.on_map_point_navigate("mill").as_deref(),
        Some("/en/sites/mill/")
    );
}

#[test]
fn current_view_can_be_hidden_and_shown() {
    let mut fixture = Fixture::ready();
    fixture.engine.hide_current_view();
    assert_eq!(fixture.visible_view_count(), 0);
    assert_eq!(fixture.surface().source_ids(SourceId::Clustered).len(), 5);

    fixture.engine.show_current_view();
    assert_eq!(fixture.visible_view_count(), 1);
}

#[test]
fn overlays_toggle_without_losing_data() {
    let mut fixture = Fixture::ready();
    fixture.engine.set_highlights(vec![site("loc-1", 1.0, 10.0)]);
    fixture.engine.set_highlights_visible(false);
    assert!(!fixture.surface().is_layer_visible(LayerId::HighlightPoints));

    fixture.engine.set_highlights(vec![site("loc-2", 2.0, 20.0)]);
    assert!(!fixture.surface().is_layer_visible(LayerId::HighlightPoints));

    fixture.engine.set_highlights_visible(true);
    assert!(fixture.surface().is_layer_visible(LayerId::HighlightPoints));
    assert_eq!(
        fixture.sorted_ids(SourceId::Highlights),
        vec!["loc-2", "loc-2"]
    );

    fixture.engine.set_tour_path(vec![LngLat::new(1.0, 1.0), LngLat::new(2.0, 2.0)]);
    fixture.engine.set_tour_visible(false);
    assert!(!fixture.surface().is_layer_visible(LayerId::TourPath));
}

#[test]
fn highlight_hover_shows_popup() {
    let mut fixture = Fixture::ready();
    fixture.engine.set_highlights(vec![site("loc-3", 3.0, 30.0)]);
    fixture.engine.handle_event(MapEvent::Layer {
        layer: LayerId::HighlightPoints,
        event: LayerEvent::Enter(RenderedFeature::Point(site("loc-3", 3.0, 30.0))),
    });

    let (spec, _) = fixture.surface().popup().expect("popup is attached");
    assert_eq!(spec.anchor, LngLat::new(3.0, 30.0));
}

#[test]
fn user_location_ignores_invalid_coordinates() {
    let mut fixture = Fixture::ready();
    fixture.engine.set_user_location(f64::NAN, 1.0);
    assert!(!fixture.surface().has_source(SourceId::UserLocation));

    fixture.engine.set_user_location(4.35, 50.85);
    assert!(fixture.surface().is_layer_visible(LayerId::UserLocationDot));

    fixture.engine.clear_user_location();
    assert!(!fixture.surface().has_source(SourceId::UserLocation));
}

#[test]
fn destroy_removes_everything() {
    let mut fixture = Fixture::ready();
    fixture.engine.set_highlights(vec![site("loc-1", 1.0, 10.0)]);
    fixture.engine.set_tour_path(vec![LngLat::new(1.0, 1.0), LngLat::new(2.0, 2.0)]);
    fixture.hover(site("loc-1", 1.0, 10.0));
    script_cluster(&mut fixture, vec![], 18.0);
    fixture.click(LayerId::Clusters, None);

    let surface = fixture.engine.destroy().expect("engine was initialized");
    let surface = surface
        .as_any()
        .downcast_ref::<RecordingSurface>()
        .expect("recording surface");

    assert!(surface.layer_ids().is_empty());
    assert!(surface.subscriptions().is_empty());
    assert!(surface.markers().is_empty());
    assert!(surface.popup().is_none());
    assert!(!surface.has_source(SourceId::Clustered));
    assert!(fixture.engine.surface().is_none());
    assert_eq!(fixture.engine.current_view(), None);
    assert!(fixture.engine.destroy().is_none());
}

#[test]
fn invalid_config_is_rejected() {
    let mut config = MapConfig::default();
    config.min_zoom = 20.0;
    assert_matches!(
        MapEngine::builder().with_config(config).build().err(),
        Some(MapError::InvalidConfig(_))
    );
}
