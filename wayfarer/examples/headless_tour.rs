//! Drives the engine through a guided tour without a browser.
//!
//! Run with `RUST_LOG=debug cargo run --example headless_tour --features _tests`.

use std::time::Duration;

use wayfarer::feature::{encode_localized, FeatureProperties};
use wayfarer::surface::{LayerId, MapSurface, RecordingSurface, RenderedFeature, SourceId};
use wayfarer::wayfarer_types::LngLat;
use wayfarer::{
    LayerEvent, LocationCollection, MapConfig, MapEngine, MapEvent, PointFeature, TourStop,
    ViewKind,
};
use web_time::Instant;

fn location(id: &str, name: &str, slug: &str, lng: f64, lat: f64) -> PointFeature {
    PointFeature::new(
        id,
        LngLat::new(lng, lat),
        FeatureProperties {
            color: "#8c2f39".to_string(),
            stroke_color: "#ffffff".to_string(),
            radius: 7.0,
            stroke_width: 2.0,
            title: encode_localized([("en", name)]),
            slug: encode_localized([("en", slug)]),
            ..Default::default()
        },
    )
}

fn main() {
    env_logger::init();

    let sites = vec![
        location("loc-1", "Cloth Hall", "cloth-hall", 3.2247, 51.2093),
        location("loc-2", "Belfry", "belfry", 3.2248, 51.2085),
        location("loc-3", "Beguinage", "beguinage", 3.2226, 51.2019),
        location("loc-4", "Groeninge Museum", "groeninge-museum", 3.2273, 51.2051),
    ];

    let config = MapConfig::default();
    let start = Instant::now();
    let mut engine = MapEngine::builder()
        .with_config(config.clone())
        .with_navigator(|path: &str| println!("router: navigate to {path}"))
        .with_start_time(start)
        .build()
        .expect("default configuration is valid");

    let options = config.map_options();
    println!(
        "creating map at {:?}, zoom {} ({}..{})",
        options.center, options.zoom, options.min_zoom, options.max_zoom
    );
    engine.init(Box::new(RecordingSurface::new(options.zoom, 1440.0)));

    // Requested before the map is ready, run once it is.
    engine.set_view(ViewKind::Unclustered);
    engine.set_tour_path(sites.iter().map(|site| site.position).collect());
    engine.set_tour_stops(
        sites
            .iter()
            .enumerate()
            .map(|(i, site)| TourStop {
                feature: site.clone(),
                number: i as u32 + 1,
                highlight: i == 1,
            })
            .collect(),
    );
    engine.fit_to_current_view_bounds();
    println!("queued {} operations", engine.pending_jobs());

    engine.handle_event(MapEvent::StyleLoaded);
    engine.on_locations_loaded(Ok(LocationCollection::new(sites.clone())));
    engine.advance(start + Duration::from_millis(200));
    println!("ready: {}, view: {:?}", engine.is_ready(), engine.current_view());

    engine.handle_event(MapEvent::Layer {
        layer: LayerId::TourStops,
        event: LayerEvent::Enter(RenderedFeature::Point(sites[1].clone())),
    });
    engine.advance(start + Duration::from_millis(250));
    println!("popup: {:?}", engine.popup_state());

    engine.handle_event(MapEvent::PopupViewDetails);

    let surface = engine.destroy().expect("engine was initialized");
    if let Some(surface) = surface.as_any().downcast_ref::<RecordingSurface>() {
        println!("camera requests: {:#?}", surface.camera_calls());
        println!(
            "tour stops left on the map: {}",
            surface.source_ids(SourceId::TourStops).len()
        );
    }
}
