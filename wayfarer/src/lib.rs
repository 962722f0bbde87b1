//! Wayfarer is the map view and state engine of a directory of cultural sites. It draws the
//! location points on a slippy map, clusters them, spiderfies clusters that cannot be broken up
//! by zooming, shows popups, and overlays highlighted items and guided tours.
//!
//! # Quick start
//!
//! ```no_run
//! use wayfarer::{LocationCollection, MapConfig, MapEngine, MapEvent, ViewKind};
//! # fn create_surface(_: wayfarer::MapOptions) -> Box<dyn wayfarer::MapSurface> { unimplemented!() }
//!
//! let config = MapConfig::default();
//! let mut engine = MapEngine::builder()
//!     .with_config(config.clone())
//!     .with_navigator(|path: &str| println!("go to {path}"))
//!     .build()
//!     .expect("valid configuration");
//!
//! engine.init(create_surface(config.map_options()));
//!
//! // Safe to call right away: queued until the map is ready.
//! engine.set_view(ViewKind::Unclustered);
//! engine.fit_to_current_view_bounds();
//!
//! engine.handle_event(MapEvent::StyleLoaded);
//! engine.on_locations_loaded(LocationCollection::from_json(r#"{"type": "FeatureCollection", "features": []}"#));
//! engine.advance(web_time::Instant::now());
//! ```
//!
//! # Main components
//!
//! * [`MapEngine`] owns everything and is the only thing the page talks to.
//! * [`MapSurface`] is the renderer as the engine sees it. The engine adds sources and layers to
//!   it, subscribes to its events and moves its camera. The host implements it on top of the
//!   actual map library and forwards the renderer events as [`MapEvent`]s.
//! * Point views ([`ViewKind`]) draw the locations either clustered or one by one. Only one view
//!   is shown at a time.
//! * Overlays draw highlights, the tour and the user position over the active view.
//! * The popup and the spiderfied cluster are short-lived and fade in and out. Their transitions
//!   are timed by the engine clock, advanced by the host with [`MapEngine::advance`].

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

mod cluster;
pub mod config;
mod engine;
pub mod error;
pub mod feature;
mod interaction;
mod layers;
pub mod layout;
mod messenger;
mod overlay;
mod popup;
mod scheduler;
pub mod surface;
mod view;

pub use cluster::{LegPlacement, Spiderfier};
pub use config::{MapConfig, MapOptions};
pub use engine::{MapEngine, MapEngineBuilder, MapEvent, Readiness};
pub use error::MapError;
pub use feature::{FeatureProperties, LocationCollection, PointFeature};
pub use interaction::{InputMode, LayerEvent};
pub use messenger::{
    DefaultLocalizer, DummyLocationSource, Label, LocationSource, Localizer, Navigator,
};
pub use overlay::TourStop;
pub use popup::PopupState;
pub use surface::MapSurface;
pub use view::ViewKind;

// Reexport wayfarer_types
pub use wayfarer_types;

#[cfg(test)]
mod tests;
