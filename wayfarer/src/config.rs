//! Engine configuration.
//!
//! Every value has a default, so a configuration file only needs to list what differs:
//!
//! ```json
//! {
//!   "styleUrl": "https://tiles.example.org/style.json",
//!   "locationsUrl": "/api/locations.geojson",
//!   "center": { "lng": 4.35, "lat": 50.85 },
//!   "timings": { "settleDelay": 150 }
//! }
//! ```
//!
//! Durations are written in milliseconds.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use wayfarer_types::{LngLat, LngLatBounds};

use crate::error::MapError;
use crate::view::ViewKind;

/// Top level configuration of a [`MapEngine`](crate::MapEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapConfig {
    /// URL of the renderer style document.
    pub style_url: String,
    /// URL of the GeoJSON feature collection with all locations.
    pub locations_url: String,
    /// Initial camera center.
    pub center: LngLat,
    /// Initial zoom level.
    pub zoom: f64,
    /// Minimum zoom level allowed by the map.
    pub min_zoom: f64,
    /// Maximum zoom level allowed by the map. User gestures that end above `max_zoom - 1` are
    /// animated back to `max_zoom - 1`.
    pub max_zoom: f64,
    /// Points outside of these bounds are ignored when the camera is framed.
    pub world_bounds: LngLatBounds,
    /// View activated when the engine becomes ready.
    pub default_view: ViewKind,
    /// Maximum zoom used when the camera is fitted to the view bounds.
    pub fit_max_zoom: f64,
    /// Language used when a localized text has no entry for the active language.
    pub fallback_language: String,
    /// Timing contract of the transitions.
    pub timings: Timings,
    /// Cluster expansion strategy.
    pub cluster: ClusterConfig,
    /// Geometry of spiderfied cluster legs.
    pub spiderfier: SpiderfierConfig,
    /// Popup behaviour.
    pub popup: PopupConfig,
    /// Navigation to location pages.
    pub navigation: NavigationConfig,
    /// Retry policy of the base data fetch.
    pub fetch: FetchConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            style_url: String::new(),
            locations_url: "/api/locations.geojson".to_string(),
            center: LngLat::new(10.0, 50.0),
            zoom: 4.0,
            min_zoom: 2.0,
            max_zoom: 19.0,
            world_bounds: LngLatBounds::WORLD,
            default_view: ViewKind::Clustered,
            fit_max_zoom: 15.0,
            fallback_language: "en".to_string(),
            timings: Timings::default(),
            cluster: ClusterConfig::default(),
            spiderfier: SpiderfierConfig::default(),
            popup: PopupConfig::default(),
            navigation: NavigationConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

impl MapConfig {
    /// Parses the configuration from a JSON document and validates it.
    pub fn from_json(json: &str) -> Result<Self, MapError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the values are consistent with each other.
    pub fn validate(&self) -> Result<(), MapError> {
        if self.min_zoom.is_nan() || self.max_zoom.is_nan() || self.min_zoom > self.max_zoom {
            return Err(MapError::InvalidConfig(format!(
                "min zoom {} is greater than max zoom {}",
                self.min_zoom, self.max_zoom
            )));
        }

        if !self.center.is_finite() {
            return Err(MapError::InvalidConfig("center is not finite".to_string()));
        }

        if self.fetch.max_attempts == 0 {
            return Err(MapError::InvalidConfig(
                "fetch must be attempted at least once".to_string(),
            ));
        }

        Ok(())
    }

    /// Options the map surface is created with.
    pub fn map_options(&self) -> MapOptions {
        MapOptions {
            style_url: self.style_url.clone(),
            center: self.center,
            zoom: self.zoom.clamp(self.min_zoom, self.max_zoom),
            min_zoom: self.min_zoom,
            max_zoom: self.max_zoom,
        }
    }

    /// Zoom level above which user gestures are animated back.
    pub fn zoom_clamp(&self) -> f64 {
        self.max_zoom - 1.0
    }
}

/// Options given to the map surface factory in [`MapEngine::init`](crate::MapEngine::init).
#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    /// URL of the renderer style.
    pub style_url: String,
    /// Initial center.
    pub center: LngLat,
    /// Initial zoom.
    pub zoom: f64,
    /// Minimum zoom.
    pub min_zoom: f64,
    /// Maximum zoom.
    pub max_zoom: f64,
}

/// Delays of the transitions.
///
/// The underlying renderer applies styles asynchronously, so several steps must wait for it
/// before they can proceed. These values are part of the behaviour of the engine.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Timings {
    /// Delay between the engine becoming ready and queued jobs being flushed.
    #[serde(with = "millis")]
    pub settle_delay: Duration,
    /// Delay between a view switch and rendering of the new view.
    #[serde(with = "millis")]
    pub render_delay: Duration,
    /// Delay between attaching a popup and starting its fade-in.
    #[serde(with = "millis")]
    pub popup_fade_in: Duration,
    /// Grace period between a hide request and the popup fade-out.
    #[serde(with = "millis")]
    pub popup_hide_delay: Duration,
    /// Duration of the popup fade-out transition.
    #[serde(with = "millis")]
    pub popup_fade_out: Duration,
    /// Delay between creating cluster legs and starting their fade-in.
    #[serde(with = "millis")]
    pub legs_fade_in: Duration,
    /// Duration of the cluster legs fade transition.
    #[serde(with = "millis")]
    pub legs_fade: Duration,
    /// Duration of camera animations.
    #[serde(with = "millis")]
    pub camera: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(100),
            render_delay: Duration::from_millis(50),
            popup_fade_in: Duration::from_millis(10),
            popup_hide_delay: Duration::from_millis(150),
            popup_fade_out: Duration::from_millis(200),
            legs_fade_in: Duration::from_millis(10),
            legs_fade: Duration::from_millis(250),
            camera: Duration::from_millis(600),
        }
    }
}

/// Cluster click strategy.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusterConfig {
    /// Clustering radius in pixels.
    pub radius: f64,
    /// Zoom above which the renderer stops clustering points.
    pub max_cluster_zoom: f64,
    /// Zoom the camera moves to before a cluster is spiderfied.
    pub leaf_zoom: f64,
    /// A cluster whose expansion zoom is lower than `max_zoom - spiderfy_zoom_gap` is zoomed
    /// into instead of being spiderfied.
    pub spiderfy_zoom_gap: f64,
    /// Maximum number of leaves shown around a spiderfied cluster.
    pub max_leaves: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            radius: 50.0,
            max_cluster_zoom: 17.0,
            leaf_zoom: 17.0,
            spiderfy_zoom_gap: 2.0,
            max_leaves: 100,
        }
    }
}

/// Leg geometry of spiderfied clusters, in pixels.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpiderfierConfig {
    /// Leaf count from which legs are placed on a spiral instead of a circle.
    pub circle_spiral_switchover: usize,
    /// Distance between neighbouring legs on a circle.
    pub circle_foot_separation: f64,
    /// Distance between neighbouring legs on a spiral.
    pub spiral_foot_separation: f64,
    /// Length of the first spiral leg.
    pub spiral_length_start: f64,
    /// Growth of spiral legs per turn.
    pub spiral_length_factor: f64,
}

impl Default for SpiderfierConfig {
    fn default() -> Self {
        Self {
            circle_spiral_switchover: 12,
            circle_foot_separation: 25.0,
            spiral_foot_separation: 28.0,
            spiral_length_start: 15.0,
            spiral_length_factor: 4.0,
        }
    }
}

/// Popup behaviour.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PopupConfig {
    /// An open popup is hidden when the zoom differs from the zoom it was opened at by more
    /// than this value.
    pub zoom_tolerance: f64,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            zoom_tolerance: 1.0,
        }
    }
}

/// Navigation to location pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NavigationConfig {
    /// Path template. `{lang}` is replaced with the active language and `{slug}` with the slug
    /// of the location.
    pub path_template: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            path_template: "/{lang}/locations/{slug}".to_string(),
        }
    }
}

/// Retry policy of the base data fetch.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FetchConfig {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry. Every next retry waits twice as long.
    #[serde(with = "millis")]
    pub initial_backoff: Duration,
    /// Upper limit of the retry delay.
    #[serde(with = "millis")]
    pub max_backoff: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl FetchConfig {
    /// Delay before the next attempt after `failed_attempts` attempts have failed.
    pub fn backoff(&self, failed_attempts: u32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1 << exponent)
            .min(self.max_backoff)
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = MapConfig::from_json(
            r#"{
                "locationsUrl": "/data/sites.geojson",
                "maxZoom": 18,
                "defaultView": "unclustered",
                "timings": { "settleDelay": 250 }
            }"#,
        )
        .expect("valid config");

        assert_eq!(config.locations_url, "/data/sites.geojson");
        assert_eq!(config.max_zoom, 18.0);
        assert_eq!(config.zoom_clamp(), 17.0);
        assert_eq!(config.default_view, ViewKind::Unclustered);
        assert_eq!(config.timings.settle_delay, Duration::from_millis(250));
        assert_eq!(config.timings.render_delay, Duration::from_millis(50));
        assert_eq!(config.spiderfier.circle_spiral_switchover, 12);
    }

    #[test]
    fn rejects_inverted_zoom_range() {
        let result = MapConfig::from_json(r#"{ "minZoom": 12, "maxZoom": 4 }"#);
        assert!(matches!(result, Err(MapError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            MapConfig::from_json("{ not json"),
            Err(MapError::Decoding(_))
        ));
    }

    #[test]
    fn backoff_doubles_up_to_limit() {
        let fetch = FetchConfig::default();
        assert_eq!(fetch.backoff(1), Duration::from_secs(1));
        assert_eq!(fetch.backoff(2), Duration::from_secs(2));
        assert_eq!(fetch.backoff(3), Duration::from_secs(4));
        assert_eq!(fetch.backoff(10), Duration::from_secs(8));
    }

    #[test]
    fn initial_zoom_is_clamped() {
        let config = MapConfig {
            zoom: 25.0,
            ..Default::default()
        };
        assert_eq!(config.map_options().zoom, 19.0);
    }

    #[test]
    fn durations_roundtrip_as_millis() {
        let json = serde_json::to_value(Timings::default()).expect("serializable");
        assert_eq!(json["popupFadeOut"], 200);
    }
}
