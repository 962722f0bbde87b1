//! The seam between the engine and the slippy-map renderer.
//!
//! The engine never touches the renderer directly. Everything it needs (sources, layers,
//! event subscriptions, camera, DOM markers and the popup) goes through the [`MapSurface`]
//! trait. A browser build implements it on top of the JS map library; tests use the in-memory
//! [`RecordingSurface`].
//!
//! Sources and layers the engine creates are a closed set, described by [`SourceId`] and
//! [`LayerId`]. Every layer belongs to exactly one component of the engine (see
//! [`LayerOwner`]), and only that component adds or removes it.

use std::any::Any;
use std::time::Duration;

use geojson::FeatureCollection;
use maybe_sync::{MaybeSend, MaybeSync};
use wayfarer_types::{LngLat, LngLatBounds, Padding, ScreenOffset, ScreenPoint};

use crate::error::MapError;
use crate::feature::PointFeature;
use crate::view::ViewKind;

#[cfg(any(test, feature = "_tests"))]
mod recording;
#[cfg(any(test, feature = "_tests"))]
pub use recording::{CameraCall, RecordingSurface, ScriptedCluster};

/// GeoJSON sources owned by the engine.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceId {
    /// Points of the clustered view. The renderer clusters this source.
    Clustered,
    /// Points of the unclustered view.
    Unclustered,
    /// Highlighted locations.
    Highlights,
    /// Line of a guided tour.
    TourPath,
    /// Numbered stops of a guided tour.
    TourStops,
    /// Position of the user.
    UserLocation,
}

impl SourceId {
    /// Name of the source in the renderer.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Clustered => "locations-clustered",
            SourceId::Unclustered => "locations-unclustered",
            SourceId::Highlights => "highlights",
            SourceId::TourPath => "tour-path",
            SourceId::TourStops => "tour-stops",
            SourceId::UserLocation => "user-location",
        }
    }
}

/// Layers owned by the engine.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerId {
    /// Cluster circles of the clustered view.
    Clusters,
    /// Point counts drawn over cluster circles.
    ClusterCount,
    /// Single points of the clustered view.
    ClusteredPoints,
    /// Points of the unclustered view.
    UnclusteredPoints,
    /// Ring and fill of highlighted locations.
    HighlightPoints,
    /// Tour line.
    TourPath,
    /// Tour stop circles.
    TourStops,
    /// Tour stop ordinals.
    TourStopNumbers,
    /// Halo around the user position.
    UserLocationHalo,
    /// Dot at the user position.
    UserLocationDot,
}

/// Component of the engine that owns a layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LayerOwner {
    /// One of the point views.
    View(ViewKind),
    /// Highlights overlay.
    Highlights,
    /// Tour overlay.
    Tour,
    /// User location overlay.
    UserLocation,
}

impl LayerId {
    /// Every layer in drawing order, bottom to top. Overlays are drawn over the point views.
    pub const ALL: [LayerId; 10] = [
        LayerId::Clusters,
        LayerId::ClusterCount,
        LayerId::ClusteredPoints,
        LayerId::UnclusteredPoints,
        LayerId::HighlightPoints,
        LayerId::TourPath,
        LayerId::TourStops,
        LayerId::TourStopNumbers,
        LayerId::UserLocationHalo,
        LayerId::UserLocationDot,
    ];

    /// Name of the layer in the renderer.
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerId::Clusters => "clusters",
            LayerId::ClusterCount => "cluster-count",
            LayerId::ClusteredPoints => "clustered-points",
            LayerId::UnclusteredPoints => "unclustered-points",
            LayerId::HighlightPoints => "highlight-points",
            LayerId::TourPath => "tour-path",
            LayerId::TourStops => "tour-stops",
            LayerId::TourStopNumbers => "tour-stop-numbers",
            LayerId::UserLocationHalo => "user-location-halo",
            LayerId::UserLocationDot => "user-location-dot",
        }
    }

    /// Component that adds, removes and handles events of the layer.
    pub fn owner(&self) -> LayerOwner {
        match self {
            LayerId::Clusters | LayerId::ClusterCount | LayerId::ClusteredPoints => {
                LayerOwner::View(ViewKind::Clustered)
            }
            LayerId::UnclusteredPoints => LayerOwner::View(ViewKind::Unclustered),
            LayerId::HighlightPoints => LayerOwner::Highlights,
            LayerId::TourPath | LayerId::TourStops | LayerId::TourStopNumbers => LayerOwner::Tour,
            LayerId::UserLocationHalo | LayerId::UserLocationDot => LayerOwner::UserLocation,
        }
    }
}

/// Source creation options.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct SourceSpec {
    /// Clustering options. `None` for plain sources.
    pub cluster: Option<ClusterOptions>,
}

/// Clustering options of a source.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClusterOptions {
    /// Clustering radius in pixels.
    pub radius: f64,
    /// Zoom above which points are not clustered.
    pub max_zoom: f64,
}

/// How a layer draws its source.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LayerKind {
    /// Circles styled by feature properties (`color`, `radius`, `strokeColor`, `strokeWidth`).
    Circle,
    /// Lines.
    Line,
    /// Text labels.
    Symbol,
}

/// Which features of the source a layer draws.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LayerFilter {
    /// All features.
    All,
    /// Only cluster features.
    Clusters,
    /// Only features that are not clusters.
    Unclustered,
}

/// Layer creation options.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LayerSpec {
    /// Layer id.
    pub id: LayerId,
    /// Source the layer draws.
    pub source: SourceId,
    /// Drawing kind.
    pub kind: LayerKind,
    /// Feature filter.
    pub filter: LayerFilter,
}

impl LayerSpec {
    /// Creates a new layer spec.
    pub fn new(id: LayerId, source: SourceId, kind: LayerKind, filter: LayerFilter) -> Self {
        Self {
            id,
            source,
            kind,
            filter,
        }
    }
}

/// Events a component can subscribe to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Pointer entered a feature of a layer.
    MouseEnter,
    /// Pointer left a layer.
    MouseLeave,
    /// Click or tap on a layer.
    Click,
    /// Map zoom changed.
    Zoom,
}

/// Handle of an event subscription.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Handle of a DOM marker.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

/// Mouse cursor over the map canvas.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Cursor {
    /// Default cursor.
    #[default]
    Default,
    /// Pointer cursor, shown over interactive features.
    Pointer,
}

/// Who started a camera movement.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MotionOrigin {
    /// The user (drag, wheel, pinch).
    User,
    /// The engine (pan, fit, zoom clamp, cluster expansion).
    Programmatic,
}

/// Animated camera change.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraMove {
    /// New center. `None` keeps the current one.
    pub center: Option<LngLat>,
    /// New zoom. `None` keeps the current one.
    pub zoom: Option<f64>,
    /// Pixel offset of the target from the viewport center.
    pub offset: ScreenOffset,
    /// Animation duration.
    pub duration: Duration,
    /// Tag forwarded to the move events of this animation.
    pub origin: MotionOrigin,
}

/// Options of [`MapSurface::fit_bounds`].
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    /// Viewport padding.
    pub padding: Padding,
    /// Maximum zoom of the fitted camera.
    pub max_zoom: f64,
    /// Animation duration.
    pub duration: Duration,
    /// Tag forwarded to the move events of this animation.
    pub origin: MotionOrigin,
}

/// Cluster aggregated by the renderer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClusterInfo {
    /// Id of the cluster in the clustering index.
    pub id: u64,
    /// Number of points in the cluster.
    pub point_count: usize,
    /// Position of the cluster.
    pub position: LngLat,
}

/// Feature found under the pointer.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderedFeature {
    /// A single location.
    Point(PointFeature),
    /// A cluster of locations.
    Cluster(ClusterInfo),
}

impl RenderedFeature {
    /// Position of the feature.
    pub fn position(&self) -> LngLat {
        match self {
            RenderedFeature::Point(feature) => feature.position,
            RenderedFeature::Cluster(cluster) => cluster.position,
        }
    }

    /// Returns true if the feature is a cluster.
    pub fn is_cluster(&self) -> bool {
        matches!(self, RenderedFeature::Cluster(_))
    }
}

/// DOM marker of a spiderfied cluster leg.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    /// Geographic anchor (the cluster position).
    pub anchor: LngLat,
    /// Pixel offset of the leg end from the anchor.
    pub offset: ScreenOffset,
    /// Leg angle in radians, used to rotate the leg line.
    pub leg_angle: f64,
    /// Leg length in pixels.
    pub leg_length: f64,
    /// Fill color of the point.
    pub color: String,
    /// Stroke color of the point.
    pub stroke_color: String,
    /// Radius of the point.
    pub radius: f64,
    /// Stroke width of the point.
    pub stroke_width: f64,
}

/// Content of the popup.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupContent {
    /// Title of the location.
    pub title: String,
    /// Accent color.
    pub color: String,
    /// Label of the "view details" affordance. `None` if the popup has nothing to navigate to.
    pub details_label: Option<String>,
    /// Label of the explicit close affordance. Only present on touch devices.
    pub close_label: Option<String>,
}

/// Popup placement and content.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupSpec {
    /// Geographic anchor.
    pub anchor: LngLat,
    /// Pixel offset from the anchor.
    pub offset: ScreenOffset,
    /// Content.
    pub content: PopupContent,
}

/// Slippy-map renderer as seen by the engine.
///
/// Implementations must tolerate repeated removal of things that are already gone: the engine
/// tears down before every render and relies on teardown being idempotent.
pub trait MapSurface: MaybeSend + MaybeSync {
    /// Current zoom level.
    fn zoom(&self) -> f64;
    /// Width of the map container in CSS pixels.
    fn container_width(&self) -> f64;

    /// Returns true if the source exists.
    fn has_source(&self, id: SourceId) -> bool;
    /// Creates a GeoJSON source.
    fn add_source(
        &mut self,
        id: SourceId,
        spec: SourceSpec,
        data: FeatureCollection,
    ) -> Result<(), MapError>;
    /// Replaces the data of an existing source.
    fn set_source_data(&mut self, id: SourceId, data: FeatureCollection) -> Result<(), MapError>;
    /// Removes a source. Does nothing if there is no such source.
    fn remove_source(&mut self, id: SourceId);

    /// Returns true if the layer exists.
    fn has_layer(&self, id: LayerId) -> bool;
    /// Adds a layer right below `before`, or on top of the existing ones if `before` is `None`.
    fn add_layer(&mut self, spec: LayerSpec, before: Option<LayerId>) -> Result<(), MapError>;
    /// Removes a layer. Does nothing if there is no such layer.
    fn remove_layer(&mut self, id: LayerId);
    /// Shows or hides a layer without removing it.
    fn set_layer_visibility(&mut self, id: LayerId, visible: bool);

    /// Starts forwarding events of the given kind. Layer events need a layer, map events don't.
    fn subscribe(&mut self, kind: EventKind, layer: Option<LayerId>) -> SubscriptionId;
    /// Stops forwarding events of a subscription.
    fn unsubscribe(&mut self, id: SubscriptionId);
    /// Changes the cursor over the map canvas.
    fn set_cursor(&mut self, cursor: Cursor);

    /// Animates the camera.
    fn ease_to(&mut self, camera: CameraMove);
    /// Animates the camera so that the bounds fill the padded viewport.
    fn fit_bounds(&mut self, bounds: LngLatBounds, options: FitOptions);

    /// Features of the given layers under the screen point, topmost first.
    fn query_rendered_features(&self, point: ScreenPoint, layers: &[LayerId])
        -> Vec<RenderedFeature>;
    /// Direct children of a cluster.
    fn cluster_children(
        &self,
        source: SourceId,
        cluster_id: u64,
    ) -> Result<Vec<RenderedFeature>, MapError>;
    /// Zoom level at which the cluster splits.
    fn cluster_expansion_zoom(&self, source: SourceId, cluster_id: u64) -> Result<f64, MapError>;
    /// Individual points of a cluster, at most `limit` of them.
    fn cluster_leaves(
        &self,
        source: SourceId,
        cluster_id: u64,
        limit: usize,
    ) -> Result<Vec<PointFeature>, MapError>;

    /// Creates a DOM marker. Markers are created faded out.
    fn add_marker(&mut self, marker: MarkerSpec) -> MarkerId;
    /// Fades a marker in or out.
    fn set_marker_visible(&mut self, id: MarkerId, visible: bool);
    /// Removes a marker.
    fn remove_marker(&mut self, id: MarkerId);

    /// Attaches the popup to the map. Replaces the previous popup if there is one. The popup is
    /// attached faded out.
    fn attach_popup(&mut self, popup: PopupSpec);
    /// Fades the popup in or out.
    fn set_popup_visible(&mut self, visible: bool);
    /// Removes the popup from the map.
    fn detach_popup(&mut self);

    /// A map stores the surface as a trait object. This method can be used to convert it into
    /// the concrete type.
    fn as_any(&self) -> &dyn Any;
    /// A map stores the surface as a trait object. This method can be used to convert it into
    /// the concrete type.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
