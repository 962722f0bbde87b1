use std::any::Any;
use std::collections::BTreeMap;

use ahash::AHashMap;
use geojson::FeatureCollection;
use wayfarer_types::{LngLat, LngLatBounds, ScreenPoint};

use super::{
    CameraMove, Cursor, EventKind, FitOptions, LayerId, LayerSpec, MapSurface, MarkerId,
    MarkerSpec, PopupSpec, RenderedFeature, SourceId, SourceSpec, SubscriptionId,
};
use crate::error::MapError;
use crate::feature::PointFeature;

/// Camera request recorded by [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum CameraCall {
    /// [`MapSurface::ease_to`] call.
    Ease(CameraMove),
    /// [`MapSurface::fit_bounds`] call.
    Fit(LngLatBounds, FitOptions),
}

/// Answers of the clustering index for one cluster.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptedCluster {
    /// Direct children.
    pub children: Vec<RenderedFeature>,
    /// Expansion zoom.
    pub expansion_zoom: f64,
    /// All points of the cluster.
    pub leaves: Vec<PointFeature>,
}

/// In-memory [`MapSurface`] that records everything the engine does to it.
///
/// Camera requests are applied instantly. Clustering answers and features under the pointer are
/// scripted by the test.
#[derive(Debug)]
pub struct RecordingSurface {
    zoom: f64,
    center: LngLat,
    container_width: f64,
    sources: BTreeMap<SourceId, (SourceSpec, FeatureCollection)>,
    layers: Vec<(LayerSpec, bool)>,
    subscriptions: AHashMap<SubscriptionId, (EventKind, Option<LayerId>)>,
    next_id: u64,
    cursor: Cursor,
    camera_calls: Vec<CameraCall>,
    markers: BTreeMap<MarkerId, (MarkerSpec, bool)>,
    popup: Option<(PopupSpec, bool)>,
    popup_attach_count: usize,
    layer_add_count: usize,
    rendered: Vec<(LayerId, RenderedFeature)>,
    clusters: AHashMap<u64, ScriptedCluster>,
}

impl RecordingSurface {
    /// Creates a new surface with the given zoom and container width.
    pub fn new(zoom: f64, container_width: f64) -> Self {
        Self {
            zoom,
            center: LngLat::default(),
            container_width,
            sources: BTreeMap::new(),
            layers: Vec::new(),
            subscriptions: AHashMap::new(),
            next_id: 1,
            cursor: Cursor::Default,
            camera_calls: Vec::new(),
            markers: BTreeMap::new(),
            popup: None,
            popup_attach_count: 0,
            layer_add_count: 0,
            rendered: Vec::new(),
            clusters: AHashMap::new(),
        }
    }

    /// Sets the zoom as if the user zoomed the map.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
    }

    /// Current camera center.
    pub fn center(&self) -> LngLat {
        self.center
    }

    /// Sets the container width.
    pub fn set_container_width(&mut self, width: f64) {
        self.container_width = width;
    }

    /// Makes `feature` appear under the pointer for queries of `layer`.
    pub fn script_rendered(&mut self, layer: LayerId, feature: RenderedFeature) {
        self.rendered.push((layer, feature));
    }

    /// Scripts the clustering index answers for a cluster.
    pub fn script_cluster(&mut self, cluster_id: u64, cluster: ScriptedCluster) {
        self.clusters.insert(cluster_id, cluster);
    }

    /// Data of a source.
    pub fn source_data(&self, id: SourceId) -> Option<&FeatureCollection> {
        self.sources.get(&id).map(|(_, data)| data)
    }

    /// Creation options of a source.
    pub fn source_spec(&self, id: SourceId) -> Option<&SourceSpec> {
        self.sources.get(&id).map(|(spec, _)| spec)
    }

    /// Ids of the features in a source.
    pub fn source_ids(&self, id: SourceId) -> Vec<String> {
        self.source_data(id)
            .map(|data| {
                data.features
                    .iter()
                    .filter_map(|f| f.property("id").and_then(|v| v.as_str()))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Layer ids in drawing order.
    pub fn layer_ids(&self) -> Vec<LayerId> {
        self.layers.iter().map(|(spec, _)| spec.id).collect()
    }

    /// Returns true if the layer exists and is visible.
    pub fn is_layer_visible(&self, id: LayerId) -> bool {
        self.layers
            .iter()
            .any(|(spec, visible)| spec.id == id && *visible)
    }

    /// Total number of `add_layer` calls.
    pub fn layer_add_count(&self) -> usize {
        self.layer_add_count
    }

    /// Active subscriptions.
    pub fn subscriptions(&self) -> Vec<(EventKind, Option<LayerId>)> {
        self.subscriptions.values().copied().collect()
    }

    /// Returns true if there is an active subscription of the kind on the layer.
    pub fn is_subscribed(&self, kind: EventKind, layer: Option<LayerId>) -> bool {
        self.subscriptions.values().any(|s| *s == (kind, layer))
    }

    /// Current cursor.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Camera requests in the order they were made.
    pub fn camera_calls(&self) -> &[CameraCall] {
        &self.camera_calls
    }

    /// Markers currently on the map with their visibility.
    pub fn markers(&self) -> Vec<(MarkerId, &MarkerSpec, bool)> {
        self.markers
            .iter()
            .map(|(id, (spec, visible))| (*id, spec, *visible))
            .collect()
    }

    /// Currently attached popup and its visibility.
    pub fn popup(&self) -> Option<(&PopupSpec, bool)> {
        self.popup.as_ref().map(|(spec, visible)| (spec, *visible))
    }

    /// Number of times a popup was attached.
    pub fn popup_attach_count(&self) -> usize {
        self.popup_attach_count
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn cluster(&self, source: SourceId, cluster_id: u64) -> Result<&ScriptedCluster, MapError> {
        if !self.has_source(source) {
            return Err(MapError::NotFound(source.as_str().to_string()));
        }

        self.clusters
            .get(&cluster_id)
            .ok_or_else(|| MapError::NotFound(format!("cluster {cluster_id}")))
    }
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new(4.0, 1280.0)
    }
}

impl MapSurface for RecordingSurface {
    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn container_width(&self) -> f64 {
        self.container_width
    }

    fn has_source(&self, id: SourceId) -> bool {
        self.sources.contains_key(&id)
    }

    fn add_source(
        &mut self,
        id: SourceId,
        spec: SourceSpec,
        data: FeatureCollection,
    ) -> Result<(), MapError> {
        if self.sources.contains_key(&id) {
            return Err(MapError::Surface(format!(
                "source {} already exists",
                id.as_str()
            )));
        }

        self.sources.insert(id, (spec, data));
        Ok(())
    }

    fn set_source_data(&mut self, id: SourceId, data: FeatureCollection) -> Result<(), MapError> {
        match self.sources.get_mut(&id) {
            Some(entry) => {
                entry.1 = data;
                Ok(())
            }
            None => Err(MapError::NotFound(id.as_str().to_string())),
        }
    }

    fn remove_source(&mut self, id: SourceId) {
        self.sources.remove(&id);
    }

    fn has_layer(&self, id: LayerId) -> bool {
        self.layers.iter().any(|(spec, _)| spec.id == id)
    }

    fn add_layer(&mut self, spec: LayerSpec, before: Option<LayerId>) -> Result<(), MapError> {
        if self.has_layer(spec.id) {
            return Err(MapError::Surface(format!(
                "layer {} already exists",
                spec.id.as_str()
            )));
        }
        if !self.has_source(spec.source) {
            return Err(MapError::NotFound(spec.source.as_str().to_string()));
        }

        let index = before
            .and_then(|before| self.layers.iter().position(|(layer, _)| layer.id == before))
            .unwrap_or(self.layers.len());
        self.layers.insert(index, (spec, true));
        self.layer_add_count += 1;
        Ok(())
    }

    fn remove_layer(&mut self, id: LayerId) {
        self.layers.retain(|(spec, _)| spec.id != id);
    }

    fn set_layer_visibility(&mut self, id: LayerId, visible: bool) {
        for (spec, is_visible) in &mut self.layers {
            if spec.id == id {
                *is_visible = visible;
            }
        }
    }

    fn subscribe(&mut self, kind: EventKind, layer: Option<LayerId>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id());
        self.subscriptions.insert(id, (kind, layer));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscriptions.remove(&id);
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    fn ease_to(&mut self, camera: CameraMove) {
        if let Some(center) = camera.center {
            self.center = center;
        }
        if let Some(zoom) = camera.zoom {
            self.zoom = zoom;
        }
        self.camera_calls.push(CameraCall::Ease(camera));
    }

    fn fit_bounds(&mut self, bounds: LngLatBounds, options: FitOptions) {
        self.center = bounds.center();
        self.camera_calls.push(CameraCall::Fit(bounds, options));
    }

    fn query_rendered_features(
        &self,
        _point: ScreenPoint,
        layers: &[LayerId],
    ) -> Vec<RenderedFeature> {
        self.rendered
            .iter()
            .filter(|(layer, _)| layers.contains(layer) && self.is_layer_visible(*layer))
            .map(|(_, feature)| feature.clone())
            .collect()
    }

    fn cluster_children(
        &self,
        source: SourceId,
        cluster_id: u64,
    ) -> Result<Vec<RenderedFeature>, MapError> {
        Ok(self.cluster(source, cluster_id)?.children.clone())
    }

    fn cluster_expansion_zoom(&self, source: SourceId, cluster_id: u64) -> Result<f64, MapError> {
        Ok(self.cluster(source, cluster_id)?.expansion_zoom)
    }

    fn cluster_leaves(
        &self,
        source: SourceId,
        cluster_id: u64,
        limit: usize,
    ) -> Result<Vec<PointFeature>, MapError> {
        Ok(self
            .cluster(source, cluster_id)?
            .leaves
            .iter()
            .take(limit)
            .cloned()
            .collect())
    }

    fn add_marker(&mut self, marker: MarkerSpec) -> MarkerId {
        let id = MarkerId(self.next_id());
        self.markers.insert(id, (marker, false));
        id
    }

    fn set_marker_visible(&mut self, id: MarkerId, visible: bool) {
        if let Some(entry) = self.markers.get_mut(&id) {
            entry.1 = visible;
        }
    }

    fn remove_marker(&mut self, id: MarkerId) {
        self.markers.remove(&id);
    }

    fn attach_popup(&mut self, popup: PopupSpec) {
        self.popup = Some((popup, false));
        self.popup_attach_count += 1;
    }

    fn set_popup_visible(&mut self, visible: bool) {
        if let Some(entry) = &mut self.popup {
            entry.1 = visible;
        }
    }

    fn detach_popup(&mut self) {
        self.popup = None;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
