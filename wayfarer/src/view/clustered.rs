use wayfarer_types::ScreenPoint;

use crate::config::ClusterConfig;
use crate::interaction::{point_layer_event, Interaction, InteractionContext, InputMode, LayerEvent};
use crate::layers::{LayerGroup, LayerSet};
use crate::surface::{
    ClusterInfo, ClusterOptions, Cursor, LayerFilter, LayerId, LayerKind, LayerSpec, MapSurface,
    RenderedFeature, SourceId, SourceSpec,
};
use crate::view::{PointView, ViewKind, ViewState};

/// Groups nearby points into clusters.
///
/// Clicking a cluster either zooms into it, or, when the cluster would not break up any further
/// before the maximum zoom, spiderfies its points around the cluster center.
#[derive(Debug)]
pub(crate) struct ClusteredView {
    state: ViewState,
    config: ClusterConfig,
    max_zoom: f64,
}

impl ClusteredView {
    pub fn new(config: ClusterConfig, max_zoom: f64) -> Self {
        let source = SourceId::Clustered;
        let group = LayerGroup::new(
            source,
            SourceSpec {
                cluster: Some(ClusterOptions {
                    radius: config.radius,
                    max_zoom: config.max_cluster_zoom,
                }),
            },
            vec![
                LayerSpec::new(LayerId::Clusters, source, LayerKind::Circle, LayerFilter::Clusters),
                LayerSpec::new(
                    LayerId::ClusterCount,
                    source,
                    LayerKind::Symbol,
                    LayerFilter::Clusters,
                ),
                LayerSpec::new(
                    LayerId::ClusteredPoints,
                    source,
                    LayerKind::Circle,
                    LayerFilter::Unclustered,
                ),
            ],
        );

        Self {
            state: ViewState::new(
                source,
                LayerSet::new(
                    vec![group],
                    vec![LayerId::Clusters, LayerId::ClusteredPoints],
                ),
            ),
            config,
            max_zoom,
        }
    }

    fn cluster_at(surface: &dyn MapSurface, point: ScreenPoint) -> Option<ClusterInfo> {
        surface
            .query_rendered_features(point, &[LayerId::Clusters])
            .into_iter()
            .find_map(|feature| match feature {
                RenderedFeature::Cluster(cluster) => Some(cluster),
                RenderedFeature::Point(_) => None,
            })
    }

    /// Decides between zooming into the cluster and spiderfying it.
    fn expand(&self, surface: &dyn MapSurface, point: ScreenPoint) -> Vec<Interaction> {
        let Some(cluster) = Self::cluster_at(surface, point) else {
            log::debug!("No cluster under the pointer at {point}");
            return vec![];
        };

        let source = self.state.source;
        let expansion = surface
            .cluster_children(source, cluster.id)
            .and_then(|children| {
                Ok((
                    children,
                    surface.cluster_expansion_zoom(source, cluster.id)?,
                ))
            });
        let (children, expansion_zoom) = match expansion {
            Ok(result) => result,
            Err(err) => {
                log::warn!("Failed to expand cluster {}: {err}", cluster.id);
                return vec![];
            }
        };

        let has_subclusters = children.iter().any(RenderedFeature::is_cluster);
        if has_subclusters || expansion_zoom < self.max_zoom - self.config.spiderfy_zoom_gap {
            return vec![Interaction::ZoomIntoCluster {
                center: cluster.position,
                zoom: expansion_zoom,
            }];
        }

        match surface.cluster_leaves(source, cluster.id, self.config.max_leaves) {
            Ok(leaves) => vec![Interaction::Spiderfy {
                center: cluster.position,
                leaves,
            }],
            Err(err) => {
                log::warn!("Failed to get points of cluster {}: {err}", cluster.id);
                vec![]
            }
        }
    }
}

impl PointView for ClusteredView {
    fn kind(&self) -> ViewKind {
        ViewKind::Clustered
    }

    fn state(&self) -> &ViewState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ViewState {
        &mut self.state
    }

    fn handle(
        &self,
        surface: &dyn MapSurface,
        layer: LayerId,
        event: &LayerEvent,
        context: &InteractionContext,
    ) -> Vec<Interaction> {
        if layer != LayerId::Clusters {
            return point_layer_event(event, context);
        }

        match event {
            LayerEvent::Enter(_) if context.input == InputMode::Pointer => {
                vec![Interaction::SetCursor(Cursor::Pointer)]
            }
            LayerEvent::Leave if context.input == InputMode::Pointer => {
                vec![Interaction::SetCursor(Cursor::Default)]
            }
            LayerEvent::Click { point, .. } => self.expand(surface, *point),
            _ => vec![],
        }
    }
}
