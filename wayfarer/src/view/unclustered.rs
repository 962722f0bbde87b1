use crate::interaction::{point_layer_event, Interaction, InteractionContext, LayerEvent};
use crate::layers::{LayerGroup, LayerSet};
use crate::surface::{
    LayerFilter, LayerId, LayerKind, LayerSpec, MapSurface, SourceId, SourceSpec,
};
use crate::view::{PointView, ViewKind, ViewState};

/// Draws every point on its own.
#[derive(Debug)]
pub(crate) struct UnclusteredView {
    state: ViewState,
}

impl UnclusteredView {
    pub fn new() -> Self {
        let source = SourceId::Unclustered;
        let group = LayerGroup::new(
            source,
            SourceSpec::default(),
            vec![LayerSpec::new(
                LayerId::UnclusteredPoints,
                source,
                LayerKind::Circle,
                LayerFilter::All,
            )],
        );

        Self {
            state: ViewState::new(
                source,
                LayerSet::new(vec![group], vec![LayerId::UnclusteredPoints]),
            ),
        }
    }
}

impl PointView for UnclusteredView {
    fn kind(&self) -> ViewKind {
        ViewKind::Unclustered
    }

    fn state(&self) -> &ViewState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ViewState {
        &mut self.state
    }

    fn handle(
        &self,
        _surface: &dyn MapSurface,
        _layer: LayerId,
        event: &LayerEvent,
        context: &InteractionContext,
    ) -> Vec<Interaction> {
        point_layer_event(event, context)
    }
}
