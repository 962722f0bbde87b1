//! Point views.
//!
//! A view is one of the mutually exclusive ways of drawing the location points. Each view owns
//! one source and a set of layers, and caches the bounds of the data it was last given. The
//! engine keeps every view alive for its whole lifetime and only switches which one is shown.

use maybe_sync::{MaybeSend, MaybeSync};
use serde::{Deserialize, Serialize};
use wayfarer_types::LngLatBounds;

use crate::error::MapError;
use crate::feature::LocationCollection;
use crate::interaction::{zoom_changed, Interaction, InteractionContext, LayerEvent};
use crate::layers::LayerSet;
use crate::surface::{EventKind, LayerId, MapSurface, SourceId};

mod clustered;
mod unclustered;

pub(crate) use clustered::ClusteredView;
pub(crate) use unclustered::UnclusteredView;

/// Name of a view.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    /// Points are grouped into clusters that expand on click.
    #[default]
    Clustered,
    /// Every point is drawn on its own.
    Unclustered,
}

impl ViewKind {
    /// All views.
    pub const ALL: [ViewKind; 2] = [ViewKind::Clustered, ViewKind::Unclustered];

    /// Name of the view.
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewKind::Clustered => "clustered",
            ViewKind::Unclustered => "unclustered",
        }
    }
}

/// Layers and cached data summary shared by all views.
#[derive(Debug)]
pub(crate) struct ViewState {
    layers: LayerSet,
    source: SourceId,
    bounds: Option<LngLatBounds>,
    feature_count: usize,
}

impl ViewState {
    pub fn new(source: SourceId, layers: LayerSet) -> Self {
        Self {
            layers: layers.hidden(),
            source,
            bounds: None,
            feature_count: 0,
        }
    }
}

/// Point drawing strategy.
pub(crate) trait PointView: MaybeSend + MaybeSync {
    fn kind(&self) -> ViewKind;
    fn state(&self) -> &ViewState;
    fn state_mut(&mut self) -> &mut ViewState;

    /// Handles an event on one of the view layers.
    fn handle(
        &self,
        surface: &dyn MapSurface,
        layer: LayerId,
        event: &LayerEvent,
        context: &InteractionContext,
    ) -> Vec<Interaction>;

    /// Installs the data and recomputes the bounds. Points outside `world` are drawn but do not
    /// count towards the bounds.
    fn set_data(
        &mut self,
        surface: &mut dyn MapSurface,
        data: &LocationCollection,
        world: &LngLatBounds,
    ) -> Result<(), MapError> {
        let summary = data.bounds_within(world);
        if summary.skipped > 0 {
            log::debug!(
                "{} view: {} of {} points are outside of the world bounds",
                self.kind().as_str(),
                summary.skipped,
                data.len()
            );
        }

        let state = self.state_mut();
        state.bounds = summary.bounds;
        state.feature_count = data.len();
        state.layers.set_data(surface, state.source, data.to_geojson())
    }

    /// Draws the view from scratch.
    fn render(&mut self, surface: &mut dyn MapSurface) -> Result<(), MapError> {
        let state = self.state_mut();
        state.layers.set_visible(surface, true);
        state.layers.render(surface)
    }

    fn teardown(&mut self, surface: &mut dyn MapSurface) {
        let state = self.state_mut();
        state.layers.teardown(surface);
        state.bounds = None;
        state.feature_count = 0;
    }

    fn set_visible(&mut self, surface: &mut dyn MapSurface, visible: bool) {
        self.state_mut().layers.set_visible(surface, visible);
    }

    fn is_visible(&self) -> bool {
        self.state().layers.is_visible()
    }

    fn bounds(&self) -> Option<LngLatBounds> {
        self.state().bounds
    }

    fn feature_count(&self) -> usize {
        self.state().feature_count
    }

    /// Routes a layer event to [`PointView::handle`] if the view listens to it.
    fn dispatch(
        &self,
        surface: &dyn MapSurface,
        layer: LayerId,
        event: &LayerEvent,
        context: &InteractionContext,
    ) -> Vec<Interaction> {
        if !self.state().layers.listens(event.kind(), Some(layer)) {
            return vec![];
        }

        self.handle(surface, layer, event, context)
    }

    fn on_zoom(&self, context: &InteractionContext) -> Vec<Interaction> {
        if self.state().layers.listens(EventKind::Zoom, None) {
            zoom_changed(context)
        } else {
            vec![]
        }
    }
}
