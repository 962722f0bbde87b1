//! Overlays drawn on top of the point views.
//!
//! Overlays are independent of the active view. Each one owns its sources and layers, and wires
//! the standard point handlers on its interactive layers when rendered.

use crate::error::MapError;
use crate::interaction::{point_layer_event, zoom_changed, Interaction, InteractionContext, LayerEvent};
use crate::layers::LayerSet;
use crate::surface::{EventKind, LayerId, MapSurface};

mod highlights;
mod tour;
mod user_location;

pub(crate) use highlights::Highlights;
pub(crate) use tour::Tour;
pub use tour::TourStop;
pub(crate) use user_location::UserLocation;

pub(crate) trait Overlay {
    fn layers(&self) -> &LayerSet;
    fn layers_mut(&mut self) -> &mut LayerSet;

    fn render(&mut self, surface: &mut dyn MapSurface) -> Result<(), MapError> {
        self.layers_mut().render(surface)
    }

    fn teardown(&mut self, surface: &mut dyn MapSurface) {
        self.layers_mut().teardown(surface);
    }

    fn set_visible(&mut self, surface: &mut dyn MapSurface, visible: bool) {
        self.layers_mut().set_visible(surface, visible);
    }

    fn dispatch(
        &self,
        layer: LayerId,
        event: &LayerEvent,
        context: &InteractionContext,
    ) -> Vec<Interaction> {
        if self.layers().listens(event.kind(), Some(layer)) {
            point_layer_event(event, context)
        } else {
            vec![]
        }
    }

    fn on_zoom(&self, context: &InteractionContext) -> Vec<Interaction> {
        if self.layers().listens(EventKind::Zoom, None) {
            zoom_changed(context)
        } else {
            vec![]
        }
    }
}
