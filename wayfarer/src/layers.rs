//! Bookkeeping of the sources, layers and event subscriptions a component owns.

use ahash::AHashMap;
use geojson::FeatureCollection;

use crate::error::MapError;
use crate::surface::{EventKind, LayerId, LayerSpec, MapSurface, SourceId, SourceSpec, SubscriptionId};

/// Event subscriptions of one component, keyed by event kind and layer.
///
/// A component registers its handlers every time it renders and drops them every time it clears,
/// so the registry must not leak subscriptions between renders.
#[derive(Debug, Default)]
pub(crate) struct HandlerRegistry {
    handlers: AHashMap<(EventKind, Option<LayerId>), SubscriptionId>,
}

impl HandlerRegistry {
    /// Subscribes to the event, replacing the previous subscription with the same key.
    pub fn register(&mut self, surface: &mut dyn MapSurface, kind: EventKind, layer: Option<LayerId>) {
        let id = surface.subscribe(kind, layer);
        if let Some(previous) = self.handlers.insert((kind, layer), id) {
            surface.unsubscribe(previous);
        }
    }

    pub fn is_registered(&self, kind: EventKind, layer: Option<LayerId>) -> bool {
        self.handlers.contains_key(&(kind, layer))
    }

    /// Unsubscribes everything. Calling it twice is harmless.
    pub fn clear(&mut self, surface: &mut dyn MapSurface) {
        for (_, id) in self.handlers.drain() {
            surface.unsubscribe(id);
        }
    }
}

/// A source together with the layers drawn from it.
#[derive(Debug)]
pub(crate) struct LayerGroup {
    source: SourceId,
    source_spec: SourceSpec,
    layers: Vec<LayerSpec>,
    visible: bool,
}

impl LayerGroup {
    pub fn new(source: SourceId, source_spec: SourceSpec, layers: Vec<LayerSpec>) -> Self {
        Self {
            source,
            source_spec,
            layers,
            visible: true,
        }
    }

    pub fn source(&self) -> SourceId {
        self.source
    }

    /// Creates the source or replaces its data.
    pub fn set_data(
        &self,
        surface: &mut dyn MapSurface,
        data: FeatureCollection,
    ) -> Result<(), MapError> {
        if surface.has_source(self.source) {
            surface.set_source_data(self.source, data)
        } else {
            surface.add_source(self.source, self.source_spec, data)
        }
    }

    /// Adds every layer that is not on the map yet, honouring the visibility flag. Layers are
    /// slotted into [`LayerId::ALL`] order whatever the order of renders.
    pub fn add_layers(&self, surface: &mut dyn MapSurface) -> Result<(), MapError> {
        for spec in &self.layers {
            if surface.has_layer(spec.id) {
                continue;
            }

            let before = layer_above(&*surface, spec.id);
            surface.add_layer(*spec, before)?;
            if !self.visible {
                surface.set_layer_visibility(spec.id, false);
            }
        }

        Ok(())
    }

    /// Removes the layers, keeping the source.
    pub fn remove_layers(&self, surface: &mut dyn MapSurface) {
        for spec in self.layers.iter().rev() {
            if surface.has_layer(spec.id) {
                surface.remove_layer(spec.id);
            }
        }
    }

    /// Removes the layers and the source.
    pub fn remove_all(&self, surface: &mut dyn MapSurface) {
        self.remove_layers(surface);
        if surface.has_source(self.source) {
            surface.remove_source(self.source);
        }
    }

    pub fn set_visible(&mut self, surface: &mut dyn MapSurface, visible: bool) {
        self.visible = visible;
        for spec in &self.layers {
            if surface.has_layer(spec.id) {
                surface.set_layer_visibility(spec.id, visible);
            }
        }
    }
}

/// Lowest existing layer drawn above `id`.
fn layer_above(surface: &dyn MapSurface, id: LayerId) -> Option<LayerId> {
    LayerId::ALL
        .into_iter()
        .skip_while(|layer| *layer != id)
        .skip(1)
        .find(|layer| surface.has_layer(*layer))
}

/// Everything a view or an overlay puts on the map: its sources with their layers, and the
/// event subscriptions wired on render.
#[derive(Debug)]
pub(crate) struct LayerSet {
    groups: Vec<LayerGroup>,
    handlers: HandlerRegistry,
    interactive: Vec<LayerId>,
    visible: bool,
}

impl LayerSet {
    /// `interactive` layers get the enter/leave/click trio on render.
    pub fn new(groups: Vec<LayerGroup>, interactive: Vec<LayerId>) -> Self {
        Self {
            groups,
            handlers: HandlerRegistry::default(),
            interactive,
            visible: true,
        }
    }

    /// Starts hidden: layers are added hidden until [`LayerSet::set_visible`] shows them.
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        for group in &mut self.groups {
            group.visible = false;
        }
        self
    }

    pub fn group(&self, source: SourceId) -> Option<&LayerGroup> {
        self.groups.iter().find(|group| group.source() == source)
    }

    pub fn set_data(
        &self,
        surface: &mut dyn MapSurface,
        source: SourceId,
        data: FeatureCollection,
    ) -> Result<(), MapError> {
        match self.group(source) {
            Some(group) => group.set_data(surface, data),
            None => Err(MapError::NotFound(source.as_str().to_string())),
        }
    }

    /// Clears, then adds the layers of every source that exists and rewires the handlers.
    pub fn render(&mut self, surface: &mut dyn MapSurface) -> Result<(), MapError> {
        self.clear(surface);

        for group in &self.groups {
            if surface.has_source(group.source()) {
                group.add_layers(surface)?;
            }
        }

        for layer in &self.interactive {
            if !surface.has_layer(*layer) {
                continue;
            }

            for kind in [EventKind::MouseEnter, EventKind::MouseLeave, EventKind::Click] {
                self.handlers.register(surface, kind, Some(*layer));
            }
        }
        self.handlers.register(surface, EventKind::Zoom, None);

        Ok(())
    }

    /// Removes the layers and detaches the handlers. Sources stay.
    pub fn clear(&mut self, surface: &mut dyn MapSurface) {
        self.handlers.clear(surface);
        for group in self.groups.iter().rev() {
            group.remove_layers(surface);
        }
    }

    /// Removes everything, sources included.
    pub fn teardown(&mut self, surface: &mut dyn MapSurface) {
        self.handlers.clear(surface);
        for group in self.groups.iter().rev() {
            group.remove_all(surface);
        }
    }

    pub fn set_visible(&mut self, surface: &mut dyn MapSurface, visible: bool) {
        self.visible = visible;
        for group in &mut self.groups {
            group.set_visible(surface, visible);
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Returns true if a handler for the event is wired.
    pub fn listens(&self, kind: EventKind, layer: Option<LayerId>) -> bool {
        self.handlers.is_registered(kind, layer)
    }
}
