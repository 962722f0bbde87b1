use geojson::{FeatureCollection, JsonValue};

use crate::error::MapError;
use crate::feature::PointFeature;
use crate::layers::{LayerGroup, LayerSet};
use crate::overlay::Overlay;
use crate::surface::{
    LayerFilter, LayerId, LayerKind, LayerSpec, MapSurface, SourceId, SourceSpec,
};

/// Width of the ring drawn around a highlighted point, in pixels.
const RING_WIDTH: f64 = 4.0;

/// A few points drawn on top of the active view to draw attention to them.
#[derive(Debug)]
pub(crate) struct Highlights {
    layers: LayerSet,
}

impl Highlights {
    pub fn new() -> Self {
        let source = SourceId::Highlights;
        let group = LayerGroup::new(
            source,
            SourceSpec::default(),
            vec![LayerSpec::new(
                LayerId::HighlightPoints,
                source,
                LayerKind::Circle,
                LayerFilter::All,
            )],
        );

        Self {
            layers: LayerSet::new(vec![group], vec![LayerId::HighlightPoints]),
        }
    }

    pub fn set_data(
        &mut self,
        surface: &mut dyn MapSurface,
        items: &[PointFeature],
    ) -> Result<(), MapError> {
        let features = items
            .iter()
            .filter(|item| item.position.is_finite())
            .flat_map(stacked)
            .map(|feature| feature.to_geojson())
            .collect();

        self.layers.set_data(
            surface,
            SourceId::Highlights,
            FeatureCollection {
                bbox: None,
                features,
                foreign_members: None,
            },
        )?;
        self.render(surface)
    }
}

/// Outer ring and inner fill of a highlighted point. The ring goes first so the fill is drawn
/// over it.
fn stacked(item: &PointFeature) -> [PointFeature; 2] {
    let mut ring = item.clone();
    ring.properties.color = item.properties.stroke_color.clone();
    ring.properties.radius = item.properties.radius + RING_WIDTH;
    ring.properties.stroke_width = 0.0;
    ring.properties
        .extra
        .insert("part".to_string(), JsonValue::from("ring"));

    let mut fill = item.clone();
    fill.properties
        .extra
        .insert("part".to_string(), JsonValue::from("fill"));

    [ring, fill]
}

impl Overlay for Highlights {
    fn layers(&self) -> &LayerSet {
        &self.layers
    }

    fn layers_mut(&mut self) -> &mut LayerSet {
        &mut self.layers
    }
}
