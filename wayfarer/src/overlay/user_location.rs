use geojson::FeatureCollection;
use wayfarer_types::LngLat;

use crate::error::MapError;
use crate::feature::{encode_localized, FeatureProperties, PointFeature};
use crate::layers::{LayerGroup, LayerSet};
use crate::overlay::Overlay;
use crate::surface::{
    LayerFilter, LayerId, LayerKind, LayerSpec, MapSurface, SourceId, SourceSpec,
};

const USER_LOCATION_ID: &str = "user-location";
const USER_LOCATION_COLOR: &str = "#1a73e8";

/// Position of the visitor: a dot with a translucent halo.
#[derive(Debug)]
pub(crate) struct UserLocation {
    layers: LayerSet,
}

impl UserLocation {
    pub fn new() -> Self {
        let source = SourceId::UserLocation;
        let group = LayerGroup::new(
            source,
            SourceSpec::default(),
            vec![
                LayerSpec::new(LayerId::UserLocationHalo, source, LayerKind::Circle, LayerFilter::All),
                LayerSpec::new(LayerId::UserLocationDot, source, LayerKind::Circle, LayerFilter::All),
            ],
        );

        Self {
            layers: LayerSet::new(vec![group], vec![LayerId::UserLocationDot]),
        }
    }

    /// Moves the dot. `title` is shown in the popup of the dot.
    pub fn set_position(
        &mut self,
        surface: &mut dyn MapSurface,
        position: LngLat,
        language: &str,
        title: &str,
    ) -> Result<(), MapError> {
        let feature = PointFeature::new(
            USER_LOCATION_ID,
            position,
            FeatureProperties {
                color: USER_LOCATION_COLOR.to_string(),
                stroke_color: "#ffffff".to_string(),
                radius: 6.0,
                stroke_width: 2.0,
                title: encode_localized([(language, title)]),
                ..Default::default()
            },
        );

        self.layers.set_data(
            surface,
            SourceId::UserLocation,
            FeatureCollection {
                bbox: None,
                features: vec![feature.to_geojson()],
                foreign_members: None,
            },
        )?;
        self.render(surface)
    }
}

impl Overlay for UserLocation {
    fn layers(&self) -> &LayerSet {
        &self.layers
    }

    fn layers_mut(&mut self) -> &mut LayerSet {
        &mut self.layers
    }
}
