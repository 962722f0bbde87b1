use geojson::{Feature, FeatureCollection, Geometry, Value};
use wayfarer_types::LngLat;

use crate::error::MapError;
use crate::feature::PointFeature;
use crate::layers::{LayerGroup, LayerSet};
use crate::overlay::Overlay;
use crate::surface::{
    LayerFilter, LayerId, LayerKind, LayerSpec, MapSurface, SourceId, SourceSpec,
};

/// Stop of a guided tour.
#[derive(Debug, Clone, PartialEq)]
pub struct TourStop {
    /// Location of the stop.
    pub feature: PointFeature,
    /// Ordinal of the stop, shown on the marker.
    pub number: u32,
    /// The stop the visitor is currently at.
    pub highlight: bool,
}

/// Ordered tour path with numbered stops.
#[derive(Debug)]
pub(crate) struct Tour {
    layers: LayerSet,
}

impl Tour {
    pub fn new() -> Self {
        let path = LayerGroup::new(
            SourceId::TourPath,
            SourceSpec::default(),
            vec![LayerSpec::new(
                LayerId::TourPath,
                SourceId::TourPath,
                LayerKind::Line,
                LayerFilter::All,
            )],
        );
        let stops = LayerGroup::new(
            SourceId::TourStops,
            SourceSpec::default(),
            vec![
                LayerSpec::new(
                    LayerId::TourStops,
                    SourceId::TourStops,
                    LayerKind::Circle,
                    LayerFilter::All,
                ),
                LayerSpec::new(
                    LayerId::TourStopNumbers,
                    SourceId::TourStops,
                    LayerKind::Symbol,
                    LayerFilter::All,
                ),
            ],
        );

        Self {
            layers: LayerSet::new(vec![path, stops], vec![LayerId::TourStops]),
        }
    }

    /// Sets the path. Invalid positions are dropped.
    pub fn set_path(&mut self, surface: &mut dyn MapSurface, path: &[LngLat]) -> Result<(), MapError> {
        let line: Vec<_> = path
            .iter()
            .filter(|position| position.is_finite())
            .map(LngLat::to_position)
            .collect();

        let features = if line.len() < 2 {
            vec![]
        } else {
            vec![Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::LineString(line))),
                id: None,
                properties: None,
                foreign_members: None,
            }]
        };

        self.layers
            .set_data(surface, SourceId::TourPath, collection(features))?;
        self.render(surface)
    }

    pub fn set_stops(&mut self, surface: &mut dyn MapSurface, stops: &[TourStop]) -> Result<(), MapError> {
        let features = stops
            .iter()
            .filter(|stop| stop.feature.position.is_finite())
            .map(|stop| {
                let mut feature = stop.feature.clone();
                feature.properties.number = Some(stop.number);
                feature.properties.highlight = Some(stop.highlight);
                feature.to_geojson()
            })
            .collect();

        self.layers
            .set_data(surface, SourceId::TourStops, collection(features))?;
        self.render(surface)
    }
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

impl Overlay for Tour {
    fn layers(&self) -> &LayerSet {
        &self.layers
    }

    fn layers_mut(&mut self) -> &mut LayerSet {
        &mut self.layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::tests::site;
    use crate::surface::{EventKind, RecordingSurface};

    fn stop(id: &str, number: u32, highlight: bool) -> TourStop {
        TourStop {
            feature: site(id, number as f64, 1.0),
            number,
            highlight,
        }
    }

    #[test]
    fn path_alone_draws_only_the_line() {
        let mut surface = RecordingSurface::default();
        let mut tour = Tour::new();
        tour.set_path(
            &mut surface,
            &[LngLat::new(1.0, 1.0), LngLat::new(f64::NAN, 0.0), LngLat::new(2.0, 2.0)],
        )
        .expect("path is set");

        assert_eq!(surface.layer_ids(), vec![LayerId::TourPath]);
        let data = surface.source_data(SourceId::TourPath).expect("source exists");
        assert_eq!(data.features.len(), 1);
        assert!(!surface.is_subscribed(EventKind::Click, Some(LayerId::TourStops)));
    }

    #[test]
    fn stops_carry_number_and_highlight() {
        let mut surface = RecordingSurface::default();
        let mut tour = Tour::new();
        tour.set_path(&mut surface, &[LngLat::new(1.0, 1.0), LngLat::new(2.0, 2.0)])
            .expect("path is set");
        tour.set_stops(&mut surface, &[stop("loc-1", 1, false), stop("loc-2", 2, true)])
            .expect("stops are set");

        assert_eq!(
            surface.layer_ids(),
            vec![LayerId::TourPath, LayerId::TourStops, LayerId::TourStopNumbers]
        );
        assert!(surface.is_subscribed(EventKind::Click, Some(LayerId::TourStops)));

        let data = surface.source_data(SourceId::TourStops).expect("source exists");
        let numbers: Vec<_> = data
            .features
            .iter()
            .filter_map(|f| f.property("number").and_then(|v| v.as_u64()))
            .collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(
            data.features[1].property("highlight").and_then(|v| v.as_bool()),
            Some(true)
        );
    }

    #[test]
    fn short_path_is_empty() {
        let mut surface = RecordingSurface::default();
        let mut tour = Tour::new();
        tour.set_path(&mut surface, &[LngLat::new(1.0, 1.0)])
            .expect("path is set");
        let data = surface.source_data(SourceId::TourPath).expect("source exists");
        assert!(data.features.is_empty());
    }
}
