//! Point features exchanged with the data layer.
//!
//! The data layer delivers GeoJSON. Every location is a point feature with a fixed set of
//! properties (see [`FeatureProperties`]). Titles and slugs are multilingual: the property value
//! is itself a JSON document mapping language codes to texts.

use std::collections::BTreeMap;

use ahash::AHashSet;
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};
use serde::{Deserialize, Serialize};
use wayfarer_types::{LngLat, LngLatBounds};

use crate::error::MapError;

/// Properties of a location feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureProperties {
    /// Fill color of the point.
    #[serde(default)]
    pub color: String,
    /// Stroke color of the point.
    #[serde(default)]
    pub stroke_color: String,
    /// Radius of the point in pixels.
    #[serde(default)]
    pub radius: f64,
    /// Stroke width in pixels.
    #[serde(default)]
    pub stroke_width: f64,
    /// JSON-encoded map of language code to title.
    #[serde(default)]
    pub title: String,
    /// JSON-encoded map of language code to slug.
    #[serde(default)]
    pub slug: String,
    /// Ordinal of a tour stop.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    /// Marks the current stop of a tour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<bool>,
    /// Any other properties, passed to the renderer untouched.
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl FeatureProperties {
    /// Title in the requested language.
    pub fn localized_title(&self, language: &str, fallback: &str) -> Result<String, MapError> {
        localize(&self.title, "title", language, fallback)
    }

    /// Slug in the requested language.
    pub fn localized_slug(&self, language: &str, fallback: &str) -> Result<String, MapError> {
        localize(&self.slug, "slug", language, fallback)
    }
}

/// Picks a text out of a JSON-encoded `{language: text}` map.
///
/// The requested language is preferred, then the fallback language, then the first entry in
/// alphabetical order of language codes.
pub fn localize(
    encoded: &str,
    property: &'static str,
    language: &str,
    fallback: &str,
) -> Result<String, MapError> {
    let texts: BTreeMap<String, String> =
        serde_json::from_str(encoded).map_err(|err| MapError::MalformedProperty {
            property,
            reason: err.to_string(),
        })?;

    texts
        .get(language)
        .or_else(|| texts.get(fallback))
        .or_else(|| texts.values().next())
        .cloned()
        .ok_or(MapError::MalformedProperty {
            property,
            reason: "no translations".to_string(),
        })
}

/// Encodes `{language: text}` pairs the way the data layer does.
pub fn encode_localized<'a>(texts: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let map: BTreeMap<&str, &str> = texts.into_iter().collect();
    serde_json::to_string(&map).unwrap_or_default()
}

/// Location point.
#[derive(Debug, Clone, PartialEq)]
pub struct PointFeature {
    /// Identifier prefixed by its domain, e.g. `loc-42`.
    pub id: String,
    /// Position of the point.
    pub position: LngLat,
    /// Properties.
    pub properties: FeatureProperties,
}

impl PointFeature {
    /// Creates a new feature.
    pub fn new(id: impl Into<String>, position: LngLat, properties: FeatureProperties) -> Self {
        Self {
            id: id.into(),
            position,
            properties,
        }
    }

    /// Converts the feature into GeoJSON. The id is written both as the feature id and as the
    /// `id` property.
    pub fn to_geojson(&self) -> Feature {
        let mut properties = match serde_json::to_value(&self.properties) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => JsonObject::new(),
        };
        properties.insert("id".to_string(), self.id.clone().into());

        Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::Point(self.position.to_position()))),
            id: Some(Id::String(self.id.clone())),
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

impl TryFrom<Feature> for PointFeature {
    type Error = MapError;

    fn try_from(feature: Feature) -> Result<Self, Self::Error> {
        let position = match feature.geometry.as_ref().map(|g| &g.value) {
            Some(Value::Point(position)) => LngLat::try_from(position.as_slice())?,
            Some(_) => {
                return Err(MapError::MalformedProperty {
                    property: "geometry",
                    reason: "not a point".to_string(),
                })
            }
            None => {
                return Err(MapError::MalformedProperty {
                    property: "geometry",
                    reason: "missing".to_string(),
                })
            }
        };

        let mut object = feature.properties.unwrap_or_default();
        let property_id = match object.remove("id") {
            Some(serde_json::Value::String(id)) => Some(id),
            Some(serde_json::Value::Number(id)) => Some(id.to_string()),
            _ => None,
        };
        let id = property_id
            .or_else(|| match feature.id {
                Some(Id::String(id)) => Some(id),
                Some(Id::Number(id)) => Some(id.to_string()),
                None => None,
            })
            .ok_or(MapError::MalformedProperty {
                property: "id",
                reason: "missing".to_string(),
            })?;

        let properties = match serde_json::from_value(serde_json::Value::Object(object)) {
            Ok(properties) => properties,
            Err(err) => {
                log::warn!("Feature {id} has unexpected properties, using defaults: {err}");
                FeatureProperties::default()
            }
        };

        Ok(Self {
            id,
            position,
            properties,
        })
    }
}

/// Result of a bounds computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsSummary {
    /// Bounds of the accepted points. `None` if no point was accepted.
    pub bounds: Option<LngLatBounds>,
    /// Number of points skipped because they were outside the world bounds.
    pub skipped: usize,
}

/// Ordered set of location features.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationCollection {
    features: Vec<PointFeature>,
}

impl LocationCollection {
    /// Creates a new collection.
    pub fn new(features: Vec<PointFeature>) -> Self {
        Self { features }
    }

    /// Parses a GeoJSON document. The document must be a feature collection.
    pub fn from_json(json: &str) -> Result<Self, MapError> {
        match json.parse::<GeoJson>()? {
            GeoJson::FeatureCollection(collection) => Ok(collection.into()),
            _ => Err(MapError::MalformedProperty {
                property: "type",
                reason: "expected a FeatureCollection".to_string(),
            }),
        }
    }

    /// Features of the collection.
    pub fn features(&self) -> &[PointFeature] {
        &self.features
    }

    /// Iterates over the features.
    pub fn iter(&self) -> impl Iterator<Item = &PointFeature> {
        self.features.iter()
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns true if there are no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Finds a feature by id.
    pub fn get(&self, id: &str) -> Option<&PointFeature> {
        self.features.iter().find(|f| f.id == id)
    }

    /// Sub-collection of the features whose id is in `ids`. The order of the collection is kept.
    pub fn filter_by_ids<S: AsRef<str>>(&self, ids: &[S]) -> Self {
        let ids: AHashSet<&str> = ids.iter().map(|id| id.as_ref()).collect();
        Self {
            features: self
                .features
                .iter()
                .filter(|f| ids.contains(f.id.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// Bounds of the features that are inside `world`. A warning is logged for every point that
    /// is outside.
    pub fn bounds_within(&self, world: &LngLatBounds) -> BoundsSummary {
        let mut bounds: Option<LngLatBounds> = None;
        let mut skipped = 0;

        for feature in &self.features {
            if !world.contains(feature.position) {
                log::warn!(
                    "Feature {} is outside of the world bounds: {:?}",
                    feature.id,
                    feature.position
                );
                skipped += 1;
                continue;
            }

            match &mut bounds {
                Some(bounds) => bounds.extend(feature.position),
                None => bounds = Some(LngLatBounds::from_point(feature.position)),
            }
        }

        BoundsSummary { bounds, skipped }
    }

    /// Converts the collection into GeoJSON.
    pub fn to_geojson(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self.features.iter().map(PointFeature::to_geojson).collect(),
            foreign_members: None,
        }
    }
}

impl From<FeatureCollection> for LocationCollection {
    fn from(collection: FeatureCollection) -> Self {
        let features = collection
            .features
            .into_iter()
            .filter_map(|feature| match PointFeature::try_from(feature) {
                Ok(feature) => Some(feature),
                Err(err) => {
                    log::warn!("Skipping feature: {err}");
                    None
                }
            })
            .collect();

        Self { features }
    }
}

impl From<Vec<PointFeature>> for LocationCollection {
    fn from(features: Vec<PointFeature>) -> Self {
        Self { features }
    }
}

impl FromIterator<PointFeature> for LocationCollection {
    fn from_iter<T: IntoIterator<Item = PointFeature>>(iter: T) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}
