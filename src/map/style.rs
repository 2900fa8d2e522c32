// src/map/style.rs
//! Declarative style document: tile sources, GeoJSON sources and layers

use crate::error::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const STYLE_VERSION: u8 = 8;

pub const OCM_SOURCE_ID: &str = "ocm";
pub const OCM_LAYER_ID: &str = "ocm-layer";
pub const HERE_SOURCE_ID: &str = "here-src";
pub const HERE_LAYER_ID: &str = "here-layer";

const OCM_TILE_URL: &str = "https://tile.thunderforest.com/cycle/{z}/{x}/{y}.png?apikey=";
const OCM_ATTRIBUTION: &str = "Maps © Thunderforest, Data © OpenStreetMap contributors";

/// GeoJSON geometry; coordinates are longitude first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: [f64; 2] },
}

impl Geometry {
    /// Build a point from a latitude-first fix
    pub fn point(lat: f64, lon: f64) -> Self {
        Geometry::Point { coordinates: [lon, lat] }
    }

    /// Latitude and longitude of the geometry
    pub fn lat_lon(&self) -> (f64, f64) {
        match self {
            Geometry::Point { coordinates: [lon, lat] } => (*lat, *lon),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Source {
    Raster {
        tiles: Vec<String>,
        #[serde(rename = "tileSize", default = "default_tile_size")]
        tile_size: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attribution: Option<String>,
    },
    #[serde(rename = "geojson")]
    GeoJson { data: Geometry },
}

fn default_tile_size() -> u32 {
    512
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CirclePaint {
    #[serde(rename = "circle-color")]
    pub color: String,
    #[serde(rename = "circle-radius")]
    pub radius: f32,
    #[serde(rename = "circle-stroke-color")]
    pub stroke_color: String,
    #[serde(rename = "circle-stroke-width")]
    pub stroke_width: f32,
}

impl Default for CirclePaint {
    fn default() -> Self {
        Self {
            color: "#000000".to_string(),
            radius: 5.0,
            stroke_color: "#000000".to_string(),
            stroke_width: 0.0,
        }
    }
}

impl CirclePaint {
    /// Blue dot with a white ring
    pub fn here_marker() -> Self {
        Self {
            color: "#2196F3".to_string(),
            radius: 6.0,
            stroke_color: "#FFFFFF".to_string(),
            stroke_width: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerKind {
    Raster,
    Circle {
        #[serde(default)]
        paint: CirclePaint,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: String,
    pub source: String,
    #[serde(flatten)]
    pub kind: LayerKind,
}

impl Layer {
    pub fn raster(id: &str, source: &str) -> Self {
        Self {
            id: id.to_string(),
            source: source.to_string(),
            kind: LayerKind::Raster,
        }
    }

    pub fn circle(id: &str, source: &str, paint: CirclePaint) -> Self {
        Self {
            id: id.to_string(),
            source: source.to_string(),
            kind: LayerKind::Circle { paint },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleDocument {
    pub version: u8,
    pub name: String,
    pub sources: BTreeMap<String, Source>,
    pub layers: Vec<Layer>,
}

impl StyleDocument {
    pub fn new(name: &str) -> Self {
        Self {
            version: STYLE_VERSION,
            name: name.to_string(),
            sources: BTreeMap::new(),
            layers: Vec::new(),
        }
    }

    /// OpenCycleMap raster style for the given Thunderforest API key
    pub fn open_cycle_map(api_key: &str) -> Self {
        let mut style = Self::new("OCM");
        style.add_source(
            OCM_SOURCE_ID,
            Source::Raster {
                tiles: vec![format!("{}{}", OCM_TILE_URL, api_key)],
                tile_size: 256,
                attribution: Some(OCM_ATTRIBUTION.to_string()),
            },
        );
        style.add_layer(Layer::raster(OCM_LAYER_ID, OCM_SOURCE_ID));
        style
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let style: Self = serde_json::from_str(json)?;
        style.validate()?;
        Ok(style)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that the document can be rendered
    pub fn validate(&self) -> Result<()> {
        if self.version != STYLE_VERSION {
            return Err(MapError::Style(format!("unsupported style version {}", self.version)));
        }

        for (id, source) in &self.sources {
            if let Source::Raster { tiles, .. } = source {
                if tiles.is_empty() {
                    return Err(MapError::Style(format!("raster source '{}' has no tile URLs", id)));
                }
            }
        }

        for layer in &self.layers {
            match (&layer.kind, self.sources.get(&layer.source)) {
                (_, None) => {
                    return Err(MapError::Style(format!(
                        "layer '{}' references missing source '{}'",
                        layer.id, layer.source
                    )));
                }
                (LayerKind::Raster, Some(Source::GeoJson { .. }))
                | (LayerKind::Circle { .. }, Some(Source::Raster { .. })) => {
                    return Err(MapError::Style(format!(
                        "layer '{}' cannot draw source '{}'",
                        layer.id, layer.source
                    )));
                }
                _ => {}
            }
        }

        Ok(())
    }

    pub fn source(&self, id: &str) -> Option<&Source> {
        self.sources.get(id)
    }

    pub fn add_source(&mut self, id: &str, source: Source) {
        self.sources.insert(id.to_string(), source);
    }

    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn add_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    /// Replace the geometry of a GeoJSON source. Returns false when the
    /// source is missing or is not a GeoJSON source.
    pub fn set_geojson(&mut self, id: &str, geometry: Geometry) -> bool {
        match self.sources.get_mut(id) {
            Some(Source::GeoJson { data }) => {
                *data = geometry;
                true
            }
            _ => false,
        }
    }

    pub fn geojson(&self, id: &str) -> Option<&Geometry> {
        match self.sources.get(id) {
            Some(Source::GeoJson { data }) => Some(data),
            _ => None,
        }
    }

    /// First raster source in layer order, with its id
    pub fn raster_source(&self) -> Option<(&str, &Source)> {
        self.layers
            .iter()
            .filter(|layer| layer.kind == LayerKind::Raster)
            .find_map(|layer| {
                self.sources
                    .get_key_value(&layer.source)
                    .map(|(id, source)| (id.as_str(), source))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_open_cycle_map_shape() {
        let style = StyleDocument::open_cycle_map("secret");
        let value = serde_json::to_value(&style).unwrap();

        assert_eq!(
            value,
            json!({
                "version": 8,
                "name": "OCM",
                "sources": {
                    "ocm": {
                        "type": "raster",
                        "tiles": ["https://tile.thunderforest.com/cycle/{z}/{x}/{y}.png?apikey=secret"],
                        "tileSize": 256,
                        "attribution": "Maps © Thunderforest, Data © OpenStreetMap contributors"
                    }
                },
                "layers": [
                    { "id": "ocm-layer", "type": "raster", "source": "ocm" }
                ]
            })
        );
    }

    #[test]
    fn test_point_is_longitude_first() {
        let point = Geometry::point(52.52, 13.405);
        assert_eq!(point, Geometry::Point { coordinates: [13.405, 52.52] });
        assert_eq!(
            serde_json::to_value(&point).unwrap(),
            json!({ "type": "Point", "coordinates": [13.405, 52.52] })
        );
        assert_eq!(point.lat_lon(), (52.52, 13.405));
    }

    #[test]
    fn test_circle_layer_json() {
        let layer = Layer::circle(HERE_LAYER_ID, HERE_SOURCE_ID, CirclePaint::here_marker());
        assert_eq!(
            serde_json::to_value(&layer).unwrap(),
            json!({
                "id": "here-layer",
                "source": "here-src",
                "type": "circle",
                "paint": {
                    "circle-color": "#2196F3",
                    "circle-radius": 6.0,
                    "circle-stroke-color": "#FFFFFF",
                    "circle-stroke-width": 2.0
                }
            })
        );
    }

    #[test]
    fn test_from_json_round_trip() {
        let style = StyleDocument::open_cycle_map("k");
        let parsed = StyleDocument::from_json(&style.to_json().unwrap()).unwrap();
        assert_eq!(parsed, style);
    }

    #[test]
    fn test_validate_rejects_dangling_layer() {
        let json = r#"{"version":8,"name":"x","sources":{},"layers":[{"id":"l","type":"raster","source":"nope"}]}"#;
        let err = StyleDocument::from_json(json).unwrap_err();
        assert!(matches!(err, MapError::Style(_)));
    }

    #[test]
    fn test_validate_rejects_empty_tiles() {
        let mut style = StyleDocument::new("x");
        style.add_source("r", Source::Raster { tiles: vec![], tile_size: 256, attribution: None });
        assert!(style.validate().is_err());
    }

    #[test]
    fn test_set_geojson() {
        let mut style = StyleDocument::open_cycle_map("k");
        assert!(!style.set_geojson(HERE_SOURCE_ID, Geometry::point(1.0, 2.0)));
        assert!(!style.set_geojson(OCM_SOURCE_ID, Geometry::point(1.0, 2.0)));

        style.add_source(HERE_SOURCE_ID, Source::GeoJson { data: Geometry::point(0.0, 0.0) });
        assert!(style.set_geojson(HERE_SOURCE_ID, Geometry::point(1.0, 2.0)));
        assert_eq!(style.geojson(HERE_SOURCE_ID), Some(&Geometry::point(1.0, 2.0)));
    }

    #[test]
    fn test_raster_source_lookup() {
        let style = StyleDocument::open_cycle_map("k");
        let (id, source) = style.raster_source().unwrap();
        assert_eq!(id, OCM_SOURCE_ID);
        assert!(matches!(source, Source::Raster { tile_size: 256, .. }));
    }
}
