// src/map/tiles.rs
//! Raster tile addressing and URL templates

use super::style::{Source, StyleDocument};
use crate::error::{MapError, Result};

/// Address of one raster tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileId {
    pub fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// Same tile with x wrapped around the antimeridian; None when y is off
    /// the map
    pub fn wrapped(zoom: u8, x: i64, y: i64) -> Option<Self> {
        let n = 1_i64 << zoom;
        if y < 0 || y >= n {
            return None;
        }
        Some(Self::new(zoom, x.rem_euclid(n) as u32, y as u32))
    }
}

impl std::fmt::Display for TileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Raster tile endpoint taken from a style's raster source
#[derive(Debug, Clone, PartialEq)]
pub struct TileSource {
    template: String,
    tile_size: u32,
    attribution: Option<String>,
}

impl TileSource {
    pub fn new(template: &str, tile_size: u32) -> Self {
        Self {
            template: template.to_string(),
            tile_size,
            attribution: None,
        }
    }

    /// Tile source of the first raster layer in the style
    pub fn from_style(style: &StyleDocument) -> Result<Self> {
        match style.raster_source() {
            Some((_, Source::Raster { tiles, tile_size, attribution })) => {
                let template = tiles
                    .first()
                    .ok_or_else(|| MapError::Style("raster source has no tile URLs".to_string()))?;
                Ok(Self {
                    template: template.clone(),
                    tile_size: *tile_size,
                    attribution: attribution.clone(),
                })
            }
            _ => Err(MapError::Style(format!("style '{}' has no raster layer", style.name))),
        }
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn attribution(&self) -> Option<&str> {
        self.attribution.as_deref()
    }

    pub fn url(&self, tile: TileId) -> String {
        self.template
            .replace("{z}", &tile.zoom.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
    }

    /// URL with any `apikey` query value masked, for display and logs
    pub fn redacted_url(&self, tile: TileId) -> String {
        let url = self.url(tile);
        match url.find("apikey=") {
            Some(start) => {
                let value_start = start + "apikey=".len();
                let value_end = url[value_start..]
                    .find('&')
                    .map_or(url.len(), |offset| value_start + offset);
                format!("{}***{}", &url[..value_start], &url[value_end..])
            }
            None => url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_from_ocm_style() {
        let source = TileSource::from_style(&StyleDocument::open_cycle_map("abc123")).unwrap();
        assert_eq!(source.tile_size(), 256);
        assert_eq!(
            source.url(TileId::new(15, 17604, 10746)),
            "https://tile.thunderforest.com/cycle/15/17604/10746.png?apikey=abc123"
        );
        assert!(source.attribution().unwrap().contains("OpenStreetMap"));
    }

    #[test]
    fn test_redacted_url() {
        let source = TileSource::new("https://t.example/{z}/{x}/{y}.png?apikey=abc&lang=de", 256);
        assert_eq!(
            source.redacted_url(TileId::new(1, 0, 1)),
            "https://t.example/1/0/1.png?apikey=***&lang=de"
        );

        let plain = TileSource::new("https://t.example/{z}/{x}/{y}.png", 256);
        assert_eq!(plain.redacted_url(TileId::new(1, 0, 1)), "https://t.example/1/0/1.png");
    }

    #[test]
    fn test_style_without_raster_layer() {
        let style = StyleDocument::new("empty");
        assert!(TileSource::from_style(&style).is_err());
    }

    #[rstest]
    #[case(2, -1, 0, Some(TileId::new(2, 3, 0)))]
    #[case(2, 4, 3, Some(TileId::new(2, 0, 3)))]
    #[case(2, 1, 4, None)]
    #[case(2, 1, -1, None)]
    fn test_wrapped(#[case] zoom: u8, #[case] x: i64, #[case] y: i64, #[case] expected: Option<TileId>) {
        assert_eq!(TileId::wrapped(zoom, x, y), expected);
    }
}
