// src/display/gui/surface.rs
//! egui backend: tile textures and the download cache

use crate::{
    display::RenderSurface,
    error::Result,
    lifecycle::LifecycleEvent,
    map::{tile_cache::MAX_MEMORY_TILES, StyleDocument, TileCache, TileId, TileSource},
};
use eframe::egui;
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Per-tile values evicted oldest first once `capacity` is exceeded
struct BoundedTiles<T> {
    items: HashMap<TileId, T>,
    order: VecDeque<TileId>,
    capacity: usize,
}

impl<T> BoundedTiles<T> {
    fn new(capacity: usize) -> Self {
        Self {
            items: HashMap::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    fn get(&self, tile: &TileId) -> Option<&T> {
        self.items.get(tile)
    }

    fn insert(&mut self, tile: TileId, value: T) {
        if self.items.insert(tile, value).is_none() {
            self.order.push_back(tile);
        }
        while self.items.len() > self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.items.remove(&oldest);
                }
                None => break,
            }
        }
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn clear(&mut self) {
        self.items.clear();
        self.order.clear();
    }
}

pub struct EguiSurface {
    cache: Option<TileCache>,
    textures: BoundedTiles<egui::TextureHandle>,
    started: bool,
}

impl Default for EguiSurface {
    fn default() -> Self {
        Self {
            cache: None,
            textures: BoundedTiles::new(MAX_MEMORY_TILES),
            started: false,
        }
    }
}

impl EguiSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the window is currently started (not minimized)
    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn attribution(&self) -> Option<&str> {
        self.cache.as_ref().and_then(|cache| cache.source().attribution())
    }

    /// Texture for a tile, decoding it from the cache or requesting a
    /// download. None while the tile is not available.
    pub fn tile_texture(&mut self, ctx: &egui::Context, tile: TileId) -> Option<egui::TextureHandle> {
        if let Some(texture) = self.textures.get(&tile) {
            return Some(texture.clone());
        }

        let cache = self.cache.as_ref()?;
        let Some(bytes) = cache.get_tile(tile) else {
            if self.started {
                cache.download_tile_async(tile);
            }
            return None;
        };

        let image = image::load_from_memory(&bytes).ok()?;
        let size = [image.width() as usize, image.height() as usize];
        let rgba = image.to_rgba8();
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_flat_samples().as_slice());
        let texture = ctx.load_texture(format!("tile_{}", tile), color_image, egui::TextureOptions::LINEAR);

        self.textures.insert(tile, texture.clone());
        Some(texture)
    }

    /// Textures currently held on the GPU
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn has_failed(&self, tile: TileId) -> bool {
        self.cache.as_ref().map_or(false, |cache| cache.has_failed(tile))
    }

    fn release(&mut self) {
        if let Some(cache) = self.cache.take() {
            cache.shutdown();
        }
        self.textures.clear();
    }
}

impl RenderSurface for EguiSurface {
    fn on_lifecycle(&mut self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::Start => self.started = true,
            LifecycleEvent::Stop => {
                self.started = false;
                // Textures are rebuilt from cached bytes on the next start
                self.textures.clear();
            }
            LifecycleEvent::Destroy => {
                self.started = false;
                self.release();
                debug!("egui surface released");
            }
            LifecycleEvent::Create | LifecycleEvent::Resume | LifecycleEvent::Pause => {}
        }
    }

    fn load_style(&mut self, style: &StyleDocument) -> Result<()> {
        style.validate()?;
        let cache = TileCache::new(TileSource::from_style(style)?)?;
        self.release();
        self.cache = Some(cache);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_tiles_evict_oldest() {
        let mut tiles = BoundedTiles::new(2);
        tiles.insert(TileId::new(15, 1, 1), "a");
        tiles.insert(TileId::new(15, 2, 1), "b");
        tiles.insert(TileId::new(15, 1, 1), "a2");
        tiles.insert(TileId::new(15, 3, 1), "c");

        assert_eq!(tiles.len(), 2);
        assert!(tiles.get(&TileId::new(15, 1, 1)).is_none());
        assert_eq!(tiles.get(&TileId::new(15, 3, 1)), Some(&"c"));
    }

    #[test]
    fn test_textures_stay_within_cache_capacity() {
        let ctx = egui::Context::default();
        let mut surface = EguiSurface::new();

        for x in 0..(MAX_MEMORY_TILES as u32 + 40) {
            let texture = ctx.load_texture(
                format!("tile_{}", x),
                egui::ColorImage::new([1, 1], egui::Color32::WHITE),
                egui::TextureOptions::LINEAR,
            );
            surface.textures.insert(TileId::new(15, x, 0), texture);
        }

        assert_eq!(surface.texture_count(), MAX_MEMORY_TILES);

        surface.on_lifecycle(LifecycleEvent::Destroy);
        assert_eq!(surface.texture_count(), 0);
    }
}
