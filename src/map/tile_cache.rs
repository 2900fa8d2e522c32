// src/map/tile_cache.rs
//! In-memory raster tile cache with bounded background downloads

use super::tiles::{TileId, TileSource};
use crate::error::{MapError, Result};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::time::Duration;
use tracing::{debug, warn};

/// Decoded tiles kept in memory
pub const MAX_MEMORY_TILES: usize = 256;

const USER_AGENT: &str = concat!("cycle-map/", env!("CARGO_PKG_VERSION"));

#[derive(Default)]
struct MemoryTiles {
    tiles: HashMap<TileId, Arc<Vec<u8>>>,
    order: VecDeque<TileId>,
}

impl MemoryTiles {
    fn insert(&mut self, key: TileId, tile: Arc<Vec<u8>>, capacity: usize) {
        if self.tiles.insert(key, tile).is_none() {
            self.order.push_back(key);
        }
        while self.tiles.len() > capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.tiles.remove(&oldest);
                }
                None => break,
            }
        }
    }
}

#[derive(Clone)]
pub struct TileCache {
    source: TileSource,
    client: reqwest::blocking::Client,
    memory: Arc<Mutex<MemoryTiles>>,
    downloading: Arc<Mutex<HashSet<TileId>>>,
    failed: Arc<Mutex<HashSet<TileId>>>,
    shutdown: Arc<AtomicBool>,
    max_memory_tiles: usize,
    max_concurrent_downloads: usize,
}

impl TileCache {
    pub fn new(source: TileSource) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| MapError::Connection(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            source,
            client,
            memory: Arc::new(Mutex::new(MemoryTiles::default())),
            downloading: Arc::new(Mutex::new(HashSet::new())),
            failed: Arc::new(Mutex::new(HashSet::new())),
            shutdown: Arc::new(AtomicBool::new(false)),
            max_memory_tiles: MAX_MEMORY_TILES,
            max_concurrent_downloads: 4,
        })
    }

    pub fn source(&self) -> &TileSource {
        &self.source
    }

    /// Tile bytes if already in memory
    pub fn get_tile(&self, tile: TileId) -> Option<Arc<Vec<u8>>> {
        self.memory.lock().ok()?.tiles.get(&tile).cloned()
    }

    pub fn has_failed(&self, tile: TileId) -> bool {
        self.failed.lock().map_or(false, |failed| failed.contains(&tile))
    }

    /// Download tile in background (non-blocking) with concurrency limit
    pub fn download_tile_async(&self, tile: TileId) {
        if self.shutdown.load(Ordering::Relaxed) || self.has_failed(tile) {
            return;
        }

        {
            let Ok(mut downloading) = self.downloading.lock() else {
                return;
            };
            if downloading.len() >= self.max_concurrent_downloads || downloading.contains(&tile) {
                return;
            }
            downloading.insert(tile);
        }

        let cache = self.clone();
        std::thread::spawn(move || {
            match cache.download_tile(tile) {
                Ok(bytes) if !cache.shutdown.load(Ordering::Relaxed) => {
                    if let Ok(mut memory) = cache.memory.lock() {
                        memory.insert(tile, Arc::new(bytes), cache.max_memory_tiles);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(%tile, error = %e, "tile download failed");
                    if let Ok(mut failed) = cache.failed.lock() {
                        failed.insert(tile);
                    }
                }
            }

            if let Ok(mut downloading) = cache.downloading.lock() {
                downloading.remove(&tile);
            }
        });
    }

    fn download_tile(&self, tile: TileId) -> Result<Vec<u8>> {
        debug!(url = %self.source.redacted_url(tile), "downloading tile");

        let response = self
            .client
            .get(self.source.url(tile))
            .send()
            .map_err(|e| MapError::Connection(format!("Download failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(MapError::Connection(format!("HTTP error: {}", response.status())));
        }

        let bytes = response
            .bytes()
            .map_err(|e| MapError::Connection(format!("Failed to read response: {}", e)))?;
        Ok(bytes.to_vec())
    }

    pub fn memory_tiles(&self) -> usize {
        self.memory.lock().map_or(0, |memory| memory.tiles.len())
    }

    /// Drop every cached tile and stop accepting new downloads
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Ok(mut memory) = self.memory.lock() {
            *memory = MemoryTiles::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_tiles_evict_oldest() {
        let mut memory = MemoryTiles::default();
        for x in 0..5 {
            memory.insert(TileId::new(3, x, 0), Arc::new(vec![x as u8]), 3);
        }

        assert_eq!(memory.tiles.len(), 3);
        assert!(!memory.tiles.contains_key(&TileId::new(3, 0, 0)));
        assert!(!memory.tiles.contains_key(&TileId::new(3, 1, 0)));
        assert!(memory.tiles.contains_key(&TileId::new(3, 4, 0)));
    }

    #[test]
    fn test_shutdown_clears_memory() {
        let cache = TileCache::new(TileSource::new("http://127.0.0.1:9/{z}/{x}/{y}.png", 256)).unwrap();
        if let Ok(mut memory) = cache.memory.lock() {
            memory.insert(TileId::new(1, 0, 0), Arc::new(vec![1]), 10);
        }
        assert_eq!(cache.memory_tiles(), 1);

        cache.shutdown();
        assert_eq!(cache.memory_tiles(), 0);
        cache.download_tile_async(TileId::new(1, 0, 0));
        assert!(cache.downloading.lock().unwrap().is_empty());
    }
}
