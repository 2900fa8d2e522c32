// src/map/mod.rs
//! Map surface, style document and tile handling

pub mod camera;
pub mod projection;
pub mod style;
pub mod surface;
pub mod thread;
pub mod tiles;

#[cfg(feature = "gui")]
pub mod tile_cache;

pub use camera::{CameraPosition, LatLng};
pub use projection::{lat_lon_to_tile, tile_to_lat_lon};
pub use style::StyleDocument;
pub use surface::{MapSurface, SurfaceState};
pub use thread::{MapHandle, MapThread};
pub use tiles::{TileId, TileSource};

#[cfg(feature = "gui")]
pub use tile_cache::TileCache;
