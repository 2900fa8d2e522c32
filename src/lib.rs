// src/lib.rs
//! Cycle Map Library
//!
//! An OpenCycleMap raster map with a live "you are here" marker fed by GPS
//! and network location providers.

pub mod config;
pub mod display;
pub mod error;
pub mod lifecycle;
pub mod location;
pub mod map;
pub mod screen;

// Re-export main types for convenience
pub use config::MapConfig;
pub use error::{MapError, Result};
pub use lifecycle::LifecycleEvent;
pub use location::{LocationBridge, LocationFix, ProviderKind};
pub use map::{MapSurface, StyleDocument};
pub use screen::MapScreen;

#[cfg(feature = "gui")]
pub use display::gui::MapApp;
