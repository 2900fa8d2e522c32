// src/display/mod.rs
//! Rendering backends for the map surface

pub mod headless;
pub mod terminal;

#[cfg(feature = "gui")]
pub mod gui;

use crate::{error::Result, lifecycle::LifecycleEvent, map::style::StyleDocument};

/// Native side of a map surface.
///
/// The surface forwards every host lifecycle transition verbatim; a backend
/// must release whatever it holds (textures, download threads, terminal
/// state) on `Destroy`.
pub trait RenderSurface {
    fn on_lifecycle(&mut self, event: LifecycleEvent);

    /// Prepare to draw a style. An error leaves the surface without a style.
    fn load_style(&mut self, style: &StyleDocument) -> Result<()>;
}

/// Check if GUI should be used based on environment
#[cfg(feature = "gui")]
pub fn should_use_gui() -> bool {
    std::env::var("DISPLAY").is_ok() || std::env::var("WAYLAND_DISPLAY").is_ok() || cfg!(any(windows, target_os = "macos"))
}

#[cfg(not(feature = "gui"))]
pub fn should_use_gui() -> bool {
    false
}
