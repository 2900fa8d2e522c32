// src/display/gui/mod.rs
//! Desktop window host

mod app;
mod map_view;
mod surface;

pub use app::{MapApp, WindowLifecycle};
pub use surface::EguiSurface;

use crate::{error::Result, screen::MapScreen};

/// Open the map window and block until it closes
pub fn run(screen: MapScreen<EguiSurface>) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 768.0])
            .with_title("Cycle Map")
            .with_min_inner_size([480.0, 360.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Cycle Map",
        options,
        Box::new(|cc| {
            cc.egui_ctx.set_visuals(eframe::egui::Visuals::light());
            Ok(Box::new(MapApp::new(screen)))
        }),
    )?;

    Ok(())
}
