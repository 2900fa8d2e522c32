// src/display/gui/app.rs
//! Main GUI application structure and eframe::App implementation

use super::{map_view, surface::EguiSurface};
use crate::{lifecycle::LifecycleEvent, screen::MapScreen};
use eframe::egui;
use std::time::Duration;
use tracing::debug;

/// Maps window visibility and focus onto lifecycle transitions
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct WindowLifecycle {
    started: bool,
    resumed: bool,
}

impl WindowLifecycle {
    /// Events that move the screen to match the window. A minimized window
    /// is stopped, an unfocused one is paused.
    pub fn transitions(&mut self, visible: bool, focused: bool) -> Vec<LifecycleEvent> {
        let mut events = Vec::new();

        if self.resumed && !(visible && focused) {
            self.resumed = false;
            events.push(LifecycleEvent::Pause);
        }
        if self.started && !visible {
            self.started = false;
            events.push(LifecycleEvent::Stop);
        }
        if !self.started && visible {
            self.started = true;
            events.push(LifecycleEvent::Start);
        }
        if self.started && !self.resumed && focused {
            self.resumed = true;
            events.push(LifecycleEvent::Resume);
        }

        events
    }
}

pub struct MapApp {
    screen: MapScreen<EguiSurface>,
    window: WindowLifecycle,
}

impl MapApp {
    pub fn new(screen: MapScreen<EguiSurface>) -> Self {
        Self {
            screen,
            window: WindowLifecycle::default(),
        }
    }

    fn track_window(&mut self, ctx: &egui::Context) {
        let (minimized, focused) = ctx.input(|i| {
            let viewport = i.viewport();
            (viewport.minimized.unwrap_or(false), viewport.focused.unwrap_or(true))
        });

        for event in self.window.transitions(!minimized, focused) {
            debug!(%event, "window lifecycle");
            self.screen.handle_lifecycle(event);
        }
    }
}

impl eframe::App for MapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.request_repaint_after(Duration::from_millis(250));

        self.track_window(ctx);
        self.screen.pump();

        let surface = self.screen.surface();
        let camera = surface.camera();
        let marker = surface.marker_position().filter(|_| surface.is_centered());

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.heading("🚲 Cycle Map");
                ui.separator();

                let status_color = if marker.is_some() {
                    egui::Color32::GREEN
                } else if self.screen.is_location_active() {
                    egui::Color32::YELLOW
                } else {
                    egui::Color32::RED
                };
                ui.colored_label(status_color, "●");

                match marker {
                    Some(position) => ui.label(format!("You are here: {}", position)),
                    None if self.screen.is_location_active() => ui.label("Waiting for a position fix"),
                    None => ui.label("Location unavailable"),
                };

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(format!("Zoom {:.1}", camera.zoom));
                });
            });
        });

        egui::TopBottomPanel::bottom("bottom_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("Center: {}", camera.target));
                if let Some(attribution) = self.screen.surface().renderer().attribution() {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.small(attribution);
                    });
                }
            });
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| map_view::show(ui, self.screen.surface_mut()));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.screen.shutdown();
    }
}
