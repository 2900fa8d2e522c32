// src/screen.rs
//! The map screen: one surface, one location bridge, one map thread

use crate::{
    display::RenderSurface,
    error::Result,
    lifecycle::LifecycleEvent,
    location::{BridgeStart, LocationBridge, LocationFix, LocationListener},
    map::{MapHandle, MapSurface, MapThread, StyleDocument},
};
use std::sync::Arc;
use tracing::{debug, info};

pub struct MapScreen<R: RenderSurface + 'static> {
    // Dropped before the surface so providers stop first
    bridge: LocationBridge,
    bridge_start: BridgeStart,
    map_thread: MapThread<R>,
    surface: MapSurface<R>,
}

impl<R: RenderSurface + 'static> MapScreen<R> {
    /// Build the screen: create the surface, start loading the style and
    /// subscribe to location updates. Fixes reach the surface only through
    /// the map thread, on the next [`MapScreen::pump`].
    pub fn new(renderer: R, style: StyleDocument, mut bridge: LocationBridge) -> Result<Self> {
        let mut surface = MapSurface::new(renderer);
        surface.on_lifecycle(LifecycleEvent::Create);
        surface.set_style(style)?;

        let map_thread = MapThread::new();
        let handle = map_thread.handle();
        handle.post(|surface| surface.on_style_loaded());

        let bridge_start = bridge.start(location_listener(handle));
        info!(
            subscribed = ?bridge_start.subscribed,
            failed = ?bridge_start.failed,
            "map screen created"
        );

        Ok(Self {
            bridge,
            bridge_start,
            map_thread,
            surface,
        })
    }

    /// Forward a host lifecycle transition. `Destroy` also unsubscribes the
    /// location providers.
    pub fn handle_lifecycle(&mut self, event: LifecycleEvent) {
        debug!(%event, "lifecycle");
        if event == LifecycleEvent::Destroy {
            self.bridge.stop();
        }
        self.surface.on_lifecycle(event);
    }

    /// Replay whatever transitions are missing down to `Destroy`
    pub fn shutdown(&mut self) {
        for event in self.surface.lifecycle().teardown_events() {
            self.handle_lifecycle(event);
        }
    }

    /// Run pending map-thread work; call from the UI context
    pub fn pump(&mut self) -> usize {
        self.map_thread.drain(&mut self.surface)
    }

    pub fn surface(&self) -> &MapSurface<R> {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut MapSurface<R> {
        &mut self.surface
    }

    pub fn bridge_start(&self) -> &BridgeStart {
        &self.bridge_start
    }

    pub fn is_location_active(&self) -> bool {
        self.bridge.is_subscribed()
    }

    pub fn handle(&self) -> MapHandle<R> {
        self.map_thread.handle()
    }
}

/// Listener that marshals each fix onto the map thread
fn location_listener<R: RenderSurface + 'static>(handle: MapHandle<R>) -> Arc<dyn LocationListener> {
    Arc::new(move |fix: LocationFix| {
        handle.post(move |surface| surface.on_fix(&fix));
    })
}
