// src/map/surface.rs
//! Map surface: style state machine, "you are here" marker and the
//! centered-once camera latch

use super::{
    camera::{Camera, CameraPosition, LatLng, FIX_ZOOM, MAX_ZOOM, MIN_ZOOM},
    style::{CirclePaint, Geometry, Layer, Source, StyleDocument, HERE_LAYER_ID, HERE_SOURCE_ID},
};
use crate::{
    display::RenderSurface,
    error::{MapError, Result},
    lifecycle::{LifecycleEvent, LifecycleState},
    location::LocationFix,
};
use tracing::{debug, info, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
    Uninitialized,
    StyleLoading,
    StyleReady,
    Destroyed,
}

pub struct MapSurface<R: RenderSurface> {
    renderer: R,
    state: SurfaceState,
    lifecycle: LifecycleState,
    style: Option<StyleDocument>,
    camera: Camera,
    centered: bool,
}

impl<R: RenderSurface> MapSurface<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            state: SurfaceState::Uninitialized,
            lifecycle: LifecycleState::default(),
            style: None,
            camera: Camera::new(MIN_ZOOM, MAX_ZOOM),
            centered: false,
        }
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn is_style_ready(&self) -> bool {
        self.state == SurfaceState::StyleReady
    }

    pub fn lifecycle(&self) -> LifecycleState {
        self.lifecycle
    }

    /// Whether the camera has already jumped to a fix
    pub fn is_centered(&self) -> bool {
        self.centered
    }

    pub fn style(&self) -> Option<&StyleDocument> {
        self.style.as_ref()
    }

    pub fn camera(&self) -> CameraPosition {
        self.camera.position()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Current marker coordinate, if the marker source exists
    pub fn marker_position(&self) -> Option<LatLng> {
        self.style
            .as_ref()
            .and_then(|style| style.geojson(HERE_SOURCE_ID))
            .map(|geometry| {
                let (lat, lon) = geometry.lat_lon();
                LatLng::new(lat, lon)
            })
    }

    /// Hand a style to the backend and start loading it
    pub fn set_style(&mut self, style: StyleDocument) -> Result<()> {
        if self.state == SurfaceState::Destroyed {
            return Err(MapError::Style("surface has been destroyed".to_string()));
        }

        self.renderer.load_style(&style)?;
        debug!(name = %style.name, "style loading");
        self.style = Some(style);
        self.state = SurfaceState::StyleLoading;
        Ok(())
    }

    /// Style finished loading: install the marker source and layer
    pub fn on_style_loaded(&mut self) {
        if self.state != SurfaceState::StyleLoading {
            trace!(state = ?self.state, "ignoring style-loaded outside of loading");
            return;
        }
        let Some(style) = self.style.as_mut() else {
            return;
        };

        if style.source(HERE_SOURCE_ID).is_none() {
            style.add_source(
                HERE_SOURCE_ID,
                Source::GeoJson {
                    data: Geometry::point(0.0, 0.0),
                },
            );
        }
        if style.layer(HERE_LAYER_ID).is_none() {
            style.add_layer(Layer::circle(HERE_LAYER_ID, HERE_SOURCE_ID, CirclePaint::here_marker()));
        }

        self.state = SurfaceState::StyleReady;
        info!(name = %style.name, "style ready");
    }

    /// Move the marker to a fix. Returns false when the update was dropped
    /// because the style is not ready; dropped updates are not replayed.
    pub fn update_marker(&mut self, lat: f64, lon: f64) -> bool {
        if self.state != SurfaceState::StyleReady {
            debug!(lat, lon, state = ?self.state, "dropping marker update");
            return false;
        }
        self.style
            .as_mut()
            .map_or(false, |style| style.set_geojson(HERE_SOURCE_ID, Geometry::point(lat, lon)))
    }

    /// Jump the camera to a fix at zoom 15, only the first time. Later
    /// calls leave the camera where the user put it. Ignored until the style
    /// is ready, without consuming the latch.
    pub fn center_camera(&mut self, lat: f64, lon: f64) -> bool {
        if self.centered || self.state != SurfaceState::StyleReady {
            return false;
        }
        self.centered = true;
        self.camera.set_position(LatLng::new(lat, lon), FIX_ZOOM);
        info!(lat, lon, "camera centered on first fix");
        true
    }

    /// Accept a fix from the location bridge
    pub fn on_fix(&mut self, fix: &LocationFix) {
        if !self.update_marker(fix.latitude, fix.longitude) {
            return;
        }
        self.center_camera(fix.latitude, fix.longitude);
    }

    /// User gesture: pan by a screen-pixel delta
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if self.state != SurfaceState::Destroyed {
            self.camera.pan_by(dx, dy);
        }
    }

    /// User gesture: change zoom, clamped to the bounds
    pub fn zoom_by(&mut self, delta: f64) {
        if self.state != SurfaceState::Destroyed {
            self.camera.zoom_by(delta);
        }
    }

    /// Forward a host lifecycle transition to the backend
    pub fn on_lifecycle(&mut self, event: LifecycleEvent) {
        if self.state == SurfaceState::Destroyed {
            trace!(%event, "surface already destroyed");
            return;
        }

        self.renderer.on_lifecycle(event);
        self.lifecycle.apply(event);

        if event == LifecycleEvent::Destroy {
            self.state = SurfaceState::Destroyed;
            self.style = None;
            debug!("surface destroyed");
        }
    }
}

impl<R: RenderSurface> Drop for MapSurface<R> {
    fn drop(&mut self) {
        if self.state != SurfaceState::Destroyed {
            for event in self.lifecycle.teardown_events() {
                self.on_lifecycle(event);
            }
        }
    }
}
