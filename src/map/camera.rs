// src/map/camera.rs
//! Camera position and zoom bounds

use super::projection::{self, MAX_LATITUDE};
use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: f64 = 2.0;
pub const MAX_ZOOM: f64 = 22.0;

/// Zoom used when the camera jumps to the first fix
pub const FIX_ZOOM: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPosition {
    pub target: LatLng,
    pub zoom: f64,
}

impl Default for CameraPosition {
    fn default() -> Self {
        Self {
            target: LatLng::new(0.0, 0.0),
            zoom: MIN_ZOOM,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Camera {
    position: CameraPosition,
    min_zoom: f64,
    max_zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(MIN_ZOOM, MAX_ZOOM)
    }
}

impl Camera {
    pub fn new(min_zoom: f64, max_zoom: f64) -> Self {
        Self {
            position: CameraPosition {
                target: LatLng::new(0.0, 0.0),
                zoom: min_zoom,
            },
            min_zoom,
            max_zoom,
        }
    }

    pub fn position(&self) -> CameraPosition {
        self.position
    }

    pub fn zoom_bounds(&self) -> (f64, f64) {
        (self.min_zoom, self.max_zoom)
    }

    /// Move the camera; zoom is clamped to the bounds
    pub fn set_position(&mut self, target: LatLng, zoom: f64) {
        self.position = CameraPosition {
            target: LatLng::new(
                target.latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE),
                projection::wrap_longitude(target.longitude),
            ),
            zoom: zoom.clamp(self.min_zoom, self.max_zoom),
        };
    }

    /// Pan by a screen-pixel delta
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let zoom = self.position.zoom;
        let (wx, wy) = projection::lat_lon_to_world(
            self.position.target.latitude,
            self.position.target.longitude,
            zoom,
        );
        let (lat, lon) = projection::world_to_lat_lon(wx - dx, wy - dy, zoom);
        self.set_position(LatLng::new(lat, lon), zoom);
    }

    pub fn zoom_by(&mut self, delta: f64) {
        let target = self.position.target;
        self.set_position(target, self.position.zoom + delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, MIN_ZOOM)]
    #[case(1.99, MIN_ZOOM)]
    #[case(15.0, 15.0)]
    #[case(22.0, MAX_ZOOM)]
    #[case(30.0, MAX_ZOOM)]
    fn test_zoom_clamped(#[case] requested: f64, #[case] expected: f64) {
        let mut camera = Camera::default();
        camera.set_position(LatLng::new(48.1, 11.5), requested);
        assert_eq!(camera.position().zoom, expected);
    }

    #[test]
    fn test_pan_moves_target() {
        let mut camera = Camera::default();
        camera.set_position(LatLng::new(48.1, 11.5), 15.0);
        camera.pan_by(100.0, 0.0);

        let target = camera.position().target;
        assert!(target.longitude < 11.5);
        assert!((target.latitude - 48.1).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_by() {
        let mut camera = Camera::default();
        camera.set_position(LatLng::new(48.1, 11.5), 21.5);
        camera.zoom_by(1.0);
        assert_eq!(camera.position().zoom, MAX_ZOOM);
        camera.zoom_by(-30.0);
        assert_eq!(camera.position().zoom, MIN_ZOOM);
    }
}
