// src/map/projection.rs
//! Web Mercator tile math and great-circle distance

use std::f64::consts::PI;

pub const TILE_SIZE: f64 = 256.0;

const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Mercator latitude limit; tiles do not exist beyond it
pub const MAX_LATITUDE: f64 = 85.051_128_78;

/// Calculate tile coordinates from lat/lon and zoom level
pub fn lat_lon_to_tile(lat: f64, lon: f64, zoom: u8) -> (u32, u32) {
    let n = 2_f64.powi(zoom as i32);
    let (wx, wy) = lat_lon_to_world(lat, lon, zoom as f64);
    let max = (n - 1.0).max(0.0);
    let x = (wx / TILE_SIZE).floor().clamp(0.0, max) as u32;
    let y = (wy / TILE_SIZE).floor().clamp(0.0, max) as u32;
    (x, y)
}

/// Calculate lat/lon of the north-west corner of a tile
pub fn tile_to_lat_lon(x: u32, y: u32, zoom: u8) -> (f64, f64) {
    let n = 2_f64.powi(zoom as i32);
    let lon = x as f64 / n * 360.0 - 180.0;
    let lat_rad = ((1.0 - 2.0 * y as f64 / n) * PI).sinh().atan();
    (lat_rad.to_degrees(), lon)
}

/// Project a coordinate to world pixels at a (possibly fractional) zoom
pub fn lat_lon_to_world(lat: f64, lon: f64, zoom: f64) -> (f64, f64) {
    let scale = 2_f64.powf(zoom) * TILE_SIZE;
    let lat_rad = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (lon + 180.0) / 360.0 * scale;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * scale;
    (x, y)
}

/// Inverse of [`lat_lon_to_world`]
pub fn world_to_lat_lon(x: f64, y: f64, zoom: f64) -> (f64, f64) {
    let scale = 2_f64.powf(zoom) * TILE_SIZE;
    let lon = x / scale * 360.0 - 180.0;
    let lat_rad = ((1.0 - 2.0 * y / scale) * PI).sinh().atan();
    (lat_rad.to_degrees(), lon)
}

/// Wrap a longitude into [-180, 180)
pub fn wrap_longitude(lon: f64) -> f64 {
    if (-180.0..180.0).contains(&lon) {
        return lon;
    }
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Haversine distance in meters
pub fn distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().asin()
}
