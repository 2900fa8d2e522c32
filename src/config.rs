// src/config.rs
//! Configuration: tile API key, provider backends and location grants

use crate::{
    error::{MapError, Result},
    location::{
        fixed::FixedProvider, gpsd::GpsdProvider, nmea::NmeaSerialProvider, Grants, LocationBridge,
        LocationProvider, PermissionSource, ProviderKind, UpdateRequest,
    },
};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tokio::runtime::Handle;

/// Thunderforest key baked in at build time, if any
pub const BUILD_API_KEY: Option<&str> = option_env!("THUNDERFOREST_KEY");

/// Where a named provider gets its positions from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum ProviderConfig {
    Disabled,
    Gpsd { host: String, port: u16 },
    Serial { port: String, baudrate: u32 },
    Fixed { latitude: f64, longitude: f64 },
}

impl ProviderConfig {
    /// Instantiate the provider; None when disabled
    pub fn build(
        &self,
        kind: ProviderKind,
        runtime: &Handle,
        permissions: &Arc<dyn PermissionSource>,
    ) -> Option<Box<dyn LocationProvider>> {
        let permissions = Arc::clone(permissions);
        match self {
            ProviderConfig::Disabled => None,
            ProviderConfig::Gpsd { host, port } => {
                Some(Box::new(GpsdProvider::new(kind, host, *port, runtime.clone(), permissions)))
            }
            ProviderConfig::Serial { port, baudrate } => Some(Box::new(NmeaSerialProvider::new(
                kind,
                port,
                *baudrate,
                runtime.clone(),
                permissions,
            ))),
            ProviderConfig::Fixed { latitude, longitude } => {
                Some(Box::new(FixedProvider::new(kind, *latitude, *longitude, permissions)))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub api_key: Option<String>,
    pub gps: ProviderConfig,
    pub network: ProviderConfig,
    pub fine_location: bool,
    pub coarse_location: bool,
    pub min_interval_ms: u64,
    pub min_displacement_m: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            gps: ProviderConfig::Gpsd {
                host: "localhost".to_string(),
                port: 2947,
            },
            network: ProviderConfig::Disabled,
            fine_location: true,
            coarse_location: true,
            min_interval_ms: 2000,
            min_displacement_m: 5.0,
        }
    }
}

impl MapConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Load from a file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| MapError::Other(format!("Failed to read config file: {}", e)))?;

        serde_json::from_str(&contents).map_err(|e| MapError::Other(format!("Failed to parse config file: {}", e)))
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| MapError::Other(format!("Failed to create config directory: {}", e)))?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(|e| MapError::Other(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Config file path under the user's home
    pub fn get_config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| MapError::Other("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home).join(".config").join("cycle-map").join("config.json"))
    }

    /// Key used in the tile URL: config first, then the build-time key
    pub fn api_key(&self) -> &str {
        self.api_key.as_deref().or(BUILD_API_KEY).unwrap_or_default()
    }

    pub fn update_request(&self) -> UpdateRequest {
        UpdateRequest {
            min_interval: Duration::from_millis(self.min_interval_ms),
            min_displacement_m: self.min_displacement_m,
        }
    }

    pub fn grants(&self) -> Grants {
        Grants::new(self.fine_location, self.coarse_location)
    }

    /// Update gpsd settings for the GPS provider
    pub fn update_gpsd(&mut self, host: String, port: u16) {
        self.gps = ProviderConfig::Gpsd { host, port };
    }

    /// Update serial port settings for the GPS provider
    pub fn update_serial(&mut self, port: String, baudrate: u32) {
        self.gps = ProviderConfig::Serial { port, baudrate };
    }

    /// Use a fixed coordinate as the network provider
    pub fn update_fixed_network(&mut self, latitude: f64, longitude: f64) {
        self.network = ProviderConfig::Fixed { latitude, longitude };
    }

    /// Build a location bridge with the configured GPS and network providers
    pub fn location_bridge(&self, runtime: &Handle) -> LocationBridge {
        let permissions: Arc<dyn PermissionSource> = Arc::new(self.grants());
        let mut bridge = LocationBridge::new(Arc::clone(&permissions), self.update_request());

        for (kind, provider) in [(ProviderKind::Gps, &self.gps), (ProviderKind::Network, &self.network)] {
            if let Some(provider) = provider.build(kind, runtime, &permissions) {
                bridge.add_provider(provider);
            }
        }
        bridge
    }
}

/// Parse "host:port" for gpsd, port defaulting to 2947
pub fn parse_host_port(value: &str) -> Result<(String, u16)> {
    match value.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse()
                .map_err(|_| MapError::Parse(format!("invalid port in '{}'", value)))?;
            Ok((host.to_string(), port))
        }
        None => Ok((value.to_string(), 2947)),
    }
}

/// Parse "lat,lon"
pub fn parse_lat_lon(value: &str) -> Result<(f64, f64)> {
    let (lat, lon) = value
        .split_once(',')
        .ok_or_else(|| MapError::Parse(format!("expected LAT,LON, got '{}'", value)))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| MapError::Parse(format!("invalid latitude '{}'", lat)))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| MapError::Parse(format!("invalid longitude '{}'", lon)))?;

    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(MapError::Parse(format!("coordinate out of range: {}", value)));
    }
    Ok((lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = MapConfig::default();
        assert_eq!(config.gps, ProviderConfig::Gpsd { host: "localhost".to_string(), port: 2947 });
        assert_eq!(config.network, ProviderConfig::Disabled);

        let request = config.update_request();
        assert_eq!(request.min_interval, Duration::from_millis(2000));
        assert_eq!(request.min_displacement_m, 5.0);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: MapConfig = serde_json::from_str(
            r#"{"api_key":"abc","network":{"backend":"fixed","latitude":48.1,"longitude":11.5}}"#,
        )
        .unwrap();

        assert_eq!(config.api_key(), "abc");
        assert_eq!(config.network, ProviderConfig::Fixed { latitude: 48.1, longitude: 11.5 });
        assert!(config.fine_location);
        assert_eq!(config.min_interval_ms, 2000);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir()
            .join(format!("cycle-map-test-{}", std::process::id()))
            .join("config.json");

        let mut config = MapConfig::default();
        config.update_serial("/dev/ttyUSB0".to_string(), 115200);
        config.coarse_location = false;
        config.save_to(&path).unwrap();

        let loaded = MapConfig::load_from(&path).unwrap();
        assert_eq!(loaded.gps, ProviderConfig::Serial { port: "/dev/ttyUSB0".to_string(), baudrate: 115200 });
        assert!(!loaded.coarse_location);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = MapConfig::load_from(Path::new("/nonexistent/cycle-map/config.json")).unwrap();
        assert_eq!(config.min_displacement_m, 5.0);
    }

    #[tokio::test]
    async fn test_bridge_skips_disabled_providers() {
        let mut config = MapConfig::default();
        config.update_fixed_network(48.1, 11.5);
        let bridge = config.location_bridge(&Handle::current());
        assert_eq!(bridge.provider_kinds(), vec![ProviderKind::Gps, ProviderKind::Network]);

        config.gps = ProviderConfig::Disabled;
        let bridge = config.location_bridge(&Handle::current());
        assert_eq!(bridge.provider_kinds(), vec![ProviderKind::Network]);
    }

    #[test]
    fn test_parse_host_port() {
        assert_eq!(parse_host_port("gps.local:3000").unwrap(), ("gps.local".to_string(), 3000));
        assert_eq!(parse_host_port("localhost").unwrap(), ("localhost".to_string(), 2947));
        assert!(parse_host_port("host:port").is_err());
    }

    #[test]
    fn test_parse_lat_lon() {
        assert_eq!(parse_lat_lon("52.52, 13.405").unwrap(), (52.52, 13.405));
        assert!(parse_lat_lon("52.52").is_err());
        assert!(parse_lat_lon("95,0").is_err());
    }
}
