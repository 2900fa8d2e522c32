// src/location/mod.rs
//! Location providers and the bridge that feeds their fixes to the map

pub mod bridge;
pub mod fix;
pub mod fixed;
pub mod gpsd;
pub mod mock;
pub mod nmea;
pub mod permission;
pub mod provider;

pub use bridge::{BridgeStart, LocationBridge};
pub use fix::{LocationFix, ProviderKind};
pub use permission::{Grants, Permission, PermissionSource};
pub use provider::{LocationListener, LocationProvider, UpdateRequest};
