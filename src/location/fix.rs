// src/location/fix.rs
//! Location fixes and the providers that report them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Named location provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Satellite receiver, high accuracy
    Gps,
    /// Network or otherwise approximate location
    Network,
}

impl ProviderKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Gps => "gps",
            ProviderKind::Network => "network",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single reported position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    pub provider: ProviderKind,
    pub timestamp: DateTime<Utc>,
    /// Horizontal accuracy in meters, when the provider reports it
    pub accuracy: Option<f64>,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64, provider: ProviderKind) -> Self {
        Self {
            latitude,
            longitude,
            provider,
            timestamp: Utc::now(),
            accuracy: None,
        }
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for LocationFix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6} ({})", self.latitude, self.longitude, self.provider)?;
        if let Some(accuracy) = self.accuracy {
            write!(f, " ±{:.0} m", accuracy)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity() {
        assert!(LocationFix::new(52.52, 13.405, ProviderKind::Gps).is_valid());
        assert!(!LocationFix::new(91.0, 0.0, ProviderKind::Gps).is_valid());
        assert!(!LocationFix::new(0.0, f64::NAN, ProviderKind::Network).is_valid());
    }

    #[test]
    fn test_display() {
        let fix = LocationFix::new(48.1, 11.5, ProviderKind::Network).with_accuracy(25.0);
        assert_eq!(fix.to_string(), "48.100000, 11.500000 (network) ±25 m");
    }
}
