// src/location/fixed.rs
//! Provider that reports one configured coordinate

use super::{
    fix::{LocationFix, ProviderKind},
    permission::PermissionSource,
    provider::{check_permission, LocationListener, LocationProvider, UpdateRequest},
};
use crate::error::ProviderError;
use std::sync::Arc;
use tracing::debug;

/// Stands in for a network lookup on machines without one: the configured
/// position is the last known fix and is reported once per subscription.
pub struct FixedProvider {
    kind: ProviderKind,
    latitude: f64,
    longitude: f64,
    accuracy: Option<f64>,
    permissions: Arc<dyn PermissionSource>,
    subscribed: bool,
}

impl FixedProvider {
    pub fn new(kind: ProviderKind, latitude: f64, longitude: f64, permissions: Arc<dyn PermissionSource>) -> Self {
        Self {
            kind,
            latitude,
            longitude,
            accuracy: None,
            permissions,
            subscribed: false,
        }
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    fn fix(&self) -> LocationFix {
        let fix = LocationFix::new(self.latitude, self.longitude, self.kind);
        match self.accuracy {
            Some(accuracy) => fix.with_accuracy(accuracy),
            None => fix,
        }
    }
}

impl LocationProvider for FixedProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn request_updates(
        &mut self,
        _request: UpdateRequest,
        listener: Arc<dyn LocationListener>,
    ) -> Result<(), ProviderError> {
        check_permission(self.kind, self.permissions.as_ref())?;
        if self.subscribed {
            return Err(ProviderError::AlreadySubscribed);
        }
        self.subscribed = true;
        debug!(provider = %self.kind, "reporting fixed position");
        listener.on_location_changed(self.fix());
        Ok(())
    }

    fn remove_updates(&mut self) {
        self.subscribed = false;
    }

    fn last_known_fix(&self) -> Option<LocationFix> {
        check_permission(self.kind, self.permissions.as_ref()).ok()?;
        Some(self.fix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::permission::Grants;
    use std::sync::Mutex;

    #[test]
    fn test_reports_once_per_subscription() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let listener: Arc<dyn LocationListener> = Arc::new(move |fix: LocationFix| {
            sink.lock().unwrap().push(fix);
        });

        let mut provider = FixedProvider::new(ProviderKind::Network, 48.1, 11.5, Arc::new(Grants::new(false, true)))
            .with_accuracy(1500.0);
        provider.request_updates(UpdateRequest::default(), Arc::clone(&listener)).unwrap();
        assert_eq!(
            provider.request_updates(UpdateRequest::default(), Arc::clone(&listener)),
            Err(ProviderError::AlreadySubscribed)
        );

        provider.remove_updates();
        provider.request_updates(UpdateRequest::default(), listener).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].accuracy, Some(1500.0));
        assert_eq!(seen[0].provider, ProviderKind::Network);
    }

    #[test]
    fn test_last_known_needs_permission() {
        let provider = FixedProvider::new(ProviderKind::Network, 48.1, 11.5, Arc::new(Grants::new(false, false)));
        assert!(provider.last_known_fix().is_none());
    }
}
