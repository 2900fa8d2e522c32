// src/location/bridge.rs
//! Location bridge: subscribes the providers and hands every fix to one
//! listener

use super::{
    fix::{LocationFix, ProviderKind},
    permission::PermissionSource,
    provider::{LocationListener, LocationProvider, UpdateRequest},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of [`LocationBridge::start`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BridgeStart {
    /// Providers whose subscription succeeded
    pub subscribed: Vec<ProviderKind>,
    /// Providers whose subscription failed and were skipped
    pub failed: Vec<ProviderKind>,
    /// Provider whose last known fix was delivered immediately
    pub last_known: Option<ProviderKind>,
}

pub struct LocationBridge {
    providers: Vec<Box<dyn LocationProvider>>,
    subscribed: Vec<usize>,
    permissions: Arc<dyn PermissionSource>,
    request: UpdateRequest,
}

impl LocationBridge {
    pub fn new(permissions: Arc<dyn PermissionSource>, request: UpdateRequest) -> Self {
        Self {
            providers: Vec::new(),
            subscribed: Vec::new(),
            permissions,
            request,
        }
    }

    pub fn with_provider(mut self, provider: impl LocationProvider + 'static) -> Self {
        self.add_provider(Box::new(provider));
        self
    }

    pub fn add_provider(&mut self, provider: Box<dyn LocationProvider>) {
        self.providers.push(provider);
    }

    pub fn provider_kinds(&self) -> Vec<ProviderKind> {
        self.providers.iter().map(|p| p.kind()).collect()
    }

    pub fn is_subscribed(&self) -> bool {
        !self.subscribed.is_empty()
    }

    /// Subscribe every provider and deliver the last known fix, if any.
    ///
    /// Without a location permission nothing is subscribed and no fix is
    /// ever delivered. A provider that fails to subscribe is skipped; the
    /// others are unaffected.
    pub fn start(&mut self, listener: Arc<dyn LocationListener>) -> BridgeStart {
        let mut outcome = BridgeStart::default();

        if !self.permissions.any_location_granted() {
            debug!("no location permission granted, map will show no position");
            return outcome;
        }

        for (index, provider) in self.providers.iter_mut().enumerate() {
            if self.subscribed.contains(&index) {
                continue;
            }
            match provider.request_updates(self.request, Arc::clone(&listener)) {
                Ok(()) => {
                    info!(provider = %provider.kind(), "subscribed to location updates");
                    self.subscribed.push(index);
                    outcome.subscribed.push(provider.kind());
                }
                Err(e) => {
                    warn!(provider = %provider.kind(), error = %e, "location provider did not start");
                    outcome.failed.push(provider.kind());
                }
            }
        }

        if let Some(fix) = self.last_known_fix() {
            debug!(%fix, "delivering last known fix");
            outcome.last_known = Some(fix.provider);
            listener.on_location_changed(fix);
        }

        outcome
    }

    /// Last known fix, GPS preferred over network
    fn last_known_fix(&self) -> Option<LocationFix> {
        let mut providers: Vec<&dyn LocationProvider> = self.providers.iter().map(|p| p.as_ref()).collect();
        providers.sort_by_key(|provider| provider.kind());
        providers.into_iter().find_map(|provider| provider.last_known_fix())
    }

    /// Unsubscribe every provider that `start` subscribed
    pub fn stop(&mut self) {
        for index in self.subscribed.drain(..) {
            if let Some(provider) = self.providers.get_mut(index) {
                provider.remove_updates();
                debug!(provider = %provider.kind(), "unsubscribed from location updates");
            }
        }
    }
}

impl Drop for LocationBridge {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ProviderError,
        location::{mock::MockProvider, permission::Grants},
    };
    use std::sync::Mutex;

    fn collector() -> (Arc<dyn LocationListener>, Arc<Mutex<Vec<LocationFix>>>) {
        let fixes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&fixes);
        let listener: Arc<dyn LocationListener> = Arc::new(move |fix: LocationFix| {
            sink.lock().unwrap().push(fix);
        });
        (listener, fixes)
    }

    #[test]
    fn test_no_permission_no_subscription() {
        let gps = MockProvider::new(ProviderKind::Gps).with_last_known(52.52, 13.405);
        let network = MockProvider::new(ProviderKind::Network);
        let mut bridge = LocationBridge::new(Arc::new(Grants::new(false, false)), UpdateRequest::default())
            .with_provider(gps.clone())
            .with_provider(network.clone());
        let (listener, fixes) = collector();

        let outcome = bridge.start(listener);

        assert_eq!(outcome, BridgeStart::default());
        assert_eq!(gps.subscribe_calls(), 0);
        assert_eq!(network.subscribe_calls(), 0);
        assert!(!gps.emit(1.0, 2.0));
        assert!(fixes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failed_provider_does_not_block_other() {
        let gps = MockProvider::new(ProviderKind::Gps).fail_subscribe(ProviderError::PermissionDenied("fine"));
        let network = MockProvider::new(ProviderKind::Network);
        let mut bridge = LocationBridge::new(Arc::new(Grants::new(true, true)), UpdateRequest::default())
            .with_provider(gps.clone())
            .with_provider(network.clone());
        let (listener, fixes) = collector();

        let outcome = bridge.start(listener);

        assert_eq!(outcome.subscribed, vec![ProviderKind::Network]);
        assert_eq!(outcome.failed, vec![ProviderKind::Gps]);
        assert!(network.is_subscribed());
        assert!(network.emit(48.1, 11.5));
        assert_eq!(fixes.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_request_thresholds_passed_through() {
        let gps = MockProvider::new(ProviderKind::Gps);
        let mut bridge =
            LocationBridge::new(Arc::new(Grants::new(true, false)), UpdateRequest::default()).with_provider(gps.clone());
        let (listener, _) = collector();
        bridge.start(listener);

        let request = gps.last_request().unwrap();
        assert_eq!(request.min_interval.as_millis(), 2000);
        assert_eq!(request.min_displacement_m, 5.0);
    }

    #[test]
    fn test_last_known_prefers_gps() {
        let network = MockProvider::new(ProviderKind::Network).with_last_known(48.0, 11.0);
        let gps = MockProvider::new(ProviderKind::Gps).with_last_known(52.52, 13.405);
        let mut bridge = LocationBridge::new(Arc::new(Grants::new(true, true)), UpdateRequest::default())
            .with_provider(network)
            .with_provider(gps);
        let (listener, fixes) = collector();

        let outcome = bridge.start(listener);

        assert_eq!(outcome.last_known, Some(ProviderKind::Gps));
        let fixes = fixes.lock().unwrap();
        assert_eq!(fixes.len(), 1);
        assert_eq!((fixes[0].latitude, fixes[0].longitude), (52.52, 13.405));
    }

    #[test]
    fn test_last_known_falls_back_to_network() {
        let gps = MockProvider::new(ProviderKind::Gps);
        let network = MockProvider::new(ProviderKind::Network).with_last_known(48.0, 11.0);
        let mut bridge = LocationBridge::new(Arc::new(Grants::new(false, true)), UpdateRequest::default())
            .with_provider(gps)
            .with_provider(network);
        let (listener, fixes) = collector();

        assert_eq!(bridge.start(listener).last_known, Some(ProviderKind::Network));
        assert_eq!(fixes.lock().unwrap()[0].provider, ProviderKind::Network);
    }

    #[test]
    fn test_both_providers_delivered_without_dedup() {
        let gps = MockProvider::new(ProviderKind::Gps);
        let network = MockProvider::new(ProviderKind::Network);
        let mut bridge = LocationBridge::new(Arc::new(Grants::new(true, true)), UpdateRequest::default())
            .with_provider(gps.clone())
            .with_provider(network.clone());
        let (listener, fixes) = collector();
        bridge.start(listener);

        gps.emit(48.1, 11.5);
        network.emit(48.1, 11.5);

        assert_eq!(fixes.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_stop_unsubscribes_only_subscribed() {
        let gps = MockProvider::new(ProviderKind::Gps).fail_subscribe(ProviderError::Unavailable("gone".into()));
        let network = MockProvider::new(ProviderKind::Network);
        let mut bridge = LocationBridge::new(Arc::new(Grants::new(true, true)), UpdateRequest::default())
            .with_provider(gps.clone())
            .with_provider(network.clone());
        let (listener, _) = collector();
        bridge.start(listener);

        bridge.stop();
        bridge.stop();

        assert_eq!(gps.remove_calls(), 0);
        assert_eq!(network.remove_calls(), 1);
        assert!(!network.is_subscribed());
        assert!(!bridge.is_subscribed());
    }
}
