// src/location/provider.rs
//! Location provider interface and the update thresholds providers honor

use super::{
    fix::{LocationFix, ProviderKind},
    permission::{Permission, PermissionSource},
};
use crate::{error::ProviderError, map::projection};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(2000);
pub const DEFAULT_MIN_DISPLACEMENT_M: f64 = 5.0;

/// Receives fixes from providers, on whatever thread the provider reports on
pub trait LocationListener: Send + Sync {
    fn on_location_changed(&self, fix: LocationFix);
}

impl<F> LocationListener for F
where
    F: Fn(LocationFix) + Send + Sync,
{
    fn on_location_changed(&self, fix: LocationFix) {
        self(fix)
    }
}

/// Subscription thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateRequest {
    pub min_interval: Duration,
    pub min_displacement_m: f64,
}

impl Default for UpdateRequest {
    fn default() -> Self {
        Self {
            min_interval: DEFAULT_MIN_INTERVAL,
            min_displacement_m: DEFAULT_MIN_DISPLACEMENT_M,
        }
    }
}

pub trait LocationProvider: Send {
    fn kind(&self) -> ProviderKind;

    /// Start delivering fixes to `listener`. Fails without side effects when
    /// permission is missing or the provider cannot start.
    fn request_updates(
        &mut self,
        request: UpdateRequest,
        listener: Arc<dyn LocationListener>,
    ) -> Result<(), ProviderError>;

    /// Stop delivering fixes. Safe to call when not subscribed.
    fn remove_updates(&mut self);

    /// Most recent fix this provider has seen, without waiting
    fn last_known_fix(&self) -> Option<LocationFix>;
}

/// Permission a provider of the given kind needs before subscribing
pub fn check_permission(kind: ProviderKind, permissions: &dyn PermissionSource) -> Result<(), ProviderError> {
    let granted = match kind {
        ProviderKind::Gps => permissions.is_granted(Permission::FineLocation),
        ProviderKind::Network => permissions.any_location_granted(),
    };

    if granted {
        Ok(())
    } else {
        let needed = match kind {
            ProviderKind::Gps => Permission::FineLocation,
            ProviderKind::Network => Permission::CoarseLocation,
        };
        Err(ProviderError::PermissionDenied(needed.name()))
    }
}

/// Applies an [`UpdateRequest`]: a fix goes through when it is the first one,
/// when `min_interval` has passed since the last delivered fix, or when it
/// moved at least `min_displacement_m` from it.
#[derive(Debug, Clone)]
pub struct UpdateThrottle {
    request: UpdateRequest,
    last: Option<LocationFix>,
}

impl UpdateThrottle {
    pub fn new(request: UpdateRequest) -> Self {
        Self { request, last: None }
    }

    pub fn accept(&mut self, fix: &LocationFix) -> bool {
        let pass = match &self.last {
            None => true,
            Some(last) => {
                let elapsed = fix
                    .timestamp
                    .signed_duration_since(last.timestamp)
                    .to_std()
                    .unwrap_or(Duration::ZERO);
                let moved = projection::distance_m(last.latitude, last.longitude, fix.latitude, fix.longitude);
                elapsed >= self.request.min_interval || moved >= self.request.min_displacement_m
            }
        };

        if pass {
            self.last = Some(fix.clone());
        }
        pass
    }
}

/// Delivery path shared by the streaming providers: remembers the last
/// known fix and forwards throttled fixes to the listener.
#[derive(Clone)]
pub(crate) struct FixSink {
    listener: Arc<dyn LocationListener>,
    throttle: Arc<Mutex<UpdateThrottle>>,
    last_known: Arc<Mutex<Option<LocationFix>>>,
}

impl FixSink {
    pub(crate) fn new(
        request: UpdateRequest,
        listener: Arc<dyn LocationListener>,
        last_known: Arc<Mutex<Option<LocationFix>>>,
    ) -> Self {
        Self {
            listener,
            throttle: Arc::new(Mutex::new(UpdateThrottle::new(request))),
            last_known,
        }
    }

    pub(crate) fn report(&self, fix: LocationFix) {
        if !fix.is_valid() {
            return;
        }

        if let Ok(mut last_known) = self.last_known.lock() {
            *last_known = Some(fix.clone());
        }

        let deliver = self.throttle.lock().map_or(false, |mut throttle| throttle.accept(&fix));
        if deliver {
            self.listener.on_location_changed(fix);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::permission::Grants;
    use chrono::{Duration as ChronoDuration, Utc};

    fn fix_at(lat: f64, lon: f64, seconds: i64) -> LocationFix {
        let base = Utc::now();
        LocationFix::new(lat, lon, ProviderKind::Gps).with_timestamp(base + ChronoDuration::seconds(seconds))
    }

    #[test]
    fn test_throttle_interval_or_displacement() {
        let base = Utc::now();
        let at = |lat: f64, ms: i64| {
            LocationFix::new(lat, 11.5, ProviderKind::Gps).with_timestamp(base + ChronoDuration::milliseconds(ms))
        };
        let mut throttle = UpdateThrottle::new(UpdateRequest::default());

        assert!(throttle.accept(&at(48.1, 0)));
        // Same place, too soon
        assert!(!throttle.accept(&at(48.1, 500)));
        // Same place, interval elapsed
        assert!(throttle.accept(&at(48.1, 2000)));
        // ~11 m north, too soon but far enough
        assert!(throttle.accept(&at(48.1001, 2100)));
        // ~1 m, too soon
        assert!(!throttle.accept(&at(48.10011, 2200)));
    }

    #[test]
    fn test_throttle_first_fix_always_passes() {
        let mut throttle = UpdateThrottle::new(UpdateRequest {
            min_interval: Duration::from_secs(3600),
            min_displacement_m: 1_000_000.0,
        });
        assert!(throttle.accept(&fix_at(0.0, 0.0, 0)));
        assert!(!throttle.accept(&fix_at(0.0, 0.0, 1)));
    }

    #[test]
    fn test_gps_needs_fine_permission() {
        let coarse_only = Grants::new(false, true);
        assert_eq!(
            check_permission(ProviderKind::Gps, &coarse_only),
            Err(ProviderError::PermissionDenied("fine"))
        );
        assert_eq!(check_permission(ProviderKind::Network, &coarse_only), Ok(()));

        let none = Grants::new(false, false);
        assert!(check_permission(ProviderKind::Network, &none).is_err());
    }

    #[test]
    fn test_sink_remembers_throttled_fixes() {
        let delivered = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&delivered);
        let listener: Arc<dyn LocationListener> = Arc::new(move |fix: LocationFix| {
            seen.lock().unwrap().push(fix);
        });
        let last_known = Arc::new(Mutex::new(None));
        let sink = FixSink::new(UpdateRequest::default(), listener, Arc::clone(&last_known));

        sink.report(fix_at(48.1, 11.5, 0));
        sink.report(fix_at(48.1, 11.5, 0));
        sink.report(fix_at(f64::NAN, 11.5, 0));

        assert_eq!(delivered.lock().unwrap().len(), 1);
        assert_eq!(last_known.lock().unwrap().as_ref().map(|f| f.latitude), Some(48.1));
    }
}
