// src/location/mock.rs
//! Mock location provider for testing and demos

use super::{
    fix::{LocationFix, ProviderKind},
    provider::{LocationListener, LocationProvider, UpdateRequest},
};
use crate::error::ProviderError;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct MockState {
    listener: Option<Arc<dyn LocationListener>>,
    request: Option<UpdateRequest>,
    last_known: Option<LocationFix>,
    subscribe_error: Option<ProviderError>,
    subscribe_calls: usize,
    remove_calls: usize,
}

/// Scripted provider. Cloning yields a controller that shares state with the
/// copy handed to the bridge, so a test can push fixes and inspect calls.
#[derive(Clone)]
pub struct MockProvider {
    kind: ProviderKind,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Make every subscribe attempt fail with `error`
    pub fn fail_subscribe(self, error: ProviderError) -> Self {
        self.with_state(|state| state.subscribe_error = Some(error));
        self
    }

    pub fn with_last_known(self, latitude: f64, longitude: f64) -> Self {
        let fix = LocationFix::new(latitude, longitude, self.kind);
        self.with_state(|state| state.last_known = Some(fix));
        self
    }

    /// Deliver a fix as if the platform reported it. Returns false when
    /// nobody is subscribed.
    pub fn emit(&self, latitude: f64, longitude: f64) -> bool {
        let fix = LocationFix::new(latitude, longitude, self.kind);
        let listener = self.with_state(|state| {
            state.last_known = Some(fix.clone());
            state.listener.clone()
        });
        match listener {
            Some(listener) => {
                listener.on_location_changed(fix);
                true
            }
            None => false,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.with_state(|state| state.listener.is_some())
    }

    pub fn subscribe_calls(&self) -> usize {
        self.with_state(|state| state.subscribe_calls)
    }

    pub fn remove_calls(&self) -> usize {
        self.with_state(|state| state.remove_calls)
    }

    pub fn last_request(&self) -> Option<UpdateRequest> {
        self.with_state(|state| state.request)
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MockState) -> T) -> T {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut state)
    }
}

impl LocationProvider for MockProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn request_updates(
        &mut self,
        request: UpdateRequest,
        listener: Arc<dyn LocationListener>,
    ) -> Result<(), ProviderError> {
        self.with_state(|state| {
            state.subscribe_calls += 1;
            if let Some(error) = state.subscribe_error.clone() {
                return Err(error);
            }
            state.request = Some(request);
            state.listener = Some(listener);
            Ok(())
        })
    }

    fn remove_updates(&mut self) {
        self.with_state(|state| {
            state.remove_calls += 1;
            state.listener = None;
        });
    }

    fn last_known_fix(&self) -> Option<LocationFix> {
        self.with_state(|state| state.last_known.clone())
    }
}
