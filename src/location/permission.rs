// src/location/permission.rs
//! Location permission grants, read but never requested

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    FineLocation,
    CoarseLocation,
}

impl Permission {
    pub fn name(&self) -> &'static str {
        match self {
            Permission::FineLocation => "fine",
            Permission::CoarseLocation => "coarse",
        }
    }
}

pub trait PermissionSource: Send + Sync {
    fn is_granted(&self, permission: Permission) -> bool;

    fn any_location_granted(&self) -> bool {
        self.is_granted(Permission::FineLocation) || self.is_granted(Permission::CoarseLocation)
    }
}

/// Grants that can be flipped at runtime, e.g. from settings or tests
#[derive(Debug, Default)]
pub struct Grants {
    fine: AtomicBool,
    coarse: AtomicBool,
}

impl Grants {
    pub fn new(fine: bool, coarse: bool) -> Self {
        Self {
            fine: AtomicBool::new(fine),
            coarse: AtomicBool::new(coarse),
        }
    }

    pub fn set(&self, permission: Permission, granted: bool) {
        match permission {
            Permission::FineLocation => self.fine.store(granted, Ordering::SeqCst),
            Permission::CoarseLocation => self.coarse.store(granted, Ordering::SeqCst),
        }
    }
}

impl PermissionSource for Grants {
    fn is_granted(&self, permission: Permission) -> bool {
        match permission {
            Permission::FineLocation => self.fine.load(Ordering::SeqCst),
            Permission::CoarseLocation => self.coarse.load(Ordering::SeqCst),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_location_granted() {
        assert!(!Grants::new(false, false).any_location_granted());
        assert!(Grants::new(true, false).any_location_granted());
        assert!(Grants::new(false, true).any_location_granted());
    }

    #[test]
    fn test_revoke() {
        let grants = Grants::new(true, true);
        grants.set(Permission::FineLocation, false);
        assert!(!grants.is_granted(Permission::FineLocation));
        assert!(grants.is_granted(Permission::CoarseLocation));
    }
}
