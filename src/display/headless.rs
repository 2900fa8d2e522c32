// src/display/headless.rs
//! Backend that draws nothing and records what it was asked to do

use super::RenderSurface;
use crate::{
    error::{MapError, Result},
    lifecycle::LifecycleEvent,
    map::style::StyleDocument,
};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Record {
    events: Vec<LifecycleEvent>,
    styles: Vec<String>,
}

/// Recording backend. Clones share the same record, so a test can keep one
/// clone while the surface owns another.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    record: Arc<Mutex<Record>>,
    fail_style: bool,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose `load_style` always fails
    pub fn failing() -> Self {
        Self {
            fail_style: true,
            ..Self::default()
        }
    }

    /// Lifecycle events received so far, in order
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.record.lock().map(|r| r.events.clone()).unwrap_or_default()
    }

    /// Names of the styles loaded so far
    pub fn styles(&self) -> Vec<String> {
        self.record.lock().map(|r| r.styles.clone()).unwrap_or_default()
    }
}

impl RenderSurface for HeadlessSurface {
    fn on_lifecycle(&mut self, event: LifecycleEvent) {
        if let Ok(mut record) = self.record.lock() {
            record.events.push(event);
        }
    }

    fn load_style(&mut self, style: &StyleDocument) -> Result<()> {
        if self.fail_style {
            return Err(MapError::Style("headless backend refused the style".to_string()));
        }
        style.validate()?;
        if let Ok(mut record) = self.record.lock() {
            record.styles.push(style.name.clone());
        }
        Ok(())
    }
}
