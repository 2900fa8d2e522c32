// src/map/thread.rs
//! Marshaling work onto the thread that owns the map surface

use super::surface::MapSurface;
use crate::display::RenderSurface;
use std::sync::mpsc;
use tracing::trace;

pub type MapTask<R> = Box<dyn FnOnce(&mut MapSurface<R>) + Send>;

/// Receiving end, owned by the UI context
pub struct MapThread<R: RenderSurface> {
    tx: mpsc::Sender<MapTask<R>>,
    rx: mpsc::Receiver<MapTask<R>>,
}

/// Posting end; clone freely and send to provider threads
pub struct MapHandle<R: RenderSurface> {
    tx: mpsc::Sender<MapTask<R>>,
}

impl<R: RenderSurface> Clone for MapHandle<R> {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone() }
    }
}

impl<R: RenderSurface> MapHandle<R> {
    /// Queue a task for the next drain. Returns false when the map thread
    /// is gone; the task is dropped.
    pub fn post<F>(&self, task: F) -> bool
    where
        F: FnOnce(&mut MapSurface<R>) + Send + 'static,
    {
        let posted = self.tx.send(Box::new(task)).is_ok();
        if !posted {
            trace!("map thread gone, dropping task");
        }
        posted
    }
}

impl<R: RenderSurface> Default for MapThread<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RenderSurface> MapThread<R> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub fn handle(&self) -> MapHandle<R> {
        MapHandle { tx: self.tx.clone() }
    }

    /// Run every queued task against the surface, in posting order
    pub fn drain(&self, surface: &mut MapSurface<R>) -> usize {
        let mut count = 0;
        while let Ok(task) = self.rx.try_recv() {
            task(surface);
            count += 1;
        }
        count
    }
}
