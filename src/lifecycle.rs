// src/lifecycle.rs
//! Host screen lifecycle events

use std::fmt;

/// Transitions reported by the host that owns a map screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    Create,
    Start,
    Resume,
    Pause,
    Stop,
    Destroy,
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleEvent::Create => "create",
            LifecycleEvent::Start => "start",
            LifecycleEvent::Resume => "resume",
            LifecycleEvent::Pause => "pause",
            LifecycleEvent::Stop => "stop",
            LifecycleEvent::Destroy => "destroy",
        };
        f.write_str(name)
    }
}

/// Tracks which lifecycle transitions a host has already reported, so the
/// host can replay the missing ones when it tears down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Initialized,
    Created,
    Started,
    Resumed,
    Destroyed,
}

impl LifecycleState {
    pub fn apply(&mut self, event: LifecycleEvent) {
        *self = match event {
            LifecycleEvent::Create | LifecycleEvent::Stop => LifecycleState::Created,
            LifecycleEvent::Start | LifecycleEvent::Pause => LifecycleState::Started,
            LifecycleEvent::Resume => LifecycleState::Resumed,
            LifecycleEvent::Destroy => LifecycleState::Destroyed,
        };
    }

    /// Events needed to walk from this state down to `Destroy`
    pub fn teardown_events(self) -> Vec<LifecycleEvent> {
        match self {
            LifecycleState::Resumed => vec![LifecycleEvent::Pause, LifecycleEvent::Stop, LifecycleEvent::Destroy],
            LifecycleState::Started => vec![LifecycleEvent::Stop, LifecycleEvent::Destroy],
            LifecycleState::Created | LifecycleState::Initialized => vec![LifecycleEvent::Destroy],
            LifecycleState::Destroyed => Vec::new(),
        }
    }
}
