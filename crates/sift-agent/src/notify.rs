//! Notification channel for screening events.
//!
//! Screening code only sees [`EventSink`]. [`SessionRegistry`] is the
//! in-process implementation: sessions register, join rooms and receive
//! events over unbounded channels.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use sift_core::events::{EventScope, ScreeningEvent};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// Receives screening events for delivery.
pub trait EventSink: Send + Sync {
    /// Deliver `event` to `scope`. Returns how many sessions received it.
    fn publish(&self, scope: &EventScope, event: &ScreeningEvent) -> usize;
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _scope: &EventScope, _event: &ScreeningEvent) -> usize {
        0
    }
}

#[derive(Default)]
struct Registry {
    sessions: HashMap<String, UnboundedSender<ScreeningEvent>>,
    rooms: HashMap<String, HashSet<String>>,
}

impl Registry {
    fn leave_all(&mut self, session_id: &str) {
        self.rooms.retain(|_, members| {
            members.remove(session_id);
            !members.is_empty()
        });
    }
}

/// In-memory session and room registry.
#[derive(Default)]
pub struct SessionRegistry {
    inner: Mutex<Registry>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Register a session and return its event stream. Registering an id
    /// again replaces the previous stream.
    pub fn register(&self, session_id: &str) -> UnboundedReceiver<ScreeningEvent> {
        let (tx, rx) = unbounded_channel();
        self.lock().sessions.insert(session_id.to_string(), tx);
        tracing::debug!(session_id, "session registered");
        rx
    }

    /// Drop a session and remove it from every room.
    pub fn unregister(&self, session_id: &str) {
        let mut registry = self.lock();
        registry.sessions.remove(session_id);
        registry.leave_all(session_id);
    }

    pub fn join(&self, session_id: &str, room: &str) {
        self.lock()
            .rooms
            .entry(room.to_string())
            .or_default()
            .insert(session_id.to_string());
    }

    /// Leave a room; empty rooms are removed.
    pub fn leave(&self, session_id: &str, room: &str) {
        let mut registry = self.lock();
        if let Some(members) = registry.rooms.get_mut(room) {
            members.remove(session_id);
            if members.is_empty() {
                registry.rooms.remove(room);
            }
        }
    }

    #[must_use]
    pub fn room_members(&self, room: &str) -> HashSet<String> {
        self.lock().rooms.get(room).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn session_count(&self) -> usize {
        self.lock().sessions.len()
    }
}

impl EventSink for SessionRegistry {
    fn publish(&self, scope: &EventScope, event: &ScreeningEvent) -> usize {
        let mut registry = self.lock();
        let targets: Vec<String> = match scope {
            EventScope::Session(id) => vec![id.clone()],
            EventScope::Room(room) => registry
                .rooms
                .get(room)
                .map(|members| members.iter().cloned().collect())
                .unwrap_or_default(),
            EventScope::Broadcast => registry.sessions.keys().cloned().collect(),
        };

        let mut delivered = 0;
        let mut closed = Vec::new();
        for id in targets {
            match registry.sessions.get(&id) {
                Some(tx) if tx.send(event.clone()).is_ok() => delivered += 1,
                Some(_) => closed.push(id),
                None => {}
            }
        }
        for id in &closed {
            registry.sessions.remove(id);
            registry.leave_all(id);
        }
        if !closed.is_empty() {
            tracing::debug!(dropped = closed.len(), "removed closed sessions");
        }
        delivered
    }
}
