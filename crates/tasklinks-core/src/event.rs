//! Change notifications for link rows.
//!
//! The store holds an injected [`EventSink`] and calls it after a mutation
//! commits, once per written row and in write order. Delivery is
//! fire-and-forget: a sink cannot fail the operation that triggered it.

use std::sync::mpsc::Sender;
use std::sync::{Mutex, PoisonError};

use crate::model::TaskLinkEvent;

/// Published after a link pair is created or updated.
pub const EVENT_CREATE_UPDATE: &str = "tasklink.create_update";
/// Published after a link pair is removed, when enabled in config.
pub const EVENT_DELETE: &str = "tasklink.delete";

/// Receiver of link change notifications.
pub trait EventSink: Send + Sync {
    fn publish(&self, name: &str, event: &TaskLinkEvent);
}

/// An event together with the name it was published under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedEvent {
    pub name: String,
    pub event: TaskLinkEvent,
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _name: &str, _event: &TaskLinkEvent) {}
}

/// Logs every event as JSON at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn publish(&self, name: &str, event: &TaskLinkEvent) {
        match serde_json::to_string(event) {
            Ok(payload) => tracing::info!(event = name, %payload, "task link event"),
            Err(error) => tracing::warn!(event = name, %error, "failed to encode task link event"),
        }
    }
}

/// Keeps events in memory, in publication order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<PublishedEvent>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything published so far.
    #[must_use]
    pub fn events(&self) -> Vec<PublishedEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return everything published so far.
    pub fn drain(&self) -> Vec<PublishedEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl EventSink for MemorySink {
    fn publish(&self, name: &str, event: &TaskLinkEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(PublishedEvent {
                name: name.to_string(),
                event: *event,
            });
    }
}

/// Forwards events over an mpsc channel. Events published after the
/// receiver hung up are dropped.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<PublishedEvent>,
}

impl ChannelSink {
    #[must_use]
    pub const fn new(tx: Sender<PublishedEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn publish(&self, name: &str, event: &TaskLinkEvent) {
        let sent = self.tx.send(PublishedEvent {
            name: name.to_string(),
            event: *event,
        });
        if sent.is_err() {
            tracing::debug!(event = name, "event receiver gone, dropping task link event");
        }
    }
}
