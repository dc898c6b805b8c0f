//! Domain event system: decoupled observation of the injection lifecycle.
//!
//! The injection engine publishes events as it moves between states.
//! Other components (CLI output, tests, diagnostics) subscribe without
//! reaching into engine state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A supported chat platform was recognized from the hostname
    PlatformDetected {
        platform: String,
        url: String,
        timestamp: DateTime<Utc>,
    },

    /// The prompt input element was found
    InputLocated {
        platform: String,
        attempts: u32,
        timestamp: DateTime<Utc>,
    },

    /// The input element never appeared; the engine went idle
    SearchTimedOut {
        platform: String,
        attempts: u32,
        timestamp: DateTime<Utc>,
    },

    /// The page URL changed without a reload
    NavigationObserved {
        from: String,
        to: String,
        timestamp: DateTime<Utc>,
    },

    /// A new role list was loaded or pushed from storage
    RolesUpdated {
        count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Role text was merged into the prompt input
    RoleInjected {
        role_id: String,
        platform: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
