//! Process-wide storefront events.
//!
//! Components that display derived state (the bag count badge, for one)
//! subscribe here to know when to refresh. Emitting is fire-and-forget: no
//! subscriber is required and nothing is acknowledged.

use serde::Serialize;
use tokio::sync::broadcast;

use threadline_core::UserId;

/// Default channel capacity when none is configured.
pub const DEFAULT_CAPACITY: usize = 64;

/// Wire name of [`StorefrontEvent::BagUpdated`].
pub const BAG_UPDATED: &str = "bagUpdated";

/// Events broadcast to interested components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum StorefrontEvent {
    /// The user's bag changed and any displayed count is stale.
    BagUpdated {
        /// Whose bag changed.
        user_id: UserId,
    },
}

impl StorefrontEvent {
    /// Wire name of the event, also used as the `HX-Trigger` value.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::BagUpdated { .. } => BAG_UPDATED,
        }
    }
}

/// Broadcast channel for [`StorefrontEvent`]s.
///
/// Cheaply cloneable; all clones publish to the same subscribers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StorefrontEvent>,
}

impl EventBus {
    /// Create a bus that buffers up to `capacity` events per lagging subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn emit(&self, event: StorefrontEvent) {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => tracing::debug!(event = name, receivers, "Event emitted"),
            Err(_) => tracing::trace!(event = name, "Event emitted with no subscribers"),
        }
    }

    /// Subscribe to events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StorefrontEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
