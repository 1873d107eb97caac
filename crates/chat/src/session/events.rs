//! Auth lifecycle events
//!
//! Replaces ad-hoc global signalling with a typed subscription bus. The store
//! and views subscribe to learn about sign-in, sign-out, and token expiry
//! without holding a reference to the session internals.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// A change in the viewer's authentication state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A session was stored for the given viewer
    SignedIn { viewer_id: i64 },
    /// The session was cleared locally
    SignedOut,
    /// The server rejected the stored credentials
    TokenExpired,
}

type Callback = Arc<dyn Fn(&AuthEvent) + Send + Sync>;

struct EventsInner {
    next_id: AtomicU64,
    subscribers: Mutex<HashMap<u64, Callback>>,
}

/// Cloneable handle to the auth event bus
#[derive(Clone)]
pub struct AuthEvents {
    inner: Arc<EventsInner>,
}

impl AuthEvents {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(EventsInner {
                next_id: AtomicU64::new(0),
                subscribers: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Register a callback; dropping the returned subscription unregisters it
    pub fn subscribe(&self, callback: impl Fn(&AuthEvent) + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut subscribers) = self.inner.subscribers.lock() {
            subscribers.insert(id, Arc::new(callback));
        }
        Subscription {
            id,
            events: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver an event to every live subscriber
    pub fn emit(&self, event: &AuthEvent) {
        // Clone callbacks out so a subscriber can unsubscribe during dispatch
        let callbacks: Vec<Callback> = match self.inner.subscribers.lock() {
            Ok(subscribers) => subscribers.values().cloned().collect(),
            Err(_) => return,
        };
        for callback in callbacks {
            callback(event);
        }
    }
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps a subscription alive; unsubscribes on drop
pub struct Subscription {
    id: u64,
    events: std::sync::Weak<EventsInner>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.events.upgrade()
            && let Ok(mut subscribers) = inner.subscribers.lock()
        {
            subscribers.remove(&self.id);
        }
    }
}
