//! Event bus - invokes subscribers in priority order.
//!
//! `trigger` walks an event's subscribers one at a time, awaiting each
//! asynchronous handler before moving on, so a trigger call produces a
//! single ordered sequence of side effects. `chain` folds a parameter map
//! through an event's chain reducers.

use parking_lot::RwLock;
use tracing::{debug, trace};

use super::{EventRegistry, Handler, Subscription};
use crate::error::EngineResult;
use crate::types::Params;

/// Priority-ordered publish/subscribe registry.
///
/// The bus is generic over the context handed to handlers. The context is
/// passed per call rather than captured, so handlers never hold references
/// into engine state between events.
#[derive(Debug)]
pub struct EventBus<C> {
    registry: RwLock<EventRegistry<C>>,
}

impl<C> Default for EventBus<C> {
    fn default() -> Self {
        Self {
            registry: RwLock::new(EventRegistry::new()),
        }
    }
}

impl<C> EventBus<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a handler to an event.
    pub fn subscribe(&self, name: &str, handler: Handler<C>, priority: i32) {
        debug!(
            event = %name,
            priority,
            is_async = handler.is_async(),
            "subscribing handler"
        );
        self.registry.write().insert(name, handler, priority);
    }

    /// Remove a handler by identity. Unknown events are a no-op.
    pub fn unsubscribe(&self, name: &str, handler: &Handler<C>) -> bool {
        self.registry.write().remove(name, handler)
    }

    pub fn has_event(&self, name: &str) -> bool {
        self.registry.read().has_event(name)
    }

    pub fn subscriber_count(&self, name: &str) -> usize {
        self.registry.read().subscriber_count(name)
    }

    /// Copy out an event's subscriber list so no lock is held while
    /// handlers run (handlers may subscribe or unsubscribe).
    fn snapshot(&self, name: &str) -> Vec<Subscription<C>> {
        self.registry.read().get(name).to_vec()
    }

    /// Fold `initial` through every chain reducer subscribed to `name`.
    ///
    /// Returns `Ok(None)` when nothing subscribes to the event. The first
    /// reducer error stops the fold and is returned.
    pub fn chain(&self, name: &str, context: &C, initial: Params) -> EngineResult<Option<Params>> {
        let subscribers = self.snapshot(name);
        if subscribers.is_empty() {
            debug!(event = %name, "no subscribers for chain event");
            return Ok(None);
        }

        let mut acc = initial;
        for subscription in &subscribers {
            match &subscription.handler {
                Handler::Chain(f) => acc = f(context, acc)?,
                _ => trace!(event = %name, "skipping non-chain handler in chain"),
            }
        }
        Ok(Some(acc))
    }

    /// Invoke every handler subscribed to `name`, in priority order.
    ///
    /// Asynchronous handlers are awaited before the next handler starts. A
    /// handler error stops the walk and is returned to the caller.
    pub async fn trigger(&self, name: &str, context: &mut C) -> EngineResult<()> {
        let subscribers = self.snapshot(name);
        if subscribers.is_empty() {
            debug!(event = %name, "no subscribers for event");
            return Ok(());
        }

        for subscription in &subscribers {
            match &subscription.handler {
                Handler::Sync(f) => f(context)?,
                Handler::Async(f) => f(context).await?,
                Handler::Chain(_) => trace!(event = %name, "skipping chain handler in trigger"),
            }
        }

        debug!(event = %name, handlers = subscribers.len(), "trigger complete");
        Ok(())
    }
}
