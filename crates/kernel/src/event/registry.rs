//! Event registry - indexes which handlers subscribe to which events.
//!
//! The registry maps event names to an ordered list of subscriptions.
//! Subscriptions are kept sorted by priority (lower = called first); equal
//! priorities keep registration order.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::EngineResult;
use crate::types::Params;

/// Boxed future returned by asynchronous handlers.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

type SyncFn<C> = dyn Fn(&mut C) -> EngineResult<()> + Send + Sync;
type AsyncFn<C> = dyn for<'a> Fn(&'a mut C) -> BoxFuture<'a, EngineResult<()>> + Send + Sync;
type ChainFn<C> = dyn Fn(&C, Params) -> EngineResult<Params> + Send + Sync;

/// A subscriber callback.
///
/// Identity is the allocation behind the `Arc`: clones of one handler are
/// the same handler, two handlers built from identical closures are not.
pub enum Handler<C> {
    /// Runs to completion before the next subscriber.
    Sync(Arc<SyncFn<C>>),
    /// Awaited before the next subscriber.
    Async(Arc<AsyncFn<C>>),
    /// Receives and returns the chain accumulator.
    Chain(Arc<ChainFn<C>>),
}

impl<C> Handler<C> {
    /// Wrap a synchronous handler.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&mut C) -> EngineResult<()> + Send + Sync + 'static,
    {
        Handler::Sync(Arc::new(f))
    }

    /// Wrap an asynchronous handler.
    pub fn asynchronous<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a mut C) -> BoxFuture<'a, EngineResult<()>> + Send + Sync + 'static,
    {
        Handler::Async(Arc::new(f))
    }

    /// Wrap a chain reducer.
    pub fn chain<F>(f: F) -> Self
    where
        F: Fn(&C, Params) -> EngineResult<Params> + Send + Sync + 'static,
    {
        Handler::Chain(Arc::new(f))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Handler::Async(_))
    }

    pub fn is_chain(&self) -> bool {
        matches!(self, Handler::Chain(_))
    }

    /// Whether both handles point at the same callback.
    pub fn same(&self, other: &Handler<C>) -> bool {
        match (self, other) {
            (Handler::Sync(a), Handler::Sync(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            (Handler::Async(a), Handler::Async(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            (Handler::Chain(a), Handler::Chain(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl<C> Clone for Handler<C> {
    fn clone(&self) -> Self {
        match self {
            Handler::Sync(f) => Handler::Sync(Arc::clone(f)),
            Handler::Async(f) => Handler::Async(Arc::clone(f)),
            Handler::Chain(f) => Handler::Chain(Arc::clone(f)),
        }
    }
}

impl<C> fmt::Debug for Handler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Handler::Sync(_) => "sync",
            Handler::Async(_) => "async",
            Handler::Chain(_) => "chain",
        };
        f.debug_tuple("Handler").field(&kind).finish()
    }
}

/// A registered handler with its priority.
#[derive(Debug)]
pub struct Subscription<C> {
    pub handler: Handler<C>,
    /// Ordering key (lower = called first).
    pub priority: i32,
}

impl<C> Subscription<C> {
    pub fn is_async(&self) -> bool {
        self.handler.is_async()
    }
}

impl<C> Clone for Subscription<C> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            priority: self.priority,
        }
    }
}

/// Registry mapping event names to ordered subscriptions.
#[derive(Debug)]
pub struct EventRegistry<C> {
    events: HashMap<String, Vec<Subscription<C>>>,
}

impl<C> Default for EventRegistry<C> {
    fn default() -> Self {
        Self {
            events: HashMap::new(),
        }
    }
}

impl<C> EventRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a subscription, keeping the event's list sorted by priority.
    pub fn insert(&mut self, name: &str, handler: Handler<C>, priority: i32) {
        let list = self.events.entry(name.to_string()).or_default();
        let at = list.partition_point(|s| s.priority <= priority);
        list.insert(at, Subscription { handler, priority });
    }

    /// Remove a handler by identity. Returns whether anything was removed.
    pub fn remove(&mut self, name: &str, handler: &Handler<C>) -> bool {
        let Some(list) = self.events.get_mut(name) else {
            return false;
        };
        let before = list.len();
        list.retain(|s| !s.handler.same(handler));
        before != list.len()
    }

    /// Subscriptions for an event, in call order.
    ///
    /// Returns an empty slice for unknown events.
    pub fn get(&self, name: &str) -> &[Subscription<C>] {
        self.events.get(name).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Check if anything subscribes to an event.
    pub fn has_event(&self, name: &str) -> bool {
        self.events.get(name).is_some_and(|list| !list.is_empty())
    }

    pub fn subscriber_count(&self, name: &str) -> usize {
        self.events.get(name).map(|v| v.len()).unwrap_or(0)
    }

    /// Get all event names that have ever had a subscriber.
    pub fn event_names(&self) -> impl Iterator<Item = &str> {
        self.events.keys().map(|s| s.as_str())
    }
}
