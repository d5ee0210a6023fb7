//! Event bus for engine lifecycle events.
//!
//! Events are named extension points. When an event is triggered, every
//! subscriber is called in priority order (lower = earlier). Chain events
//! fold an accumulator through their subscribers instead.

mod bus;
mod registry;

pub use bus::EventBus;
pub use registry::{BoxFuture, EventRegistry, Handler, Subscription};
