//! Build queue and dispatcher for a continuous-integration controller.
//!
//! [`Queue`] holds the three-stage waiting/blocked/buildable scheduling state
//! machine and the table of parked executors, all guarded by one lock. The
//! queue decides what runs next and where: producers call [`Queue::add`] to
//! schedule a task, executors call [`Queue::pop`] to block until one is
//! handed to them.
//!
//! Everything here is generic over the host application's concrete task,
//! node and resource-controller types (see `ci_queue_api`), so this crate
//! never needs to know what a "build" actually does.

mod choose;
mod clock;
mod dispatch;
mod display;
mod environment;
mod error;
mod event;
mod item;
mod offer;
mod persistence;
mod queue;
mod resource;
mod runtime;

#[cfg(test)]
mod test_support;

pub use clock::{Clock, SystemClock, TestClock};
pub use environment::StaticEnvironment;
pub use error::{Error, Result};
pub use item::{BlockedItem, BuildableItem, Item, WaitingItem};
pub use queue::Queue;
pub use resource::InMemoryResourceController;
pub use runtime::Ticker;
