//! Capability traits consumed by `ci-queue`.
//!
//! The queue engine never depends on a concrete task, node or resource
//! implementation: it only calls through [`Task`], [`Node`], [`Executor`],
//! [`Environment`] and [`ResourceController`]. Host applications (or the
//! `ci-queued` demo binary) plug in whatever concrete types model their own
//! build items.

mod environment;
mod node;
mod resource;
mod task;

pub use environment::Environment;
pub use node::{Executor, Node, NodeMode, NodeRole};
pub use resource::ResourceController;
pub use task::Task;
