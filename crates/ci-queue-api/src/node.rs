use std::fmt::Debug;

/// Whether a node accepts ordinary tasks alongside tied ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeMode {
    /// Open to any task the selection policy routes to it.
    Normal,
    /// Only runs tasks explicitly tied to it (via [`Task::last_built_on`]
    /// or [`Task::assigned_label`](crate::Task::assigned_label)).
    Exclusive,
}

/// Coarse role a node plays in the build farm. The selection policy avoids
/// offloading affinity-less, large or long-running work onto controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    Controller,
    Agent,
}

/// A place work can run. Cheap to clone: the queue snapshots a node's
/// routing-relevant fields each time an executor parks, rather than holding
/// a long-lived reference into the host application's node registry.
pub trait Node: Clone + Send + Sync + Debug + 'static {
    fn name(&self) -> &str;

    fn mode(&self) -> NodeMode;

    fn role(&self) -> NodeRole;

    /// True if the node (or its connection) is down and shouldn't receive
    /// new work.
    fn is_offline(&self) -> bool;

    fn has_label(&self, label: &str) -> bool;
}

/// One executor slot on a [`Node`]. An executor calls the queue's `pop`
/// and blocks until it's handed a task to run.
pub trait Executor: Send + Sync + Debug + 'static {
    type Node: Node;

    /// Identity of this executor slot, unique among the executors parked on
    /// the queue at any one time.
    fn id(&self) -> &str;

    fn node(&self) -> Self::Node;
}
