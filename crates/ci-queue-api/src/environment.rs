use crate::Task;

/// The narrow slice of the build farm the queue needs, in place of a global
/// singleton controller. Host applications implement this over whatever
/// registry already tracks nodes and tasks.
pub trait Environment<T: Task>: Send + Sync + 'static {
    /// True once the controller is shutting down: no new offers are made,
    /// existing parked executors are left parked.
    fn is_quieting_down(&self) -> bool;

    /// Count of non-controller nodes, used by the offload heuristic to
    /// decide whether this is a "large" deployment.
    fn agent_count(&self) -> usize;

    /// Looks a task up by its [`Task::name`], used when restoring the queue
    /// from persistence.
    fn resolve_task(&self, name: &str) -> Option<T>;
}
