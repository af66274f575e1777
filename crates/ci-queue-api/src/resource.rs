use crate::Task;

/// Mutual-exclusion interlock over the named resources a task declares via
/// [`Task::resource_list`]. Acquisition is re-entrant per task: a task that
/// already holds a resource (e.g. across a requeue-after-abort) can acquire
/// it again without blocking on itself.
pub trait ResourceController<T: Task>: Send + Sync + 'static {
    /// True if every resource `task` needs is either free or already held by
    /// `task` itself.
    fn can_acquire(&self, task: &T) -> bool;

    /// Display name of the activity currently blocking `task`, if any, for
    /// diagnostics.
    fn blocking_activity(&self, task: &T) -> Option<String>;
}
