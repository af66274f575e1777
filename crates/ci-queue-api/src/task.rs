use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

/// A unit of work the queue schedules onto an [`Executor`](crate::Executor).
///
/// The queue never inspects a task beyond this surface, and it never relies
/// on `PartialEq`/`Hash` on `Self` for identity: dedup and lookups go through
/// [`Task::id`] instead, so two handles to the same underlying build item
/// compare equal even if they were constructed independently.
pub trait Task: Clone + Send + Sync + Debug + 'static {
    /// Stable identity, stable for the lifetime of the task.
    type Id: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    fn id(&self) -> Self::Id;

    /// Short name, used for persistence round-tripping and log lines.
    fn name(&self) -> &str;

    /// Longer, human-facing name. Defaults to [`Task::name`].
    fn full_display_name(&self) -> String {
        self.name().to_string()
    }

    /// Restricts placement to nodes carrying this label, if set.
    fn assigned_label(&self) -> Option<&str> {
        None
    }

    /// Name of the node this task last built on, used for affinity.
    fn last_built_on(&self) -> Option<&str> {
        None
    }

    /// True if something other than resource contention is holding this
    /// task back (e.g. an upstream dependency hasn't finished). Resource
    /// contention itself is evaluated separately via
    /// [`ResourceController`](crate::ResourceController).
    fn is_build_blocked(&self) -> bool {
        false
    }

    /// Task-supplied reason it's blocked, shown on status displays when no
    /// more specific blocking activity is available from the resource
    /// controller. `None` when the task doesn't track its own reason.
    fn why_blocked(&self) -> Option<String> {
        None
    }

    /// Resources this task needs exclusive access to while running.
    fn resource_list(&self) -> Vec<String> {
        Vec::new()
    }

    /// Rough duration estimate, used by the offload heuristic. `None` means
    /// unknown.
    fn estimated_duration(&self) -> Option<Duration> {
        None
    }

    /// Minimum time the task must sit in the queue before it becomes
    /// eligible, counted from the moment it's added.
    fn quiet_period(&self) -> Duration {
        Duration::ZERO
    }
}
