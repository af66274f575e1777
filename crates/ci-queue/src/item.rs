use std::cmp::Ordering;
use std::time::Instant;

use ci_queue_api::Task;

/// A task waiting for its quiet period to elapse. Ordered by `(due_at, id)`
/// so the earliest-due task is always the first element of the waiting set,
/// with insertion order as a tiebreaker between tasks due at the same
/// instant.
#[derive(Clone)]
pub struct WaitingItem<T: Task> {
    pub task: T,
    pub due_at: Instant,
    pub id: u64,
}

impl<T: Task> PartialEq for WaitingItem<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due_at == other.due_at && self.id == other.id
    }
}

impl<T: Task> Eq for WaitingItem<T> {}

impl<T: Task> PartialOrd for WaitingItem<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Task> Ord for WaitingItem<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due_at.cmp(&other.due_at).then(self.id.cmp(&other.id))
    }
}

/// A task that has cleared its quiet period but is currently held back,
/// either by [`Task::is_build_blocked`] or by resource contention.
#[derive(Clone)]
pub struct BlockedItem<T: Task> {
    pub task: T,
    /// Set once, the first time the task left the waiting set, and carried
    /// across any number of buildable/blocked cycles.
    pub buildable_start: Instant,
}

/// A task ready to run, waiting only for a matching executor. Buildable
/// items live in an insertion-ordered map: FIFO within it, and a task
/// demoted back to blocked and later re-promoted re-enters at the tail.
#[derive(Clone)]
pub struct BuildableItem<T: Task> {
    pub task: T,
    pub buildable_start: Instant,
}

/// A task's current stage, returned by lookups that don't care which
/// collection it physically lives in.
pub enum Item<T: Task> {
    Waiting(WaitingItem<T>),
    Blocked(BlockedItem<T>),
    Buildable(BuildableItem<T>),
}

impl<T: Task> Item<T> {
    pub fn task(&self) -> &T {
        match self {
            Item::Waiting(w) => &w.task,
            Item::Blocked(b) => &b.task,
            Item::Buildable(b) => &b.task,
        }
    }
}
