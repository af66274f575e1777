use ci_queue_api::{Environment, Node, ResourceController, Task};

use crate::clock::Clock;
use crate::item::{BlockedItem, BuildableItem, Item, WaitingItem};
use crate::queue::Queue;

impl<T, N, R, E, C> Queue<T, N, R, E, C>
where
    T: Task,
    N: Node,
    R: ResourceController<T>,
    E: Environment<T>,
    C: Clock,
{
    /// Human-facing "why" string for a status display, per the observable
    /// item fields: a quiet-period countdown for waiting items, the
    /// blocking activity (or the task's own reason) for blocked items, and
    /// a label-aware "waiting for an executor" message for buildable ones.
    pub fn describe(&self, item: &Item<T>) -> String {
        match item {
            Item::Waiting(w) => self.describe_waiting(w),
            Item::Blocked(b) => self.describe_blocked(b),
            Item::Buildable(b) => self.describe_buildable(b),
        }
    }

    fn describe_waiting(&self, item: &WaitingItem<T>) -> String {
        let now = self.clock.now();
        if item.due_at <= now {
            return "pending".to_string();
        }
        let remaining = item.due_at.saturating_duration_since(now);
        format!("quiet period, {} more second(s)", remaining.as_secs().max(1))
    }

    fn describe_blocked(&self, item: &BlockedItem<T>) -> String {
        if let Some(activity) = self.resources.blocking_activity(&item.task) {
            return activity;
        }
        if item.task.is_build_blocked() {
            return item.task.why_blocked().unwrap_or_else(|| "in progress".to_string());
        }
        "in progress".to_string()
    }

    fn describe_buildable(&self, item: &BuildableItem<T>) -> String {
        match item.task.assigned_label() {
            Some(label) => {
                let state = self.state.lock();
                let all_labeled_offline = state
                    .parked
                    .values()
                    .filter(|offer| offer.node.has_label(label))
                    .all(|offer| offer.node.is_offline());
                drop(state);
                if all_labeled_offline {
                    format!("all nodes for label \"{label}\" are offline")
                } else {
                    format!("waiting for next available executor on label \"{label}\"")
                }
            }
            None => "waiting for next available executor".to_string(),
        }
    }
}
