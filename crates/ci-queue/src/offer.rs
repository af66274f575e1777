use std::sync::Arc;

use ci_queue_api::Node;

use crate::event::OneShotEvent;
use crate::item::BuildableItem;
use ci_queue_api::Task;

/// The parked-table entry for one blocked-on-`pop` executor: a snapshot of
/// its node (routing-relevant fields only, taken when it parked) plus the
/// one-shot event the dispatcher signals when it hands the slot a task.
pub struct JobOffer<T: Task, N: Node> {
    pub executor_id: String,
    pub node: N,
    pub event: Arc<OneShotEvent>,
    pub assigned: Option<BuildableItem<T>>,
}

impl<T: Task, N: Node> JobOffer<T, N> {
    pub fn new(executor_id: String, node: N) -> Self {
        Self {
            executor_id,
            node,
            event: Arc::new(OneShotEvent::new()),
            assigned: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.assigned.is_none() && !self.node.is_offline()
    }
}
