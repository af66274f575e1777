use std::collections::HashMap;

use ci_queue_api::{ResourceController, Task};
use parking_lot::Mutex;

/// Reference [`ResourceController`] implementation: an in-memory map from
/// resource name to the task currently holding it. Acquisition is
/// re-entrant, so a task already holding a resource never blocks on
/// itself.
///
/// The queue only ever calls [`ResourceController::can_acquire`]; holding
/// and releasing resources as tasks start and finish running is the host
/// application's job, via [`InMemoryResourceController::acquire`] and
/// [`InMemoryResourceController::release`].
pub struct InMemoryResourceController<T: Task> {
    holders: Mutex<HashMap<String, T::Id>>,
}

impl<T: Task> InMemoryResourceController<T> {
    pub fn new() -> Self {
        Self {
            holders: Mutex::new(HashMap::new()),
        }
    }

    /// Claims every resource in `task.resource_list()` for `task`. Callers
    /// should only do this after [`ResourceController::can_acquire`]
    /// reported `true`.
    pub fn acquire(&self, task: &T) {
        let mut holders = self.holders.lock();
        for resource in task.resource_list() {
            holders.insert(resource, task.id());
        }
    }

    pub fn release(&self, task: &T) {
        let mut holders = self.holders.lock();
        for resource in task.resource_list() {
            if holders.get(&resource) == Some(&task.id()) {
                holders.remove(&resource);
            }
        }
    }
}

impl<T: Task> Default for InMemoryResourceController<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Task> ResourceController<T> for InMemoryResourceController<T> {
    fn can_acquire(&self, task: &T) -> bool {
        let holders = self.holders.lock();
        let id = task.id();
        task.resource_list()
            .iter()
            .all(|resource| holders.get(resource).map_or(true, |holder| holder == &id))
    }

    fn blocking_activity(&self, task: &T) -> Option<String> {
        let holders = self.holders.lock();
        let id = task.id();
        task.resource_list().iter().find_map(|resource| {
            holders.get(resource).and_then(|holder| {
                if holder == &id {
                    None
                } else {
                    Some(format!("{holder:?}"))
                }
            })
        })
    }
}
