use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use ci_queue_api::{Environment, Task};
use parking_lot::RwLock;

/// Reference [`Environment`] implementation backed by an in-process
/// registry, for the demo binary and for tests that don't need a real
/// build-farm controller behind the queue.
pub struct StaticEnvironment<T: Task> {
    quiescing: AtomicBool,
    agent_count: AtomicUsize,
    tasks: RwLock<HashMap<String, T>>,
}

impl<T: Task> StaticEnvironment<T> {
    pub fn new(agent_count: usize) -> Self {
        Self {
            quiescing: AtomicBool::new(false),
            agent_count: AtomicUsize::new(agent_count),
            tasks: RwLock::new(HashMap::new()),
        }
    }

    pub fn set_quieting_down(&self, quiescing: bool) {
        self.quiescing.store(quiescing, Ordering::SeqCst);
    }

    pub fn set_agent_count(&self, count: usize) {
        self.agent_count.store(count, Ordering::SeqCst);
    }

    /// Registers `task` under its name so [`Environment::resolve_task`] can
    /// find it again, e.g. when restoring queue state from persistence.
    pub fn register(&self, task: T) {
        self.tasks.write().insert(task.name().to_string(), task);
    }
}

impl<T: Task> Default for StaticEnvironment<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<T: Task> Environment<T> for StaticEnvironment<T> {
    fn is_quieting_down(&self) -> bool {
        self.quiescing.load(Ordering::SeqCst)
    }

    fn agent_count(&self) -> usize {
        self.agent_count.load(Ordering::SeqCst)
    }

    fn resolve_task(&self, name: &str) -> Option<T> {
        self.tasks.read().get(name).cloned()
    }
}
