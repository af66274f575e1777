//! Fixture task/node/executor types shared by the unit tests in this crate.
//! Not exported outside `#[cfg(test)]`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ci_queue_api::{Environment, Executor, Node, NodeMode, NodeRole, ResourceController, Task};

#[derive(Debug, Clone)]
pub(crate) struct TestTask {
    id: u64,
    name: Arc<str>,
    label: Option<&'static str>,
    last_built_on: Option<&'static str>,
    blocked: Arc<AtomicBool>,
    resources: Vec<String>,
    estimated_duration: Option<Duration>,
    quiet_period: Duration,
}

impl TestTask {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            id,
            name: format!("task-{id}").into(),
            label: None,
            last_built_on: None,
            blocked: Arc::new(AtomicBool::new(false)),
            resources: Vec::new(),
            estimated_duration: None,
            quiet_period: Duration::ZERO,
        }
    }

    pub(crate) fn with_label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    pub(crate) fn with_last_built_on(mut self, node: &'static str) -> Self {
        self.last_built_on = Some(node);
        self
    }

    pub(crate) fn with_resources(mut self, resources: &[&str]) -> Self {
        self.resources = resources.iter().map(|r| r.to_string()).collect();
        self
    }

    pub(crate) fn with_estimated_duration(mut self, duration: Duration) -> Self {
        self.estimated_duration = Some(duration);
        self
    }

    pub(crate) fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }

    pub(crate) fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }
}

impl Task for TestTask {
    type Id = u64;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn assigned_label(&self) -> Option<&str> {
        self.label
    }

    fn last_built_on(&self) -> Option<&str> {
        self.last_built_on
    }

    fn is_build_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    fn resource_list(&self) -> Vec<String> {
        self.resources.clone()
    }

    fn estimated_duration(&self) -> Option<Duration> {
        self.estimated_duration
    }

    fn quiet_period(&self) -> Duration {
        self.quiet_period
    }
}

#[derive(Debug, Clone)]
pub(crate) struct TestNode {
    name: &'static str,
    mode: NodeMode,
    role: NodeRole,
    labels: &'static [&'static str],
    offline: Arc<AtomicBool>,
}

impl TestNode {
    pub(crate) fn normal_agent(name: &'static str) -> Self {
        Self {
            name,
            mode: NodeMode::Normal,
            role: NodeRole::Agent,
            labels: &[],
            offline: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn controller(name: &'static str) -> Self {
        Self {
            name,
            mode: NodeMode::Normal,
            role: NodeRole::Controller,
            labels: &[],
            offline: Arc::new(AtomicBool::new(false)),
        }
    }

    /// An agent node in `EXCLUSIVE` mode: only runs tasks explicitly tied
    /// to it (label match or last-built-on affinity), never picked up by
    /// the unlabeled/offload/any-fit fallthroughs in `choose`.
    pub(crate) fn exclusive(name: &'static str) -> Self {
        Self {
            name,
            mode: NodeMode::Exclusive,
            role: NodeRole::Agent,
            labels: &[],
            offline: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

impl Node for TestNode {
    fn name(&self) -> &str {
        self.name
    }

    fn mode(&self) -> NodeMode {
        self.mode
    }

    fn role(&self) -> NodeRole {
        self.role
    }

    fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    fn has_label(&self, label: &str) -> bool {
        self.labels.contains(&label)
    }
}

#[derive(Debug)]
pub(crate) struct TestExecutor {
    id: String,
    node: TestNode,
}

impl TestExecutor {
    pub(crate) fn new(id: impl Into<String>, node: TestNode) -> Self {
        Self { id: id.into(), node }
    }
}

impl Executor for TestExecutor {
    type Node = TestNode;

    fn id(&self) -> &str {
        &self.id
    }

    fn node(&self) -> Self::Node {
        self.node.clone()
    }
}

#[derive(Debug, Default)]
pub(crate) struct TestResources {
    held: std::sync::Mutex<std::collections::HashMap<String, u64>>,
}

impl TestResources {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn hold(&self, resource: &str, holder: u64) {
        self.held.lock().unwrap().insert(resource.to_string(), holder);
    }

    pub(crate) fn release(&self, resource: &str) {
        self.held.lock().unwrap().remove(resource);
    }
}

impl ResourceController<TestTask> for TestResources {
    fn can_acquire(&self, task: &TestTask) -> bool {
        let held = self.held.lock().unwrap();
        task.resource_list()
            .iter()
            .all(|resource| held.get(resource).map_or(true, |holder| *holder == task.id()))
    }

    fn blocking_activity(&self, task: &TestTask) -> Option<String> {
        let held = self.held.lock().unwrap();
        task.resource_list().iter().find_map(|resource| {
            held.get(resource).filter(|holder| **holder != task.id()).map(|holder| holder.to_string())
        })
    }
}

#[derive(Debug, Default)]
pub(crate) struct TestEnvironment {
    quiescing: AtomicBool,
    agent_count: std::sync::atomic::AtomicUsize,
    tasks: std::sync::Mutex<std::collections::HashMap<String, TestTask>>,
}

impl TestEnvironment {
    pub(crate) fn new(agent_count: usize) -> Self {
        Self {
            quiescing: AtomicBool::new(false),
            agent_count: std::sync::atomic::AtomicUsize::new(agent_count),
            tasks: std::sync::Mutex::new(std::collections::HashMap::new()),
        }
    }

    pub(crate) fn set_quieting_down(&self, quiescing: bool) {
        self.quiescing.store(quiescing, Ordering::SeqCst);
    }

    pub(crate) fn register(&self, task: TestTask) {
        self.tasks.lock().unwrap().insert(task.name().to_string(), task);
    }
}

impl Environment<TestTask> for TestEnvironment {
    fn is_quieting_down(&self) -> bool {
        self.quiescing.load(Ordering::SeqCst)
    }

    fn agent_count(&self) -> usize {
        self.agent_count.load(Ordering::SeqCst)
    }

    fn resolve_task(&self, name: &str) -> Option<TestTask> {
        self.tasks.lock().unwrap().get(name).cloned()
    }
}
