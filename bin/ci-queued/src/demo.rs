use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ci_queue_api::{Executor, Node, NodeMode, NodeRole, Task};

/// An in-memory stand-in for a build item: enough of the capability set in
/// `ci_queue_api::Task` to exercise every branch of the scheduling state
/// machine and selection policy from the demo binary.
///
/// `blocked` is the one field a running demo can flip after construction
/// (simulating a resource becoming unavailable mid-flight), so it lives
/// behind an `Arc<AtomicBool>` shared across clones; everything else is
/// fixed at build time.
#[derive(Debug, Clone)]
pub struct DemoTask {
    id: u64,
    name: Arc<str>,
    label: Option<Arc<str>>,
    last_built_on: Option<Arc<str>>,
    blocked: Arc<AtomicBool>,
    resources: Arc<Vec<String>>,
    estimated_duration: Option<Duration>,
    quiet_period: Duration,
}

impl DemoTask {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into().into(),
            label: None,
            last_built_on: None,
            blocked: Arc::new(AtomicBool::new(false)),
            resources: Arc::new(Vec::new()),
            estimated_duration: None,
            quiet_period: Duration::ZERO,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into().into());
        self
    }

    pub fn with_last_built_on(mut self, node: impl Into<String>) -> Self {
        self.last_built_on = Some(node.into().into());
        self
    }

    pub fn with_resources(mut self, resources: Vec<String>) -> Self {
        self.resources = Arc::new(resources);
        self
    }

    pub fn with_estimated_duration(mut self, duration: Duration) -> Self {
        self.estimated_duration = Some(duration);
        self
    }

    pub fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }

    /// Flips whether the task reports itself as build-blocked, independent
    /// of resource contention. Visible to every clone of this task.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }
}

impl Task for DemoTask {
    type Id = u64;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn assigned_label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn last_built_on(&self) -> Option<&str> {
        self.last_built_on.as_deref()
    }

    fn is_build_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    fn resource_list(&self) -> Vec<String> {
        self.resources.as_ref().clone()
    }

    fn estimated_duration(&self) -> Option<Duration> {
        self.estimated_duration
    }

    fn quiet_period(&self) -> Duration {
        self.quiet_period
    }
}

/// A simulated build host: carries only the routing-relevant fields the
/// selection policy reads.
#[derive(Debug, Clone)]
pub struct DemoNode {
    name: Arc<str>,
    mode: NodeMode,
    role: NodeRole,
    labels: Arc<Vec<String>>,
    offline: Arc<AtomicBool>,
}

impl DemoNode {
    pub fn new(name: impl Into<String>, mode: NodeMode, role: NodeRole) -> Self {
        Self {
            name: name.into().into(),
            mode,
            role,
            labels: Arc::new(Vec::new()),
            offline: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = Arc::new(labels);
        self
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

impl Node for DemoNode {
    fn name(&self) -> &str {
        &self.name
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
        self.labels.iter().any(|l| l == label)
    }
}

/// One executor slot on a [`DemoNode`], identified by a monotonic counter so
/// several slots on the same node get distinct ids.
#[derive(Debug)]
pub struct DemoExecutor {
    id: String,
    node: DemoNode,
}

impl DemoExecutor {
    pub fn new(node: DemoNode, slot: u64) -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        let ordinal = NEXT.fetch_add(1, Ordering::SeqCst);
        Self { id: format!("{}-{}-{}", node.name, slot, ordinal), node }
    }
}

impl Executor for DemoExecutor {
    type Node = DemoNode;

    fn id(&self) -> &str {
        &self.id
    }

    fn node(&self) -> Self::Node {
        self.node.clone()
    }
}
