use std::time::Duration;

use ci_queue_api::{Environment, Node, NodeMode, NodeRole, Task};
use indexmap::IndexMap;

use crate::offer::JobOffer;

/// Above this many agents, the deployment is considered "large" and the
/// offload heuristic starts steering affinity-less and long tasks away from
/// controllers.
const LARGE_DEPLOYMENT_AGENT_COUNT: usize = 10;

/// A task is "long" once its estimate passes this threshold, for the same
/// offload heuristic.
const LONG_TASK_THRESHOLD: Duration = Duration::from_secs(15 * 60);

/// Picks a parked executor for `task`, or `None` if none is currently
/// suitable. Offers are scanned in park order (oldest-parked first), so
/// among several equally-eligible executors the one that's been waiting
/// longest wins.
///
/// Steps, in order, each short-circuiting on the first match:
/// 1. Refuse to place anything while the environment is quiescing.
/// 2. A labeled task only ever goes to a matching, available, online node.
/// 3. A task with build history is offered back to that node, unless this
///    is a large deployment and the node is a controller.
/// 4. On a large deployment, or for a long task, prefer an available,
///    non-exclusive agent (never a controller).
/// 5. Otherwise, any available, non-exclusive node.
pub fn choose<T, N, E>(task: &T, offers: &IndexMap<String, JobOffer<T, N>>, env: &E) -> Option<String>
where
    T: Task,
    N: Node,
    E: Environment<T>,
{
    if env.is_quieting_down() {
        return None;
    }

    if let Some(label) = task.assigned_label() {
        return offers
            .values()
            .find(|offer| offer.is_available() && offer.node.has_label(label))
            .map(|offer| offer.executor_id.clone());
    }

    let large_deployment = env.agent_count() > LARGE_DEPLOYMENT_AGENT_COUNT;

    if let Some(last_node) = task.last_built_on() {
        let affine = offers.values().find(|offer| {
            offer.is_available()
                && offer.node.mode() == NodeMode::Normal
                && offer.node.name() == last_node
        });
        if let Some(offer) = affine {
            let skip_controller_affinity =
                large_deployment && offer.node.role() == NodeRole::Controller;
            if !skip_controller_affinity {
                return Some(offer.executor_id.clone());
            }
        }
    }

    let is_long = task
        .estimated_duration()
        .map(|d| d > LONG_TASK_THRESHOLD)
        .unwrap_or(false);

    if large_deployment || is_long {
        let agent_only = offers.values().find(|offer| {
            offer.is_available()
                && offer.node.mode() == NodeMode::Normal
                && offer.node.role() == NodeRole::Agent
        });
        if let Some(offer) = agent_only {
            return Some(offer.executor_id.clone());
        }
    }

    offers
        .values()
        .find(|offer| offer.is_available() && offer.node.mode() == NodeMode::Normal)
        .map(|offer| offer.executor_id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TestEnvironment, TestNode, TestTask};

    fn offer(id: &str, node: TestNode) -> (String, JobOffer<TestTask, TestNode>) {
        (id.to_string(), JobOffer::new(id.to_string(), node))
    }

    /// S1: no offer is ever chosen while the environment is quiescing, even
    /// with idle executors available.
    #[test]
    fn quiescing_blocks_every_offer() {
        let env = TestEnvironment::new(0);
        env.set_quieting_down(true);
        let offers = IndexMap::from_iter([offer("e1", TestNode::normal_agent("agent-1"))]);

        assert!(choose(&TestTask::new(1), &offers, &env).is_none());
    }

    /// S2: a labeled task only ever matches a node carrying that label, and
    /// never falls through to an unlabeled match.
    #[test]
    fn labeled_task_requires_label_match() {
        let env = TestEnvironment::new(0);
        let offers = IndexMap::from_iter([offer("plain", TestNode::normal_agent("agent-1"))]);

        let t = TestTask::new(1).with_label("linux");
        assert!(choose(&t, &offers, &env).is_none());

        let offers =
            IndexMap::from_iter([offer("linux-box", TestNode::normal_agent("agent-2").with_labels(&["linux"]))]);
        assert_eq!(choose(&t, &offers, &env), Some("linux-box".to_string()));
    }

    /// S3: affinity to the last-built-on node wins when it's parked and
    /// available.
    #[test]
    fn affinity_prefers_last_built_on_node() {
        let env = TestEnvironment::new(0);
        let offers = IndexMap::from_iter([
            offer("other", TestNode::normal_agent("agent-1")),
            offer("home", TestNode::normal_agent("agent-2")),
        ]);

        let t = TestTask::new(1).with_last_built_on("agent-2");
        assert_eq!(choose(&t, &offers, &env), Some("home".to_string()));
    }

    /// E5: on a large deployment, affinity to the controller is skipped for
    /// a long task, and the offload heuristic steers it to an agent instead.
    #[test]
    fn large_deployment_skips_controller_affinity_for_long_tasks() {
        let env = TestEnvironment::new(11);
        let offers = IndexMap::from_iter([
            offer("controller", TestNode::controller("controller")),
            offer("agent", TestNode::normal_agent("agent-1")),
        ]);

        let t =
            TestTask::new(1).with_last_built_on("controller").with_estimated_duration(Duration::from_secs(30 * 60));

        assert_eq!(choose(&t, &offers, &env), Some("agent".to_string()));
    }

    /// E5 (negative branch): same setup but with no agent offer parked —
    /// `choose` must not fall back to the controller.
    #[test]
    fn large_deployment_never_falls_back_to_controller() {
        let env = TestEnvironment::new(11);
        let offers = IndexMap::from_iter([offer("controller", TestNode::controller("controller"))]);

        let t =
            TestTask::new(1).with_last_built_on("controller").with_estimated_duration(Duration::from_secs(30 * 60));

        assert!(choose(&t, &offers, &env).is_none());
    }

    /// S5: an unlabeled, short, affinity-less task on a small deployment
    /// takes any available non-exclusive offer, including the controller.
    #[test]
    fn small_deployment_falls_back_to_any_offer() {
        let env = TestEnvironment::new(2);
        let offers = IndexMap::from_iter([offer("controller", TestNode::controller("controller"))]);

        let t = TestTask::new(1);
        assert_eq!(choose(&t, &offers, &env), Some("controller".to_string()));
    }

    /// An unavailable (already-assigned, or offline) offer is never chosen.
    #[test]
    fn unavailable_offers_are_skipped() {
        let env = TestEnvironment::new(0);
        let node = TestNode::normal_agent("agent-1");
        node.set_offline(true);
        let offers = IndexMap::from_iter([offer("offline", node)]);

        assert!(choose(&TestTask::new(1), &offers, &env).is_none());
    }

    /// S2: a labeled task may land on an exclusive node, as long as the
    /// node carries the label — exclusivity only restricts the
    /// unlabeled/affinity/offload/any-fit paths, not a direct label match.
    #[test]
    fn labeled_task_may_match_an_exclusive_node() {
        let env = TestEnvironment::new(0);
        let offers =
            IndexMap::from_iter([offer("tied-box", TestNode::exclusive("tied-box").with_labels(&["gpu"]))]);

        let t = TestTask::new(1).with_label("gpu");
        assert_eq!(choose(&t, &offers, &env), Some("tied-box".to_string()));
    }

    /// S3: affinity to the last-built-on node is skipped when that node is
    /// exclusive, even though it's the only parked offer and would
    /// otherwise match by name.
    #[test]
    fn affinity_skips_exclusive_node() {
        let env = TestEnvironment::new(0);
        let offers = IndexMap::from_iter([offer("tied-box", TestNode::exclusive("tied-box"))]);

        let t = TestTask::new(1).with_last_built_on("tied-box");
        assert!(choose(&t, &offers, &env).is_none());
    }

    /// S4: the offload heuristic never lands a long task on an exclusive
    /// node, even when it's the only parked offer on a large deployment.
    #[test]
    fn offload_heuristic_skips_exclusive_node() {
        let env = TestEnvironment::new(11);
        let offers = IndexMap::from_iter([offer("tied-box", TestNode::exclusive("tied-box"))]);

        let t = TestTask::new(1).with_estimated_duration(Duration::from_secs(30 * 60));
        assert!(choose(&t, &offers, &env).is_none());
    }

    /// S5: an unlabeled, affinity-less, short task never falls back to an
    /// exclusive node, even when it's the only parked offer.
    #[test]
    fn any_fit_skips_exclusive_node() {
        let env = TestEnvironment::new(0);
        let offers = IndexMap::from_iter([offer("tied-box", TestNode::exclusive("tied-box"))]);

        assert!(choose(&TestTask::new(1), &offers, &env).is_none());
    }
}
