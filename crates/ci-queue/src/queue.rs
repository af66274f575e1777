use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use ci_queue_api::{Environment, Node, ResourceController, Task};
use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::choose::choose;
use crate::clock::{Clock, SystemClock};
use crate::event::OneShotEvent;
use crate::item::{BlockedItem, BuildableItem, Item, WaitingItem};
use crate::offer::JobOffer;

/// Floor on how long a parked executor sleeps waiting for the earliest
/// waiting item to come due, so a due time that's already (just barely) in
/// the past doesn't make `pop` spin through park/wait/unpark in a tight
/// loop.
const MIN_PARK_SLEEP: Duration = Duration::from_millis(100);

pub(crate) struct QueueState<T: Task, N: Node> {
    pub(crate) waiting: BTreeSet<WaitingItem<T>>,
    pub(crate) blocked: HashMap<T::Id, BlockedItem<T>>,
    pub(crate) buildable: IndexMap<T::Id, BuildableItem<T>>,
    pub(crate) parked: IndexMap<String, JobOffer<T, N>>,
    pub(crate) next_id: u64,
}

impl<T: Task, N: Node> QueueState<T, N> {
    fn new() -> Self {
        Self {
            waiting: BTreeSet::new(),
            blocked: HashMap::new(),
            buildable: IndexMap::new(),
            parked: IndexMap::new(),
            next_id: 0,
        }
    }

    fn find_waiting(&self, id: &T::Id) -> Option<WaitingItem<T>> {
        self.waiting.iter().find(|w| &w.task.id() == id).cloned()
    }

    fn is_active(&self, id: &T::Id) -> bool {
        self.blocked.contains_key(id) || self.buildable.contains_key(id)
    }
}

/// The build queue itself: a monitor guarding the waiting/blocked/buildable
/// collections and the table of executors parked in [`Queue::pop`].
///
/// Generic over the task and node types the host application uses
/// ([`Task`], [`Node`]), the resource interlock ([`ResourceController`]),
/// the environment handle ([`Environment`]) and the clock, so tests can
/// swap in a [`crate::clock::TestClock`] for deterministic due-time
/// behavior.
pub struct Queue<T, N, R, E, C = SystemClock>
where
    T: Task,
    N: Node,
    R: ResourceController<T>,
    E: Environment<T>,
    C: Clock,
{
    pub(crate) state: Mutex<QueueState<T, N>>,
    pub(crate) resources: R,
    pub(crate) env: E,
    pub(crate) clock: C,
}

impl<T, N, R, E> Queue<T, N, R, E, SystemClock>
where
    T: Task,
    N: Node,
    R: ResourceController<T>,
    E: Environment<T>,
{
    pub fn new(resources: R, env: E) -> Self {
        Self::with_clock(resources, env, SystemClock)
    }
}

impl<T, N, R, E, C> Queue<T, N, R, E, C>
where
    T: Task,
    N: Node,
    R: ResourceController<T>,
    E: Environment<T>,
    C: Clock,
{
    pub fn with_clock(resources: R, env: E, clock: C) -> Self {
        Self {
            state: Mutex::new(QueueState::new()),
            resources,
            env,
            clock,
        }
    }

    /// The environment handle this queue was constructed with, for callers
    /// that need to register newly-created tasks so they can later be
    /// resolved from persisted names (see [`Environment::resolve_task`]).
    pub fn environment(&self) -> &E {
        &self.env
    }

    /// Adds `task` using its own [`Task::quiet_period`] hint. Convenience
    /// wrapper around [`Queue::add_with_quiet_period`] for callers that
    /// don't need to override it.
    pub fn add(&self, task: T) -> bool {
        let quiet_period = task.quiet_period();
        self.add_with_quiet_period(task, quiet_period)
    }

    /// Adds `task`, or, if it's already waiting, pulls its `WaitingItem`'s
    /// due time in to the newly computed one when that's earlier — never
    /// pushes it out. Returns `true` if this call put a genuinely new task
    /// into the queue.
    ///
    /// A task already blocked or buildable is left alone: it has already
    /// cleared its quiet period, so re-triggering it is a no-op.
    pub fn add_with_quiet_period(&self, task: T, quiet_period: Duration) -> bool {
        let id = task.id();
        let due_at = self.clock.now() + quiet_period;

        let mut state = self.state.lock();
        if let Some(existing) = state.find_waiting(&id) {
            if due_at < existing.due_at {
                state.waiting.remove(&existing);
                state.waiting.insert(WaitingItem {
                    task,
                    due_at,
                    id: existing.id,
                });
                trace!(task = ?id, "pulled in due time for already-waiting task");
                drop(state);
                self.run_maintenance();
            } else {
                trace!(task = ?id, "ignoring add, would push due time out");
            }
            return false;
        }

        if state.is_active(&id) {
            trace!(task = ?id, "ignoring add for task already blocked or buildable");
            return false;
        }

        let wid = state.next_id;
        state.next_id += 1;
        state.waiting.insert(WaitingItem { task, due_at, id: wid });
        debug!(task = ?id, "added task to waiting set");
        drop(state);
        self.run_maintenance();
        true
    }

    /// Removes `id` from whichever stage it's currently in. Returns `true`
    /// if it was present.
    pub fn cancel(&self, id: &T::Id) -> bool {
        let mut state = self.state.lock();
        if let Some(w) = state.find_waiting(id) {
            state.waiting.remove(&w);
            return true;
        }
        if state.blocked.remove(id).is_some() {
            return true;
        }
        if state.buildable.shift_remove(id).is_some() {
            return true;
        }
        false
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        let state = self.state.lock();
        state.find_waiting(id).is_some() || state.is_active(id)
    }

    pub fn is_empty(&self) -> bool {
        let state = self.state.lock();
        state.waiting.is_empty() && state.blocked.is_empty() && state.buildable.is_empty()
    }

    pub fn get_item(&self, id: &T::Id) -> Option<Item<T>> {
        let state = self.state.lock();
        if let Some(w) = state.find_waiting(id) {
            return Some(Item::Waiting(w));
        }
        if let Some(b) = state.blocked.get(id) {
            return Some(Item::Blocked(b.clone()));
        }
        if let Some(b) = state.buildable.get(id) {
            return Some(Item::Buildable(b.clone()));
        }
        None
    }

    /// Snapshot of every item currently in the queue: waiting items in due
    /// order, then blocked items, then buildable items in FIFO order.
    pub fn get_items(&self) -> Vec<Item<T>> {
        let state = self.state.lock();
        let mut items: Vec<Item<T>> = state.waiting.iter().cloned().map(Item::Waiting).collect();
        items.extend(state.blocked.values().cloned().map(Item::Blocked));
        items.extend(state.buildable.values().cloned().map(Item::Buildable));
        items
    }

    /// Snapshot of the buildable set, in FIFO order.
    pub fn buildable_items(&self) -> Vec<T> {
        let state = self.state.lock();
        state.buildable.values().map(|b| b.task.clone()).collect()
    }

    /// Snapshot of the buildable set, restricted to tasks `node` is eligible
    /// to run: unlabeled tasks plus tasks whose assigned label `node`
    /// carries. Used by status displays scoped to a single computer.
    pub fn buildable_items_for(&self, node: &N) -> Vec<T> {
        let state = self.state.lock();
        state
            .buildable
            .values()
            .map(|b| &b.task)
            .filter(|task| match task.assigned_label() {
                Some(label) => node.has_label(label),
                None => true,
            })
            .cloned()
            .collect()
    }

    /// Wakes exactly one currently-unassigned parked offer so it re-runs
    /// maintenance, in case conditions changed in a way that could unblock a
    /// task (e.g. a resource was released outside of `add`/`pop`). A silent
    /// no-op if every parked offer already has an assigned task.
    pub fn schedule_maintenance(&self) {
        let state = self.state.lock();
        if let Some(offer) = state.parked.values().find(|offer| offer.assigned.is_none()) {
            offer.event.signal();
        }
    }

    /// Runs one maintenance pass immediately and tries to match the
    /// resulting buildable items against any parked executors. Called
    /// after every mutation, and periodically by [`crate::runtime::Ticker`].
    pub fn run_maintenance(&self) {
        let mut state = self.state.lock();
        self.maintain_locked(&mut state);
        self.match_locked(&mut state);
    }

    /// Promotes blocked items that have become buildable (pass A), then
    /// promotes due waiting items to blocked or buildable (pass B).
    fn maintain_locked(&self, state: &mut QueueState<T, N>) {
        let now = self.clock.now();

        let blocked_ids: Vec<T::Id> = state.blocked.keys().cloned().collect();
        for id in blocked_ids {
            let Some(item) = state.blocked.get(&id) else {
                continue;
            };
            if !item.task.is_build_blocked() && self.resources.can_acquire(&item.task) {
                let item = state.blocked.remove(&id).expect("checked above");
                state.buildable.insert(
                    id,
                    BuildableItem {
                        task: item.task,
                        buildable_start: item.buildable_start,
                    },
                );
            }
        }

        loop {
            let Some(earliest) = state.waiting.iter().next().cloned() else {
                break;
            };
            if earliest.due_at > now {
                break;
            }
            state.waiting.remove(&earliest);
            let id = earliest.task.id();
            if earliest.task.is_build_blocked() || !self.resources.can_acquire(&earliest.task) {
                state.blocked.insert(
                    id,
                    BlockedItem {
                        task: earliest.task,
                        buildable_start: now,
                    },
                );
            } else {
                state.buildable.insert(
                    id,
                    BuildableItem {
                        task: earliest.task,
                        buildable_start: now,
                    },
                );
            }
        }
    }

    /// Re-checks every buildable item against the block predicate (a task
    /// can go from eligible to blocked between promotion and dispatch,
    /// e.g. a resource another task just acquired), demoting any that now
    /// fail it, then offers the rest to parked executors via [`choose`].
    fn match_locked(&self, state: &mut QueueState<T, N>) {
        if state.parked.is_empty() || state.buildable.is_empty() {
            return;
        }

        let candidate_ids: Vec<T::Id> = state.buildable.keys().cloned().collect();
        for id in candidate_ids {
            let Some(item) = state.buildable.get(&id) else {
                continue;
            };
            if item.task.is_build_blocked() || !self.resources.can_acquire(&item.task) {
                let item = state.buildable.shift_remove(&id).expect("checked above");
                state.blocked.insert(
                    id,
                    BlockedItem {
                        task: item.task,
                        buildable_start: item.buildable_start,
                    },
                );
                continue;
            }

            let Some(executor_id) = choose(&item.task, &state.parked, &self.env) else {
                continue;
            };
            let item = state.buildable.shift_remove(&id).expect("checked above");
            let offer = state
                .parked
                .get_mut(&executor_id)
                .expect("choose returned a parked executor id");
            offer.assigned = Some(item);
            offer.event.signal();
        }
    }

    /// Requeues a task whose build was aborted mid-flight, guarding against
    /// two concurrent aborts both trying to requeue the same task.
    pub fn requeue_after_abort(&self, task: T) {
        let id = task.id();
        let due_at = self.clock.now();
        let mut state = self.state.lock();
        if state.find_waiting(&id).is_some() || state.is_active(&id) {
            warn!(task = ?id, "skipping requeue, task already present in the queue");
            return;
        }
        let wid = state.next_id;
        state.next_id += 1;
        state.waiting.insert(WaitingItem { task, due_at, id: wid });
        drop(state);
        self.run_maintenance();
    }

    /// Registers `executor` as parked and waiting for work. Internal: used
    /// by [`crate::dispatch`].
    pub(crate) fn park(&self, executor_id: String, node: N) -> Arc<OneShotEvent> {
        let mut state = self.state.lock();
        let offer = JobOffer::new(executor_id.clone(), node);
        let event = offer.event.clone();
        state.parked.insert(executor_id, offer);
        self.maintain_locked(&mut state);
        self.match_locked(&mut state);
        event
    }

    /// Removes `executor_id` from the parked table, returning the item it
    /// was assigned, if any. Internal: used by [`crate::dispatch`].
    pub(crate) fn unpark(&self, executor_id: &str) -> Option<BuildableItem<T>> {
        let mut state = self.state.lock();
        state.parked.shift_remove(executor_id).and_then(|offer| offer.assigned)
    }

    /// Puts an assigned-but-unclaimed buildable item back, used by the
    /// abnormal-exit cleanup path in [`crate::dispatch::pop`].
    pub(crate) fn reinstate_buildable(&self, item: BuildableItem<T>) {
        let mut state = self.state.lock();
        let id = item.task.id();
        if !state.is_active(&id) && state.find_waiting(&id).is_none() {
            state.buildable.insert(id, item);
        }
    }

    /// How long until the next waiting item becomes due, if any, floored at
    /// [`MIN_PARK_SLEEP`] so a due time in the past or the immediate future
    /// doesn't spin the parked thread in a tight re-park loop.
    pub(crate) fn next_wakeup(&self, state: &QueueState<T, N>) -> Option<Duration> {
        let now = self.clock.now();
        state
            .waiting
            .iter()
            .next()
            .map(|w| w.due_at.saturating_duration_since(now).max(MIN_PARK_SLEEP))
    }
}
