use ci_queue_api::{Environment, Executor, Node, ResourceController, Task};

use crate::clock::Clock;
use crate::queue::Queue;

impl<T, N, R, Env, C> Queue<T, N, R, Env, C>
where
    T: Task,
    N: Node,
    R: ResourceController<T>,
    Env: Environment<T>,
    C: Clock,
{
    /// Blocks the calling thread until a buildable task is matched to
    /// `executor`, then returns it.
    ///
    /// Each iteration: park, compute how long until the earliest waiting
    /// item is due (or block indefinitely if the waiting set is empty),
    /// wait up to that long, then check whether the dispatcher assigned
    /// this slot a task while it slept. A plain timer tick re-runs
    /// maintenance and parks again; an assignment returns the task.
    pub fn pop<Exe: Executor<Node = N>>(&self, executor: &Exe) -> T {
        loop {
            let node = executor.node();
            let executor_id = executor.id().to_string();
            let event = self.park(executor_id.clone(), node);
            let mut guard = ParkedGuard {
                queue: self,
                executor_id: executor_id.clone(),
                settled: false,
            };

            let sleep = {
                let state = self.state.lock();
                self.next_wakeup(&state)
            };
            match sleep {
                Some(duration) => {
                    event.wait_timeout(duration);
                }
                None => event.wait(),
            }

            let assigned = self.unpark(&executor_id);
            guard.settled = true;

            if let Some(item) = assigned {
                return item.task;
            }
            self.run_maintenance();
        }
    }
}

/// Cleans up the parked-table entry if `pop` unwinds (via panic) before it
/// reaches its own `unpark` call, so a task assigned to a slot whose
/// executor never came back to claim it isn't lost.
struct ParkedGuard<'q, T, N, R, Env, C>
where
    T: Task,
    N: Node,
    R: ResourceController<T>,
    Env: Environment<T>,
    C: Clock,
{
    queue: &'q Queue<T, N, R, Env, C>,
    executor_id: String,
    settled: bool,
}

impl<'q, T, N, R, Env, C> Drop for ParkedGuard<'q, T, N, R, Env, C>
where
    T: Task,
    N: Node,
    R: ResourceController<T>,
    Env: Environment<T>,
    C: Clock,
{
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        if let Some(item) = self.queue.unpark(&self.executor_id) {
            self.queue.reinstate_buildable(item);
        }
        self.queue.run_maintenance();
    }
}
