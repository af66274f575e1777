use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use ci_queue_api::{Environment, Node, ResourceController, Task};
use tracing::trace;

use crate::clock::Clock;
use crate::event::OneShotEvent;
use crate::queue::Queue;

/// Background timer that periodically re-runs maintenance on a [`Queue`], so
/// waiting items whose due time has passed get promoted even if nothing
/// else (an `add`, a `pop`, an explicit `schedule_maintenance`) woke the
/// dispatcher in the meantime.
///
/// Lifecycle is explicit rather than reference-counted: the ticker is
/// started alongside the queue, and its [`Drop`] impl signals the stop
/// event and joins the timer thread, the same start/own/join shape used for
/// worker threads elsewhere in this codebase.
pub struct Ticker {
    stop: Arc<OneShotEvent>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Spawns the timer thread, re-running maintenance on `queue` every
    /// `period` until this `Ticker` is dropped.
    pub fn spawn<T, N, R, E, C>(queue: Arc<Queue<T, N, R, E, C>>, period: Duration) -> Self
    where
        T: Task,
        N: Node,
        R: ResourceController<T>,
        E: Environment<T>,
        C: Clock,
    {
        let stop = Arc::new(OneShotEvent::new());
        let stop_for_thread = stop.clone();

        let handle = thread::Builder::new()
            .name("ci-queue-ticker".into())
            .spawn(move || {
                while !stop_for_thread.wait_timeout(period) {
                    trace!("ticker firing, re-running maintenance");
                    queue.run_maintenance();
                    queue.schedule_maintenance();
                }
            })
            .expect("failed to spawn ci-queue ticker thread");

        Self { stop, handle: Some(handle) }
    }

    /// Signals the timer thread to stop and blocks until it exits.
    pub fn shutdown(mut self) {
        self.stop.signal();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop.signal();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
