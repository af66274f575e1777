use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Source of "now" for due-time and buildable-start bookkeeping, injectable
/// so queue tests don't depend on real wall-clock delays.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
}

/// The default clock, backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock whose time only moves when [`TestClock::advance`] is called.
/// Still produces real `Instant`s (anchored at construction time) so it
/// drops into any API expecting one.
#[derive(Debug)]
pub struct TestClock {
    base: Instant,
    offset: AtomicU64,
}

impl TestClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: AtomicU64::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Default for TestClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TestClock {
    fn now(&self) -> Instant {
        self.base + Duration::from_millis(self.offset.load(Ordering::SeqCst))
    }
}
