use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// One-shot flag that other threads can block on with a timeout.
#[derive(Debug, Clone, Default)]
pub(crate) struct Flag {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl Flag {
    pub(crate) fn set(&self) {
        let (lock, condvar) = &*self.inner;
        let mut raised = lock.lock().unwrap_or_else(PoisonError::into_inner);
        *raised = true;
        condvar.notify_all();
    }

    pub(crate) fn is_set(&self) -> bool {
        let (lock, _) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until the flag is raised or `timeout` elapses. Returns whether
    /// the flag is raised.
    pub(crate) fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let (lock, condvar) = &*self.inner;
        let mut raised = lock.lock().unwrap_or_else(PoisonError::into_inner);
        while !*raised {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            raised = condvar
                .wait_timeout(raised, deadline - now)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|poisoned| poisoned.into_inner().0);
        }
        true
    }
}

/// Cooperative stop request shared between the lifecycle manager and one
/// worker. Clones observe the same signal.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    flag: Flag,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.set();
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.is_set()
    }

    /// Interruptible sleep. Returns `true` when woken by cancellation, in
    /// which case the caller should leave its loop.
    pub fn sleep(&self, duration: Duration) -> bool {
        self.flag.wait_timeout(duration)
    }
}
