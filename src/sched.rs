use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Opaque token identifying one periodic schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScheduleHandle(u64);

/// Periodic scheduling facility consumed by the engine. Cancelling must be
/// idempotent, and a cancelled handle must never fire again.
pub trait Scheduler {
    fn schedule_periodic(&mut self, interval: Duration) -> ScheduleHandle;
    fn cancel(&mut self, handle: ScheduleHandle);
}

struct Entry {
    handle: ScheduleHandle,
    interval: Duration,
    next_due: Instant,
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    entries: Vec<Entry>,
}

/// Single-threaded scheduler driven from the host event loop. The engine
/// holds one clone for scheduling and cancelling; the host polls `due` and
/// dispatches fired handles back into the engine, so handlers never run
/// re-entrantly.
#[derive(Clone, Default)]
pub struct LoopScheduler {
    inner: Rc<RefCell<Inner>>,
}

impl LoopScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles whose period has elapsed at `now`. Each fired entry is pushed
    /// one full interval past `now`, so a slow loop iteration does not cause
    /// a burst of catch-up firings.
    pub fn due(&self, now: Instant) -> Vec<ScheduleHandle> {
        let mut inner = self.inner.borrow_mut();
        let mut fired = Vec::new();
        for entry in inner.entries.iter_mut() {
            if now >= entry.next_due {
                fired.push(entry.handle);
                entry.next_due = now + entry.interval;
            }
        }
        fired
    }

    pub fn is_scheduled(&self, handle: ScheduleHandle) -> bool {
        self.inner
            .borrow()
            .entries
            .iter()
            .any(|e| e.handle == handle)
    }
}

impl Scheduler for LoopScheduler {
    fn schedule_periodic(&mut self, interval: Duration) -> ScheduleHandle {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let handle = ScheduleHandle(inner.next_id);
        inner.entries.push(Entry {
            handle,
            interval,
            next_due: Instant::now() + interval,
        });
        handle
    }

    fn cancel(&mut self, handle: ScheduleHandle) {
        self.inner.borrow_mut().entries.retain(|e| e.handle != handle);
    }
}
