//! Time source and timer scheduling.
//!
//! Engine code never sleeps or spawns. It asks a [`Clock`] to schedule a
//! [`Timer`], and whoever drives the session collects due timers with
//! [`Clock::take_due`] and feeds them back in. [`VirtualClock`] makes that
//! loop fully deterministic in tests; [`SystemClock`] reads wall time.

use core::time::Duration;
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::common::{Side, Timestamp};

/// Work the engine wants done later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    /// The computer opponent on `side` takes its shot.
    AiShot { side: Side },
}

/// Handle returned by [`Clock::schedule`], used to cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

pub trait Clock {
    /// Current time in milliseconds since the Unix epoch.
    fn now(&self) -> Timestamp;

    fn schedule(&mut self, delay: Duration, timer: Timer) -> TimerHandle;

    /// Drop a pending timer. Returns `false` if it already fired or was
    /// cancelled.
    fn cancel(&mut self, handle: TimerHandle) -> bool;

    /// Remove and return every timer whose deadline has passed, earliest
    /// first.
    fn take_due(&mut self) -> Vec<(TimerHandle, Timer)>;

    /// Deadline of the earliest pending timer.
    fn next_deadline(&self) -> Option<Timestamp>;
}

/// Pending timers ordered by (deadline, handle).
#[derive(Debug, Default)]
struct TimerQueue {
    next_id: u64,
    pending: BTreeMap<(Timestamp, TimerHandle), Timer>,
}

impl TimerQueue {
    fn push(&mut self, deadline: Timestamp, timer: Timer) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.pending.insert((deadline, handle), timer);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        let key = self.pending.keys().find(|(_, h)| *h == handle).copied();
        match key {
            Some(key) => self.pending.remove(&key).is_some(),
            None => false,
        }
    }

    fn take_due(&mut self, now: Timestamp) -> Vec<(TimerHandle, Timer)> {
        let mut due = Vec::new();
        while let Some(entry) = self.pending.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let ((_, handle), timer) = entry.remove_entry();
            due.push((handle, timer));
        }
        due
    }

    fn next_deadline(&self) -> Option<Timestamp> {
        self.pending.keys().next().map(|(deadline, _)| *deadline)
    }

    fn len(&self) -> usize {
        self.pending.len()
    }
}

/// Manually advanced clock for deterministic tests.
#[derive(Debug, Default)]
pub struct VirtualClock {
    now: Timestamp,
    queue: TimerQueue,
}

impl VirtualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: start,
            queue: TimerQueue::default(),
        }
    }

    /// Move time forward by `by`.
    pub fn advance(&mut self, by: Duration) {
        self.now += by.as_millis() as Timestamp;
    }

    /// Number of timers not yet fired or cancelled.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Timestamp {
        self.now
    }

    fn schedule(&mut self, delay: Duration, timer: Timer) -> TimerHandle {
        self.queue.push(self.now + delay.as_millis() as Timestamp, timer)
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.queue.cancel(handle)
    }

    fn take_due(&mut self) -> Vec<(TimerHandle, Timer)> {
        self.queue.take_due(self.now)
    }

    fn next_deadline(&self) -> Option<Timestamp> {
        self.queue.next_deadline()
    }
}

/// Wall-clock time.
#[derive(Debug, Default)]
pub struct SystemClock {
    queue: TimerQueue,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as Timestamp)
            .unwrap_or_default()
    }

    fn schedule(&mut self, delay: Duration, timer: Timer) -> TimerHandle {
        let deadline = self.now() + delay.as_millis() as Timestamp;
        self.queue.push(deadline, timer)
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.queue.cancel(handle)
    }

    fn take_due(&mut self) -> Vec<(TimerHandle, Timer)> {
        let now = self.now();
        self.queue.take_due(now)
    }

    fn next_deadline(&self) -> Option<Timestamp> {
        self.queue.next_deadline()
    }
}
