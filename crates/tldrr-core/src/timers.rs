//! Cancellable timers driven by a host clock
//!
//! The controller never sleeps. It records deadlines here and the host
//! calls [`crate::Controller::tick`] when [`TimerQueue::next_deadline`]
//! passes. Cancelled timers never fire.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

/// Milliseconds since an arbitrary epoch.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Clock advanced by hand. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by.as_millis() as u64);
    }

    pub fn set(&self, now_ms: u64) {
        self.now.set(now_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Handle for cancelling a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Deadline-ordered queue of pending events.
#[derive(Debug)]
pub struct TimerQueue<E> {
    next_id: u64,
    // (deadline, id) keeps insertion order among equal deadlines
    pending: BTreeMap<(u64, TimerId), E>,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            pending: BTreeMap::new(),
        }
    }
}

impl<E> TimerQueue<E> {
    pub fn schedule(&mut self, now_ms: u64, after: Duration, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let deadline = now_ms.saturating_add(after.as_millis() as u64);
        self.pending.insert((deadline, id), event);
        id
    }

    /// Drop a pending timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let key = self.pending.keys().find(|(_, k)| *k == id).copied();
        match key {
            Some(key) => self.pending.remove(&key).is_some(),
            None => false,
        }
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Remove and return the earliest event due at `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(TimerId, E)> {
        let key = *self.pending.keys().next()?;
        if key.0 > now_ms {
            return None;
        }
        self.pending.remove(&key).map(|event| (key.1, event))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
