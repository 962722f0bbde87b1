//! Deferred tasks.
//!
//! The engine runs on the UI event loop and never blocks. Everything that has to happen "a bit
//! later" (settling after the renderer applied a style, popup fades, cluster leg fades) is put
//! into a [`TimerQueue`] as a typed [`Task`]. The host drives the queue by calling
//! [`MapEngine::advance`](crate::MapEngine::advance) with the current time, usually once per
//! animation frame. Delays are measured from the time of the last `advance`, so a host that stops
//! advancing while idle must advance to the current time before forwarding the next event.

use std::collections::BTreeMap;
use std::time::Duration;

use ahash::AHashMap;
use web_time::Instant;

use crate::cluster::ClusterTask;
use crate::popup::PopupTask;
use crate::view::ViewKind;

/// Something the engine does when a timer fires.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Task {
    /// Drain the queue of jobs requested before the engine was ready.
    FlushJobs,
    /// Render a view after a view switch.
    RenderView(ViewKind),
    /// Request the base data again after a failed fetch.
    RetryFetch,
    /// Popup transition step.
    Popup(PopupTask),
    /// Cluster legs transition step.
    Cluster(ClusterTask),
}

/// Handle of a scheduled task. Can be used to cancel it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// Queue of tasks ordered by their deadline.
///
/// Tasks with the same deadline run in the order they were scheduled. The queue keeps its own
/// notion of the current time: when a task is popped, the clock moves to the task deadline, so
/// tasks scheduled while handling it are timed relative to the moment it was due, not to the
/// moment the host happened to call `advance`.
#[derive(Debug)]
pub struct TimerQueue<T> {
    now: Instant,
    next_seq: u64,
    entries: BTreeMap<(Instant, u64), T>,
    deadlines: AHashMap<u64, Instant>,
}

impl<T> TimerQueue<T> {
    /// Creates an empty queue with the clock set to `now`.
    pub fn new(now: Instant) -> Self {
        Self {
            now,
            next_seq: 0,
            entries: BTreeMap::new(),
            deadlines: AHashMap::new(),
        }
    }

    /// Current time of the queue.
    pub fn now(&self) -> Instant {
        self.now
    }

    /// Moves the clock forward. The clock never goes back.
    pub fn set_now(&mut self, now: Instant) {
        if now > self.now {
            self.now = now;
        }
    }

    /// Schedules a task to run `delay` after the current time.
    pub fn schedule(&mut self, delay: Duration, task: T) -> TimerHandle {
        let seq = self.next_seq;
        self.next_seq += 1;

        let deadline = self.now + delay;
        self.entries.insert((deadline, seq), task);
        self.deadlines.insert(seq, deadline);

        TimerHandle(seq)
    }

    /// Cancels a task. Returns the task if it was still pending.
    pub fn cancel(&mut self, handle: TimerHandle) -> Option<T> {
        let deadline = self.deadlines.remove(&handle.0)?;
        self.entries.remove(&(deadline, handle.0))
    }

    /// Returns true if the task is still pending.
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.deadlines.contains_key(&handle.0)
    }

    /// Removes and returns the earliest task that is due at `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<T> {
        let (&(deadline, seq), _) = self.entries.first_key_value()?;
        if deadline > now {
            return None;
        }

        self.deadlines.remove(&seq);
        self.set_now(deadline);
        self.entries.remove(&(deadline, seq))
    }

    /// Deadline of the earliest pending task.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.first_key_value().map(|(&(deadline, _), _)| deadline)
    }

    /// Number of pending tasks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no task is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops all pending tasks.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.deadlines.clear();
    }
}
