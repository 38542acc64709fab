use std::time::{Duration, Instant};

/// Pointer interaction state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SchedulerState {
    /// Requests run on the next tick.
    #[default]
    Idle,
    /// Requests are debounced by the drag window.
    Dragging,
}

/// Counters for scheduled, superseded and executed requests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub requested: u64,
    /// Requests replaced by a newer one before they ran.
    pub coalesced: u64,
    pub fired: u64,
}

#[derive(Debug)]
struct Pending<T> {
    request: T,
    due: Instant,
}

/// Coalesces recomposition requests into a single pending slot.
///
/// While idle a request becomes due immediately and runs on the next [`tick`](Self::tick).
/// While dragging every request pushes the deadline out by the debounce window, so a burst of
/// pointer moves produces one recomposition once the pointer rests. Either way a newer request
/// replaces the pending one; nothing queues.
///
/// Time is passed in explicitly so hosts drive the scheduler from their own frame clock.
#[derive(Debug)]
pub struct InteractionScheduler<T> {
    state: SchedulerState,
    debounce: Duration,
    pending: Option<Pending<T>>,
    stats: SchedulerStats,
}

impl<T> InteractionScheduler<T> {
    pub fn new(debounce: Duration) -> Self {
        Self {
            state: SchedulerState::Idle,
            debounce,
            pending: None,
            stats: SchedulerStats::default(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Pointer pressed over the canvas.
    pub fn pointer_down(&mut self) {
        self.state = SchedulerState::Dragging;
    }

    /// Pointer released. A debounced request becomes due at `now`.
    pub fn pointer_up(&mut self, now: Instant) {
        self.to_idle(now);
    }

    /// Pointer left the canvas; same as a release.
    pub fn pointer_leave(&mut self, now: Instant) {
        self.to_idle(now);
    }

    fn to_idle(&mut self, now: Instant) {
        self.state = SchedulerState::Idle;
        if let Some(p) = self.pending.as_mut() {
            p.due = p.due.min(now);
        }
    }

    /// Schedule `request`, replacing any pending one.
    pub fn request(&mut self, request: T, now: Instant) {
        self.stats.requested += 1;
        if self.pending.is_some() {
            self.stats.coalesced += 1;
        }
        let due = match self.state {
            SchedulerState::Idle => now,
            SchedulerState::Dragging => now + self.debounce,
        };
        self.pending = Some(Pending { request, due });
    }

    /// Take the pending request if its deadline has passed.
    pub fn tick(&mut self, now: Instant) -> Option<T> {
        if self.pending.as_ref()?.due > now {
            return None;
        }
        let p = self.pending.take()?;
        self.stats.fired += 1;
        Some(p.request)
    }

    /// Deadline of the pending request.
    pub fn next_due(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.due)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the pending request without running it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.request)
    }
}
