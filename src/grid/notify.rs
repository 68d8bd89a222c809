// src/grid/notify.rs
// Deferred-flush primitive for change notifications. Nothing here owns a timer: the owner asks
// for the deadline and polls.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock advanced by hand. Clones share the same time, so a test can keep one handle while the
/// grid owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// Handle returned when registering a listener; pass it back to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

/// At most one pending flush. `schedule` keeps an existing deadline, `reschedule` replaces it.
#[derive(Debug, Clone)]
pub struct DebouncedFlush {
    window: Duration,
    deadline: Option<Instant>,
}

impl DebouncedFlush {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn schedule(&mut self, now: Instant) {
        if self.deadline.is_none() {
            self.deadline = Some(now + self.window);
        }
    }

    pub fn reschedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    /// Returns whether a flush was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Consumes the pending flush if its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(5);

    #[test]
    fn schedule_keeps_first_deadline() {
        let clock = ManualClock::new();
        let mut flush = DebouncedFlush::new(WINDOW);
        flush.schedule(clock.now());
        let first = flush.deadline();
        clock.advance(Duration::from_millis(3));
        flush.schedule(clock.now());
        assert_eq!(flush.deadline(), first);
    }

    #[test]
    fn reschedule_moves_deadline() {
        let clock = ManualClock::new();
        let mut flush = DebouncedFlush::new(WINDOW);
        flush.schedule(clock.now());
        clock.advance(Duration::from_millis(3));
        flush.reschedule(clock.now());
        assert_eq!(flush.deadline(), Some(clock.now() + WINDOW));
    }

    #[test]
    fn take_due_fires_once() {
        let clock = ManualClock::new();
        let mut flush = DebouncedFlush::new(WINDOW);
        flush.schedule(clock.now());
        assert!(!flush.take_due(clock.now()));
        clock.advance(WINDOW);
        assert!(flush.take_due(clock.now()));
        assert!(!flush.take_due(clock.now()));
        assert!(!flush.is_pending());
    }

    #[test]
    fn cancel_reports_pending_state() {
        let mut flush = DebouncedFlush::new(WINDOW);
        assert!(!flush.cancel());
        flush.schedule(Instant::now());
        assert!(flush.cancel());
        assert!(flush.deadline().is_none());
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let a = ManualClock::new();
        let b = a.clone();
        a.advance(Duration::from_secs(1));
        assert_eq!(a.now(), b.now());
    }
}
