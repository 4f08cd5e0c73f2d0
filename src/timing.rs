use std::cell::Cell;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Millisecond-resolution time source used to stamp reaction windows
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Production clock backed by the system wall clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Manually advanced clock for tests; clones share the same timeline
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now_ms: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now_ms.set(self.now_ms.get() + delta_ms);
    }

    pub fn set(&self, now_ms: u64) {
        self.now_ms.set(now_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }
}

/// Rotation tick scheduling. At most one tick is ever pending: arming
/// replaces the previous deadline, cancelling drops it.
pub trait TickScheduler {
    /// Arm a single tick `delay_ms` from now, replacing any pending one.
    fn schedule_once(&mut self, delay_ms: u64);
    /// Drop the pending tick, if any.
    fn cancel_all(&mut self);
    /// Absolute deadline (clock milliseconds) of the pending tick.
    fn next_deadline_ms(&self) -> Option<u64>;
}

/// Single-slot scheduler polled by the event loop
#[derive(Clone, Debug)]
pub struct DeadlineScheduler<C: Clock> {
    clock: C,
    deadline_ms: Option<u64>,
}

impl<C: Clock> DeadlineScheduler<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            deadline_ms: None,
        }
    }
}

impl<C: Clock> TickScheduler for DeadlineScheduler<C> {
    fn schedule_once(&mut self, delay_ms: u64) {
        self.deadline_ms = Some(self.clock.now_ms() + delay_ms);
    }

    fn cancel_all(&mut self) {
        self.deadline_ms = None;
    }

    fn next_deadline_ms(&self) -> Option<u64> {
        self.deadline_ms
    }
}
