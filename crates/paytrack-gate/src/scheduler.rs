//! Timer scheduling
//!
//! The gate never sleeps. It asks a [`Scheduler`] to deliver a
//! [`TimerEvent`] later and cancels it by id when the state it was scheduled
//! for goes away. Events arriving for an id the gate no longer waits on are
//! dropped by the gate, so cancellation racing a fire is harmless.

use std::sync::Mutex;
use std::time::Duration;

/// Handle of one scheduled event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// What a timer is for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerKind {
    /// Verify the full entry buffer
    Verify,
    /// One second of lockout countdown
    LockoutTick,
}

/// Delivered back to [`crate::PinGate::on_timer`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerEvent {
    pub id: TimerId,
    pub kind: TimerKind,
}

/// Deferred delivery of timer events
pub trait Scheduler: Send + Sync {
    /// Deliver `event` once `after` has elapsed
    fn schedule(&self, after: Duration, event: TimerEvent);

    /// Forget a scheduled event; unknown ids are ignored
    fn cancel(&self, id: TimerId);
}

#[derive(Debug, Default)]
struct Clock {
    now: Duration,
    seq: u64,
    pending: Vec<(Duration, u64, TimerEvent)>,
}

/// Scheduler driven by hand, for hosts with their own loop and for tests
///
/// Time only moves in [`ManualScheduler::advance`].
#[derive(Debug, Default)]
pub struct ManualScheduler {
    clock: Mutex<Clock>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed so far
    pub fn now(&self) -> Duration {
        self.clock.lock().map(|c| c.now).unwrap_or_default()
    }

    /// Number of events waiting to fire
    pub fn pending(&self) -> usize {
        self.clock.lock().map(|c| c.pending.len()).unwrap_or_default()
    }

    /// Move time forward by `by`, handing due events to `deliver` in order
    ///
    /// Events scheduled by `deliver` itself fire in the same call if they
    /// fall due before the new time.
    pub fn advance(&self, by: Duration, mut deliver: impl FnMut(TimerEvent)) {
        let target = self.now() + by;
        loop {
            let next = {
                let mut clock = match self.clock.lock() {
                    Ok(clock) => clock,
                    Err(_) => return,
                };
                let due = clock
                    .pending
                    .iter()
                    .enumerate()
                    .filter(|(_, (at, _, _))| *at <= target)
                    .min_by_key(|(_, (at, seq, _))| (*at, *seq))
                    .map(|(i, _)| i);
                match due {
                    Some(i) => {
                        let (at, _, event) = clock.pending.remove(i);
                        clock.now = at;
                        Some(event)
                    }
                    None => {
                        clock.now = target;
                        None
                    }
                }
            };

            match next {
                Some(event) => deliver(event),
                None => break,
            }
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, after: Duration, event: TimerEvent) {
        if let Ok(mut clock) = self.clock.lock() {
            let at = clock.now + after;
            let seq = clock.seq;
            clock.seq += 1;
            clock.pending.push((at, seq, event));
        }
    }

    fn cancel(&self, id: TimerId) {
        if let Ok(mut clock) = self.clock.lock() {
            clock.pending.retain(|(_, _, e)| e.id != id);
        }
    }
}
