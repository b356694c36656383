//! Scheduled callbacks.
//!
//! The engine never sleeps: it asks a [`Timers`] service to hand a
//! [`GameEvent`] back later and keeps the returned [`TimerId`] so the callback
//! can be cancelled when a new game starts. The browser implementation lives
//! in `dom`; [`VirtualTimers`] drives the same engine from tests on a clock
//! that only moves when told to.

use std::time::Duration;

use crate::board::GameEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

pub trait Timers {
    /// Deliver `event` once after `delay`.
    fn after(&mut self, delay: Duration, event: GameEvent) -> TimerId;
    /// Deliver `event` every `period` until cancelled.
    fn every(&mut self, period: Duration, event: GameEvent) -> TimerId;
    /// Unknown or already fired ids are ignored.
    fn cancel(&mut self, id: TimerId);
}

#[derive(Debug, Clone)]
struct Scheduled {
    id: TimerId,
    due_ms: u64,
    period_ms: Option<u64>,
    event: GameEvent,
}

/// Deterministic timer service on a virtual millisecond clock.
#[derive(Debug, Clone, Default)]
pub struct VirtualTimers {
    now_ms: u64,
    next_id: u64,
    queue: Vec<Scheduled>,
}

impl VirtualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        Duration::from_millis(self.now_ms)
    }

    /// Number of live timers (fired one-shots are gone, intervals stay).
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.queue.iter().any(|s| s.id == id)
    }

    /// Fires the earliest timer due at or before `deadline`, moving the clock to
    /// its due time. Ties fire in scheduling order. Intervals are re-armed.
    pub fn fire_next(&mut self, deadline: Duration) -> Option<GameEvent> {
        let deadline_ms = millis(deadline);
        let pos = self
            .queue
            .iter()
            .enumerate()
            .filter(|(_, s)| s.due_ms <= deadline_ms)
            .min_by_key(|(_, s)| (s.due_ms, s.id))
            .map(|(pos, _)| pos)?;

        let entry = &mut self.queue[pos];
        self.now_ms = self.now_ms.max(entry.due_ms);
        let event = entry.event;
        match entry.period_ms {
            Some(period) => entry.due_ms += period.max(1),
            None => {
                self.queue.remove(pos);
            }
        }
        Some(event)
    }

    /// Moves the clock forward without firing anything; callers fire first.
    pub fn settle_at(&mut self, deadline: Duration) {
        self.now_ms = self.now_ms.max(millis(deadline));
    }

    fn push(&mut self, delay: Duration, period_ms: Option<u64>, event: GameEvent) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.queue.push(Scheduled {
            id,
            due_ms: self.now_ms + millis(delay),
            period_ms,
            event,
        });
        id
    }
}

impl Timers for VirtualTimers {
    fn after(&mut self, delay: Duration, event: GameEvent) -> TimerId {
        self.push(delay, None, event)
    }

    fn every(&mut self, period: Duration, event: GameEvent) -> TimerId {
        self.push(period, Some(millis(period)), event)
    }

    fn cancel(&mut self, id: TimerId) {
        self.queue.retain(|s| s.id != id);
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
