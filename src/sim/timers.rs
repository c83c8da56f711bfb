//! Discrete-event scheduler
//!
//! Every delayed action (ship arrivals, overload countdowns, spawners, prompt
//! timeouts) is an entry keyed by simulated time. `tick` pops due entries in
//! time order; entries for the same instant fire in scheduling order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Something that happens at a simulated instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimerEvent {
    /// A ship reached the waypoint it was heading for
    ShipArrival { line: usize, ship_id: u32 },
    /// One second of a port's overload countdown elapsed
    OverloadCountdown { port_id: u32, generation: u32 },
    /// Grace period after a fatal countdown ended
    GameOver { port_id: u32 },
    SpawnPort,
    SpawnStorm,
    SpawnCargo,
    OfferUpgrade,
    /// The prompt step identified by `serial` ran out of time
    UpgradePromptExpired { serial: u32 },
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    at: f64,
    seq: u64,
    event: TimerEvent,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    // Reversed so the max-heap pops the earliest entry first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .at
            .total_cmp(&self.at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Min-heap of pending timer events
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Scheduled>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `event` to fire at simulated time `at`
    pub fn schedule(&mut self, at: f64, event: TimerEvent) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Scheduled { at, seq, event });
    }

    /// Pop the earliest event due at or before `now`
    pub fn pop_due(&mut self, now: f64) -> Option<(f64, TimerEvent)> {
        if self.queue.peek()?.at > now {
            return None;
        }
        self.queue.pop().map(|s| (s.at, s.event))
    }

    /// Time of the next pending event
    pub fn next_due(&self) -> Option<f64> {
        self.queue.peek().map(|s| s.at)
    }

    /// Drop every pending event
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Whether an event matching `pred` is pending
    pub fn any(&self, pred: impl Fn(&TimerEvent) -> bool) -> bool {
        self.queue.iter().any(|s| pred(&s.event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pops_in_time_order() {
        let mut s = Scheduler::new();
        s.schedule(3.0, TimerEvent::SpawnStorm);
        s.schedule(1.0, TimerEvent::SpawnPort);
        s.schedule(2.0, TimerEvent::SpawnCargo);

        assert_eq!(s.pop_due(0.5), None);
        assert_eq!(s.pop_due(10.0), Some((1.0, TimerEvent::SpawnPort)));
        assert_eq!(s.pop_due(10.0), Some((2.0, TimerEvent::SpawnCargo)));
        assert_eq!(s.pop_due(2.5), None);
        assert_eq!(s.next_due(), Some(3.0));
    }

    #[test]
    fn test_same_instant_keeps_insertion_order() {
        let mut s = Scheduler::new();
        s.schedule(1.0, TimerEvent::OfferUpgrade);
        s.schedule(1.0, TimerEvent::SpawnPort);
        s.schedule(1.0, TimerEvent::SpawnStorm);
        assert_eq!(s.pop_due(1.0).map(|e| e.1), Some(TimerEvent::OfferUpgrade));
        assert_eq!(s.pop_due(1.0).map(|e| e.1), Some(TimerEvent::SpawnPort));
        assert_eq!(s.pop_due(1.0).map(|e| e.1), Some(TimerEvent::SpawnStorm));
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut s = Scheduler::new();
        s.schedule(1.0, TimerEvent::SpawnPort);
        s.schedule(2.0, TimerEvent::GameOver { port_id: 1 });
        assert_eq!(s.len(), 2);
        assert!(s.any(|e| matches!(e, TimerEvent::GameOver { .. })));
        s.clear();
        assert!(s.is_empty());
        assert_eq!(s.pop_due(100.0), None);
    }
}
