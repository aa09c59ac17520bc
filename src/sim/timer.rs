//! Cooperative timers advanced once per simulation tick
//!
//! Nothing here blocks. A "wait N seconds" is an entry with a deadline that the
//! driving loop advances with the tick's `dt`; time that is never fed in (e.g. while
//! paused) never elapses.

/// A one-shot or repeating countdown owned by a single component
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Countdown {
    remaining: f32,
    period: f32,
    repeating: bool,
    armed: bool,
}

impl Countdown {
    /// One-shot countdown that fires once after `delay` seconds
    pub fn once(delay: f32) -> Self {
        Self {
            remaining: delay,
            period: delay,
            repeating: false,
            armed: true,
        }
    }

    /// Repeating countdown that fires every `period` seconds
    pub fn repeating(period: f32) -> Self {
        Self {
            remaining: period,
            period,
            repeating: true,
            armed: true,
        }
    }

    /// A countdown that never fires until re-armed
    pub fn disarmed() -> Self {
        Self {
            remaining: 0.0,
            period: 0.0,
            repeating: false,
            armed: false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Seconds until the next firing (0 when disarmed)
    pub fn remaining(&self) -> f32 {
        if self.armed { self.remaining.max(0.0) } else { 0.0 }
    }

    /// Restart from a full period
    pub fn reset(&mut self) {
        self.remaining = self.period;
        self.armed = true;
    }

    /// Re-arm as a one-shot with a new delay
    pub fn arm(&mut self, delay: f32) {
        self.remaining = delay;
        self.period = delay;
        self.repeating = false;
        self.armed = true;
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Advance by `dt` and return how many times the countdown fired.
    ///
    /// A repeating countdown carries overshoot into the next period, so a large `dt`
    /// can fire several times. A zero or negative period fires at most once per call.
    pub fn tick(&mut self, dt: f32) -> u32 {
        if !self.armed {
            return 0;
        }
        self.remaining -= dt;
        if self.remaining > 0.0 {
            return 0;
        }

        if !self.repeating {
            self.armed = false;
            return 1;
        }

        if self.period <= 0.0 {
            self.remaining = 0.0;
            return 1;
        }

        let mut fired = 0;
        while self.remaining <= 0.0 {
            self.remaining += self.period;
            fired += 1;
        }
        fired
    }
}

/// A scheduled entry in a [`TimerQueue`]
#[derive(Debug, Clone)]
struct Entry<K> {
    key: K,
    deadline: f64,
    period: Option<f64>,
    seq: u64,
}

/// Deadline-ordered queue of keyed timers sharing one clock
///
/// Entries are kept sorted by `(deadline, insertion order)`; `advance` pops every entry
/// whose deadline has passed and returns their keys in firing order.
#[derive(Debug, Clone)]
pub struct TimerQueue<K> {
    now: f64,
    entries: Vec<Entry<K>>,
    next_seq: u64,
}

impl<K> Default for TimerQueue<K> {
    fn default() -> Self {
        Self {
            now: 0.0,
            entries: Vec::new(),
            next_seq: 0,
        }
    }
}

impl<K: Copy + PartialEq> TimerQueue<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock time accumulated through `advance`
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Schedule `key` to fire once after `delay` seconds, replacing any existing entry
    pub fn schedule_once(&mut self, key: K, delay: f32) {
        self.cancel(key);
        let deadline = self.now + f64::from(delay.max(0.0));
        self.insert(key, deadline, None);
    }

    /// Schedule `key` to fire every `period` seconds, replacing any existing entry
    pub fn schedule_repeating(&mut self, key: K, period: f32) {
        self.cancel(key);
        let period = f64::from(period.max(f32::EPSILON));
        self.insert(key, self.now + period, Some(period));
    }

    /// Remove `key`; returns whether it was scheduled
    pub fn cancel(&mut self, key: K) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.key != key);
        before != self.entries.len()
    }

    pub fn is_scheduled(&self, key: K) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    /// Seconds until `key` fires
    pub fn remaining(&self, key: K) -> Option<f32> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| (e.deadline - self.now).max(0.0) as f32)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Move the clock forward and collect every key that came due, in firing order
    pub fn advance(&mut self, dt: f32) -> Vec<K> {
        self.now += f64::from(dt.max(0.0));
        let mut fired = Vec::new();

        while let Some(first) = self.entries.first() {
            if first.deadline > self.now {
                break;
            }
            let entry = self.entries.remove(0);
            fired.push(entry.key);
            if let Some(period) = entry.period {
                self.insert(entry.key, entry.deadline + period, Some(period));
            }
        }

        fired
    }

    fn insert(&mut self, key: K, deadline: f64, period: Option<f64>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        let pos = self
            .entries
            .iter()
            .position(|e| (e.deadline, e.seq) > (deadline, seq))
            .unwrap_or(self.entries.len());
        self.entries.insert(
            pos,
            Entry {
                key,
                deadline,
                period,
                seq,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_once_fires_once() {
        let mut c = Countdown::once(1.0);
        assert_eq!(c.tick(0.5), 0);
        assert_eq!(c.tick(0.5), 1);
        assert!(!c.is_armed());
        assert_eq!(c.tick(10.0), 0);
    }

    #[test]
    fn test_countdown_repeating_carries_overshoot() {
        let mut c = Countdown::repeating(1.0);
        assert_eq!(c.tick(2.5), 2);
        assert!((c.remaining() - 0.5).abs() < 1e-5);
        assert_eq!(c.tick(0.5), 1);
    }

    #[test]
    fn test_countdown_disarmed_never_fires() {
        let mut c = Countdown::disarmed();
        assert_eq!(c.tick(100.0), 0);
        c.arm(0.25);
        assert_eq!(c.tick(0.25), 1);
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Key {
        A,
        B,
    }

    #[test]
    fn test_queue_fires_in_deadline_order() {
        let mut q = TimerQueue::new();
        q.schedule_once(Key::A, 2.0);
        q.schedule_once(Key::B, 1.0);
        assert!(q.advance(0.5).is_empty());
        assert_eq!(q.advance(2.0), vec![Key::B, Key::A]);
        assert!(!q.is_scheduled(Key::A));
    }

    #[test]
    fn test_queue_repeating_and_cancel() {
        let mut q = TimerQueue::new();
        q.schedule_repeating(Key::A, 1.0);
        assert_eq!(q.advance(3.0), vec![Key::A, Key::A, Key::A]);
        assert!(q.is_scheduled(Key::A));
        assert!(q.cancel(Key::A));
        assert!(q.advance(5.0).is_empty());
    }

    #[test]
    fn test_queue_reschedule_replaces_entry() {
        let mut q = TimerQueue::new();
        q.schedule_once(Key::A, 1.0);
        q.schedule_once(Key::A, 5.0);
        assert!(q.advance(2.0).is_empty());
        assert!((q.remaining(Key::A).unwrap_or(0.0) - 3.0).abs() < 1e-4);
    }
}
