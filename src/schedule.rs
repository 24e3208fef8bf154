use std::collections::BTreeMap;
use std::time::Duration;

/// Handle returned when a timer is armed; used to cancel it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle {
    due: Duration,
    id: u64,
}

impl TimerHandle {
    pub fn due(self) -> Duration {
        self.due
    }
}

/// Cooperative timeline of one-shot timers.
///
/// Timers fire in order of their due time; timers sharing a due time fire in
/// the order they were armed. Nothing runs on its own: the owner pulls due
/// timers with [`Scheduler::pop_due`] from its frame or tick callback.
#[derive(Debug)]
pub struct Scheduler<E> {
    timers: BTreeMap<(Duration, u64), E>,
    next_id: u64,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self {
            timers: BTreeMap::new(),
            next_id: 0,
        }
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a timer firing at the absolute time `due`.
    pub fn schedule_at(&mut self, due: Duration, event: E) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.timers.insert((due, id), event);
        TimerHandle { due, id }
    }

    /// Arms a timer firing `delay` after `now`.
    pub fn schedule_after(&mut self, now: Duration, delay: Duration, event: E) -> TimerHandle {
        self.schedule_at(now + delay, event)
    }

    /// Cancels a pending timer. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.timers.remove(&(handle.due, handle.id)).is_some()
    }

    /// Drops every pending timer and returns how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.timers.len();
        self.timers.clear();
        count
    }

    /// Removes and returns the earliest timer whose due time is at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<(Duration, E)> {
        let (&(due, _), _) = self.timers.first_key_value()?;
        if due > now {
            return None;
        }
        self.timers.pop_first().map(|((due, _), event)| (due, event))
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.timers.keys().next().map(|(due, _)| *due)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

/// Converts a millisecond count into a [`Duration`].
pub fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(scheduler: &mut Scheduler<&'static str>, now: Duration) -> Vec<&'static str> {
        std::iter::from_fn(|| scheduler.pop_due(now).map(|(_, event)| event)).collect()
    }

    #[test]
    fn fires_in_due_order_then_insertion_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(millis(300), "late");
        scheduler.schedule_at(millis(100), "first");
        scheduler.schedule_at(millis(100), "second");
        assert_eq!(drain(&mut scheduler, millis(99)), Vec::<&str>::new());
        assert_eq!(drain(&mut scheduler, millis(100)), vec!["first", "second"]);
        assert_eq!(scheduler.next_due(), Some(millis(300)));
        assert_eq!(drain(&mut scheduler, millis(1_000)), vec!["late"]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut scheduler = Scheduler::new();
        let handle = scheduler.schedule_after(millis(50), millis(50), "cancelled");
        scheduler.schedule_after(millis(50), millis(60), "kept");
        assert_eq!(handle.due(), millis(100));
        assert!(scheduler.cancel(handle));
        assert!(!scheduler.cancel(handle));
        assert_eq!(drain(&mut scheduler, millis(200)), vec!["kept"]);
    }

    #[test]
    fn cancel_all_reports_dropped_timers() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_at(millis(1), "a");
        scheduler.schedule_at(millis(2), "b");
        assert_eq!(scheduler.cancel_all(), 2);
        assert_eq!(scheduler.pop_due(millis(10)), None);
    }
}
