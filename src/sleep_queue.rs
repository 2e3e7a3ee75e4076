use std::collections::BTreeSet;

use crate::co::CoroId;

/// Timed wake-ups ordered by wake time.
///
/// Several coroutines may share a wake time; each entry is keyed by the
/// `(wake_time, id)` pair so removal only ever touches the exact entry.
#[derive(Debug, Default)]
pub struct SleepQueue {
    entries: BTreeSet<(i64, CoroId)>
}

impl SleepQueue {
    pub fn new() -> SleepQueue {
        SleepQueue {
            entries: BTreeSet::new()
        }
    }

    pub fn insert(&mut self, wake_time: i64, id: CoroId) {
        self.entries.insert((wake_time, id));
    }

    /// Removes the entry for `id` at `wake_time`, if any.
    pub fn remove(&mut self, wake_time: i64, id: CoroId) -> bool {
        self.entries.remove(&(wake_time, id))
    }

    pub fn peek(&self) -> Option<(i64, CoroId)> {
        self.entries.iter().next().cloned()
    }

    /// Takes the earliest entry if it is due at `now`.
    pub fn pop_due(&mut self, now: i64) -> Option<(i64, CoroId)> {
        match self.peek() {
            Some(entry) if entry.0 <= now => {
                self.entries.remove(&entry);
                Some(entry)
            },
            _ => None
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
