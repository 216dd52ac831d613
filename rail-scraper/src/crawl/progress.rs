//! The in-memory processed-set.

use std::collections::BTreeSet;

use crate::domain::StationId;

/// Lifecycle of one station within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    Pending,
    InProgress,
    Done,
}

/// Which stations this run has finished.
///
/// Never persisted. A restarted run starts with every station pending and
/// relies on the cache to make already-collected stations cheap.
#[derive(Debug, Clone, Default)]
pub struct Progress {
    done: BTreeSet<StationId>,
    current: Option<StationId>,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, station: StationId) -> EntityState {
        if self.done.contains(&station) {
            EntityState::Done
        } else if self.current == Some(station) {
            EntityState::InProgress
        } else {
            EntityState::Pending
        }
    }

    pub fn is_done(&self, station: StationId) -> bool {
        self.done.contains(&station)
    }

    /// Move `station` to in-progress. Returns `false` if it is already done.
    pub fn start(&mut self, station: StationId) -> bool {
        if self.is_done(station) {
            return false;
        }
        self.current = Some(station);
        true
    }

    /// Mark `station` done. Returns the number of stations done so far.
    pub fn finish(&mut self, station: StationId) -> usize {
        if self.current == Some(station) {
            self.current = None;
        }
        self.done.insert(station);
        self.done.len()
    }

    pub fn done_count(&self) -> usize {
        self.done.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle() {
        let mut progress = Progress::new();
        let id = StationId::new(1);
        assert_eq!(progress.state(id), EntityState::Pending);

        assert!(progress.start(id));
        assert_eq!(progress.state(id), EntityState::InProgress);

        assert_eq!(progress.finish(id), 1);
        assert_eq!(progress.state(id), EntityState::Done);
        assert!(!progress.start(id));
        assert_eq!(progress.state(id), EntityState::Done);
    }

    #[test]
    fn finishing_twice_counts_once() {
        let mut progress = Progress::new();
        progress.finish(StationId::new(1));
        progress.finish(StationId::new(1));
        progress.finish(StationId::new(2));
        assert_eq!(progress.done_count(), 2);
        assert!(progress.is_done(StationId::new(2)));
    }
}
