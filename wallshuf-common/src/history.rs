use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Default number of recent wallpapers excluded from selection.
pub const DEFAULT_HISTORY_SIZE: usize = 3;

/// Largest accepted history size.
pub const MAX_HISTORY_SIZE: usize = 4096;

/// Bounded, most-recent-first record of applied wallpapers.
///
/// Only kept in memory: a restarted daemon starts with an empty history.
#[derive(Debug, Clone)]
pub struct HistoryTracker {
    entries: VecDeque<PathBuf>,
    capacity: usize,
}

impl HistoryTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Push `path` to the front, evicting from the tail once over capacity.
    pub fn record(&mut self, path: PathBuf) {
        self.entries.push_front(path);
        self.entries.truncate(self.capacity);
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.iter().any(|entry| entry == path)
    }

    pub fn most_recent(&self) -> Option<&PathBuf> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn to_vec(&self) -> Vec<PathBuf> {
        self.entries.iter().cloned().collect()
    }
}

impl Default for HistoryTracker {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_record_is_most_recent_first() {
        let mut history = HistoryTracker::new(3);
        history.record(PathBuf::from("/wp/a.png"));
        history.record(PathBuf::from("/wp/b.png"));

        assert_eq!(history.to_vec(), paths(&["/wp/b.png", "/wp/a.png"]));
        assert_eq!(history.most_recent(), Some(&PathBuf::from("/wp/b.png")));
    }

    #[test]
    fn test_evicts_oldest_beyond_capacity() {
        let mut history = HistoryTracker::new(3);
        for name in ["/wp/1.png", "/wp/2.png", "/wp/3.png", "/wp/4.png", "/wp/5.png"] {
            history.record(PathBuf::from(name));
        }

        assert_eq!(history.len(), 3);
        assert_eq!(history.capacity(), 3);
        assert_eq!(history.to_vec(), paths(&["/wp/5.png", "/wp/4.png", "/wp/3.png"]));
        assert!(!history.contains(Path::new("/wp/1.png")));
        assert!(!history.contains(Path::new("/wp/2.png")));
    }

    #[test]
    fn test_contains() {
        let mut history = HistoryTracker::default();
        assert!(history.is_empty());
        assert!(!history.contains(Path::new("/wp/a.png")));

        history.record(PathBuf::from("/wp/a.png"));
        assert!(history.contains(Path::new("/wp/a.png")));
        assert!(!history.contains(Path::new("/wp/b.png")));
    }

    #[test]
    fn test_large_capacity_allocates_lazily() {
        let mut history = HistoryTracker::new(usize::MAX);
        history.record(PathBuf::from("/wp/a.png"));

        assert_eq!(history.len(), 1);
        assert_eq!(history.capacity(), usize::MAX);
    }

    #[test]
    fn test_repeated_entries_count_toward_capacity() {
        let mut history = HistoryTracker::new(2);
        history.record(PathBuf::from("/wp/a.png"));
        history.record(PathBuf::from("/wp/a.png"));
        history.record(PathBuf::from("/wp/b.png"));

        assert_eq!(history.to_vec(), paths(&["/wp/b.png", "/wp/a.png"]));
    }
}
