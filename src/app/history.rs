//! Linear history of committed transitions.

use std::sync::Arc;

use crate::descriptors::ServiceConfig;
use crate::screen::Screen;

/// A committed `(screen, configs)` pair that can be navigated back to.
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    screen: Arc<Screen>,
    configs: Vec<ServiceConfig>,
}

impl HistoryEntry {
    pub(crate) fn new(screen: Arc<Screen>, configs: Vec<ServiceConfig>) -> Self {
        Self { screen, configs }
    }

    pub fn screen(&self) -> &Arc<Screen> {
        &self.screen
    }

    /// Configs the generation held, explicit and carried forward.
    pub fn configs(&self) -> &[ServiceConfig] {
        &self.configs
    }
}

/// Where a committed transition lands in the history.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Navigation {
    /// Drop forward entries, append, move the cursor to the end.
    Push,
    /// Move the cursor to an existing entry.
    Restore(usize),
}

#[derive(Debug, Default)]
pub(crate) struct History {
    entries: Vec<HistoryEntry>,
    cursor: Option<usize>,
    limit: Option<usize>,
}

impl History {
    /// A limit of zero keeps the entry just committed.
    pub(crate) fn new(limit: Option<usize>) -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            limit: limit.map(|limit| limit.max(1)),
        }
    }

    pub(crate) fn record(&mut self, navigation: Navigation, entry: HistoryEntry) {
        match navigation {
            Navigation::Restore(index) if index < self.entries.len() => {
                self.entries[index] = entry;
                self.cursor = Some(index);
            }
            _ => self.push(entry),
        }
    }

    fn push(&mut self, entry: HistoryEntry) {
        let keep = self.cursor.map_or(0, |cursor| cursor + 1);
        self.entries.truncate(keep);
        self.entries.push(entry);

        if let Some(limit) = self.limit {
            let overflow = self.entries.len().saturating_sub(limit);
            self.entries.drain(..overflow);
        }
        self.cursor = self.entries.len().checked_sub(1);
    }

    pub(crate) fn entry(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub(crate) fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub(crate) fn cursor(&self) -> Option<usize> {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> HistoryEntry {
        HistoryEntry::new(Arc::new(Screen::new(name)), Vec::new())
    }

    fn names(history: &History) -> Vec<String> {
        history.entries().iter().map(|e| e.screen().name().to_string()).collect()
    }

    #[test]
    fn push_truncates_forward_entries() {
        let mut history = History::new(None);
        history.record(Navigation::Push, entry("a"));
        history.record(Navigation::Push, entry("b"));
        history.record(Navigation::Push, entry("c"));
        history.record(Navigation::Restore(0), entry("a"));
        assert_eq!(history.cursor(), Some(0));

        history.record(Navigation::Push, entry("d"));
        assert_eq!(names(&history), vec!["a", "d"]);
        assert_eq!(history.cursor(), Some(1));
    }

    #[test]
    fn limit_drops_oldest() {
        let mut history = History::new(Some(2));
        for name in ["a", "b", "c"] {
            history.record(Navigation::Push, entry(name));
        }
        assert_eq!(names(&history), vec!["b", "c"]);
        assert_eq!(history.cursor(), Some(1));
    }

    #[test]
    fn zero_limit_keeps_the_latest_entry() {
        let mut history = History::new(Some(0));
        history.record(Navigation::Push, entry("a"));
        history.record(Navigation::Push, entry("b"));
        assert_eq!(names(&history), vec!["b"]);
        assert_eq!(history.cursor(), Some(0));
    }

    #[test]
    fn restore_out_of_range_pushes() {
        let mut history = History::new(None);
        history.record(Navigation::Push, entry("a"));
        history.record(Navigation::Restore(7), entry("b"));
        assert_eq!(names(&history), vec!["a", "b"]);
        assert_eq!(history.cursor(), Some(1));
    }
}
