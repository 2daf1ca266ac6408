//! Linear undo/redo over whole-document snapshots.
//!
//! The engine keeps a bounded sequence of document copies and a cursor at
//! the one currently displayed. It learns about edits only through the
//! document store's change events, and it restores documents only through
//! the store's bulk replace. A restoration raises the suppression flag first
//! so the change event it causes is swallowed instead of being recorded as a
//! new edit, which would otherwise wipe out the redo branch.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::editor::document::DocumentStore;
use crate::editor::notifier::ChangeReceiver;
use crate::models::resume::Resume;

pub const DEFAULT_MAX_HISTORY: usize = 50;

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub document: Resume,
    pub captured_at: DateTime<Utc>,
}

/// What a single change notification did to the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Caused by a restoration; consumed the suppression flag.
    Suppressed,
    /// Deep-equal to the entry under the cursor.
    Unchanged,
    Recorded,
}

#[derive(Debug, Clone, Serialize)]
pub struct VersionEntryInfo {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub summary: String,
    pub is_current: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    /// One-based position of the cursor; 0 when the history is empty.
    pub current_version: usize,
    pub total_versions: usize,
    pub versions: Vec<VersionEntryInfo>,
}

#[derive(Debug)]
pub struct HistoryEngine {
    entries: VecDeque<HistoryEntry>,
    cursor: Option<usize>,
    suppressed: bool,
    max_history: usize,
    events: Option<ChangeReceiver>,
}

impl HistoryEngine {
    /// `max_history` is clamped to at least one entry.
    pub fn new(max_history: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: None,
            suppressed: false,
            max_history: max_history.max(1),
            events: None,
        }
    }

    /// Subscribes the engine to a document store's change events.
    pub fn attach(&mut self, store: &mut DocumentStore) {
        self.events = Some(store.subscribe());
    }

    /// Feeds every pending change event to [`HistoryEngine::observe`], in
    /// emission order.
    pub fn sync(&mut self) {
        let Some(mut events) = self.events.take() else {
            return;
        };
        while let Some(event) = events.next_pending() {
            let outcome = self.observe(&event.document);
            debug!(revision = event.revision, ?outcome, "History observed change");
        }
        self.events = Some(events);
    }

    /// Handles one change notification carrying the new document value.
    pub fn observe(&mut self, document: &Resume) -> Observation {
        if self.suppressed {
            self.suppressed = false;
            return Observation::Suppressed;
        }

        if let Some(cursor) = self.cursor {
            if self.entries[cursor].document == *document {
                return Observation::Unchanged;
            }
            self.entries.truncate(cursor + 1);
        }

        self.entries.push_back(HistoryEntry {
            document: document.clone(),
            captured_at: Utc::now(),
        });

        let mut evicted = 0;
        while self.entries.len() > self.max_history {
            self.entries.pop_front();
            evicted += 1;
        }
        if evicted > 0 {
            debug!(evicted, "History evicted oldest entries");
        }
        self.cursor = Some(self.entries.len() - 1);
        Observation::Recorded
    }

    pub fn undo(&mut self, store: &mut DocumentStore) -> bool {
        self.sync();
        match self.cursor {
            Some(cursor) if cursor > 0 => self.restore_to(cursor - 1, store),
            _ => false,
        }
    }

    pub fn redo(&mut self, store: &mut DocumentStore) -> bool {
        self.sync();
        match self.cursor {
            Some(cursor) if cursor + 1 < self.entries.len() => self.restore_to(cursor + 1, store),
            _ => false,
        }
    }

    /// Jumps straight to the entry at `index`.
    pub fn restore_version(&mut self, index: usize, store: &mut DocumentStore) -> bool {
        self.sync();
        if index >= self.entries.len() {
            return false;
        }
        self.restore_to(index, store)
    }

    /// Callers drain pending events first, so the next notification seen
    /// after the flag goes up is the restoration itself.
    fn restore_to(&mut self, index: usize, store: &mut DocumentStore) -> bool {
        self.suppressed = true;
        self.cursor = Some(index);
        store.replace(self.entries[index].document.clone());
        debug!(cursor = index, len = self.entries.len(), "History restored entry");
        true
    }

    /// Restarts history from `current` alone.
    pub fn clear(&mut self, current: &Resume) {
        self.entries.clear();
        self.entries.push_back(HistoryEntry {
            document: current.clone(),
            captured_at: Utc::now(),
        });
        self.cursor = Some(0);
        self.suppressed = false;
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|cursor| cursor > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor
            .is_some_and(|cursor| cursor + 1 < self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    pub fn entry(&self, index: usize) -> Option<&Resume> {
        self.entries.get(index).map(|entry| &entry.document)
    }

    pub fn version_info(&self) -> VersionInfo {
        VersionInfo {
            current_version: self.cursor.map_or(0, |cursor| cursor + 1),
            total_versions: self.entries.len(),
            versions: self
                .entries
                .iter()
                .enumerate()
                .map(|(index, entry)| VersionEntryInfo {
                    index,
                    timestamp: entry.captured_at,
                    summary: format!("Version {}", index + 1),
                    is_current: Some(index) == self.cursor,
                })
                .collect(),
        }
    }
}

impl Default for HistoryEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn doc(skills: &[&str]) -> Resume {
        Resume {
            skills: skills.iter().map(|s| s.to_string()).collect(),
            ..Resume::default()
        }
    }

    fn numbered(n: usize) -> Resume {
        doc(&[&format!("skill-{n}")])
    }

    fn attached(initial: Resume, max_history: usize) -> (DocumentStore, HistoryEngine) {
        let mut store = DocumentStore::new(initial);
        let mut history = HistoryEngine::new(max_history);
        history.attach(&mut store);
        (store, history)
    }

    #[test]
    fn test_empty_history() {
        let history = HistoryEngine::default();
        assert_eq!(history.len(), 0);
        assert_eq!(history.cursor(), None);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(history.version_info().current_version, 0);
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let (mut store, mut history) = attached(doc(&[]), 10);
        store.announce();
        history.sync();
        store.add_skill("Rust");
        history.sync();
        let d1 = store.snapshot();

        assert!(history.undo(&mut store));
        history.sync();
        assert_eq!(store.current(), &doc(&[]));

        assert!(history.redo(&mut store));
        history.sync();
        assert_eq!(store.current(), &d1);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_new_edit_after_undo_truncates_future() {
        let mut history = HistoryEngine::new(10);
        let mut store = DocumentStore::new(doc(&[]));
        history.observe(&doc(&["a"]));
        history.observe(&doc(&["a", "b"]));
        history.observe(&doc(&["a", "b", "c"]));
        assert_eq!(history.cursor(), Some(2));

        history.undo(&mut store);
        history.observe(store.current());
        history.undo(&mut store);
        history.observe(store.current());
        assert_eq!(history.cursor(), Some(0));

        history.observe(&doc(&["z"]));
        assert_eq!(history.len(), 2);
        assert_eq!(history.entry(0), Some(&doc(&["a"])));
        assert_eq!(history.entry(1), Some(&doc(&["z"])));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_does_not_record_restoration() {
        let (mut store, mut history) = attached(doc(&[]), 10);
        store.announce();
        store.add_skill("Python");
        store.add_skill("Go");
        history.sync();
        assert_eq!(history.len(), 3);

        history.undo(&mut store);
        assert!(history.is_suppressed());
        history.sync();

        assert!(!history.is_suppressed());
        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), Some(1));
        assert!(history.can_redo());
    }

    #[test]
    fn test_undo_records_pending_edit_first() {
        let (mut store, mut history) = attached(doc(&[]), 10);
        store.announce();
        store.add_skill("a");
        history.sync();
        store.add_skill("b");

        assert!(history.undo(&mut store));
        history.sync();
        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), Some(1));
        assert_eq!(store.current(), &doc(&["a"]));

        assert!(history.redo(&mut store));
        history.sync();
        assert_eq!(store.current(), &doc(&["a", "b"]));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_restore_version_sees_pending_edit() {
        let (mut store, mut history) = attached(doc(&[]), 10);
        store.announce();
        history.sync();
        store.add_skill("a");

        // Entry 1 only exists once the pending edit is drained.
        assert!(history.restore_version(1, &mut store));
        history.sync();
        assert_eq!(history.len(), 2);
        assert_eq!(store.current(), &doc(&["a"]));
        assert!(!history.is_suppressed());
    }

    #[test]
    fn test_exactly_one_notification_is_swallowed() {
        let mut history = HistoryEngine::new(10);
        let mut store = DocumentStore::new(doc(&[]));
        history.observe(&doc(&["a"]));
        history.observe(&doc(&["a", "b"]));

        history.undo(&mut store);
        assert_eq!(history.observe(store.current()), Observation::Suppressed);
        assert_eq!(history.observe(&doc(&["x"])), Observation::Recorded);
        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_bounded_growth_evicts_oldest() {
        let max = DEFAULT_MAX_HISTORY;
        let mut history = HistoryEngine::new(max);
        for n in 1..=max + 10 {
            history.observe(&numbered(n));
        }

        assert_eq!(history.len(), max);
        assert_eq!(history.entry(0), Some(&numbered(11)));
        assert_eq!(history.cursor(), Some(max - 1));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_eviction_keeps_cursor_on_same_entry() {
        let mut history = HistoryEngine::new(3);
        let mut store = DocumentStore::new(doc(&[]));
        for n in 1..=3 {
            history.observe(&numbered(n));
        }
        history.undo(&mut store);
        history.observe(store.current());
        history.observe(&numbered(4));
        history.observe(&numbered(5));

        assert_eq!(history.len(), 3);
        assert_eq!(history.entry(0), Some(&numbered(2)));
        assert_eq!(history.cursor(), Some(2));
        assert_eq!(history.entry(2), Some(&numbered(5)));
    }

    #[test]
    fn test_duplicate_notification_is_ignored() {
        let mut history = HistoryEngine::new(10);
        history.observe(&doc(&["a"]));
        assert_eq!(history.observe(&doc(&["a"])), Observation::Unchanged);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_boundary_navigation_is_noop() {
        let mut history = HistoryEngine::new(10);
        let mut store = DocumentStore::new(doc(&[]));
        assert!(!history.undo(&mut store));
        assert!(!history.redo(&mut store));

        history.observe(&doc(&["a"]));
        assert!(!history.undo(&mut store));
        assert!(!history.redo(&mut store));
        assert!(!history.is_suppressed());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_restore_version_jumps_and_ignores_out_of_range() {
        let mut history = HistoryEngine::new(10);
        let mut store = DocumentStore::new(doc(&[]));
        for n in 1..=4 {
            history.observe(&numbered(n));
        }

        assert!(!history.restore_version(4, &mut store));
        assert!(history.restore_version(1, &mut store));
        history.observe(store.current());

        assert_eq!(store.current(), &numbered(2));
        assert_eq!(history.cursor(), Some(1));
        assert_eq!(history.len(), 4);
        assert!(history.can_undo());
        assert!(history.can_redo());
    }

    #[test]
    fn test_clear_keeps_only_current() {
        let mut history = HistoryEngine::new(10);
        history.observe(&doc(&["a"]));
        history.observe(&doc(&["b"]));
        history.clear(&doc(&["b"]));

        assert_eq!(history.len(), 1);
        assert_eq!(history.cursor(), Some(0));
        assert!(!history.can_undo());
    }

    #[test]
    fn test_version_info_marks_current() {
        let mut history = HistoryEngine::new(10);
        let mut store = DocumentStore::new(doc(&[]));
        history.observe(&doc(&["a"]));
        history.observe(&doc(&["b"]));
        history.undo(&mut store);

        let info = history.version_info();
        assert_eq!(info.current_version, 1);
        assert_eq!(info.total_versions, 2);
        assert!(info.versions[0].is_current);
        assert!(!info.versions[1].is_current);
        assert_eq!(info.versions[1].summary, "Version 2");
    }

    proptest! {
        #[test]
        fn prop_distinct_edits_fill_history(n in 1usize..120, max in 1usize..60) {
            let mut history = HistoryEngine::new(max);
            for i in 0..n {
                history.observe(&numbered(i));
            }

            prop_assert_eq!(history.len(), n.min(max));
            prop_assert_eq!(history.can_undo(), n.min(max) > 1);
            prop_assert!(!history.can_redo());
            prop_assert_eq!(history.entry(history.len() - 1), Some(&numbered(n - 1)));
        }

        #[test]
        fn prop_undo_never_grows_history(edits in 2usize..30, undos in 1usize..40) {
            let (mut store, mut history) = attached(doc(&[]), DEFAULT_MAX_HISTORY);
            for i in 0..edits {
                store.replace(numbered(i));
                history.sync();
            }
            let len = history.len();

            for _ in 0..undos {
                history.undo(&mut store);
                history.sync();
            }

            prop_assert_eq!(history.len(), len);
            prop_assert_eq!(history.cursor(), Some(edits.saturating_sub(1).saturating_sub(undos)));
            prop_assert!(history.can_redo());
            prop_assert_eq!(store.current(), history.entry(history.cursor().unwrap()).unwrap());
        }
    }
}
