//! Bounded linear undo/redo history.
//!
//! Entries are full snapshots of the editing state: the artifact, a copy of
//! the settings and a shared reference to the source raster. The buffer keeps
//! at most `capacity` entries and evicts the oldest first.
//!
//! Restoring an entry (undo/redo) sets a `restoring` flag that suppresses
//! commits until the caller acknowledges the restore with
//! [`HistoryBuffer::finish_restore`]. This keeps the re-render triggered by
//! a restore from being recorded as a new edit.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::render::{OutputArtifact, SourceRaster};
use crate::settings::Settings;

/// Default number of retained entries.
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// One recorded editing state.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub artifact: Option<OutputArtifact>,
    pub settings: Settings,
    pub source: Option<Arc<SourceRaster>>,
}

impl HistoryEntry {
    pub fn new(
        artifact: Option<OutputArtifact>,
        settings: Settings,
        source: Option<Arc<SourceRaster>>,
    ) -> Self {
        Self {
            artifact,
            settings,
            source,
        }
    }

    /// Same artifact content, same settings and the very same source.
    pub fn same_snapshot(&self, other: &HistoryEntry) -> bool {
        let same_source = match (&self.source, &other.source) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_source && self.settings == other.settings && self.artifact == other.artifact
    }
}

/// Linear history with a cursor.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    entries: VecDeque<HistoryEntry>,
    cursor: Option<usize>,
    capacity: usize,
    restoring: bool,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryBuffer {
    /// Create an empty buffer. A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            cursor: None,
            capacity,
            restoring: false,
        }
    }

    /// Record `entry` as the newest state.
    ///
    /// Returns `false` when nothing was recorded: while restoring, or when
    /// the entry is identical to the one it would follow.
    pub fn commit(&mut self, entry: HistoryEntry) -> bool {
        if self.restoring {
            log::debug!("history: commit suppressed while restoring");
            return false;
        }

        // Drop the redo tail
        if let Some(cursor) = self.cursor {
            self.entries.truncate(cursor + 1);
        }

        if self
            .entries
            .back()
            .is_some_and(|last| last.same_snapshot(&entry))
        {
            return false;
        }

        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.cursor = Some(self.entries.len() - 1);

        log::debug!(
            "history: committed entry {} of {}",
            self.entries.len(),
            self.capacity
        );
        true
    }

    /// Step back one entry. No-op at the oldest entry.
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        let cursor = self.cursor.filter(|&c| c > 0)? - 1;
        self.cursor = Some(cursor);
        self.restoring = true;
        self.entries.get(cursor)
    }

    /// Step forward one entry. No-op at the newest entry.
    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        let cursor = self.cursor.filter(|&c| c + 1 < self.entries.len())? + 1;
        self.cursor = Some(cursor);
        self.restoring = true;
        self.entries.get(cursor)
    }

    /// Forget everything.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.cursor = None;
        self.restoring = false;
    }

    /// Acknowledge that a restored entry has been applied.
    pub fn finish_restore(&mut self) {
        self.restoring = false;
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.is_some_and(|c| c + 1 < self.entries.len())
    }

    /// Entry under the cursor.
    pub fn current(&self) -> Option<&HistoryEntry> {
        self.cursor.and_then(|c| self.entries.get(c))
    }

    /// Entry at `index`, oldest first.
    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(rotation: i32) -> Settings {
        Settings {
            rotation,
            ..Settings::default()
        }
    }

    fn entry(rotation: i32) -> HistoryEntry {
        HistoryEntry::new(None, settings(rotation), None)
    }

    fn filled(count: i32) -> HistoryBuffer {
        let mut history = HistoryBuffer::default();
        for i in 0..count {
            assert!(history.commit(entry(i)));
        }
        history
    }

    #[test]
    fn test_empty_buffer() {
        let mut history = HistoryBuffer::default();
        assert!(history.is_empty());
        assert_eq!(history.cursor(), None);
        assert!(history.current().is_none());
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        assert!(!history.is_restoring());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let history = filled(25);
        assert_eq!(history.len(), 20);
        assert_eq!(history.cursor(), Some(19));
        // Entry 0 is the 6th commit
        assert_eq!(history.get(0).unwrap().settings.rotation, 5);
        assert_eq!(history.current().unwrap().settings.rotation, 24);
    }

    #[test]
    fn test_undo_and_redo() {
        let mut history = filled(3);

        assert_eq!(history.undo().unwrap().settings.rotation, 1);
        assert!(history.is_restoring());
        assert_eq!(history.cursor(), Some(1));

        assert_eq!(history.redo().unwrap().settings.rotation, 2);
        assert_eq!(history.cursor(), Some(2));
    }

    #[test]
    fn test_undo_at_oldest_is_noop() {
        let mut history = filled(1);
        assert!(!history.can_undo());
        assert!(history.undo().is_none());
        assert_eq!(history.cursor(), Some(0));
        assert!(!history.is_restoring());
    }

    #[test]
    fn test_redo_at_newest_is_noop() {
        let mut history = filled(2);
        assert!(!history.can_redo());
        assert!(history.redo().is_none());
        assert_eq!(history.cursor(), Some(1));
        assert!(!history.is_restoring());
    }

    #[test]
    fn test_commit_suppressed_while_restoring() {
        let mut history = filled(3);
        history.undo();
        assert!(!history.commit(entry(99)));
        assert_eq!(history.len(), 3);

        history.finish_restore();
        assert!(history.commit(entry(99)));
    }

    #[test]
    fn test_commit_truncates_redo_tail() {
        let mut history = filled(4);
        history.undo();
        history.undo();
        history.finish_restore();

        assert!(history.commit(entry(42)));
        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), Some(2));
        assert!(!history.can_redo());
        assert_eq!(history.current().unwrap().settings.rotation, 42);
    }

    #[test]
    fn test_duplicate_commit_is_suppressed() {
        let mut history = HistoryBuffer::default();
        assert!(history.commit(entry(0)));
        assert!(!history.commit(entry(0)));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_duplicate_detection_uses_source_identity() {
        let source = Arc::new(SourceRaster {
            name: "a.png".into(),
            byte_size: 10,
            image: crate::decode::DecodedImage::transparent(1, 1),
        });
        let twin = Arc::new((*source).clone());

        let mut history = HistoryBuffer::default();
        assert!(history.commit(HistoryEntry::new(None, settings(0), Some(source.clone()))));
        assert!(!history.commit(HistoryEntry::new(None, settings(0), Some(source))));
        // Equal content but a different load is a new entry
        assert!(history.commit(HistoryEntry::new(None, settings(0), Some(twin))));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_reset() {
        let mut history = filled(5);
        history.undo();
        history.reset();
        assert!(history.is_empty());
        assert_eq!(history.cursor(), None);
        assert!(!history.is_restoring());
    }

    #[test]
    fn test_zero_capacity_keeps_one_entry() {
        let mut history = HistoryBuffer::new(0);
        history.commit(entry(1));
        history.commit(entry(2));
        assert_eq!(history.len(), 1);
        assert_eq!(history.current().unwrap().settings.rotation, 2);
    }
}
