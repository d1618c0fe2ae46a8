use crate::bucket::{SelectionBucket, SelectionEntry};

/// An immutable capture of a [`SelectionBucket`]'s contents, suitable for stashing on an undo
/// stack. Restoring replays every captured entry into a fresh bucket rather than aliasing the
/// original, so a snapshot outlives whatever bucket it was taken from.
#[derive(Debug, Clone, Default)]
pub struct SelectionSnapshot {
    entries: Vec<SelectionEntry>,
}

impl SelectionSnapshot {
    pub fn capture(bucket: &SelectionBucket) -> Self {
        Self { entries: bucket.all_entries() }
    }

    pub fn restore(&self) -> SelectionBucket {
        let mut bucket = SelectionBucket::new();
        for &entry in &self.entries {
            bucket.add(entry);
        }
        bucket
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SelectionEntry] {
        &self.entries
    }
}
