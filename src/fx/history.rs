use crate::foundation::core::Rect;
use crate::fx::fingerprint::StableHasher;
use crate::fx::record::Record;
use std::fmt;
use std::sync::Arc;

/// One executed record and the target bounds it was applied to.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    /// The executed record.
    pub record: Record,
    /// Target bounds before the record ran.
    pub source_bounds: Rect,
}

struct Node {
    entry: HistoryEntry,
    prev: Option<Arc<Node>>,
    len: usize,
}

impl Drop for Node {
    fn drop(&mut self) {
        // Unlink iteratively so long chains do not overflow the stack.
        let mut prev = self.prev.take();
        while let Some(node) = prev {
            match Arc::try_unwrap(node) {
                Ok(mut n) => prev = n.prev.take(),
                Err(_) => break,
            }
        }
    }
}

/// Append-only, structurally shared record history of one target.
///
/// Cloning is O(1); pushing never affects other clones.
#[derive(Clone, Default)]
pub struct History {
    head: Option<Arc<Node>>,
}

impl History {
    /// Empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// A history extended by `entry`.
    #[must_use]
    pub fn push(&self, entry: HistoryEntry) -> Self {
        let len = self.len() + 1;
        Self {
            head: Some(Arc::new(Node {
                entry,
                prev: self.head.clone(),
                len,
            })),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.head.as_ref().map_or(0, |n| n.len)
    }

    /// Return `true` when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Most recent entry.
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.head.as_ref().map(|n| &n.entry)
    }

    /// Entries, newest first.
    pub fn iter_rev(&self) -> impl Iterator<Item = &HistoryEntry> {
        std::iter::successors(self.head.as_deref(), |n| n.prev.as_deref()).map(|n| &n.entry)
    }

    /// Entries, oldest first.
    pub fn entries(&self) -> Vec<&HistoryEntry> {
        let mut v: Vec<&HistoryEntry> = self.iter_rev().collect();
        v.reverse();
        v
    }

    /// Return `true` when both histories share the same head node.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        match (&a.head, &b.head) {
            (Some(x), Some(y)) => Arc::ptr_eq(x, y),
            (None, None) => true,
            _ => false,
        }
    }

    pub(crate) fn write_fingerprint(&self, h: &mut StableHasher) {
        h.write_u64(self.len() as u64);
        for e in self.entries() {
            e.record.write_fingerprint(h);
            h.write_rect(e.source_bounds);
        }
    }
}

impl PartialEq for History {
    fn eq(&self, other: &Self) -> bool {
        if Self::ptr_eq(self, other) {
            return true;
        }
        self.len() == other.len() && self.iter_rev().eq(other.iter_rev())
    }
}

impl fmt::Debug for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries()).finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fx/history.rs"]
mod tests;
