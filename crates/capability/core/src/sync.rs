//! Cross-entity tracking of objects whose attachments need re-broadcast.

use std::collections::{BTreeSet, HashSet};

use parking_lot::Mutex;
use tracing::trace;

use crate::identity::ObjectId;

/// Set of object identities whose attachment lists changed since the last
/// broadcast.
///
/// Written from the simulation step and from network receive; drained once
/// per broadcast interval. Both operations run entirely under the lock, so a
/// consumer always sees a consistent snapshot and no mark is lost between
/// two [`consume`](Self::consume) calls.
#[derive(Debug, Default)]
pub struct DirtySet {
    dirty: Mutex<HashSet<ObjectId>>,
}

impl DirtySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&self, id: ObjectId) {
        let inserted = self.dirty.lock().insert(id);
        if inserted {
            trace!(target: "capability::sync", %id, "marked dirty");
        }
    }

    /// Returns every dirty identity (sorted) and empties the set.
    pub fn consume(&self) -> BTreeSet<ObjectId> {
        let mut dirty = self.dirty.lock();
        dirty.drain().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.dirty.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.dirty.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_returns_snapshot_and_clears() {
        let set = DirtySet::new();
        set.mark(ObjectId(3));
        set.mark(ObjectId(1));
        set.mark(ObjectId(3));

        let snapshot = set.consume();
        assert_eq!(snapshot.into_iter().collect::<Vec<_>>(), vec![ObjectId(1), ObjectId(3)]);
        assert!(set.is_empty());
        assert!(set.consume().is_empty());
    }

    #[test]
    fn marks_after_consume_survive_to_next_consume() {
        let set = DirtySet::new();
        set.mark(ObjectId(1));
        let _ = set.consume();
        set.mark(ObjectId(2));
        assert_eq!(set.len(), 1);
        assert!(set.consume().contains(&ObjectId(2)));
    }
}
