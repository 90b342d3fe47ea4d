use std::collections::BTreeSet;

use crate::entry::Entry;

use super::{EntryMapping, EntryTree};

/// The changes made to a mapping tree during one snapshot window.
#[derive(Clone, Debug, Default)]
pub struct MappingDelta {
    base: EntryTree<EntryMapping>,
    changes: BTreeSet<Entry>,
}

impl MappingDelta {
    /// The mappings at the start of the window.
    pub fn base_mappings(&self) -> &EntryTree<EntryMapping> {
        &self.base
    }

    /// Entries inserted, changed or removed during the window.
    pub fn changes(&self) -> &BTreeSet<Entry> {
        &self.changes
    }

    /// Whether the window saw no changes.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// The top-level classes touched by some change, for writers that emit
    /// one file per class.
    pub fn changed_top_level_classes(&self) -> BTreeSet<Entry> {
        self.changes
            .iter()
            .map(|entry| Entry::Class(entry.top_level_class().clone()))
            .collect()
    }
}

/// A mapping tree that records every change since the last snapshot.
#[derive(Clone, Debug, Default)]
pub struct DeltaTrackingTree {
    tree: EntryTree<EntryMapping>,
    base: EntryTree<EntryMapping>,
    changes: BTreeSet<Entry>,
}

impl DeltaTrackingTree {
    /// Wraps a tree. Its current contents form the first snapshot.
    pub fn new(tree: EntryTree<EntryMapping>) -> Self {
        Self {
            base: tree.clone(),
            tree,
            changes: BTreeSet::new(),
        }
    }

    /// The current mappings.
    pub fn tree(&self) -> &EntryTree<EntryMapping> {
        &self.tree
    }

    /// Stores a mapping and records the change.
    pub fn insert(&mut self, entry: Entry, mapping: EntryMapping) -> Option<EntryMapping> {
        self.track_change(entry.clone());
        self.tree.insert(entry, mapping)
    }

    /// Removes a mapping and records the change.
    pub fn remove(&mut self, entry: &Entry) -> Option<EntryMapping> {
        let removed = self.tree.remove(entry);
        if removed.is_some() {
            self.track_change(entry.clone());
        }
        removed
    }

    /// The mapping stored for an entry.
    pub fn get(&self, entry: &Entry) -> Option<&EntryMapping> {
        self.tree.get(entry)
    }

    /// Records that an entry changed without touching the tree.
    pub fn track_change(&mut self, entry: Entry) {
        self.changes.insert(entry);
    }

    /// Whether anything changed since the last snapshot.
    pub fn is_dirty(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Hands out the changes of the current window and starts a new one.
    pub fn take_changes(&mut self) -> MappingDelta {
        let base = std::mem::replace(&mut self.base, self.tree.clone());
        MappingDelta {
            base,
            changes: std::mem::take(&mut self.changes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{ClassEntry, FieldEntry};

    #[test]
    fn test_take_changes() {
        let a = Entry::Class(ClassEntry::new("a"));
        let f = Entry::Field(FieldEntry::parse("a$b", "f", "I"));

        let mut tree = DeltaTrackingTree::new(EntryTree::new());
        tree.insert(a.clone(), EntryMapping::new("Apple"));
        tree.insert(f.clone(), EntryMapping::new("field"));
        assert!(tree.is_dirty());

        let delta = tree.take_changes();
        assert_eq!(delta.changes().len(), 2);
        assert!(delta.base_mappings().is_empty());
        assert_eq!(delta.changed_top_level_classes(), BTreeSet::from([a.clone()]));
        assert!(!tree.is_dirty());
        assert_eq!(tree.tree().len(), 2);

        assert!(tree.remove(&Entry::Class(ClassEntry::new("zzz"))).is_none());
        assert!(!tree.is_dirty());
        tree.remove(&a);
        let delta = tree.take_changes();
        assert_eq!(delta.changes(), &BTreeSet::from([a]));
        assert_eq!(delta.base_mappings().len(), 2);
    }
}
