use std::collections::BTreeMap;
use std::fmt;

use crate::entry::Entry;
use crate::index::EntryIndex;

use super::{DeltaTrackingTree, EntryMapping, EntryTree};

/// Why a mapping was dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// The mapped entry does not exist in the binary.
    Broken,
    /// The mapping changes nothing and has no mapped children.
    Empty,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::Broken => f.write_str("broken"),
            DropReason::Empty => f.write_str("empty"),
        }
    }
}

/// The mappings a check found to be droppable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dropped {
    entries: BTreeMap<Entry, DropReason>,
}

impl Dropped {
    /// The dropped entries and why.
    pub fn entries(&self) -> &BTreeMap<Entry, DropReason> {
        &self.entries
    }

    /// Number of dropped entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was dropped.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes the dropped entries from a tree, recording each removal.
    pub fn apply(&self, tree: &mut DeltaTrackingTree) {
        for (entry, reason) in &self.entries {
            log::warn!("dropping {} mapping for {}", reason, entry);
            tree.remove(entry);
        }
    }
}

/// Finds mappings that no longer fit the binary.
#[derive(Clone, Copy, Debug)]
pub struct MappingsChecker<'a> {
    entries: &'a EntryIndex,
}

impl<'a> MappingsChecker<'a> {
    /// Creates a checker against the declarations of a binary.
    pub fn new(entries: &'a EntryIndex) -> Self {
        Self { entries }
    }

    /// Collects the broken and the empty mappings of a tree.
    ///
    /// An entry whose mapped children are all dropped counts as childless,
    /// so applying the result leaves nothing for a second check to find.
    pub fn check(&self, tree: &EntryTree<EntryMapping>) -> Dropped {
        let mut dropped = Dropped::default();
        let nodes: Vec<(&Entry, &EntryMapping)> = tree.iter().collect();

        // children come after their parents
        for (entry, mapping) in nodes.into_iter().rev() {
            if !self.entries.has_entry(entry) {
                dropped.entries.insert(entry.clone(), DropReason::Broken);
            } else if mapping.is_empty_for(entry)
                && tree
                    .children(entry)
                    .iter()
                    .all(|child| dropped.entries.contains_key(child))
            {
                dropped.entries.insert(entry.clone(), DropReason::Empty);
            }
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessFlags;
    use crate::classfile::{ClassBuilder, MethodDef};
    use crate::entry::{ClassEntry, LocalVariableEntry, MethodEntry};

    #[test]
    fn test_check_and_apply() {
        let index = EntryIndex::build(&[ClassBuilder::new("a")
            .method(MethodDef::new("m", "(I)V", AccessFlags::PUBLIC))
            .build()]);

        let class = Entry::Class(ClassEntry::new("a"));
        let method = MethodEntry::parse("a", "m", "(I)V");
        let arg = Entry::LocalVariable(LocalVariableEntry::new(method.clone(), 1, "", true));
        let gone = Entry::Method(MethodEntry::parse("a", "gone", "()V"));

        let mut tree = DeltaTrackingTree::new(EntryTree::new());
        tree.insert(class.clone(), EntryMapping::DEFAULT);
        tree.insert(Entry::Method(method.clone()), EntryMapping::new("m"));
        tree.insert(arg.clone(), EntryMapping::DEFAULT);
        tree.insert(gone.clone(), EntryMapping::new("kept"));
        tree.take_changes();

        let checker = MappingsChecker::new(&index);
        let dropped = checker.check(tree.tree());
        assert_eq!(dropped.entries().get(&gone), Some(&DropReason::Broken));
        assert_eq!(dropped.entries().get(&arg), Some(&DropReason::Empty));
        assert_eq!(dropped.entries().get(&class), Some(&DropReason::Empty));
        assert_eq!(dropped.len(), 4);

        dropped.apply(&mut tree);
        assert!(tree.tree().is_empty());
        assert_eq!(tree.take_changes().changes().len(), 4);
        assert!(checker.check(tree.tree()).is_empty());
    }
}
