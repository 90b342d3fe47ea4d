use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;

use crate::entry::Entry;

/// A tree of values keyed by entry ancestry.
///
/// Each entry is stored under its full ancestry path, so a class always
/// precedes its members, and a method its local variables, when iterating.
/// Nodes are independent: a member can be stored without its class.
#[derive(Clone, PartialEq, Eq)]
pub struct EntryTree<T> {
    nodes: BTreeMap<Vec<Entry>, T>,
}

impl<T> Default for EntryTree<T> {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for EntryTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<T> EntryTree<T> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value, returning the one it replaces.
    pub fn insert(&mut self, entry: Entry, value: T) -> Option<T> {
        self.nodes.insert(entry.ancestry(), value)
    }

    /// The value stored for an entry.
    pub fn get(&self, entry: &Entry) -> Option<&T> {
        self.nodes.get(&entry.ancestry())
    }

    /// Mutable access to the value stored for an entry.
    pub fn get_mut(&mut self, entry: &Entry) -> Option<&mut T> {
        self.nodes.get_mut(&entry.ancestry())
    }

    /// Removes the value of an entry. Descendants stay.
    pub fn remove(&mut self, entry: &Entry) -> Option<T> {
        self.nodes.remove(&entry.ancestry())
    }

    /// Whether a value is stored for the entry.
    pub fn contains(&self, entry: &Entry) -> bool {
        self.nodes.contains_key(&entry.ancestry())
    }

    /// The stored entries directly below `entry`.
    pub fn children(&self, entry: &Entry) -> Vec<Entry> {
        let path = entry.ancestry();
        self.descendant_paths(&path)
            .filter(|key| key.len() == path.len() + 1)
            .filter_map(|key| key.last().cloned())
            .collect()
    }

    /// The stored entries sharing a parent with `entry`, excluding `entry`.
    ///
    /// Siblings of a top-level class are the other stored top-level classes.
    pub fn siblings(&self, entry: &Entry) -> Vec<Entry> {
        let candidates = match entry.parent() {
            Some(parent) => self.children(&parent),
            None => self.root_entries().cloned().collect(),
        };
        candidates
            .into_iter()
            .filter(|candidate| candidate != entry)
            .collect()
    }

    /// The stored top-level entries.
    pub fn root_entries(&self) -> impl Iterator<Item = &Entry> {
        self.nodes
            .keys()
            .filter(|key| key.len() == 1)
            .filter_map(|key| key.last())
    }

    /// A view of the node stored for an entry.
    pub fn find_node(&self, entry: &Entry) -> Option<EntryTreeNode<'_, T>> {
        let (path, value) = self.nodes.get_key_value(&entry.ancestry())?;
        Some(EntryTreeNode {
            tree: self,
            path,
            value,
        })
    }

    /// Every stored entry and its value, parents before children.
    pub fn iter(&self) -> impl Iterator<Item = (&Entry, &T)> {
        self.nodes
            .iter()
            .filter_map(|(key, value)| key.last().map(|entry| (entry, value)))
    }

    /// Every stored entry, parents before children.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.iter().map(|(entry, _)| entry)
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Removes every value.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    fn descendant_paths<'a>(&'a self, path: &'a [Entry]) -> impl Iterator<Item = &'a Vec<Entry>> {
        self.nodes
            .range::<[Entry], _>((Bound::Excluded(path), Bound::Unbounded))
            .map(|(key, _)| key)
            .take_while(move |key| key.starts_with(path))
    }
}

impl<T> FromIterator<(Entry, T)> for EntryTree<T> {
    fn from_iter<I: IntoIterator<Item = (Entry, T)>>(iter: I) -> Self {
        let mut tree = EntryTree::new();
        for (entry, value) in iter {
            tree.insert(entry, value);
        }
        tree
    }
}

/// A borrowed node of an [`EntryTree`].
#[derive(Debug)]
pub struct EntryTreeNode<'a, T> {
    tree: &'a EntryTree<T>,
    path: &'a [Entry],
    value: &'a T,
}

impl<'a, T> EntryTreeNode<'a, T> {
    /// The entry of this node.
    pub fn entry(&self) -> &'a Entry {
        // paths are ancestries and never empty
        &self.path[self.path.len() - 1]
    }

    /// The stored value.
    pub fn value(&self) -> &'a T {
        self.value
    }

    /// The stored entries directly below this node.
    pub fn children(&self) -> Vec<Entry> {
        self.tree.children(self.entry())
    }

    /// Every stored entry below this node, parents first.
    pub fn descendants(&self) -> Vec<&'a Entry> {
        self.tree
            .descendant_paths(self.path)
            .filter_map(|key| key.last())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{ClassEntry, FieldEntry, LocalVariableEntry, MethodEntry};

    fn class(name: &str) -> Entry {
        Entry::Class(ClassEntry::new(name))
    }

    #[test]
    fn test_ancestry_order() {
        let mut tree = EntryTree::new();
        let method = MethodEntry::parse("a", "m", "(I)V");
        tree.insert(
            Entry::LocalVariable(LocalVariableEntry::new(method.clone(), 1, "x", true)),
            "arg",
        );
        tree.insert(Entry::Method(method.clone()), "method");
        tree.insert(Entry::Field(FieldEntry::parse("a", "f", "I")), "field");
        tree.insert(class("a"), "class");
        tree.insert(class("a$b"), "inner");

        let order: Vec<&str> = tree.iter().map(|(_, v)| *v).collect();
        assert_eq!(order[0], "class");
        assert_eq!(order.last(), Some(&"arg"));
        assert_eq!(order.len(), 5);

        assert_eq!(tree.children(&class("a")).len(), 3);
        assert_eq!(tree.children(&Entry::Method(method)).len(), 1);
        assert_eq!(tree.find_node(&class("a")).unwrap().descendants().len(), 4);
    }

    #[test]
    fn test_siblings_and_remove() {
        let mut tree: EntryTree<()> = ["a", "b", "c"].iter().map(|n| (class(n), ())).collect();
        tree.insert(Entry::Field(FieldEntry::parse("a", "f", "I")), ());

        assert_eq!(tree.siblings(&class("b")), vec![class("a"), class("c")]);
        assert_eq!(tree.remove(&class("a")), Some(()));
        assert!(!tree.contains(&class("a")));
        // members survive their class
        assert_eq!(tree.len(), 3);
        assert!(tree.find_node(&class("a")).is_none());
    }
}
