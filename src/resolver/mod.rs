//! Canonicalization of entry references and rename equivalence classes.
//!
//! A reference like `b.m()V` found in a call site may name a method that is
//! declared in a superclass of `b`. Resolution finds the declaration(s) such a
//! reference denotes. Equivalence goes further and finds every declaration
//! that must carry the same name as a given one: overrides, interface
//! implementations, and bridge/specialized pairs.

use std::collections::{BTreeSet, HashSet};

use crate::access::AccessFlags;
use crate::entry::{Entry, EntryKind, MethodEntry};
use crate::index::{BridgeMethodIndex, EntryIndex, InheritanceIndex, JarIndex};

mod tree;

pub use tree::{MethodImplementationsTree, MethodInheritanceTree, NodeId};

/// Which declaration a reference resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResolutionStrategy {
    /// The topmost accessible declaration.
    ResolveRoot,
    /// The nearest accessible declaration.
    ResolveClosest,
}

/// Resolves entries against some view of the class hierarchy.
pub trait EntryResolver {
    /// The declarations an entry denotes.
    ///
    /// Classes and non-argument local variables resolve to themselves. An
    /// empty set means no declaration exists anywhere in the hierarchy.
    /// Several results are possible through multiple interface inheritance.
    fn resolve_entry(&self, entry: &Entry, strategy: ResolutionStrategy) -> BTreeSet<Entry>;

    /// The first of [`resolve_entry`](Self::resolve_entry)'s results.
    fn resolve_first_entry(&self, entry: &Entry, strategy: ResolutionStrategy) -> Option<Entry> {
        self.resolve_entry(entry, strategy).into_iter().next()
    }

    /// Every entry that must be renamed together with `entry`.
    fn resolve_equivalent_entries(&self, entry: &Entry) -> BTreeSet<Entry>;

    /// Every method that must be renamed together with `method`.
    fn resolve_equivalent_methods(&self, method: &MethodEntry) -> BTreeSet<MethodEntry>;
}

/// A resolver that knows no hierarchy: every entry is its own declaration.
#[derive(Clone, Copy, Debug, Default)]
pub struct VoidEntryResolver;

impl EntryResolver for VoidEntryResolver {
    fn resolve_entry(&self, entry: &Entry, _: ResolutionStrategy) -> BTreeSet<Entry> {
        BTreeSet::from([entry.clone()])
    }

    fn resolve_equivalent_entries(&self, entry: &Entry) -> BTreeSet<Entry> {
        BTreeSet::from([entry.clone()])
    }

    fn resolve_equivalent_methods(&self, method: &MethodEntry) -> BTreeSet<MethodEntry> {
        BTreeSet::from([method.clone()])
    }
}

/// Resolves entries through the indices of a binary.
#[derive(Clone, Copy, Debug)]
pub struct IndexEntryResolver<'a> {
    entries: &'a EntryIndex,
    inheritance: &'a InheritanceIndex,
    bridges: &'a BridgeMethodIndex,
}

// guards for the equivalence walk
#[derive(Default)]
struct Walk {
    found: BTreeSet<MethodEntry>,
    collected: HashSet<MethodEntry>,
    walked: HashSet<MethodEntry>,
}

impl<'a> IndexEntryResolver<'a> {
    /// Creates a resolver over a complete index.
    pub fn new(index: &'a JarIndex) -> Self {
        Self::from_parts(index.entries(), index.inheritance(), index.bridge_methods())
    }

    /// Creates a resolver over individual indices.
    pub fn from_parts(
        entries: &'a EntryIndex,
        inheritance: &'a InheritanceIndex,
        bridges: &'a BridgeMethodIndex,
    ) -> Self {
        Self {
            entries,
            inheritance,
            bridges,
        }
    }

    /// Walks up the hierarchy from the owner of `child`, a field or method.
    fn resolve_child(&self, child: &Entry, strategy: ResolutionStrategy, follow_bridge: bool) -> BTreeSet<Entry> {
        if let (Entry::Method(method), true) = (child, follow_bridge) {
            // bridges, not specialized methods, anchor a name across classes
            if let Some(bridge) = self.bridges.bridge_from_specialized(method) {
                if bridge != method && bridge.parent() == method.parent() {
                    let bridge = Entry::Method(bridge.clone());
                    let resolved = self.resolve_child(&bridge, strategy, false);
                    return if resolved.is_empty() {
                        BTreeSet::from([bridge])
                    } else {
                        resolved
                    };
                }
            }
        }

        let mut resolved = BTreeSet::new();
        for parent in self.inheritance.parents(child.containing_class()) {
            let Some(parent_entry) = child.with_parent(Entry::Class(parent.clone())) else {
                continue;
            };
            match strategy {
                ResolutionStrategy::ResolveRoot => resolved.extend(self.resolve_root(&parent_entry)),
                ResolutionStrategy::ResolveClosest => {
                    resolved.extend(self.resolve_closest(&parent_entry))
                }
            }
        }
        resolved
    }

    fn resolve_root(&self, entry: &Entry) -> BTreeSet<Entry> {
        // the topmost declaration wins, so look further up first
        let resolved = self.resolve_child(entry, ResolutionStrategy::ResolveRoot, true);
        if resolved.is_empty() && self.is_inheritable_declaration(entry) {
            return BTreeSet::from([entry.clone()]);
        }
        resolved
    }

    fn resolve_closest(&self, entry: &Entry) -> BTreeSet<Entry> {
        if self.is_inheritable_declaration(entry) {
            return BTreeSet::from([entry.clone()]);
        }
        self.resolve_child(entry, ResolutionStrategy::ResolveClosest, true)
    }

    fn is_inheritable_declaration(&self, entry: &Entry) -> bool {
        self.entries
            .entry_access(entry)
            .map_or(false, |access| !access.is_private())
    }

    /// The tree of overrides below the root declaration of `method`.
    pub fn method_inheritance_tree(&self, method: &MethodEntry) -> MethodInheritanceTree {
        let root = match self.resolve_first_entry(&Entry::Method(method.clone()), ResolutionStrategy::ResolveRoot) {
            Some(Entry::Method(resolved)) => resolved,
            _ => method.clone(),
        };
        let implemented = self.entries.has_method(&root);
        let mut tree = MethodInheritanceTree::new(root, implemented);
        let root = tree.root();
        self.load_overrides(&mut tree, root);
        tree
    }

    fn load_overrides(&self, tree: &mut MethodInheritanceTree, node: NodeId) -> bool {
        let method = tree.method(node).clone();
        let mut any = false;
        for child_class in self.inheritance.children(method.parent()) {
            let child = method.with_parent(child_class.clone());
            let implemented = self.entries.has_method(&child);
            let id = tree.push(child, implemented);
            let overridden = self.load_overrides(tree, id);
            if overridden || implemented {
                tree.attach(node, id);
                any = true;
            } else {
                tree.discard(id);
            }
        }
        any
    }

    /// The implementations of each root declaration of `method` in
    /// descendant classes.
    pub fn method_implementations(&self, method: &MethodEntry) -> Vec<MethodImplementationsTree> {
        self.resolve_entry(&Entry::Method(method.clone()), ResolutionStrategy::ResolveRoot)
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Method(root) => Some(root),
                _ => None,
            })
            .map(|root| {
                let implementations = self
                    .inheritance
                    .descendants(root.parent())
                    .into_iter()
                    .map(|descendant| root.with_parent(descendant))
                    .filter(|candidate| self.entries.has_method(candidate))
                    .collect();
                MethodImplementationsTree::new(root, implementations)
            })
            .collect()
    }

    fn collect_equivalent(&self, walk: &mut Walk, method: &MethodEntry) {
        if !walk.collected.insert(method.clone()) {
            return;
        }
        let Some(access) = self.entries.method_access(method) else {
            walk.found.insert(method.clone());
            return;
        };
        if !can_inherit(method, access) {
            walk.found.insert(method.clone());
            return;
        }

        let tree = self.method_inheritance_tree(method);
        self.walk_inheritance(walk, &tree, tree.root());
    }

    fn walk_inheritance(&self, walk: &mut Walk, tree: &MethodInheritanceTree, node: NodeId) {
        let method = tree.method(node);
        if !walk.walked.insert(method.clone()) {
            return;
        }
        if let Some(access) = self.entries.method_access(method) {
            if can_inherit(method, access) {
                walk.found.insert(method.clone());
            }
        }

        self.walk_bridges(walk, method);

        for implementations in self.method_implementations(method) {
            self.walk_implementation(walk, implementations.root());
            for implementation in implementations.implementations() {
                self.walk_implementation(walk, implementation);
            }
        }

        for child in tree.children(node) {
            self.walk_inheritance(walk, tree, *child);
        }
    }

    fn walk_implementation(&self, walk: &mut Walk, method: &MethodEntry) {
        if let Some(access) = self.entries.method_access(method) {
            if !access.is_private() && !access.is_static() {
                walk.found.insert(method.clone());
            }
        }
        self.walk_bridges(walk, method);
    }

    fn walk_bridges(&self, walk: &mut Walk, method: &MethodEntry) {
        // the rest of a bridge chain is reached through the trees of its
        // members
        if let Some(bridge) = self.bridges.bridge_from_specialized(method) {
            self.collect_equivalent(walk, bridge);
        }
        if let Some(specialized) = self.bridges.specialized_from_bridge(method) {
            self.collect_equivalent(walk, specialized);
        }
    }
}

impl EntryResolver for IndexEntryResolver<'_> {
    fn resolve_entry(&self, entry: &Entry, strategy: ResolutionStrategy) -> BTreeSet<Entry> {
        let itself = || BTreeSet::from([entry.clone()]);

        // body locals belong to one implementation, parameters to the
        // declaration
        if let Entry::LocalVariable(local) = entry {
            if !local.is_argument() {
                return itself();
            }
        }
        let Some(child) = class_child(entry) else {
            return itself();
        };

        let access = self.entries.entry_access(&child);
        if strategy == ResolutionStrategy::ResolveClosest && access.is_some() {
            return itself();
        }
        if access.map_or(false, |a| a.is_private() || a.is_static()) {
            return itself();
        }

        let resolved = self.resolve_child(&child, strategy, true);
        if resolved.is_empty() && access.is_some() {
            return itself();
        }
        resolved
            .iter()
            .map(|resolved_child| entry.replace_ancestor(&child, resolved_child))
            .collect()
    }

    fn resolve_equivalent_entries(&self, entry: &Entry) -> BTreeSet<Entry> {
        if let Entry::LocalVariable(local) = entry {
            if !local.is_argument() {
                return BTreeSet::from([entry.clone()]);
            }
        }
        let method = match entry.find_ancestor(EntryKind::Method) {
            Some(Entry::Method(method)) if self.entries.has_method(&method) => method,
            _ => return BTreeSet::from([entry.clone()]),
        };

        let relevant = Entry::Method(method.clone());
        self.resolve_equivalent_methods(&method)
            .into_iter()
            .map(|equivalent| entry.replace_ancestor(&relevant, &Entry::Method(equivalent)))
            .collect()
    }

    fn resolve_equivalent_methods(&self, method: &MethodEntry) -> BTreeSet<MethodEntry> {
        let mut walk = Walk::default();
        self.collect_equivalent(&mut walk, method);
        if walk.found.is_empty() {
            walk.found.insert(method.clone());
        }
        walk.found
    }
}

/// The member of a class the entry is, or lives in. `None` for classes.
fn class_child(entry: &Entry) -> Option<Entry> {
    match entry {
        Entry::Class(_) => None,
        Entry::Field(_) | Entry::Method(_) => Some(entry.clone()),
        Entry::LocalVariable(local) => Some(Entry::Method(local.parent().clone())),
    }
}

fn can_inherit(method: &MethodEntry, access: AccessFlags) -> bool {
    !method.is_constructor() && !access.is_private() && !access.is_static() && !access.is_final()
}
