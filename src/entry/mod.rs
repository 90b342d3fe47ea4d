//! Symbol identities for classes, fields, methods and local variables.
//!
//! Every symbol is an immutable value. Entries form a strict ancestry chain:
//! a local variable belongs to a method, fields and methods belong to a class,
//! a nested class belongs to its outer class and a top-level class has no
//! parent. Identity is structural over the ancestry, the name and the
//! descriptor; mapped names never take part in it.
//!
//! # Examples
//!
//! ```
//! use jvm_remap::entry::{ClassEntry, Entry, MethodEntry};
//!
//! let method = Entry::from(MethodEntry::parse("a/B$C", "m", "()V"));
//! let names: Vec<String> = method.ancestry().iter().map(Entry::full_name).collect();
//! assert_eq!(names, ["a/B", "a/B$C", "a/B$C.m"]);
//!
//! let moved = method.replace_ancestor(
//!     &Entry::from(ClassEntry::new("a/B")),
//!     &Entry::from(ClassEntry::new("x/Y")),
//! );
//! assert_eq!(moved.full_name(), "x/Y$C.m");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

mod class;
mod local;
mod member;

pub use class::ClassEntry;
pub use local::LocalVariableEntry;
pub use member::{FieldEntry, MethodEntry};

/// The kind of symbol an [`Entry`] denotes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryKind {
    /// A class or interface.
    Class,
    /// A field.
    Field,
    /// A method or constructor.
    Method,
    /// A local variable or argument.
    LocalVariable,
}

/// Any symbol.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Entry {
    /// A class.
    Class(ClassEntry),
    /// A field.
    Field(FieldEntry),
    /// A method.
    Method(MethodEntry),
    /// A local variable.
    LocalVariable(LocalVariableEntry),
}

impl Entry {
    /// The kind of symbol.
    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::Class(_) => EntryKind::Class,
            Entry::Field(_) => EntryKind::Field,
            Entry::Method(_) => EntryKind::Method,
            Entry::LocalVariable(_) => EntryKind::LocalVariable,
        }
    }

    /// The default name.
    ///
    /// Members and nested classes use their simple name, top-level classes
    /// their full internal name.
    pub fn name(&self) -> &str {
        match self {
            Entry::Class(e) => e.name(),
            Entry::Field(e) => e.name(),
            Entry::Method(e) => e.name(),
            Entry::LocalVariable(e) => e.name(),
        }
    }

    /// The name without any package or owner qualification.
    pub fn simple_name(&self) -> &str {
        match self {
            Entry::Class(e) => e.simple_name(),
            _ => self.name(),
        }
    }

    /// The name prefixed with the full name of the parent.
    pub fn full_name(&self) -> String {
        match self {
            Entry::Class(e) => e.full_name(),
            Entry::Field(e) => format!("{}.{}", e.parent().full_name(), e.name()),
            Entry::Method(e) => format!("{}.{}", e.parent().full_name(), e.name()),
            Entry::LocalVariable(e) => {
                format!("{}.{}.{}", e.parent().parent().full_name(), e.parent().name(), e.name())
            }
        }
    }

    /// The name prefixed with the contextual name of the parent; packages are
    /// left out.
    pub fn contextual_name(&self) -> String {
        match self {
            Entry::Class(e) => e.contextual_name(),
            Entry::Field(e) => format!("{}.{}", e.parent().contextual_name(), e.name()),
            Entry::Method(e) => format!("{}.{}", e.parent().contextual_name(), e.name()),
            Entry::LocalVariable(e) => format!(
                "{}.{}.{}",
                e.parent().parent().contextual_name(),
                e.parent().name(),
                e.name()
            ),
        }
    }

    /// The parent entry, `None` for top-level classes.
    pub fn parent(&self) -> Option<Entry> {
        match self {
            Entry::Class(e) => e.outer_class().cloned().map(Entry::Class),
            Entry::Field(e) => Some(Entry::Class(e.parent().clone())),
            Entry::Method(e) => Some(Entry::Class(e.parent().clone())),
            Entry::LocalVariable(e) => Some(Entry::Method(e.parent().clone())),
        }
    }

    /// Returns a copy with a different name.
    pub fn with_name(&self, name: &str) -> Entry {
        match self {
            Entry::Class(e) => Entry::Class(e.with_name(name)),
            Entry::Field(e) => Entry::Field(e.with_name(name)),
            Entry::Method(e) => Entry::Method(e.with_name(name)),
            Entry::LocalVariable(e) => Entry::LocalVariable(e.with_name(name)),
        }
    }

    /// Returns a copy with a different parent.
    ///
    /// Returns `None` if `parent` is of a kind that cannot own this entry.
    pub fn with_parent(&self, parent: Entry) -> Option<Entry> {
        match (self, parent) {
            (Entry::Class(e), Entry::Class(p)) => Some(Entry::Class(e.with_outer(Some(p)))),
            (Entry::Field(e), Entry::Class(p)) => Some(Entry::Field(e.with_parent(p))),
            (Entry::Method(e), Entry::Class(p)) => Some(Entry::Method(e.with_parent(p))),
            (Entry::LocalVariable(e), Entry::Method(p)) => {
                Some(Entry::LocalVariable(e.with_parent(p)))
            }
            _ => None,
        }
    }

    /// The ancestry of this entry from the furthest ancestor to the entry
    /// itself. Never empty.
    pub fn ancestry(&self) -> Vec<Entry> {
        let mut entries = match self.parent() {
            Some(parent) => parent.ancestry(),
            None => Vec::new(),
        };
        entries.push(self.clone());
        entries
    }

    /// Substitutes `replacement` for every occurrence of `target` in the
    /// ancestry chain.
    ///
    /// Returns an unchanged copy if `target` is not an ancestor, and
    /// `replacement` itself if `target` is this entry.
    pub fn replace_ancestor(&self, target: &Entry, replacement: &Entry) -> Entry {
        if replacement == target {
            return self.clone();
        }
        if self == target {
            return replacement.clone();
        }
        match self.parent() {
            Some(parent) => {
                let replaced = parent.replace_ancestor(target, replacement);
                if replaced == parent {
                    return self.clone();
                }
                self.with_parent(replaced).unwrap_or_else(|| self.clone())
            }
            None => self.clone(),
        }
    }

    /// The closest class in the ancestry: the entry itself for classes.
    pub fn containing_class(&self) -> &ClassEntry {
        match self {
            Entry::Class(e) => e,
            Entry::Field(e) => e.parent(),
            Entry::Method(e) => e.parent(),
            Entry::LocalVariable(e) => e.parent().parent(),
        }
    }

    /// The outermost class in the ancestry.
    pub fn top_level_class(&self) -> &ClassEntry {
        self.containing_class().outermost_class()
    }

    /// The closest ancestor (or the entry itself) of the given kind.
    pub fn find_ancestor(&self, kind: EntryKind) -> Option<Entry> {
        self.ancestry().into_iter().rev().find(|e| e.kind() == kind)
    }

    /// The method this entry is, or lives in.
    pub fn enclosing_method(&self) -> Option<&MethodEntry> {
        match self {
            Entry::Method(e) => Some(e),
            Entry::LocalVariable(e) => Some(e.parent()),
            _ => None,
        }
    }

    /// Whether giving this entry the same name as `other` could produce a
    /// clash.
    ///
    /// `other` must live in the same class as this entry, or in one of its
    /// ancestors or descendants. `is_static` tells whether a member is
    /// static.
    pub fn can_conflict_with<F>(&self, other: &Entry, is_static: F) -> bool
    where
        F: Fn(&Entry) -> bool,
    {
        match (self, other) {
            (Entry::Class(a), Entry::Class(b)) => {
                a.outer_class() == b.outer_class() && a.package_name() == b.package_name()
            }
            (Entry::Field(a), Entry::Field(b)) => a.parent() == b.parent(),
            (Entry::Method(a), Entry::Method(b)) => {
                if a.is_constructor() || b.is_constructor() {
                    return false;
                }
                if !a.desc().can_conflict_with(b.desc()) {
                    return false;
                }
                // statics in different classes only hide each other
                a.parent() == b.parent() || !(is_static(self) && is_static(other))
            }
            (Entry::LocalVariable(a), Entry::LocalVariable(b)) => a.parent() == b.parent(),
            _ => false,
        }
    }

    /// Whether this entry would hide `other`, declared in a related class,
    /// if both had the same name.
    pub fn can_shadow(&self, other: &Entry) -> bool {
        match (self, other) {
            (Entry::Field(_), Entry::Field(_)) => true,
            (Entry::Method(a), Entry::Method(b)) => {
                !a.is_constructor() && !b.is_constructor() && a.desc().can_conflict_with(b.desc())
            }
            _ => false,
        }
    }

    /// The class, if this is one.
    pub fn as_class(&self) -> Option<&ClassEntry> {
        match self {
            Entry::Class(e) => Some(e),
            _ => None,
        }
    }

    /// The field, if this is one.
    pub fn as_field(&self) -> Option<&FieldEntry> {
        match self {
            Entry::Field(e) => Some(e),
            _ => None,
        }
    }

    /// The method, if this is one.
    pub fn as_method(&self) -> Option<&MethodEntry> {
        match self {
            Entry::Method(e) => Some(e),
            _ => None,
        }
    }

    /// The local variable, if this is one.
    pub fn as_local(&self) -> Option<&LocalVariableEntry> {
        match self {
            Entry::LocalVariable(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Class(e) => e.fmt(f),
            Entry::Field(e) => e.fmt(f),
            Entry::Method(e) => e.fmt(f),
            Entry::LocalVariable(e) => e.fmt(f),
        }
    }
}

impl From<ClassEntry> for Entry {
    fn from(e: ClassEntry) -> Self {
        Entry::Class(e)
    }
}

impl From<FieldEntry> for Entry {
    fn from(e: FieldEntry) -> Self {
        Entry::Field(e)
    }
}

impl From<MethodEntry> for Entry {
    fn from(e: MethodEntry) -> Self {
        Entry::Method(e)
    }
}

impl From<LocalVariableEntry> for Entry {
    fn from(e: LocalVariableEntry) -> Self {
        Entry::LocalVariable(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{MethodDescriptor, TypeDescriptor};

    fn local(class: &str, method: &str, desc: &str, index: u16) -> Entry {
        Entry::from(LocalVariableEntry::new(
            MethodEntry::parse(class, method, desc),
            index,
            "",
            true,
        ))
    }

    #[test]
    fn test_ancestry_ends_with_self() {
        let entries = [
            Entry::from(ClassEntry::new("a")),
            Entry::from(ClassEntry::new("a$b")),
            Entry::from(FieldEntry::parse("a", "f", "I")),
            local("a", "m", "(I)V", 1),
        ];
        for entry in entries {
            let ancestry = entry.ancestry();
            assert!(!ancestry.is_empty());
            assert_eq!(ancestry.last(), Some(&entry));
            assert_eq!(ancestry.first().and_then(Entry::parent), None);
        }
    }

    #[test]
    fn test_replace_ancestor() {
        let entry = local("a", "m", "(I)V", 1);
        let method = Entry::from(MethodEntry::parse("a", "m", "(I)V"));
        let other = Entry::from(MethodEntry::parse("b", "m", "(I)V"));

        let replaced = entry.replace_ancestor(&method, &other);
        assert_eq!(replaced, local("b", "m", "(I)V", 1));

        // identity cases
        assert_eq!(entry.replace_ancestor(&method, &method), entry);
        assert_eq!(entry.replace_ancestor(&entry, &other), other);
        let unrelated = Entry::from(ClassEntry::new("zzz"));
        assert_eq!(entry.replace_ancestor(&unrelated, &other), entry);
    }

    #[test]
    fn test_replace_class_ancestor_of_nested_member() {
        let field = Entry::from(FieldEntry::parse("a$b", "f", "I"));
        let replaced = field.replace_ancestor(
            &Entry::from(ClassEntry::new("a")),
            &Entry::from(ClassEntry::new("z")),
        );
        assert_eq!(replaced, Entry::from(FieldEntry::parse("z$b", "f", "I")));
    }

    #[test]
    fn test_names() {
        let method = Entry::from(MethodEntry::parse("pkg/A$B", "run", "()V"));
        assert_eq!(method.name(), "run");
        assert_eq!(method.full_name(), "pkg/A$B.run");
        assert_eq!(method.contextual_name(), "A$B.run");
        assert_eq!(method.containing_class(), &ClassEntry::new("pkg/A$B"));
        assert_eq!(method.top_level_class(), &ClassEntry::new("pkg/A"));
        assert_eq!(
            method.find_ancestor(EntryKind::Class),
            Some(Entry::from(ClassEntry::new("pkg/A$B")))
        );
    }

    #[test]
    fn test_with_parent_checks_kind() {
        let field = Entry::from(FieldEntry::parse("a", "f", "I"));
        assert!(field
            .with_parent(Entry::from(MethodEntry::parse("a", "m", "()V")))
            .is_none());
        assert_eq!(
            field.with_parent(Entry::from(ClassEntry::new("b"))),
            Some(Entry::from(FieldEntry::parse("b", "f", "I")))
        );
    }

    #[test]
    fn test_method_conflicts() {
        let not_static = |_: &Entry| false;
        let all_static = |_: &Entry| true;
        let a = Entry::from(MethodEntry::parse("a", "x", "(I)V"));
        let same_args = Entry::from(MethodEntry::parse("a", "y", "(I)I"));
        let other_args = Entry::from(MethodEntry::parse("a", "y", "(J)V"));
        let in_child = Entry::from(MethodEntry::parse("b", "y", "(I)V"));
        let ctor = Entry::from(MethodEntry::parse("a", "<init>", "(I)V"));

        assert!(a.can_conflict_with(&same_args, not_static));
        assert!(!a.can_conflict_with(&other_args, not_static));
        assert!(a.can_conflict_with(&in_child, not_static));
        assert!(!a.can_conflict_with(&in_child, all_static));
        assert!(!a.can_conflict_with(&ctor, not_static));
        assert!(a.can_shadow(&in_child));
    }

    #[test]
    fn test_field_conflicts() {
        let f = Entry::from(FieldEntry::new(
            ClassEntry::new("a"),
            "f",
            TypeDescriptor::new("I"),
        ));
        let g = Entry::from(FieldEntry::parse("a", "g", "J"));
        let h = Entry::from(FieldEntry::parse("b", "h", "I"));
        let m = Entry::from(MethodEntry::new(
            ClassEntry::new("a"),
            "m",
            MethodDescriptor::new("()V"),
        ));
        assert!(f.can_conflict_with(&g, |_| false));
        assert!(!f.can_conflict_with(&h, |_| false));
        assert!(f.can_shadow(&h));
        assert!(!f.can_conflict_with(&m, |_| false));
    }
}
