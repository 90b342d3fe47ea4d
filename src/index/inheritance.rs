use std::collections::{HashMap, HashSet, VecDeque};

use crate::analysis::TypeHierarchy;
use crate::classfile::ClassDef;
use crate::entry::ClassEntry;

const OBJECT: &str = "java/lang/Object";

/// How one class relates to another in the hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClassRelation {
    /// Both are the same class.
    Same,
    /// The other class is a (transitive) supertype.
    Ancestor,
    /// The other class is a (transitive) subtype.
    Descendant,
    /// Neither is a supertype of the other.
    Unrelated,
    /// Neither class is part of the indexed binary, so nothing is known.
    Unknown,
}

/// Direct superclass and interface edges, with transitive queries on top.
#[derive(Clone, Debug, Default)]
pub struct InheritanceIndex {
    parents: HashMap<ClassEntry, Vec<ClassEntry>>,
    children: HashMap<ClassEntry, Vec<ClassEntry>>,
    super_classes: HashMap<ClassEntry, ClassEntry>,
}

impl InheritanceIndex {
    /// Collects the edges of every class.
    pub fn build(classes: &[ClassDef]) -> Self {
        let mut index = InheritanceIndex::default();
        for class in classes {
            let parents: Vec<ClassEntry> = class.supertypes().cloned().collect();
            for parent in &parents {
                index
                    .children
                    .entry(parent.clone())
                    .or_default()
                    .push(class.entry.clone());
            }
            if let Some(super_class) = &class.super_class {
                index
                    .super_classes
                    .insert(class.entry.clone(), super_class.clone());
            }
            index.parents.insert(class.entry.clone(), parents);
        }
        index
    }

    /// Whether the class is part of the indexed binary.
    pub fn contains(&self, class: &ClassEntry) -> bool {
        self.parents.contains_key(class)
    }

    /// The direct superclass followed by the direct interfaces.
    pub fn parents(&self, class: &ClassEntry) -> &[ClassEntry] {
        self.parents.get(class).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The classes directly extending or implementing `class`.
    pub fn children(&self, class: &ClassEntry) -> &[ClassEntry] {
        self.children.get(class).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The direct superclass.
    pub fn super_class(&self, class: &ClassEntry) -> Option<&ClassEntry> {
        self.super_classes.get(class)
    }

    /// Whether any class extends or implements `class`.
    pub fn is_parent(&self, class: &ClassEntry) -> bool {
        !self.children(class).is_empty()
    }

    /// Every transitive subtype, nearest first.
    pub fn descendants(&self, class: &ClassEntry) -> Vec<ClassEntry> {
        self.walk(class, |c| self.children(c))
    }

    /// Every transitive supertype in the index, nearest first.
    pub fn ancestors(&self, class: &ClassEntry) -> Vec<ClassEntry> {
        self.walk(class, |c| self.parents(c))
    }

    fn walk<'a, F>(&'a self, start: &ClassEntry, next: F) -> Vec<ClassEntry>
    where
        F: Fn(&ClassEntry) -> &'a [ClassEntry],
    {
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        let mut queue: VecDeque<&ClassEntry> = next(start).iter().collect();
        while let Some(class) = queue.pop_front() {
            if !seen.insert(class) {
                continue;
            }
            found.push(class.clone());
            queue.extend(next(class));
        }
        found
    }

    /// Classifies `other` relative to `class`.
    ///
    /// `java/lang/Object` is an ancestor of every class.
    pub fn relation(&self, class: &ClassEntry, other: &ClassEntry) -> ClassRelation {
        if class == other {
            return ClassRelation::Same;
        }
        if other.full_name() == OBJECT {
            return ClassRelation::Ancestor;
        }
        if class.full_name() == OBJECT {
            return ClassRelation::Descendant;
        }
        if !self.contains(class) && !self.contains(other) {
            return ClassRelation::Unknown;
        }
        if self.ancestors(class).contains(other) {
            ClassRelation::Ancestor
        } else if self.descendants(class).contains(other) {
            ClassRelation::Descendant
        } else {
            ClassRelation::Unrelated
        }
    }
}

impl TypeHierarchy for InheritanceIndex {
    fn common_supertype(&self, a: &ClassEntry, b: &ClassEntry) -> ClassEntry {
        let mut chain = HashSet::new();
        let mut current = Some(a);
        while let Some(class) = current {
            chain.insert(class);
            current = self.super_class(class);
        }
        let mut current = Some(b);
        while let Some(class) = current {
            if chain.contains(class) {
                return class.clone();
            }
            current = self.super_class(class);
        }
        ClassEntry::new(OBJECT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::ClassBuilder;

    fn index() -> InheritanceIndex {
        InheritanceIndex::build(&[
            ClassBuilder::new("a").build(),
            ClassBuilder::new("b").extends("a").implements("i").build(),
            ClassBuilder::new("c").extends("b").build(),
            ClassBuilder::new("d").extends("a").build(),
            ClassBuilder::new("i").build(),
        ])
    }

    fn class(name: &str) -> ClassEntry {
        ClassEntry::new(name)
    }

    #[test]
    fn test_closure() {
        let index = index();
        assert_eq!(index.parents(&class("b")), [class("a"), class("i")]);
        assert_eq!(
            index.descendants(&class("a")),
            vec![class("b"), class("d"), class("c")]
        );
        assert_eq!(index.descendants(&class("i")), vec![class("b"), class("c")]);
        assert!(index.ancestors(&class("c")).contains(&class("i")));
        assert!(index.descendants(&class("c")).is_empty());
    }

    #[test]
    fn test_relation() {
        let index = index();
        assert_eq!(index.relation(&class("c"), &class("c")), ClassRelation::Same);
        assert_eq!(index.relation(&class("c"), &class("a")), ClassRelation::Ancestor);
        assert_eq!(index.relation(&class("a"), &class("c")), ClassRelation::Descendant);
        assert_eq!(index.relation(&class("c"), &class("d")), ClassRelation::Unrelated);
        assert_eq!(
            index.relation(&class("x/String"), &class("java/lang/Object")),
            ClassRelation::Ancestor
        );
        assert_eq!(
            index.relation(&class("x/Foo"), &class("x/Bar")),
            ClassRelation::Unknown
        );
    }

    #[test]
    fn test_common_supertype() {
        let index = index();
        assert_eq!(index.common_supertype(&class("c"), &class("d")), class("a"));
        assert_eq!(index.common_supertype(&class("c"), &class("b")), class("b"));
        assert_eq!(
            index.common_supertype(&class("c"), &class("x")),
            class("java/lang/Object")
        );
    }
}
