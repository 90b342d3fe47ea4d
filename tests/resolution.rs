use std::collections::BTreeSet;

use lazy_static::lazy_static;

use jvm_remap::access::AccessFlags;
use jvm_remap::classfile::{ClassBuilder, MethodDef};
use jvm_remap::entry::{ClassEntry, Entry, FieldEntry, LocalVariableEntry, MethodEntry};
use jvm_remap::index::ClassRelation;
use jvm_remap::{EntryResolver, JarIndex, ResolutionStrategy};

lazy_static! {
    // interface I { void m_1(); }
    // class A implements I { public void m_1(); private void m_2(int); static void m_3(); private int f; }
    // class B extends A { public void m_1(); }
    // class C extends B {}
    // class D implements I { public void m_1(); }
    static ref INDEX: JarIndex = JarIndex::index(&[
        ClassBuilder::new("I")
            .access(AccessFlags::PUBLIC | AccessFlags::INTERFACE | AccessFlags::ABSTRACT)
            .method(MethodDef::new("m_1", "()V", AccessFlags::PUBLIC | AccessFlags::ABSTRACT))
            .build(),
        ClassBuilder::new("A")
            .implements("I")
            .field("f", "I", AccessFlags::PRIVATE)
            .method(MethodDef::new("m_1", "()V", AccessFlags::PUBLIC))
            .method(MethodDef::new("m_2", "(I)V", AccessFlags::PRIVATE))
            .method(MethodDef::new("m_3", "()V", AccessFlags::STATIC))
            .build(),
        ClassBuilder::new("B")
            .extends("A")
            .method(MethodDef::new("m_1", "()V", AccessFlags::PUBLIC))
            .build(),
        ClassBuilder::new("C").extends("B").build(),
        ClassBuilder::new("D")
            .implements("I")
            .method(MethodDef::new("m_1", "()V", AccessFlags::PUBLIC))
            .build(),
    ]);
}

fn method(owner: &str, name: &str, desc: &str) -> Entry {
    Entry::Method(MethodEntry::parse(owner, name, desc))
}

fn set<const N: usize>(entries: [Entry; N]) -> BTreeSet<Entry> {
    BTreeSet::from(entries)
}

#[test]
fn test_root_and_closest() {
    let resolver = INDEX.entry_resolver();
    let inherited = method("C", "m_1", "()V");

    assert_eq!(
        resolver.resolve_entry(&inherited, ResolutionStrategy::ResolveRoot),
        set([method("I", "m_1", "()V")])
    );
    assert_eq!(
        resolver.resolve_entry(&inherited, ResolutionStrategy::ResolveClosest),
        set([method("B", "m_1", "()V")])
    );

    // a declaration is its own closest resolution
    let declared = method("B", "m_1", "()V");
    assert_eq!(
        resolver.resolve_entry(&declared, ResolutionStrategy::ResolveClosest),
        set([declared.clone()])
    );
}

#[test]
fn test_uninheritable_members_stop() {
    let resolver = INDEX.entry_resolver();
    let field = Entry::Field(FieldEntry::parse("A", "f", "I"));
    let private = method("A", "m_2", "(I)V");
    let statik = method("A", "m_3", "()V");

    for entry in [field, private, statik] {
        assert_eq!(
            resolver.resolve_entry(&entry, ResolutionStrategy::ResolveRoot),
            set([entry.clone()])
        );
    }
}

#[test]
fn test_misses_are_empty() {
    let resolver = INDEX.entry_resolver();
    assert!(resolver
        .resolve_entry(&method("C", "m_9", "()V"), ResolutionStrategy::ResolveRoot)
        .is_empty());
    assert_eq!(
        resolver.resolve_first_entry(&method("C", "m_9", "()V"), ResolutionStrategy::ResolveClosest),
        None
    );

    // classes are never resolved anywhere else
    let class = Entry::Class(ClassEntry::new("java/util/List"));
    assert_eq!(
        resolver.resolve_entry(&class, ResolutionStrategy::ResolveRoot),
        set([class.clone()])
    );
}

#[test]
fn test_equivalent_methods_are_symmetric() {
    let resolver = INDEX.entry_resolver();
    let expected: BTreeSet<MethodEntry> = ["I", "A", "B", "D"]
        .iter()
        .map(|owner| MethodEntry::parse(owner, "m_1", "()V"))
        .collect();

    for member in &expected {
        assert_eq!(&resolver.resolve_equivalent_methods(member), &expected);
    }
    assert_eq!(
        resolver.resolve_equivalent_methods(&MethodEntry::parse("A", "m_2", "(I)V")),
        BTreeSet::from([MethodEntry::parse("A", "m_2", "(I)V")])
    );
}

#[test]
fn test_parameters_follow_overrides() {
    let resolver = INDEX.entry_resolver();
    let argument = |owner: &str| {
        Entry::LocalVariable(LocalVariableEntry::new(
            MethodEntry::parse(owner, "m_1", "()V"),
            1,
            "",
            true,
        ))
    };
    let equivalent = resolver.resolve_equivalent_entries(&argument("D"));
    assert_eq!(equivalent.len(), 4);
    assert!(equivalent.contains(&argument("B")));

    let body_local = Entry::LocalVariable(LocalVariableEntry::new(
        MethodEntry::parse("D", "m_1", "()V"),
        2,
        "tmp",
        false,
    ));
    assert_eq!(resolver.resolve_equivalent_entries(&body_local), set([body_local.clone()]));
}

#[test]
fn test_replace_ancestor_identity() {
    let entry = method("B", "m_1", "()V");
    let owner = Entry::Class(ClassEntry::new("B"));
    assert_eq!(entry.replace_ancestor(&owner, &owner), entry);
    assert_eq!(entry.replace_ancestor(&entry, &entry), entry);
}

#[test]
fn test_class_relations() {
    let inheritance = INDEX.inheritance();
    let class = |name: &str| ClassEntry::new(name);

    assert_eq!(inheritance.relation(&class("C"), &class("I")), ClassRelation::Ancestor);
    assert_eq!(inheritance.relation(&class("I"), &class("C")), ClassRelation::Descendant);
    assert_eq!(inheritance.relation(&class("B"), &class("D")), ClassRelation::Unrelated);
    assert_eq!(
        inheritance.relation(&class("x/Y"), &class("x/Z")),
        ClassRelation::Unknown
    );
}
