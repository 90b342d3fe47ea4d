use std::sync::Arc;

use jvm_remap::access::AccessFlags;
use jvm_remap::analysis::{Instruction, ValueKind};
use jvm_remap::classfile::{ClassBuilder, ClassDef, MethodDef};
use jvm_remap::entry::{Entry, MethodEntry};
use jvm_remap::services::SpecializedMethodNameProposer;
use jvm_remap::{EntryMapping, EntryRemapper, EntryResolver, JarIndex};

const BRIDGE: AccessFlags = AccessFlags::PUBLIC
    .union(AccessFlags::SYNTHETIC)
    .union(AccessFlags::BRIDGE);

fn specialized_class(owner: &str) -> ClassDef {
    ClassBuilder::new(owner)
        .method(
            MethodDef::new("m_1", "()Ljava/lang/String;", AccessFlags::PUBLIC).with_code(vec![
                Instruction::AconstNull,
                Instruction::Return(Some(ValueKind::Reference)),
            ]),
        )
        .build()
}

/// A class declaring `Object m_2()` that forwards to `String m_1()`.
fn bridging(name: &str, super_class: &str) -> ClassDef {
    ClassBuilder::new(name)
        .extends(super_class)
        .method(MethodDef::new("m_2", "()Ljava/lang/Object;", BRIDGE).with_code(vec![
            Instruction::Load(ValueKind::Reference, 0),
            Instruction::invoke_virtual(name, "m_1", "()Ljava/lang/String;"),
            Instruction::Return(Some(ValueKind::Reference)),
        ]))
        .build()
}

fn method(owner: &str, name: &str, desc: &str) -> MethodEntry {
    MethodEntry::parse(owner, name, desc)
}

#[test]
fn test_bridge_scenario() {
    let index = JarIndex::index(&[
        ClassBuilder::new("A")
            .method(
                MethodDef::new("m_1", "()V", AccessFlags::PUBLIC)
                    .with_code(vec![Instruction::Return(None)]),
            )
            .build(),
        ClassBuilder::new("B")
            .extends("A")
            .method(
                MethodDef::new("m_2", "()V", AccessFlags::PUBLIC | AccessFlags::SYNTHETIC)
                    .with_code(vec![
                        Instruction::Load(ValueKind::Reference, 0),
                        Instruction::invoke_virtual("B", "m_1", "()V"),
                        Instruction::Return(None),
                    ]),
            )
            .build(),
    ]);

    let bridges = index.bridge_methods();
    let bridge = method("B", "m_2", "()V");
    let specialized = method("A", "m_1", "()V");
    assert!(bridges.is_bridge_method(&bridge));
    assert!(bridges.is_specialized_method(&specialized));
    assert_eq!(bridges.specialized_from_bridge(&bridge), Some(&specialized));
    assert_eq!(bridges.bridge_from_specialized(&specialized), Some(&bridge));

    let equivalent = index.entry_resolver().resolve_equivalent_methods(&specialized);
    assert!(equivalent.contains(&bridge));
    assert_eq!(
        index.entry_resolver().resolve_equivalent_methods(&bridge),
        equivalent
    );

    // renaming either one renames both
    let mut remapper = EntryRemapper::empty(Arc::new(index));
    remapper
        .put_mapping(&Entry::Method(specialized.clone()), EntryMapping::new("tick"))
        .unwrap();
    assert_eq!(remapper.deobfuscate_name(&Entry::Method(bridge)).into_value(), "tick");
    assert_eq!(
        remapper
            .deobfuscate_name(&Entry::Method(specialized))
            .into_value(),
        "tick"
    );
}

#[test]
fn test_inherited_bridge_wins_regardless_of_order() {
    // D extends B extends A, both B and D bridge to A.m_1
    let classes = [
        specialized_class("A"),
        bridging("D", "B"),
        bridging("B", "A"),
    ];
    let index = JarIndex::index(&classes);
    let bridges = index.bridge_methods();

    let specialized = method("A", "m_1", "()Ljava/lang/String;");
    let upper = method("B", "m_2", "()Ljava/lang/Object;");
    let lower = method("D", "m_2", "()Ljava/lang/Object;");

    assert!(bridges.is_bridge_method(&upper));
    assert!(bridges.is_bridge_method(&lower));
    assert_eq!(bridges.bridge_from_specialized(&specialized), Some(&upper));
    assert_eq!(bridges.specialized_from_bridge(&lower), Some(&specialized));
}

#[test]
fn test_sibling_bridges_pair_bijectively() {
    // B and C are unrelated, neither bridge is higher in the hierarchy
    let index = JarIndex::index(&[
        specialized_class("A"),
        bridging("B", "A"),
        bridging("C", "A"),
    ]);
    let bridges = index.bridge_methods();
    let specialized = method("A", "m_1", "()Ljava/lang/String;");

    assert_eq!(bridges.len(), 2);
    let bridge = bridges.bridge_from_specialized(&specialized).unwrap();
    assert_eq!(bridge, &method("B", "m_2", "()Ljava/lang/Object;"));
    assert_eq!(bridges.specialized_from_bridge(bridge), Some(&specialized));

    for (bridge, specialized) in bridges.bridge_to_specialized() {
        assert!(bridges.is_specialized_method(specialized));
        assert!(bridges.is_bridge_method(bridge));
    }
}

#[test]
fn test_sibling_winner_ignores_class_order() {
    let specialized = method("A", "m_1", "()Ljava/lang/String;");
    for classes in [
        [specialized_class("A"), bridging("B", "A"), bridging("C", "A")],
        [bridging("C", "A"), bridging("B", "A"), specialized_class("A")],
    ] {
        let index = JarIndex::index(&classes);
        assert_eq!(
            index.bridge_methods().bridge_from_specialized(&specialized),
            Some(&method("B", "m_2", "()Ljava/lang/Object;"))
        );
    }
}

fn interface(name: &str, desc: &str) -> ClassDef {
    ClassBuilder::new(name)
        .access(AccessFlags::PUBLIC | AccessFlags::INTERFACE | AccessFlags::ABSTRACT)
        .method(MethodDef::new(
            "m_2",
            desc,
            AccessFlags::PUBLIC | AccessFlags::ABSTRACT,
        ))
        .build()
}

fn forwarding(desc: &str) -> MethodDef {
    MethodDef::new("m_2", desc, BRIDGE).with_code(vec![
        Instruction::Load(ValueKind::Reference, 0),
        Instruction::invoke_virtual("A", "m_1", "()Ljava/lang/String;"),
        Instruction::Return(Some(ValueKind::Reference)),
    ])
}

#[test]
fn test_diamond_bridges_share_specialized_method() {
    // interface I { Object m_2(); }  interface J { CharSequence m_2(); }
    // class A implements I, J { String m_1(); } with a bridge for each interface
    const OBJECT: &str = "()Ljava/lang/Object;";
    const CHARS: &str = "()Ljava/lang/CharSequence;";
    let specialized = method("A", "m_1", "()Ljava/lang/String;");
    let target = MethodDef::new("m_1", "()Ljava/lang/String;", AccessFlags::PUBLIC).with_code(vec![
        Instruction::AconstNull,
        Instruction::Return(Some(ValueKind::Reference)),
    ]);

    let orders = [[OBJECT, CHARS], [CHARS, OBJECT]];
    let mut winners = Vec::new();
    for order in orders {
        let mut class = ClassBuilder::new("A")
            .implements("I")
            .implements("J")
            .method(target.clone());
        for desc in order {
            class = class.method(forwarding(desc));
        }
        let index = JarIndex::index(&[interface("J", CHARS), class.build(), interface("I", OBJECT)]);
        let bridges = index.bridge_methods();

        for desc in [OBJECT, CHARS] {
            let bridge = method("A", "m_2", desc);
            assert!(bridges.is_bridge_method(&bridge));
            assert_eq!(bridges.specialized_from_bridge(&bridge), Some(&specialized));
        }
        let winner = bridges.bridge_from_specialized(&specialized).unwrap().clone();
        assert_eq!(bridges.specialized_from_bridge(&winner), Some(&specialized));
        winners.push(winner);
    }
    assert_eq!(winners[0], winners[1]);
    assert_eq!(winners[0], method("A", "m_2", CHARS));
}

#[test]
fn test_specialized_method_proposer() {
    let index = JarIndex::index(&[specialized_class("A"), bridging("B", "A")]);
    let mut remapper = EntryRemapper::empty(Arc::new(index))
        .with_name_proposers(vec![Arc::new(SpecializedMethodNameProposer)]);

    let specialized = Entry::Method(method("A", "m_1", "()Ljava/lang/String;"));
    let bridge = Entry::Method(method("B", "m_2", "()Ljava/lang/Object;"));
    assert_eq!(remapper.deobfuscate_name(&specialized).into_value(), "m_2");
    assert!(remapper.deobfuscate_name(&specialized).is_proposed());
    // the bridge keeps its own name, so the pair reads the same
    assert_eq!(remapper.deobfuscate_name(&bridge).into_value(), "m_2");
    assert!(remapper.deobfuscate_name(&bridge).is_proposed());

    remapper
        .put_mapping(&bridge, EntryMapping::new("get"))
        .unwrap();
    assert_eq!(remapper.deobfuscate_name(&specialized).into_value(), "get");
    assert_eq!(remapper.deobfuscate_name(&bridge).into_value(), "get");
}
