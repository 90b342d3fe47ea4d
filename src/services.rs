//! Pluggable naming services consulted by the [`EntryRemapper`].
//!
//! Services are handed to the remapper as ordered lists and queried in that
//! order; the first affirmative answer wins.

use std::collections::{HashMap, HashSet};

use crate::classfile::ClassDef;
use crate::analysis::{Constant, Instruction, InvokeKind};
use crate::entry::{Entry, FieldEntry};
use crate::remapper::EntryRemapper;

/// Proposes names for entries that have no mapping.
pub trait NameProposalService: Send + Sync {
    /// A name for `entry`, given the current state of the remapper.
    fn propose_name(&self, entry: &Entry, remapper: &EntryRemapper) -> Option<String>;
}

/// Recognizes entries that were never obfuscated.
pub trait ObfuscationTestService: Send + Sync {
    /// Whether `entry` already carries a readable name.
    fn test_deobfuscated(&self, entry: &Entry) -> bool;
}

/// Names specialized methods after their bridges.
///
/// A specialized method is proposed the current name of its bridge, and a
/// bridge its own current name, so both always show up under one name.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpecializedMethodNameProposer;

impl NameProposalService for SpecializedMethodNameProposer {
    fn propose_name(&self, entry: &Entry, remapper: &EntryRemapper) -> Option<String> {
        let Entry::Method(method) = entry else {
            return None;
        };
        let bridges = remapper.index().bridge_methods();
        let bridge = match bridges.bridge_from_specialized(method) {
            Some(bridge) => bridge,
            None if bridges.is_bridge_method(method) => method,
            None => return None,
        };
        let bridge = Entry::Method(bridge.clone());
        Some(
            remapper
                .mapping(&bridge)
                .target_name()
                .unwrap_or_else(|| bridge.name())
                .to_owned(),
        )
    }
}

/// Names enum constants after the string passed to their constructor.
///
/// `enum E { FOO }` compiles to a class initializer doing
/// `new E("FOO", 0)` and storing the result in the constant's field, so the
/// original name survives as a string literal.
#[derive(Clone, Debug, Default)]
pub struct EnumNameProposer {
    names: HashMap<FieldEntry, String>,
}

impl EnumNameProposer {
    /// Scans the class initializers of every enum class.
    pub fn new(classes: &[ClassDef]) -> Self {
        let mut names = HashMap::new();
        for class in classes.iter().filter(|class| class.access.is_enum()) {
            let constants: HashSet<FieldEntry> = class
                .fields
                .iter()
                .filter(|field| field.access.is_enum())
                .map(|field| class.field_entry(field))
                .collect();
            let Some(initializer) = class.method("<clinit>", "()V") else {
                continue;
            };

            let code = &initializer.code;
            let mut allocation = None;
            for (offset, instruction) in code.iter().enumerate() {
                match instruction {
                    Instruction::New(created) if created == &class.entry => {
                        allocation = Some(offset);
                    }
                    Instruction::PutStatic(field) if constants.contains(field) => {
                        let constructed = offset > 0
                            && matches!(
                                &code[offset - 1],
                                Instruction::Invoke(InvokeKind::Special, init)
                                    if init.is_constructor() && init.parent() == &class.entry
                            );
                        let Some(start) = allocation.take().filter(|_| constructed) else {
                            continue;
                        };
                        let literal = code[start..offset].iter().find_map(|arg| match arg {
                            Instruction::Ldc(Constant::String(name)) => Some(name.clone()),
                            _ => None,
                        });
                        if let Some(name) = literal {
                            names.insert(field.clone(), name);
                        }
                    }
                    _ => {}
                }
            }
        }
        log::debug!("found {} enum constant names", names.len());
        Self { names }
    }

    /// The name found for an enum constant.
    pub fn name_of(&self, field: &FieldEntry) -> Option<&str> {
        self.names.get(field).map(String::as_str)
    }
}

impl NameProposalService for EnumNameProposer {
    fn propose_name(&self, entry: &Entry, _remapper: &EntryRemapper) -> Option<String> {
        match entry {
            Entry::Field(field) => self.name_of(field).map(str::to_owned),
            _ => None,
        }
    }
}
