//! Presenting obfuscated entries under their mapped names.
//!
//! A [`Translator`] only has to say what a single entry is called. Everything
//! else, rewriting ancestry chains, descriptors, lambdas and whole class
//! definitions, is derived from that.

use crate::analysis::{Constant, Instruction, Lambda, MethodHandle};
use crate::classfile::{ClassDef, EnclosingMethod, FieldDef, LocalVariableDef, MethodDef};
use crate::descriptor::{MethodDescriptor, TypeDescriptor};
use crate::entry::{ClassEntry, Entry, FieldEntry, LocalVariableEntry, MethodEntry};
use crate::mapping::{EntryMapping, EntryTree};
use crate::resolver::{EntryResolver, ResolutionStrategy};

/// A translated value tagged with where its name came from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TranslateResult<T> {
    /// Nothing renamed the value.
    Obfuscated(T),
    /// The value was renamed by a mapping, or was never obfuscated.
    Deobfuscated(T),
    /// The value was renamed by a name proposal.
    Proposed(T),
}

impl<T> TranslateResult<T> {
    /// The translated value.
    pub fn value(&self) -> &T {
        match self {
            TranslateResult::Obfuscated(value)
            | TranslateResult::Deobfuscated(value)
            | TranslateResult::Proposed(value) => value,
        }
    }

    /// Unwraps the translated value.
    pub fn into_value(self) -> T {
        match self {
            TranslateResult::Obfuscated(value)
            | TranslateResult::Deobfuscated(value)
            | TranslateResult::Proposed(value) => value,
        }
    }

    /// Transforms the value, keeping the tag.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> TranslateResult<U> {
        match self {
            TranslateResult::Obfuscated(value) => TranslateResult::Obfuscated(f(value)),
            TranslateResult::Deobfuscated(value) => TranslateResult::Deobfuscated(f(value)),
            TranslateResult::Proposed(value) => TranslateResult::Proposed(f(value)),
        }
    }

    /// Whether the value kept its obfuscated name.
    pub fn is_obfuscated(&self) -> bool {
        matches!(self, TranslateResult::Obfuscated(_))
    }

    /// Whether the name came from a mapping.
    pub fn is_deobfuscated(&self) -> bool {
        matches!(self, TranslateResult::Deobfuscated(_))
    }

    /// Whether the name came from a proposal.
    pub fn is_proposed(&self) -> bool {
        matches!(self, TranslateResult::Proposed(_))
    }
}

/// Renames entries, and everything built from entries.
pub trait Translator {
    /// The name `entry` goes by. Only the entry's own name is translated,
    /// not its ancestry.
    fn translate_name(&self, entry: &Entry) -> TranslateResult<String>;

    /// Translates a class and its outer classes.
    fn translate_class(&self, class: &ClassEntry) -> ClassEntry {
        let outer = class.outer_class().map(|outer| self.translate_class(outer));
        let name = self.translate_name(&Entry::Class(class.clone())).into_value();
        ClassEntry::nested(outer, name)
    }

    /// Translates the class names in a type descriptor.
    fn translate_type(&self, desc: &TypeDescriptor) -> TypeDescriptor {
        desc.remap(|name| {
            let translated = self.translate_class(&ClassEntry::new(name)).full_name();
            (translated != name).then_some(translated)
        })
    }

    /// Translates the class names in a method descriptor.
    fn translate_method_desc(&self, desc: &MethodDescriptor) -> MethodDescriptor {
        desc.remap(|name| {
            let translated = self.translate_class(&ClassEntry::new(name)).full_name();
            (translated != name).then_some(translated)
        })
    }

    /// Translates a field: owner, name and type.
    fn translate_field(&self, field: &FieldEntry) -> FieldEntry {
        let name = self.translate_name(&Entry::Field(field.clone())).into_value();
        FieldEntry::new(
            self.translate_class(field.parent()),
            name,
            self.translate_type(field.desc()),
        )
    }

    /// Translates a method: owner, name and descriptor. Access flags of a
    /// declaration are kept.
    fn translate_method(&self, method: &MethodEntry) -> MethodEntry {
        let name = self.translate_name(&Entry::Method(method.clone())).into_value();
        let parent = self.translate_class(method.parent());
        let desc = self.translate_method_desc(method.desc());
        match method.access() {
            Some(access) => MethodEntry::def(parent, name, desc, access),
            None => MethodEntry::new(parent, name, desc),
        }
    }

    /// Translates a local variable and its method.
    fn translate_local(&self, local: &LocalVariableEntry) -> LocalVariableEntry {
        let name = self
            .translate_name(&Entry::LocalVariable(local.clone()))
            .into_value();
        LocalVariableEntry::new(
            self.translate_method(local.parent()),
            local.index(),
            name,
            local.is_argument(),
        )
    }

    /// Translates any entry. The tag describes the entry's own name.
    fn translate_entry(&self, entry: &Entry) -> TranslateResult<Entry> {
        let translated = match entry {
            Entry::Class(class) => Entry::Class(self.translate_class(class)),
            Entry::Field(field) => Entry::Field(self.translate_field(field)),
            Entry::Method(method) => Entry::Method(self.translate_method(method)),
            Entry::LocalVariable(local) => Entry::LocalVariable(self.translate_local(local)),
        };
        self.translate_name(entry).map(|_| translated)
    }

    /// Translates a method handle's target.
    fn translate_handle(&self, handle: &MethodHandle) -> MethodHandle {
        MethodHandle {
            kind: handle.kind,
            target: self.translate_entry(&handle.target).into_value(),
        }
    }

    /// Translates a lambda. Its invoked name follows the functional
    /// interface method it implements.
    fn translate_lambda(&self, lambda: &Lambda) -> Lambda {
        let invoked_name = match lambda.sam_method() {
            Some(sam) => self
                .translate_name(&Entry::Method(sam))
                .into_value(),
            None => lambda.invoked_name.clone(),
        };
        Lambda {
            invoked_name,
            invoked_type: self.translate_method_desc(&lambda.invoked_type),
            sam_method_type: self.translate_method_desc(&lambda.sam_method_type),
            implementation: self.translate_handle(&lambda.implementation),
            instantiated_method_type: self.translate_method_desc(&lambda.instantiated_method_type),
        }
    }

    /// Translates the constant operand of an `ldc` or bootstrap argument.
    fn translate_constant(&self, constant: &Constant) -> Constant {
        match constant {
            Constant::Class(desc) => Constant::Class(self.translate_type(desc)),
            Constant::MethodType(desc) => Constant::MethodType(self.translate_method_desc(desc)),
            Constant::MethodHandle(handle) => Constant::MethodHandle(self.translate_handle(handle)),
            other => other.clone(),
        }
    }

    /// Translates every symbol an instruction mentions.
    fn translate_instruction(&self, instruction: &Instruction) -> Instruction {
        match instruction {
            Instruction::Ldc(constant) => Instruction::Ldc(self.translate_constant(constant)),
            Instruction::GetStatic(field) => Instruction::GetStatic(self.translate_field(field)),
            Instruction::PutStatic(field) => Instruction::PutStatic(self.translate_field(field)),
            Instruction::GetField(field) => Instruction::GetField(self.translate_field(field)),
            Instruction::PutField(field) => Instruction::PutField(self.translate_field(field)),
            Instruction::Invoke(kind, method) => {
                Instruction::Invoke(*kind, self.translate_method(method))
            }
            Instruction::InvokeDynamic {
                name,
                desc,
                bootstrap,
                args,
            } => {
                let name = match Lambda::from_invoke_dynamic(name, desc, bootstrap, args) {
                    Some(lambda) => self.translate_lambda(&lambda).invoked_name,
                    None => name.clone(),
                };
                Instruction::InvokeDynamic {
                    name,
                    desc: self.translate_method_desc(desc),
                    bootstrap: self.translate_handle(bootstrap),
                    args: args.iter().map(|arg| self.translate_constant(arg)).collect(),
                }
            }
            Instruction::New(class) => Instruction::New(self.translate_class(class)),
            Instruction::NewArray(desc) => Instruction::NewArray(self.translate_type(desc)),
            Instruction::MultiNewArray(desc, dimensions) => {
                Instruction::MultiNewArray(self.translate_type(desc), *dimensions)
            }
            Instruction::CheckCast(desc) => Instruction::CheckCast(self.translate_type(desc)),
            Instruction::InstanceOf(desc) => Instruction::InstanceOf(self.translate_type(desc)),
            other => other.clone(),
        }
    }

    /// Translates a complete class definition, including method bodies.
    fn translate_class_def(&self, class: &ClassDef) -> ClassDef {
        let fields = class
            .fields
            .iter()
            .map(|field| {
                let entry = self.translate_field(&class.field_entry(field));
                FieldDef {
                    name: entry.name().to_owned(),
                    desc: entry.desc().clone(),
                    access: field.access,
                }
            })
            .collect();

        let methods = class
            .methods
            .iter()
            .map(|method| {
                let obfuscated = class.method_entry(method);
                let entry = self.translate_method(&obfuscated);
                let locals = method
                    .locals
                    .iter()
                    .map(|local| {
                        let local_entry = LocalVariableEntry::new(
                            obfuscated.clone(),
                            local.index,
                            local.name.clone(),
                            method.is_argument_slot(local.index),
                        );
                        LocalVariableDef {
                            index: local.index,
                            name: self
                                .translate_name(&Entry::LocalVariable(local_entry))
                                .into_value(),
                            desc: self.translate_type(&local.desc),
                        }
                    })
                    .collect();
                MethodDef {
                    name: entry.name().to_owned(),
                    desc: entry.desc().clone(),
                    access: method.access,
                    code: method
                        .code
                        .iter()
                        .map(|instruction| self.translate_instruction(instruction))
                        .collect(),
                    handlers: method
                        .handlers
                        .iter()
                        .map(|handler| {
                            let mut handler = handler.clone();
                            handler.catch_type = handler
                                .catch_type
                                .map(|catch_type| self.translate_class(&catch_type));
                            handler
                        })
                        .collect(),
                    locals,
                }
            })
            .collect();

        ClassDef {
            entry: self.translate_class(&class.entry),
            access: class.access,
            super_class: class.super_class.as_ref().map(|c| self.translate_class(c)),
            interfaces: class
                .interfaces
                .iter()
                .map(|c| self.translate_class(c))
                .collect(),
            fields,
            methods,
            enclosing_method: class.enclosing_method.as_ref().map(|enclosing| {
                EnclosingMethod {
                    owner: self.translate_class(&enclosing.owner),
                    method: enclosing.method_entry().map(|method| {
                        let method = self.translate_method(&method);
                        (method.name().to_owned(), method.desc().clone())
                    }),
                }
            }),
            source_file: class.source_file.clone(),
        }
    }
}

/// Translates through a mapping tree alone, without name proposals.
///
/// Mappings are looked up under the root declaration of each entry, which is
/// where renames are stored.
#[derive(Clone, Copy, Debug)]
pub struct MappingTranslator<'a, R> {
    mappings: &'a EntryTree<EntryMapping>,
    resolver: R,
}

impl<'a, R: EntryResolver> MappingTranslator<'a, R> {
    /// Creates a translator over a mapping tree.
    pub fn new(mappings: &'a EntryTree<EntryMapping>, resolver: R) -> Self {
        Self { mappings, resolver }
    }
}

impl<R: EntryResolver> Translator for MappingTranslator<'_, R> {
    fn translate_name(&self, entry: &Entry) -> TranslateResult<String> {
        let resolved = self
            .resolver
            .resolve_first_entry(entry, ResolutionStrategy::ResolveRoot)
            .unwrap_or_else(|| entry.clone());
        match self
            .mappings
            .get(&resolved)
            .and_then(EntryMapping::target_name)
        {
            Some(name) => TranslateResult::Deobfuscated(name.to_owned()),
            None => TranslateResult::Obfuscated(entry.name().to_owned()),
        }
    }
}
