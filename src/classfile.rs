//! The plain-data class model handed over by the ingestion collaborator.
//!
//! Nothing in here decodes class file bytes. A reader (or a test) fills in
//! [`ClassDef`]s, and [`JarIndex::index`](crate::JarIndex::index) consumes
//! them. [`ClassBuilder`] is a small convenience for constructing classes by
//! hand.

use serde::{Deserialize, Serialize};

use crate::access::AccessFlags;
use crate::analysis::Instruction;
use crate::descriptor::{MethodDescriptor, TypeDescriptor};
use crate::entry::{ClassEntry, FieldEntry, LocalVariableEntry, MethodEntry};

/// A class declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassDef {
    /// The class itself.
    pub entry: ClassEntry,
    /// Class access flags.
    pub access: AccessFlags,
    /// The superclass, `None` only for `java/lang/Object`.
    pub super_class: Option<ClassEntry>,
    /// Directly implemented interfaces.
    pub interfaces: Vec<ClassEntry>,
    /// Declared fields, in declaration order.
    pub fields: Vec<FieldDef>,
    /// Declared methods, in declaration order.
    pub methods: Vec<MethodDef>,
    /// The `EnclosingMethod` attribute of local and anonymous classes.
    pub enclosing_method: Option<EnclosingMethod>,
    /// The `SourceFile` attribute.
    pub source_file: Option<String>,
}

impl ClassDef {
    /// The entry of a declared field.
    pub fn field_entry(&self, field: &FieldDef) -> FieldEntry {
        FieldEntry::new(self.entry.clone(), field.name.clone(), field.desc.clone())
    }

    /// The declaration entry of a declared method, carrying its flags.
    pub fn method_entry(&self, method: &MethodDef) -> MethodEntry {
        MethodEntry::def(
            self.entry.clone(),
            method.name.clone(),
            method.desc.clone(),
            method.access,
        )
    }

    /// Looks up a declared method by name and descriptor.
    pub fn method(&self, name: &str, desc: &str) -> Option<&MethodDef> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.desc.as_str() == desc)
    }

    /// The direct supertypes: the superclass followed by the interfaces.
    pub fn supertypes(&self) -> impl Iterator<Item = &ClassEntry> {
        self.super_class.iter().chain(self.interfaces.iter())
    }
}

/// A field declaration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name.
    pub name: String,
    /// Field type.
    pub desc: TypeDescriptor,
    /// Field access flags.
    pub access: AccessFlags,
}

/// A method declaration with its body.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodDef {
    /// Method name.
    pub name: String,
    /// Method descriptor.
    pub desc: MethodDescriptor,
    /// Method access flags.
    pub access: AccessFlags,
    /// The instruction stream. Branch targets are indices into this list.
    /// Empty for abstract and native methods.
    pub code: Vec<Instruction>,
    /// The exception table.
    pub handlers: Vec<ExceptionHandler>,
    /// The local variable table.
    pub locals: Vec<LocalVariableDef>,
}

impl MethodDef {
    /// Creates a method without a body.
    pub fn new(name: impl Into<String>, desc: impl Into<String>, access: AccessFlags) -> Self {
        Self {
            name: name.into(),
            desc: MethodDescriptor::new(desc),
            access,
            code: Vec::new(),
            handlers: Vec::new(),
            locals: Vec::new(),
        }
    }

    /// Sets the body.
    pub fn with_code(mut self, code: Vec<Instruction>) -> Self {
        self.code = code;
        self
    }

    /// Adds an exception handler.
    pub fn with_handler(mut self, handler: ExceptionHandler) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Adds an entry to the local variable table.
    pub fn with_local(mut self, index: u16, name: impl Into<String>, desc: impl Into<String>) -> Self {
        self.locals.push(LocalVariableDef {
            index,
            name: name.into(),
            desc: TypeDescriptor::new(desc),
        });
        self
    }

    /// The slot of the first argument: 0 for static methods, 1 otherwise.
    pub fn first_argument_slot(&self) -> u16 {
        if self.access.is_static() {
            0
        } else {
            1
        }
    }

    /// Whether `index` refers to an argument slot rather than a body local.
    pub fn is_argument_slot(&self, index: u16) -> bool {
        let first = self.first_argument_slot();
        let end = first as usize + self.desc.argument_slots();
        index >= first && (index as usize) < end
    }

    /// The entries of every named local variable, arguments included.
    pub fn local_entries(&self, owner: &MethodEntry) -> Vec<LocalVariableEntry> {
        self.locals
            .iter()
            .map(|local| {
                LocalVariableEntry::new(
                    owner.to_reference(),
                    local.index,
                    local.name.clone(),
                    self.is_argument_slot(local.index),
                )
            })
            .collect()
    }
}

/// An entry in a method's local variable table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalVariableDef {
    /// The slot.
    pub index: u16,
    /// The debug name.
    pub name: String,
    /// The declared type.
    pub desc: TypeDescriptor,
}

/// An entry in a method's exception table. Offsets are instruction indices.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionHandler {
    /// First covered instruction.
    pub start: usize,
    /// First instruction past the covered range.
    pub end: usize,
    /// The handler's first instruction.
    pub handler: usize,
    /// The caught type, `None` for `finally` blocks.
    pub catch_type: Option<ClassEntry>,
}

/// The method (or class initializer) a local or anonymous class is declared
/// in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnclosingMethod {
    /// The enclosing class.
    pub owner: ClassEntry,
    /// The enclosing method, if the class is not declared in an initializer.
    pub method: Option<(String, MethodDescriptor)>,
}

impl EnclosingMethod {
    /// The enclosing method as an entry.
    pub fn method_entry(&self) -> Option<MethodEntry> {
        self.method
            .as_ref()
            .map(|(name, desc)| MethodEntry::new(self.owner.clone(), name.clone(), desc.clone()))
    }
}

/// Builds [`ClassDef`]s.
///
/// # Examples
///
/// ```
/// use jvm_remap::access::AccessFlags;
/// use jvm_remap::classfile::{ClassBuilder, MethodDef};
///
/// let class = ClassBuilder::new("a/B")
///     .extends("a/A")
///     .field("count", "I", AccessFlags::PRIVATE)
///     .method(MethodDef::new("m", "()V", AccessFlags::PUBLIC))
///     .build();
/// assert_eq!(class.super_class.unwrap().full_name(), "a/A");
/// assert_eq!(class.fields.len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct ClassBuilder {
    class: ClassDef,
}

impl ClassBuilder {
    /// Starts a public class extending `java/lang/Object`.
    pub fn new(name: &str) -> Self {
        let super_class = (name != "java/lang/Object").then(|| ClassEntry::new("java/lang/Object"));
        Self {
            class: ClassDef {
                entry: ClassEntry::new(name),
                access: AccessFlags::PUBLIC,
                super_class,
                interfaces: Vec::new(),
                fields: Vec::new(),
                methods: Vec::new(),
                enclosing_method: None,
                source_file: None,
            },
        }
    }

    /// Sets the class access flags.
    pub fn access(mut self, access: AccessFlags) -> Self {
        self.class.access = access;
        self
    }

    /// Sets the superclass.
    pub fn extends(mut self, super_class: &str) -> Self {
        self.class.super_class = Some(ClassEntry::new(super_class));
        self
    }

    /// Adds an interface.
    pub fn implements(mut self, interface: &str) -> Self {
        self.class.interfaces.push(ClassEntry::new(interface));
        self
    }

    /// Adds a field.
    pub fn field(mut self, name: &str, desc: &str, access: AccessFlags) -> Self {
        self.class.fields.push(FieldDef {
            name: name.to_owned(),
            desc: TypeDescriptor::new(desc),
            access,
        });
        self
    }

    /// Adds a method.
    pub fn method(mut self, method: MethodDef) -> Self {
        self.class.methods.push(method);
        self
    }

    /// Marks the class as declared inside a method of `owner`.
    pub fn enclosed_in(mut self, owner: &str, method: Option<(&str, &str)>) -> Self {
        self.class.enclosing_method = Some(EnclosingMethod {
            owner: ClassEntry::new(owner),
            method: method.map(|(name, desc)| (name.to_owned(), MethodDescriptor::new(desc))),
        });
        self
    }

    /// Sets the source file name.
    pub fn source_file(mut self, name: &str) -> Self {
        self.class.source_file = Some(name.to_owned());
        self
    }

    /// Finishes the class.
    pub fn build(self) -> ClassDef {
        self.class
    }
}
