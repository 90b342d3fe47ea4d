use std::collections::HashMap;

use crate::access::AccessFlags;
use crate::classfile::{ClassDef, EnclosingMethod};
use crate::entry::{ClassEntry, Entry, FieldEntry, MethodEntry};

/// Existence and access flags of every declared class, field and method.
#[derive(Clone, Debug, Default)]
pub struct EntryIndex {
    classes: HashMap<ClassEntry, AccessFlags>,
    fields: HashMap<FieldEntry, AccessFlags>,
    methods: HashMap<MethodEntry, AccessFlags>,
    class_order: Vec<ClassEntry>,
    field_order: Vec<FieldEntry>,
    method_order: Vec<MethodEntry>,
    enclosing_methods: HashMap<ClassEntry, EnclosingMethod>,
}

impl EntryIndex {
    /// Indexes the declarations of all classes in one pass.
    pub fn build(classes: &[ClassDef]) -> Self {
        let mut index = EntryIndex::default();
        for class in classes {
            index.classes.insert(class.entry.clone(), class.access);
            index.class_order.push(class.entry.clone());

            for field in &class.fields {
                let entry = class.field_entry(field);
                index.fields.insert(entry.clone(), field.access);
                index.field_order.push(entry);
            }
            for method in &class.methods {
                let entry = class.method_entry(method);
                index.methods.insert(entry.clone(), method.access);
                index.method_order.push(entry);
            }
            if let Some(enclosing) = &class.enclosing_method {
                index
                    .enclosing_methods
                    .insert(class.entry.clone(), enclosing.clone());
            }
        }
        index
    }

    /// Whether the class is declared in the binary.
    pub fn has_class(&self, entry: &ClassEntry) -> bool {
        self.classes.contains_key(entry)
    }

    /// Whether the method is declared in the binary.
    pub fn has_method(&self, entry: &MethodEntry) -> bool {
        self.methods.contains_key(entry)
    }

    /// Whether the field is declared in the binary.
    pub fn has_field(&self, entry: &FieldEntry) -> bool {
        self.fields.contains_key(entry)
    }

    /// Whether the entry is declared in the binary.
    ///
    /// Local variables exist if their method does.
    pub fn has_entry(&self, entry: &Entry) -> bool {
        match entry {
            Entry::Class(e) => self.has_class(e),
            Entry::Field(e) => self.has_field(e),
            Entry::Method(e) => self.has_method(e),
            Entry::LocalVariable(e) => self.has_method(e.parent()),
        }
    }

    /// Access flags of a declared class.
    pub fn class_access(&self, entry: &ClassEntry) -> Option<AccessFlags> {
        self.classes.get(entry).copied()
    }

    /// Access flags of a declared method.
    pub fn method_access(&self, entry: &MethodEntry) -> Option<AccessFlags> {
        self.methods.get(entry).copied()
    }

    /// Access flags of a declared field.
    pub fn field_access(&self, entry: &FieldEntry) -> Option<AccessFlags> {
        self.fields.get(entry).copied()
    }

    /// Access flags of a declared class, field or method. Local variables
    /// have none.
    pub fn entry_access(&self, entry: &Entry) -> Option<AccessFlags> {
        match entry {
            Entry::Class(e) => self.class_access(e),
            Entry::Field(e) => self.field_access(e),
            Entry::Method(e) => self.method_access(e),
            Entry::LocalVariable(_) => None,
        }
    }

    /// Every declared class, in ingestion order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassEntry> {
        self.class_order.iter()
    }

    /// Every declared field, in ingestion order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldEntry> {
        self.field_order.iter()
    }

    /// Every declared method as a declaration entry carrying its flags, in
    /// ingestion order.
    pub fn methods(&self) -> impl Iterator<Item = &MethodEntry> {
        self.method_order.iter()
    }

    /// The declared methods of one class.
    pub fn methods_of<'a>(&'a self, class: &'a ClassEntry) -> impl Iterator<Item = &'a MethodEntry> {
        self.method_order.iter().filter(move |m| m.parent() == class)
    }

    /// The declared fields of one class.
    pub fn fields_of<'a>(&'a self, class: &'a ClassEntry) -> impl Iterator<Item = &'a FieldEntry> {
        self.field_order.iter().filter(move |f| f.parent() == class)
    }

    /// The method a local or anonymous class is declared in.
    pub fn enclosing_method(&self, class: &ClassEntry) -> Option<&EnclosingMethod> {
        self.enclosing_methods.get(class)
    }

    /// Whether the class is a local or anonymous class.
    pub fn is_anonymous_or_local(&self, class: &ClassEntry) -> bool {
        self.enclosing_methods.contains_key(class)
    }

    /// Number of declared classes.
    pub fn class_count(&self) -> usize {
        self.class_order.len()
    }

    /// Number of declared methods.
    pub fn method_count(&self) -> usize {
        self.method_order.len()
    }
}
