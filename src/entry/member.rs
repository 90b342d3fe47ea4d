use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::access::AccessFlags;
use crate::descriptor::{MethodDescriptor, TypeDescriptor};
use crate::entry::ClassEntry;

/// A field of a class.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldEntry {
    parent: ClassEntry,
    name: String,
    desc: TypeDescriptor,
}

impl FieldEntry {
    /// Creates a field reference.
    pub fn new(parent: ClassEntry, name: impl Into<String>, desc: TypeDescriptor) -> Self {
        Self {
            parent,
            name: name.into(),
            desc,
        }
    }

    /// Creates a field reference from raw owner/name/descriptor strings, as
    /// found in a field instruction.
    pub fn parse(owner: &str, name: &str, desc: &str) -> Self {
        Self::new(ClassEntry::new(owner), name, TypeDescriptor::new(desc))
    }

    /// The declaring (or referenced) class.
    pub fn parent(&self) -> &ClassEntry {
        &self.parent
    }

    /// The field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field type.
    pub fn desc(&self) -> &TypeDescriptor {
        &self.desc
    }

    /// Returns a copy with a different name.
    pub fn with_name(&self, name: &str) -> Self {
        Self::new(self.parent.clone(), name, self.desc.clone())
    }

    /// Returns a copy owned by a different class.
    pub fn with_parent(&self, parent: ClassEntry) -> Self {
        Self::new(parent, self.name.clone(), self.desc.clone())
    }

    /// Returns a copy with a different type.
    pub fn with_desc(&self, desc: TypeDescriptor) -> Self {
        Self::new(self.parent.clone(), self.name.clone(), desc)
    }
}

impl fmt::Display for FieldEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}:{}", self.parent, self.name, self.desc)
    }
}

/// A method of a class.
///
/// A method created with [`MethodEntry::def`] denotes a declaration and
/// carries its access flags. A plain reference (a call site) carries none.
/// The flags never take part in equality, hashing or ordering: a declaration
/// and a reference to it are the same entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MethodEntry {
    parent: ClassEntry,
    name: String,
    desc: MethodDescriptor,
    #[serde(skip)]
    access: Option<AccessFlags>,
}

impl MethodEntry {
    /// Creates a method reference.
    pub fn new(parent: ClassEntry, name: impl Into<String>, desc: MethodDescriptor) -> Self {
        Self {
            parent,
            name: name.into(),
            desc,
            access: None,
        }
    }

    /// Creates a method declaration.
    pub fn def(
        parent: ClassEntry,
        name: impl Into<String>,
        desc: MethodDescriptor,
        access: AccessFlags,
    ) -> Self {
        Self {
            access: Some(access),
            ..Self::new(parent, name, desc)
        }
    }

    /// Creates a method reference from raw owner/name/descriptor strings, as
    /// found in an invoke instruction.
    pub fn parse(owner: &str, name: &str, desc: &str) -> Self {
        Self::new(ClassEntry::new(owner), name, MethodDescriptor::new(desc))
    }

    /// The declaring (or referenced) class.
    pub fn parent(&self) -> &ClassEntry {
        &self.parent
    }

    /// The method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The method descriptor.
    pub fn desc(&self) -> &MethodDescriptor {
        &self.desc
    }

    /// The access flags, if this entry denotes a declaration.
    pub fn access(&self) -> Option<AccessFlags> {
        self.access
    }

    /// `<init>` or `<clinit>`.
    pub fn is_constructor(&self) -> bool {
        self.name == "<init>" || self.name == "<clinit>"
    }

    /// Returns a copy with a different name. Access flags are kept.
    pub fn with_name(&self, name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..self.clone()
        }
    }

    /// Returns a copy owned by a different class. The copy is a plain
    /// reference: flags describe a declaration in one particular class.
    pub fn with_parent(&self, parent: ClassEntry) -> Self {
        Self::new(parent, self.name.clone(), self.desc.clone())
    }

    /// Returns a copy with a different descriptor.
    pub fn with_desc(&self, desc: MethodDescriptor) -> Self {
        Self {
            desc,
            ..self.clone()
        }
    }

    /// Drops the access flags.
    pub fn to_reference(&self) -> Self {
        Self {
            access: None,
            ..self.clone()
        }
    }

    fn key(&self) -> (&ClassEntry, &str, &MethodDescriptor) {
        (&self.parent, &self.name, &self.desc)
    }
}

impl PartialEq for MethodEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for MethodEntry {}

impl Hash for MethodEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for MethodEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MethodEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for MethodEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.parent, self.name, self.desc)
    }
}
