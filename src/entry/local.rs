use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::entry::MethodEntry;

/// A local variable slot of a method. Arguments are locals too.
///
/// Locals are identified by their method and slot index; the name is only
/// carried along for display.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocalVariableEntry {
    parent: MethodEntry,
    index: u16,
    name: String,
    is_argument: bool,
}

impl LocalVariableEntry {
    /// Creates a local variable entry.
    pub fn new(
        parent: MethodEntry,
        index: u16,
        name: impl Into<String>,
        is_argument: bool,
    ) -> Self {
        Self {
            parent,
            index,
            name: name.into(),
            is_argument,
        }
    }

    /// The method the variable lives in.
    pub fn parent(&self) -> &MethodEntry {
        &self.parent
    }

    /// The local variable slot.
    pub fn index(&self) -> u16 {
        self.index
    }

    /// The variable name, possibly empty.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the slot holds a method argument rather than a body local.
    pub fn is_argument(&self) -> bool {
        self.is_argument
    }

    /// Returns a copy with a different name.
    pub fn with_name(&self, name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..self.clone()
        }
    }

    /// Returns a copy living in a different method.
    pub fn with_parent(&self, parent: MethodEntry) -> Self {
        Self {
            parent,
            ..self.clone()
        }
    }
}

impl PartialEq for LocalVariableEntry {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.parent == other.parent
    }
}

impl Eq for LocalVariableEntry {}

impl Hash for LocalVariableEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parent.hash(state);
        self.index.hash(state);
    }
}

impl PartialOrd for LocalVariableEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LocalVariableEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.parent, self.index).cmp(&(&other.parent, other.index))
    }
}

impl fmt::Display for LocalVariableEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.parent, self.index)?;
        if !self.name.is_empty() {
            write!(f, " {}", self.name)?;
        }
        Ok(())
    }
}
