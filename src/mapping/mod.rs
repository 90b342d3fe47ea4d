//! The canonical store of obfuscated to readable names.
//!
//! Mappings are kept in an [`EntryTree`] keyed by the obfuscated entry. The
//! [`DeltaTrackingTree`] variant additionally remembers which entries changed
//! since the last snapshot. [`MappingsChecker`] and [`MappingValidator`]
//! guard the contents of a tree against the indexed binary.

use serde::{Deserialize, Serialize};

use crate::entry::Entry;

mod checker;
mod delta;
mod tree;
mod validator;

pub use checker::{DropReason, Dropped, MappingsChecker};
pub use delta::{DeltaTrackingTree, MappingDelta};
pub use tree::{EntryTree, EntryTreeNode};
pub use validator::{validate_identifier, MappingValidator, ValidationError};

/// The mapping of a single entry.
///
/// A mapping may carry a new name, documentation, both, or neither. One that
/// carries neither is a no-op.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    javadoc: Option<String>,
}

impl EntryMapping {
    /// The mapping that changes nothing.
    pub const DEFAULT: EntryMapping = EntryMapping {
        target_name: None,
        javadoc: None,
    };

    /// Creates a mapping to a new name.
    pub fn new(target_name: impl Into<String>) -> Self {
        Self {
            target_name: Some(target_name.into()),
            javadoc: None,
        }
    }

    /// The new name, if any.
    pub fn target_name(&self) -> Option<&str> {
        self.target_name.as_deref()
    }

    /// The attached documentation, if any.
    pub fn javadoc(&self) -> Option<&str> {
        self.javadoc.as_deref()
    }

    /// Returns a copy with a different target name.
    pub fn with_name(&self, target_name: Option<String>) -> Self {
        Self {
            target_name,
            javadoc: self.javadoc.clone(),
        }
    }

    /// Returns a copy with different documentation.
    pub fn with_javadoc(&self, javadoc: Option<String>) -> Self {
        Self {
            target_name: self.target_name.clone(),
            javadoc,
        }
    }

    /// Whether applying this mapping to `entry` changes nothing.
    pub fn is_empty_for(&self, entry: &Entry) -> bool {
        self.javadoc.is_none()
            && self
                .target_name
                .as_deref()
                .map_or(true, |name| name == entry.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::ClassEntry;

    #[test]
    fn test_empty_mapping() {
        let entry = Entry::Class(ClassEntry::new("a"));
        assert!(EntryMapping::DEFAULT.is_empty_for(&entry));
        assert!(EntryMapping::new("a").is_empty_for(&entry));
        assert!(!EntryMapping::new("b").is_empty_for(&entry));
        assert!(!EntryMapping::DEFAULT
            .with_javadoc(Some("docs".into()))
            .is_empty_for(&entry));
    }

    #[test]
    fn test_serialize_skips_missing() {
        let json = serde_json::to_string(&EntryMapping::new("Foo")).unwrap();
        assert_eq!(json, r#"{"target_name":"Foo"}"#);
        let back: EntryMapping = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EntryMapping::new("Foo"));
    }
}
