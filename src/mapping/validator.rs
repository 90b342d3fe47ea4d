use std::collections::BTreeSet;

use thiserror::Error;

use crate::entry::{Entry, EntryKind};
use crate::index::JarIndex;
use crate::resolver::{EntryResolver, ResolutionStrategy};

use super::{EntryMapping, EntryTree};

const RESERVED_WORDS: &[&str] = &[
    "_", "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class",
    "const", "continue", "default", "do", "double", "else", "enum", "extends", "false", "final",
    "finally", "float", "for", "goto", "if", "implements", "import", "instanceof", "int",
    "interface", "long", "native", "new", "null", "package", "private", "protected", "public",
    "return", "short", "static", "strictfp", "super", "switch", "synchronized", "this", "throw",
    "throws", "transient", "true", "try", "void", "volatile", "while",
];

/// A rename that would produce invalid or ambiguous code.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The name is empty, or a package segment of it is.
    #[error("name must not be empty")]
    EmptyName,
    /// The name contains a character not allowed in Java identifiers.
    #[error("illegal character {character:?} in identifier {name:?}")]
    IllegalIdentifier {
        /// The rejected name.
        name: String,
        /// The first offending character.
        character: char,
    },
    /// The name is a Java keyword or literal.
    #[error("{0:?} is a reserved word")]
    ReservedIdentifier(String),
    /// Another entry that could clash already carries the name.
    #[error("name {name:?} is already used by {conflicting}")]
    NonUniqueName {
        /// The rejected name.
        name: String,
        /// The entry already carrying the name.
        conflicting: Entry,
    },
}

/// Checks renames against Java naming rules and against the names already
/// given to related entries.
pub struct MappingValidator<'a> {
    index: &'a JarIndex,
    mappings: &'a EntryTree<EntryMapping>,
}

impl<'a> MappingValidator<'a> {
    /// Creates a validator for the mappings of a binary.
    pub fn new(index: &'a JarIndex, mappings: &'a EntryTree<EntryMapping>) -> Self {
        Self { index, mappings }
    }

    /// Checks whether `entry`, and everything renamed along with it, may be
    /// called `name`.
    pub fn validate_rename(&self, entry: &Entry, name: &str) -> Result<(), ValidationError> {
        validate_identifier(entry, name)?;

        let resolver = self.index.entry_resolver();
        let equivalent = resolver.resolve_equivalent_entries(entry);
        for renamed in &equivalent {
            for candidate in self.related_entries(renamed) {
                if equivalent.contains(&candidate) {
                    continue;
                }
                if self.mapped_name(&candidate) != name {
                    continue;
                }
                if renamed.can_conflict_with(&candidate, |e| self.is_static(e)) {
                    return Err(ValidationError::NonUniqueName {
                        name: name.to_owned(),
                        conflicting: candidate,
                    });
                }
                if renamed.can_shadow(&candidate) {
                    log::debug!("{} renamed to {} shadows {}", renamed, name, candidate);
                }
            }
        }
        Ok(())
    }

    /// The current name of an entry, mapped or not.
    fn mapped_name(&self, entry: &Entry) -> String {
        let resolved = self
            .index
            .entry_resolver()
            .resolve_first_entry(entry, ResolutionStrategy::ResolveRoot)
            .unwrap_or_else(|| entry.clone());
        self.mappings
            .get(&resolved)
            .and_then(EntryMapping::target_name)
            .unwrap_or_else(|| entry.name())
            .to_owned()
    }

    fn is_static(&self, entry: &Entry) -> bool {
        self.index
            .entries()
            .entry_access(entry)
            .map_or(false, |access| access.is_static())
    }

    /// Entries that might clash with `entry` if they shared its name.
    fn related_entries(&self, entry: &Entry) -> BTreeSet<Entry> {
        let entries = self.index.entries();
        match entry {
            Entry::Class(_) => entries
                .classes()
                .map(|class| Entry::Class(class.clone()))
                .filter(|class| class != entry)
                .collect(),
            Entry::Field(_) | Entry::Method(_) => {
                let inheritance = self.index.inheritance();
                let owner = entry.containing_class();
                let mut classes = vec![owner.clone()];
                classes.extend(inheritance.ancestors(owner));
                classes.extend(inheritance.descendants(owner));

                let mut related = BTreeSet::new();
                for class in &classes {
                    if entry.kind() == EntryKind::Field {
                        related.extend(entries.fields_of(class).cloned().map(Entry::Field));
                    } else {
                        related.extend(
                            entries
                                .methods_of(class)
                                .map(|method| Entry::Method(method.to_reference())),
                        );
                    }
                }
                related.remove(entry);
                related
            }
            Entry::LocalVariable(_) => self.mappings.siblings(entry).into_iter().collect(),
        }
    }
}

/// Checks `name` against the Java identifier rules for the kind of `entry`.
///
/// Top-level classes may carry a package: every `/`-separated segment must be
/// an identifier.
pub fn validate_identifier(entry: &Entry, name: &str) -> Result<(), ValidationError> {
    match entry {
        Entry::Class(class) if !class.is_inner() => {
            for segment in name.split('/') {
                validate_segment(name, segment)?;
            }
            Ok(())
        }
        _ => validate_segment(name, name),
    }
}

fn validate_segment(name: &str, segment: &str) -> Result<(), ValidationError> {
    let mut chars = segment.chars();
    let Some(first) = chars.next() else {
        return Err(ValidationError::EmptyName);
    };
    if !is_identifier_start(first) {
        return Err(ValidationError::IllegalIdentifier {
            name: name.to_owned(),
            character: first,
        });
    }
    if let Some(character) = chars.find(|c| !is_identifier_part(*c)) {
        return Err(ValidationError::IllegalIdentifier {
            name: name.to_owned(),
            character,
        });
    }
    if RESERVED_WORDS.contains(&segment) {
        return Err(ValidationError::ReservedIdentifier(segment.to_owned()));
    }
    Ok(())
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}
