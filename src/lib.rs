//! This crate resolves, renames and translates the symbols of obfuscated JVM
//! binaries.
//!
//! A binary is handed over as plain [`ClassDef`](classfile::ClassDef)s and
//! indexed once into a [`JarIndex`]. The index answers where members are
//! declared, which methods override each other and which bridge methods
//! stand in for which specialized methods. An [`EntryRemapper`] stores
//! renames on top of it, propagating every rename to all entries that must
//! keep the same name.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use jvm_remap::access::AccessFlags;
//! use jvm_remap::classfile::{ClassBuilder, MethodDef};
//! use jvm_remap::entry::{ClassEntry, Entry, MethodEntry};
//! use jvm_remap::format::MappingFormat;
//! use jvm_remap::{EntryRemapper, JarIndex, Translator};
//!
//! let index = JarIndex::index(&[
//!     ClassBuilder::new("a")
//!         .method(MethodDef::new("b", "(La;)V", AccessFlags::PUBLIC))
//!         .build(),
//!     ClassBuilder::new("c")
//!         .extends("a")
//!         .method(MethodDef::new("b", "(La;)V", AccessFlags::PUBLIC))
//!         .build(),
//! ]);
//!
//! let mappings = MappingFormat::TinyFile
//!     .read_str("v1\tofficial\tnamed\nCLASS\ta\tcom/example/Shape\nMETHOD\ta\t(La;)V\tb\tmerge\n")
//!     .unwrap();
//! let remapper = EntryRemapper::new(Arc::new(index), mappings);
//!
//! // the override in the subclass follows the declaration it overrides
//! let method = MethodEntry::parse("c", "b", "(La;)V");
//! assert_eq!(
//!     remapper.translate_method(&method).to_string(),
//!     "c.merge(Lcom/example/Shape;)V",
//! );
//! assert_eq!(
//!     remapper.translate_class(&ClassEntry::new("a")).full_name(),
//!     "com/example/Shape",
//! );
//! ```

#![warn(missing_docs)]

pub mod access;
pub mod analysis;
pub mod classfile;
pub mod config;
pub mod descriptor;
pub mod entry;
pub mod format;
pub mod index;
pub mod mapping;
pub mod progress;
pub mod project;
pub mod remapper;
pub mod resolver;
pub mod services;
pub mod translate;

pub use index::JarIndex;
pub use mapping::{EntryMapping, EntryTree};
pub use remapper::EntryRemapper;
pub use resolver::{EntryResolver, ResolutionStrategy};
pub use translate::{TranslateResult, Translator};

#[cfg(feature = "uuid")]
use uuid::Uuid;

#[cfg(feature = "uuid")]
lazy_static::lazy_static! {
    static ref BINARY_NAMESPACE: Uuid = Uuid::new_v5(&Uuid::NAMESPACE_DNS, b"jvm-remap");
}

/// Calculates the UUID of an ingested binary from its bytes.
#[cfg(feature = "uuid")]
pub fn binary_uuid(binary: &[u8]) -> Uuid {
    Uuid::new_v5(&BINARY_NAMESPACE, binary)
}
