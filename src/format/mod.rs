//! Reading and writing mapping files.
//!
//! Every format is read into, and written from, an
//! [`EntryTree<EntryMapping>`] keyed by obfuscated entries.

use std::fmt;
use std::fs;
use std::io;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::descriptor::DescriptorError;
use crate::mapping::{EntryMapping, EntryTree};

mod proguard;
mod srg;
mod tiny;

pub use proguard::ProguardRecord;

/// A mapping file format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MappingFormat {
    /// Tiny v1, tab separated.
    TinyFile,
    /// SRG, as written for the Forge toolchain.
    SrgFile,
    /// Proguard and R8 `mapping.txt` files.
    Proguard,
}

impl MappingFormat {
    /// Whether mappings can be read from this format.
    pub fn can_read(self) -> bool {
        matches!(self, Self::TinyFile | Self::Proguard)
    }

    /// Whether mappings can be written in this format.
    pub fn can_write(self) -> bool {
        matches!(self, Self::TinyFile | Self::SrgFile)
    }

    /// Reads a mapping file.
    pub fn read(self, path: &Path) -> Result<EntryTree<EntryMapping>, MappingParseError> {
        if !self.can_read() {
            return Err(MappingParseError::new(0, ParseErrorKind::Unsupported(self)).at(path));
        }
        let source = fs::read_to_string(path)
            .map_err(|err| MappingParseError::new(0, ParseErrorKind::Io(err)).at(path))?;
        self.read_str(&source).map_err(|err| err.at(path))
    }

    /// Reads mappings from a string.
    pub fn read_str(self, source: &str) -> Result<EntryTree<EntryMapping>, MappingParseError> {
        match self {
            Self::TinyFile => tiny::read(source),
            Self::Proguard => proguard::read(source),
            Self::SrgFile => Err(MappingParseError::new(0, ParseErrorKind::Unsupported(self))),
        }
    }

    /// Writes mappings to a file, replacing it.
    pub fn write(self, mappings: &EntryTree<EntryMapping>, path: &Path) -> Result<(), MappingWriteError> {
        let contents = self.write_string(mappings)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Renders mappings as a string.
    pub fn write_string(self, mappings: &EntryTree<EntryMapping>) -> Result<String, MappingWriteError> {
        match self {
            Self::TinyFile => Ok(tiny::write(mappings)),
            Self::SrgFile => Ok(srg::write(mappings)),
            Self::Proguard => Err(MappingWriteError::Unsupported(self)),
        }
    }
}

impl fmt::Display for MappingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TinyFile => "tiny",
            Self::SrgFile => "srg",
            Self::Proguard => "proguard",
        })
    }
}

/// Error when reading a mapping file.
#[derive(Debug, Error)]
#[error("{}line {line}: {kind}", .path.as_ref().map(|p| format!("{}: ", p.display())).unwrap_or_default())]
pub struct MappingParseError {
    path: Option<PathBuf>,
    line: usize,
    #[source]
    kind: ParseErrorKind,
}

impl MappingParseError {
    pub(crate) fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self {
            path: None,
            line,
            kind,
        }
    }

    fn at(mut self, path: &Path) -> Self {
        self.path = Some(path.to_owned());
        self
    }

    /// The file being read, if reading from a file.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The offending line, 1-based. `0` when no line is to blame.
    pub fn line(&self) -> usize {
        self.line
    }

    /// The specific error.
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }
}

/// The specific error when reading a mapping file.
#[derive(Debug, Error)]
pub enum ParseErrorKind {
    /// The first line is not a supported header.
    #[error("unsupported header `{0}`")]
    BadHeader(String),
    /// The record key is not part of the format.
    #[error("unknown record key `{0}`")]
    UnknownKey(String),
    /// The record has too few columns.
    #[error("expected {expected} columns, found {found}")]
    MissingColumn {
        /// Columns the record needs.
        expected: usize,
        /// Columns present.
        found: usize,
    },
    /// The line does not have the shape of any record.
    #[error("line is not a valid {0} record")]
    Malformed(MappingFormat),
    /// A descriptor column does not parse.
    #[error(transparent)]
    BadDescriptor(#[from] DescriptorError),
    /// An integer column does not parse.
    #[error("invalid integer: {0}")]
    BadInteger(#[from] ParseIntError),
    /// A JSON metadata comment does not parse.
    #[error("invalid metadata: {0}")]
    BadMetadata(#[from] serde_json::Error),
    /// The file cannot be read.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The format cannot be read.
    #[error("reading {0} mappings is not supported")]
    Unsupported(MappingFormat),
}

/// Error when writing a mapping file.
#[derive(Debug, Error)]
pub enum MappingWriteError {
    /// The file cannot be written.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The format cannot be written.
    #[error("writing {0} mappings is not supported")]
    Unsupported(MappingFormat),
}
