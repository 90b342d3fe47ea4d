//! Read-only indices over an ingested binary.
//!
//! [`JarIndex::index`] builds all of them in one go. Once built, the indices
//! never change and can be shared freely between threads.

use rayon::prelude::*;

use crate::analysis::{Analyzer, AnalyzerError, MethodAnalysis};
use crate::classfile::ClassDef;
use crate::resolver::IndexEntryResolver;

mod bridge;
mod entry;
mod inheritance;
mod reference;

pub use bridge::BridgeMethodIndex;
pub use entry::EntryIndex;
pub use inheritance::{ClassRelation, InheritanceIndex};
pub use reference::{EntryReference, ReferenceIndex};

/// All indices of one binary.
///
/// # Examples
///
/// ```
/// use jvm_remap::access::AccessFlags;
/// use jvm_remap::analysis::{Instruction, ValueKind};
/// use jvm_remap::classfile::{ClassBuilder, MethodDef};
/// use jvm_remap::entry::MethodEntry;
/// use jvm_remap::JarIndex;
///
/// let classes = vec![
///     ClassBuilder::new("a")
///         .method(MethodDef::new("m_1", "()V", AccessFlags::PUBLIC).with_code(vec![
///             Instruction::Return(None),
///         ]))
///         .build(),
///     ClassBuilder::new("b")
///         .extends("a")
///         .method(
///             MethodDef::new("m_2", "()V", AccessFlags::PUBLIC | AccessFlags::SYNTHETIC)
///                 .with_code(vec![
///                     Instruction::Load(ValueKind::Reference, 0),
///                     Instruction::invoke_virtual("b", "m_1", "()V"),
///                     Instruction::Return(None),
///                 ]),
///         )
///         .build(),
/// ];
///
/// let index = JarIndex::index(&classes);
/// let bridge = MethodEntry::parse("b", "m_2", "()V");
/// assert!(index.bridge_methods().is_bridge_method(&bridge));
/// assert_eq!(
///     index.bridge_methods().specialized_from_bridge(&bridge),
///     Some(&MethodEntry::parse("a", "m_1", "()V")),
/// );
/// ```
#[derive(Clone, Debug, Default)]
pub struct JarIndex {
    entries: EntryIndex,
    inheritance: InheritanceIndex,
    references: ReferenceIndex,
    bridges: BridgeMethodIndex,
    analysis_errors: Vec<AnalyzerError>,
}

impl JarIndex {
    /// Indexes a complete binary.
    ///
    /// Method bodies are analyzed in parallel. A method that fails to
    /// analyze contributes the edges found up to the failure and is listed
    /// in [`analysis_errors`](Self::analysis_errors).
    pub fn index(classes: &[ClassDef]) -> Self {
        let entries = EntryIndex::build(classes);
        let inheritance = InheritanceIndex::build(classes);

        let analyzer = Analyzer::new(&inheritance);
        let analyses: Vec<MethodAnalysis> = classes
            .par_iter()
            .flat_map_iter(|class| {
                class
                    .methods
                    .iter()
                    .map(|method| analyzer.analyze(&class.entry, method))
                    .collect::<Vec<_>>()
            })
            .collect();

        let analysis_errors: Vec<AnalyzerError> = analyses
            .iter()
            .filter_map(|analysis| analysis.error.clone())
            .collect();
        let references = ReferenceIndex::from_analyses(analyses);

        // nothing is known about bridges yet while canonicalizing
        let no_bridges = BridgeMethodIndex::default();
        let references = {
            let resolver = IndexEntryResolver::from_parts(&entries, &inheritance, &no_bridges);
            references.canonicalize(&resolver)
        };
        let bridges = BridgeMethodIndex::find(&entries, &inheritance, &references);

        log::debug!(
            "indexed {} classes, {} methods, {} references, {} bridges ({} analysis errors)",
            entries.class_count(),
            entries.method_count(),
            references.edge_count(),
            bridges.len(),
            analysis_errors.len(),
        );

        JarIndex {
            entries,
            inheritance,
            references,
            bridges,
            analysis_errors,
        }
    }

    /// Existence and access flags of declarations.
    pub fn entries(&self) -> &EntryIndex {
        &self.entries
    }

    /// The class hierarchy.
    pub fn inheritance(&self) -> &InheritanceIndex {
        &self.inheritance
    }

    /// Field and method references of method bodies.
    pub fn references(&self) -> &ReferenceIndex {
        &self.references
    }

    /// Bridge method pairs.
    pub fn bridge_methods(&self) -> &BridgeMethodIndex {
        &self.bridges
    }

    /// A resolver over these indices.
    pub fn entry_resolver(&self) -> IndexEntryResolver<'_> {
        IndexEntryResolver::new(self)
    }

    /// Methods whose bodies could only be analyzed partially.
    pub fn analysis_errors(&self) -> &[AnalyzerError] {
        &self.analysis_errors
    }
}
