//! The mutable side of a session: mappings on top of an immutable index.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::entry::Entry;
use crate::index::JarIndex;
use crate::mapping::{
    DeltaTrackingTree, Dropped, EntryMapping, EntryTree, MappingDelta, MappingValidator,
    MappingsChecker, ValidationError,
};
use crate::resolver::{EntryResolver, IndexEntryResolver, ResolutionStrategy};
use crate::services::{NameProposalService, ObfuscationTestService};
use crate::translate::{MappingTranslator, TranslateResult, Translator};

static NO_MAPPING: EntryMapping = EntryMapping::DEFAULT;

/// Applies renames to a binary and answers what entries are called.
///
/// Renames are stored under the root declaration of every entry that must
/// carry the same name, so overriding methods, bridge pairs and the
/// parameters of both always agree.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use jvm_remap::access::AccessFlags;
/// use jvm_remap::classfile::{ClassBuilder, MethodDef};
/// use jvm_remap::entry::{Entry, MethodEntry};
/// use jvm_remap::mapping::{EntryMapping, EntryTree};
/// use jvm_remap::remapper::EntryRemapper;
/// use jvm_remap::JarIndex;
///
/// let index = JarIndex::index(&[
///     ClassBuilder::new("a")
///         .method(MethodDef::new("m_1", "()V", AccessFlags::PUBLIC))
///         .build(),
///     ClassBuilder::new("b")
///         .extends("a")
///         .method(MethodDef::new("m_1", "()V", AccessFlags::PUBLIC))
///         .build(),
/// ]);
/// let mut remapper = EntryRemapper::new(Arc::new(index), EntryTree::new());
///
/// let overridden = Entry::Method(MethodEntry::parse("b", "m_1", "()V"));
/// remapper.put_mapping(&overridden, EntryMapping::new("tick")).unwrap();
///
/// let declared = Entry::Method(MethodEntry::parse("a", "m_1", "()V"));
/// assert_eq!(remapper.deobfuscate_name(&declared).into_value(), "tick");
/// ```
pub struct EntryRemapper {
    index: Arc<JarIndex>,
    mappings: DeltaTrackingTree,
    proposers: Vec<Arc<dyn NameProposalService>>,
    obfuscation_tests: Vec<Arc<dyn ObfuscationTestService>>,
}

impl EntryRemapper {
    /// Creates a remapper over existing mappings, without services.
    pub fn new(index: Arc<JarIndex>, mappings: EntryTree<EntryMapping>) -> Self {
        Self {
            index,
            mappings: DeltaTrackingTree::new(mappings),
            proposers: Vec::new(),
            obfuscation_tests: Vec::new(),
        }
    }

    /// Creates a remapper without any mappings.
    pub fn empty(index: Arc<JarIndex>) -> Self {
        Self::new(index, EntryTree::new())
    }

    /// Sets the name proposal services, in query order.
    pub fn with_name_proposers(mut self, proposers: Vec<Arc<dyn NameProposalService>>) -> Self {
        self.proposers = proposers;
        self
    }

    /// Sets the obfuscation test services, in query order.
    pub fn with_obfuscation_tests(mut self, tests: Vec<Arc<dyn ObfuscationTestService>>) -> Self {
        self.obfuscation_tests = tests;
        self
    }

    /// The index of the binary.
    pub fn index(&self) -> &JarIndex {
        &self.index
    }

    /// A resolver over the index of the binary.
    pub fn resolver(&self) -> IndexEntryResolver<'_> {
        self.index.entry_resolver()
    }

    /// The current mappings, keyed by obfuscated root declarations.
    pub fn mappings(&self) -> &EntryTree<EntryMapping> {
        self.mappings.tree()
    }

    /// The mapping in effect for an entry. Entries without one get
    /// [`EntryMapping::DEFAULT`].
    pub fn mapping(&self, entry: &Entry) -> &EntryMapping {
        let resolved = self
            .resolver()
            .resolve_first_entry(entry, ResolutionStrategy::ResolveRoot)
            .unwrap_or_else(|| entry.clone());
        self.mappings
            .get(&resolved)
            .unwrap_or(&NO_MAPPING)
    }

    /// Replaces every mapping. `None` installs an empty tree.
    ///
    /// The new tree forms a fresh snapshot: no changes are pending
    /// afterwards.
    pub fn set_mappings(&mut self, mappings: Option<EntryTree<EntryMapping>>) {
        self.mappings = DeltaTrackingTree::new(mappings.unwrap_or_default());
    }

    /// Checks a mapping before it is applied.
    ///
    /// Only renames are checked; changing documentation is always allowed.
    pub fn validate_put_mapping(
        &self,
        entry: &Entry,
        mapping: &EntryMapping,
    ) -> Result<(), ValidationError> {
        if !self.is_rename(entry, mapping) {
            return Ok(());
        }
        match mapping.target_name() {
            Some(name) => MappingValidator::new(&self.index, self.mappings()).validate_rename(entry, name),
            None => Ok(()),
        }
    }

    /// Validates and applies a mapping.
    pub fn put_mapping(&mut self, entry: &Entry, mapping: EntryMapping) -> Result<(), ValidationError> {
        self.validate_put_mapping(entry, &mapping)?;
        self.apply_mapping(entry, mapping);
        Ok(())
    }

    /// Removes the name and documentation of an entry and of everything
    /// renamed along with it.
    pub fn remove_mapping(&mut self, entry: &Entry) {
        self.apply_mapping(entry, EntryMapping::DEFAULT);
    }

    fn is_rename(&self, entry: &Entry, mapping: &EntryMapping) -> bool {
        self.mapping(entry).target_name() != mapping.target_name()
    }

    fn apply_mapping(&mut self, entry: &Entry, mapping: EntryMapping) {
        let targets = if self.is_rename(entry, &mapping) {
            self.rename_targets(entry)
        } else {
            self.closest_declarations(entry)
        };

        for target in targets {
            // a no-op mapping is stored as no mapping at all
            if mapping.is_empty_for(&target) {
                self.mappings.remove(&target);
            } else {
                self.mappings.insert(target, mapping.clone());
            }
        }
    }

    /// The root declarations of everything that must share a name with
    /// `entry`.
    fn rename_targets(&self, entry: &Entry) -> BTreeSet<Entry> {
        let resolver = self.resolver();
        let mut targets = BTreeSet::new();
        for equivalent in resolver.resolve_equivalent_entries(entry) {
            let roots = resolver.resolve_entry(&equivalent, ResolutionStrategy::ResolveRoot);
            if roots.is_empty() {
                targets.insert(equivalent);
            } else {
                targets.extend(roots);
            }
        }
        targets
    }

    fn closest_declarations(&self, entry: &Entry) -> BTreeSet<Entry> {
        let resolved = self
            .resolver()
            .resolve_entry(entry, ResolutionStrategy::ResolveClosest);
        if resolved.is_empty() {
            BTreeSet::from([entry.clone()])
        } else {
            resolved
        }
    }

    /// The name an entry is shown under.
    ///
    /// An entry any obfuscation test recognizes keeps its name. Otherwise
    /// the first name proposal wins, then the stored mapping.
    pub fn deobfuscate_name(&self, entry: &Entry) -> TranslateResult<String> {
        if self
            .obfuscation_tests
            .iter()
            .any(|test| test.test_deobfuscated(entry))
        {
            return TranslateResult::Deobfuscated(entry.name().to_owned());
        }
        if let Some(name) = self
            .proposers
            .iter()
            .find_map(|proposer| proposer.propose_name(entry, self))
        {
            return TranslateResult::Proposed(name);
        }
        match self.mapping(entry).target_name() {
            Some(name) => TranslateResult::Deobfuscated(name.to_owned()),
            None => TranslateResult::Obfuscated(entry.name().to_owned()),
        }
    }

    /// Translates an entry and its ancestry.
    pub fn deobfuscate(&self, entry: &Entry) -> TranslateResult<Entry> {
        self.translate_entry(entry)
    }

    /// A translator over the stored mappings alone, ignoring services.
    pub fn deobfuscator(&self) -> MappingTranslator<'_, IndexEntryResolver<'_>> {
        MappingTranslator::new(self.mappings(), self.resolver())
    }

    /// Whether nothing gives the entry a readable name.
    pub fn is_obfuscated(&self, entry: &Entry) -> bool {
        if self
            .obfuscation_tests
            .iter()
            .any(|test| test.test_deobfuscated(entry))
        {
            return false;
        }
        if self
            .proposers
            .iter()
            .any(|proposer| proposer.propose_name(entry, self).is_some())
        {
            return false;
        }
        self.mapping(entry)
            .target_name()
            .map_or(true, |name| name.is_empty() || name == entry.name())
    }

    /// Drops every mapping that is broken or empty, recording the removals
    /// as changes.
    pub fn drop_mappings(&mut self) -> Dropped {
        let dropped = MappingsChecker::new(self.index.entries()).check(self.mappings.tree());
        dropped.apply(&mut self.mappings);
        dropped
    }

    /// Hands out the changes since the last call and starts a new window.
    pub fn take_changes(&mut self) -> MappingDelta {
        self.mappings.take_changes()
    }
}

impl Translator for EntryRemapper {
    fn translate_name(&self, entry: &Entry) -> TranslateResult<String> {
        self.deobfuscate_name(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessFlags;
    use crate::classfile::{ClassBuilder, MethodDef};
    use crate::entry::{ClassEntry, FieldEntry, LocalVariableEntry, MethodEntry};

    struct Named;

    impl ObfuscationTestService for Named {
        fn test_deobfuscated(&self, entry: &Entry) -> bool {
            entry.name().len() > 3
        }
    }

    struct Propose;

    impl NameProposalService for Propose {
        fn propose_name(&self, entry: &Entry, _: &EntryRemapper) -> Option<String> {
            (entry.name() == "p").then(|| "proposed".to_owned())
        }
    }

    fn remapper() -> EntryRemapper {
        let index = JarIndex::index(&[
            ClassBuilder::new("a")
                .field("f", "I", AccessFlags::PRIVATE)
                .field("p", "I", AccessFlags::PRIVATE)
                .method(MethodDef::new("m", "(I)V", AccessFlags::PUBLIC))
                .build(),
            ClassBuilder::new("b")
                .extends("a")
                .method(MethodDef::new("m", "(I)V", AccessFlags::PUBLIC))
                .build(),
        ]);
        EntryRemapper::empty(Arc::new(index))
    }

    #[test]
    fn test_rename_goes_to_root() {
        let mut remapper = remapper();
        let child = Entry::Method(MethodEntry::parse("b", "m", "(I)V"));
        remapper.put_mapping(&child, EntryMapping::new("run")).unwrap();

        let root = Entry::Method(MethodEntry::parse("a", "m", "(I)V"));
        assert!(remapper.mappings().contains(&root));
        assert!(!remapper.mappings().contains(&child));
        assert_eq!(remapper.deobfuscate_name(&child).into_value(), "run");

        // parameters follow their method
        let arg = Entry::LocalVariable(LocalVariableEntry::new(
            MethodEntry::parse("b", "m", "(I)V"),
            1,
            "",
            true,
        ));
        remapper.put_mapping(&arg, EntryMapping::new("times")).unwrap();
        let root_arg = Entry::LocalVariable(LocalVariableEntry::new(
            MethodEntry::parse("a", "m", "(I)V"),
            1,
            "",
            true,
        ));
        assert_eq!(remapper.mapping(&root_arg).target_name(), Some("times"));
    }

    #[test]
    fn test_docs_go_to_closest() {
        let mut remapper = remapper();
        let child = Entry::Method(MethodEntry::parse("b", "m", "(I)V"));
        let docs = EntryMapping::DEFAULT.with_javadoc(Some("Runs.".into()));
        remapper.put_mapping(&child, docs.clone()).unwrap();
        assert_eq!(remapper.mappings().get(&child), Some(&docs));
    }

    #[test]
    fn test_remove_and_reject() {
        let mut remapper = remapper();
        let f = Entry::Field(FieldEntry::parse("a", "f", "I"));
        let p = Entry::Field(FieldEntry::parse("a", "p", "I"));
        remapper.put_mapping(&f, EntryMapping::new("count")).unwrap();
        assert!(remapper.put_mapping(&p, EntryMapping::new("count")).is_err());
        assert!(remapper.put_mapping(&p, EntryMapping::new("class")).is_err());

        remapper.remove_mapping(&f);
        assert!(remapper.mappings().is_empty());
        assert_eq!(remapper.take_changes().changes().len(), 1);
    }

    #[test]
    fn test_precedence() {
        let mut remapper = remapper()
            .with_obfuscation_tests(vec![Arc::new(Named)])
            .with_name_proposers(vec![Arc::new(Propose)]);
        let f = Entry::Field(FieldEntry::parse("a", "f", "I"));
        let p = Entry::Field(FieldEntry::parse("a", "p", "I"));
        let class = Entry::Class(ClassEntry::new("java/lang/String"));
        remapper.put_mapping(&f, EntryMapping::new("mapped")).unwrap();
        remapper.put_mapping(&p, EntryMapping::new("ignored")).unwrap();

        assert_eq!(
            remapper.deobfuscate_name(&class),
            TranslateResult::Deobfuscated("java/lang/String".into())
        );
        assert_eq!(
            remapper.deobfuscate_name(&p),
            TranslateResult::Proposed("proposed".into())
        );
        assert_eq!(
            remapper.deobfuscate_name(&f),
            TranslateResult::Deobfuscated("mapped".into())
        );
        assert!(!remapper.is_obfuscated(&f));
        assert!(!remapper.is_obfuscated(&class));
        assert!(remapper.is_obfuscated(&Entry::Field(FieldEntry::parse("a", "g", "I"))));
    }

    #[test]
    fn test_set_and_drop() {
        let mut remapper = remapper();
        let mut tree = EntryTree::new();
        tree.insert(
            Entry::Field(FieldEntry::parse("a", "gone", "I")),
            EntryMapping::new("x"),
        );
        tree.insert(Entry::Class(ClassEntry::new("a")), EntryMapping::new("a"));
        remapper.set_mappings(Some(tree));

        assert_eq!(remapper.drop_mappings().len(), 2);
        assert!(remapper.drop_mappings().is_empty());
        assert_eq!(remapper.take_changes().changes().len(), 2);

        remapper.set_mappings(None);
        assert!(remapper.mappings().is_empty());
    }
}
