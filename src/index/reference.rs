use std::collections::{BTreeSet, HashMap};

use crate::analysis::{Lambda, MethodAnalysis, ReferenceTargetType};
use crate::entry::{Entry, FieldEntry, MethodEntry};
use crate::resolver::{EntryResolver, ResolutionStrategy};

static NO_METHODS: BTreeSet<MethodEntry> = BTreeSet::new();
static NO_FIELDS: BTreeSet<FieldEntry> = BTreeSet::new();

/// A use of an entry inside a method body.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntryReference<E> {
    /// The referenced entry.
    pub entry: E,
    /// The method containing the reference.
    pub context: MethodEntry,
    /// What the referencing instruction dispatches on.
    pub target_type: ReferenceTargetType,
}

/// Which fields and methods every method body references, and the reverse.
#[derive(Clone, Debug, Default)]
pub struct ReferenceIndex {
    method_references: HashMap<MethodEntry, BTreeSet<MethodEntry>>,
    field_references: HashMap<MethodEntry, BTreeSet<FieldEntry>>,
    references_to_methods: HashMap<MethodEntry, Vec<EntryReference<MethodEntry>>>,
    references_to_fields: HashMap<FieldEntry, Vec<EntryReference<FieldEntry>>>,
    lambdas: HashMap<MethodEntry, Vec<Lambda>>,
}

impl ReferenceIndex {
    /// Merges per-method analysis results.
    pub fn from_analyses<I>(analyses: I) -> Self
    where
        I: IntoIterator<Item = MethodAnalysis>,
    {
        let mut index = ReferenceIndex::default();
        for analysis in analyses {
            let caller = analysis.method;
            for edge in analysis.references {
                index.add_reference(&caller, edge.target, edge.target_type);
            }
            for edge in analysis.lambdas {
                // the implementation is called from the creating method
                index.add_reference(
                    &caller,
                    edge.lambda.implementation.target.clone(),
                    edge.target_type,
                );
                index
                    .lambdas
                    .entry(caller.clone())
                    .or_default()
                    .push(edge.lambda);
            }
        }
        index
    }

    fn add_reference(&mut self, caller: &MethodEntry, target: Entry, target_type: ReferenceTargetType) {
        match target {
            Entry::Method(method) => {
                self.method_references
                    .entry(caller.clone())
                    .or_default()
                    .insert(method.clone());
                self.references_to_methods
                    .entry(method.clone())
                    .or_default()
                    .push(EntryReference {
                        entry: method,
                        context: caller.clone(),
                        target_type,
                    });
            }
            Entry::Field(field) => {
                self.field_references
                    .entry(caller.clone())
                    .or_default()
                    .insert(field.clone());
                self.references_to_fields
                    .entry(field.clone())
                    .or_default()
                    .push(EntryReference {
                        entry: field,
                        context: caller.clone(),
                        target_type,
                    });
            }
            _ => {}
        }
    }

    /// Rewrites every referenced entry to its closest declaration, so that
    /// a call through a subclass counts as a call to the inherited method.
    pub fn canonicalize<R: EntryResolver + ?Sized>(self, resolver: &R) -> Self {
        let method = |m: MethodEntry| match resolver
            .resolve_first_entry(&Entry::Method(m.clone()), ResolutionStrategy::ResolveClosest)
        {
            Some(Entry::Method(resolved)) => resolved,
            _ => m,
        };
        let field = |f: FieldEntry| match resolver
            .resolve_first_entry(&Entry::Field(f.clone()), ResolutionStrategy::ResolveClosest)
        {
            Some(Entry::Field(resolved)) => resolved,
            _ => f,
        };

        let mut index = ReferenceIndex {
            lambdas: self.lambdas,
            ..ReferenceIndex::default()
        };
        for (caller, callees) in self.method_references {
            index
                .method_references
                .insert(caller, callees.into_iter().map(&method).collect());
        }
        for (caller, fields) in self.field_references {
            index
                .field_references
                .insert(caller, fields.into_iter().map(&field).collect());
        }
        for references in self.references_to_methods.into_values() {
            for mut reference in references {
                reference.entry = method(reference.entry);
                index
                    .references_to_methods
                    .entry(reference.entry.clone())
                    .or_default()
                    .push(reference);
            }
        }
        for references in self.references_to_fields.into_values() {
            for mut reference in references {
                reference.entry = field(reference.entry);
                index
                    .references_to_fields
                    .entry(reference.entry.clone())
                    .or_default()
                    .push(reference);
            }
        }
        index
    }

    /// The methods a method body calls, including lambda implementations.
    pub fn methods_referenced_by(&self, method: &MethodEntry) -> &BTreeSet<MethodEntry> {
        self.method_references.get(method).unwrap_or(&NO_METHODS)
    }

    /// The fields a method body accesses.
    pub fn fields_referenced_by(&self, method: &MethodEntry) -> &BTreeSet<FieldEntry> {
        self.field_references.get(method).unwrap_or(&NO_FIELDS)
    }

    /// Every call site of a method.
    pub fn references_to_method(&self, method: &MethodEntry) -> &[EntryReference<MethodEntry>] {
        self.references_to_methods
            .get(method)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every access of a field.
    pub fn references_to_field(&self, field: &FieldEntry) -> &[EntryReference<FieldEntry>] {
        self.references_to_fields
            .get(field)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The lambdas created in a method body.
    pub fn lambdas_in(&self, method: &MethodEntry) -> &[Lambda] {
        self.lambdas.get(method).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of reference edges.
    pub fn edge_count(&self) -> usize {
        self.method_references.values().map(BTreeSet::len).sum::<usize>()
            + self.field_references.values().map(BTreeSet::len).sum::<usize>()
    }
}
