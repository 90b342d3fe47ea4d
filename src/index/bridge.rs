use std::collections::HashMap;

use crate::access::AccessFlags;
use crate::descriptor::TypeDescriptor;
use crate::entry::MethodEntry;

use super::{ClassRelation, EntryIndex, InheritanceIndex, ReferenceIndex};

/// The bridge/specialized pairing in both directions.
///
/// Several bridges may forward to the same specialized method, but the
/// reverse direction only remembers one of them. Every forward pair has its
/// specialized method in the reverse map and every reverse pair is also a
/// forward pair.
#[derive(Clone, Debug, Default)]
struct BridgePairs {
    bridge_to_specialized: HashMap<MethodEntry, MethodEntry>,
    specialized_to_bridge: HashMap<MethodEntry, MethodEntry>,
}

impl BridgePairs {
    /// Records `bridge -> specialized`. `prefer` decides, given the bridge
    /// already registered for `specialized`, whether the new bridge replaces
    /// it in the reverse direction.
    fn insert<F>(&mut self, bridge: MethodEntry, specialized: MethodEntry, prefer: F)
    where
        F: FnOnce(&MethodEntry) -> bool,
    {
        self.bridge_to_specialized
            .insert(bridge.clone(), specialized.clone());
        let replace = match self.specialized_to_bridge.get(&specialized) {
            Some(existing) => prefer(existing),
            None => true,
        };
        if replace {
            self.specialized_to_bridge
                .insert(specialized.clone(), bridge);
        }
        debug_assert!(self.is_consistent_for(&specialized));
    }

    fn is_consistent_for(&self, specialized: &MethodEntry) -> bool {
        self.specialized_to_bridge
            .get(specialized)
            .and_then(|bridge| self.bridge_to_specialized.get(bridge))
            == Some(specialized)
    }

    fn bridge_of(&self, specialized: &MethodEntry) -> Option<&MethodEntry> {
        self.specialized_to_bridge.get(specialized)
    }

    fn specialized_of(&self, bridge: &MethodEntry) -> Option<&MethodEntry> {
        self.bridge_to_specialized.get(bridge)
    }
}

/// Pairs compiler generated bridge methods with the specialized methods they
/// forward to.
#[derive(Clone, Debug, Default)]
pub struct BridgeMethodIndex {
    pairs: BridgePairs,
    // specialized methods under the name of their bridge
    aliases: HashMap<MethodEntry, MethodEntry>,
}

impl BridgeMethodIndex {
    /// Finds every bridge method among the synthetic methods of the binary.
    ///
    /// `references` must already point at the closest declarations.
    pub fn find(
        entries: &EntryIndex,
        inheritance: &InheritanceIndex,
        references: &ReferenceIndex,
    ) -> Self {
        let mut index = BridgeMethodIndex::default();
        for method in entries.methods() {
            let Some(access) = method.access() else {
                continue;
            };
            if !access.is_synthetic() {
                continue;
            }
            let callees = references.methods_referenced_by(method);
            if callees.len() != 1 {
                continue;
            }
            let Some(specialized) = callees.iter().next() else {
                continue;
            };
            if access.is_bridge() || is_potential_bridge(inheritance, method, access, specialized) {
                index.add_bridge(inheritance, method.to_reference(), specialized.clone());
            }
        }
        index.add_aliases();
        index
    }

    fn add_bridge(&mut self, inheritance: &InheritanceIndex, bridge: MethodEntry, specialized: MethodEntry) {
        let candidate = bridge.clone();
        self.pairs.insert(bridge, specialized, |existing| {
            prefers_bridge(inheritance, &candidate, existing)
        });
    }

    fn add_aliases(&mut self) {
        let mut pairs: Vec<(&MethodEntry, &MethodEntry)> =
            self.pairs.specialized_to_bridge.iter().collect();
        pairs.sort();
        for (specialized, bridge) in pairs {
            if specialized.name() == bridge.name() {
                continue;
            }
            let renamed = specialized.with_name(bridge.name());
            // a method that is itself specialized keeps its own bridge, so
            // real pairs stay bijective
            if self.pairs.specialized_to_bridge.contains_key(&renamed) {
                continue;
            }
            self.aliases.entry(renamed).or_insert_with(|| bridge.clone());
        }
    }

    /// Whether the method is a bridge.
    pub fn is_bridge_method(&self, entry: &MethodEntry) -> bool {
        self.pairs.specialized_of(entry).is_some()
    }

    /// Whether some bridge forwards to the method, possibly under the
    /// bridge's name.
    pub fn is_specialized_method(&self, entry: &MethodEntry) -> bool {
        self.bridge_from_specialized(entry).is_some()
    }

    /// The bridge forwarding to a specialized method.
    pub fn bridge_from_specialized(&self, specialized: &MethodEntry) -> Option<&MethodEntry> {
        self.pairs
            .bridge_of(specialized)
            .or_else(|| self.aliases.get(specialized))
    }

    /// The specialized method a bridge forwards to.
    pub fn specialized_from_bridge(&self, bridge: &MethodEntry) -> Option<&MethodEntry> {
        self.pairs.specialized_of(bridge)
    }

    /// Every `specialized -> bridge` pair, including specialized methods
    /// listed under their bridge's name.
    pub fn specialized_to_bridge(&self) -> impl Iterator<Item = (&MethodEntry, &MethodEntry)> {
        self.pairs
            .specialized_to_bridge
            .iter()
            .chain(self.aliases.iter())
    }

    /// Every `bridge -> specialized` pair.
    pub fn bridge_to_specialized(&self) -> &HashMap<MethodEntry, MethodEntry> {
        &self.pairs.bridge_to_specialized
    }

    /// Number of bridge methods.
    pub fn len(&self) -> usize {
        self.pairs.bridge_to_specialized.len()
    }

    /// Whether no bridges were found.
    pub fn is_empty(&self) -> bool {
        self.pairs.bridge_to_specialized.is_empty()
    }
}

/// Whether `candidate` should replace `existing` as the bridge of their
/// shared specialized method.
///
/// A bridge declared higher in the hierarchy wins. Between bridges of
/// unrelated classes, or of the same class, the smaller entry wins, so the
/// outcome does not depend on the order classes are indexed in.
fn prefers_bridge(inheritance: &InheritanceIndex, candidate: &MethodEntry, existing: &MethodEntry) -> bool {
    if inheritance
        .descendants(candidate.parent())
        .contains(existing.parent())
    {
        return true;
    }
    if inheritance
        .descendants(existing.parent())
        .contains(candidate.parent())
    {
        return false;
    }
    candidate < existing
}

fn is_potential_bridge(
    inheritance: &InheritanceIndex,
    bridge: &MethodEntry,
    access: AccessFlags,
    specialized: &MethodEntry,
) -> bool {
    // bridges only exist to be overridden
    if access.is_private() || access.is_final() || access.is_static() {
        return false;
    }

    let bridge_args = bridge.desc().argument_descs();
    let specialized_args = specialized.desc().argument_descs();
    if bridge_args.len() != specialized_args.len() {
        return false;
    }
    bridge_args
        .iter()
        .zip(specialized_args.iter())
        .all(|(b, s)| are_types_bridge_compatible(inheritance, b, s))
        && are_types_bridge_compatible(
            inheritance,
            &bridge.desc().return_desc(),
            &specialized.desc().return_desc(),
        )
}

fn are_types_bridge_compatible(
    inheritance: &InheritanceIndex,
    bridge: &TypeDescriptor,
    specialized: &TypeDescriptor,
) -> bool {
    if bridge == specialized {
        return true;
    }
    if !bridge.is_type() || !specialized.is_type() {
        return false;
    }
    match (bridge.type_entry(), specialized.type_entry()) {
        (Some(bridge_type), Some(specialized_type)) => matches!(
            inheritance.relation(&specialized_type, &bridge_type),
            ClassRelation::Same | ClassRelation::Ancestor | ClassRelation::Descendant
        ),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(owner: &str, name: &str) -> MethodEntry {
        MethodEntry::parse(owner, name, "()V")
    }

    #[test]
    fn test_pairs_keep_preferred_bridge() {
        let mut pairs = BridgePairs::default();
        pairs.insert(method("b", "x"), method("a", "s"), |_| true);
        pairs.insert(method("c", "y"), method("a", "s"), |_| false);

        assert_eq!(pairs.bridge_of(&method("a", "s")), Some(&method("b", "x")));
        assert_eq!(pairs.specialized_of(&method("c", "y")), Some(&method("a", "s")));
        assert!(pairs.is_consistent_for(&method("a", "s")));

        pairs.insert(method("z", "w"), method("a", "s"), |_| true);
        assert_eq!(pairs.bridge_of(&method("a", "s")), Some(&method("z", "w")));
        assert!(pairs.is_consistent_for(&method("a", "s")));
    }

    #[test]
    fn test_aliases_never_displace_real_pairs() {
        let mut index = BridgeMethodIndex::default();
        index.pairs.insert(method("b", "t"), method("a", "s"), |_| true);
        index.pairs.insert(method("d", "u"), method("a", "t"), |_| true);
        index.pairs.insert(method("e", "v"), method("a", "r"), |_| true);
        index.add_aliases();

        // `a.s` under its bridge's name is `a.t`, which has a bridge of its own
        assert_eq!(index.bridge_from_specialized(&method("a", "t")), Some(&method("d", "u")));
        assert_eq!(index.bridge_from_specialized(&method("a", "v")), Some(&method("e", "v")));
        assert!(index.is_specialized_method(&method("a", "u")));
        assert_eq!(index.specialized_to_bridge().count(), 5);
    }
}
