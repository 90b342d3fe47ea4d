use std::fmt;

use crate::entry::MethodEntry;

/// Index of a node in a method tree.
pub type NodeId = usize;

#[derive(Clone, Debug, PartialEq, Eq)]
struct Node {
    method: MethodEntry,
    implemented: bool,
    children: Vec<NodeId>,
}

/// A method and every override of it below its declaring class.
///
/// Nodes live in a flat table, the root is node `0`. A node is present if
/// its class declares the method, or if some class further down does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodInheritanceTree {
    nodes: Vec<Node>,
}

impl MethodInheritanceTree {
    pub(crate) fn new(root: MethodEntry, implemented: bool) -> Self {
        Self {
            nodes: vec![Node {
                method: root,
                implemented,
                children: Vec::new(),
            }],
        }
    }

    /// Adds a detached node. It becomes part of the tree once attached.
    pub(crate) fn push(&mut self, method: MethodEntry, implemented: bool) -> NodeId {
        self.nodes.push(Node {
            method,
            implemented,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    pub(crate) fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent].children.push(child);
    }

    /// Drops a detached node, which must be the last one pushed.
    pub(crate) fn discard(&mut self, node: NodeId) {
        debug_assert_eq!(node + 1, self.nodes.len());
        self.nodes.truncate(node);
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        0
    }

    /// The method of a node.
    pub fn method(&self, node: NodeId) -> &MethodEntry {
        &self.nodes[node].method
    }

    /// Whether the node's class declares the method.
    pub fn is_implemented(&self, node: NodeId) -> bool {
        self.nodes[node].implemented
    }

    /// Child nodes, in hierarchy order.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node].children
    }

    /// Every method in the tree, depth first.
    pub fn methods(&self) -> Vec<&MethodEntry> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(node) = stack.pop() {
            out.push(self.method(node));
            stack.extend(self.children(node).iter().rev());
        }
        out
    }

    fn fmt_node(&self, f: &mut fmt::Formatter<'_>, node: NodeId, depth: usize) -> fmt::Result {
        let marker = if self.is_implemented(node) { "" } else { " (not implemented)" };
        writeln!(f, "{:indent$}{}{}", "", self.method(node), marker, indent = depth * 2)?;
        for child in self.children(node) {
            self.fmt_node(f, *child, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for MethodInheritanceTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_node(f, self.root(), 0)
    }
}

/// An interface (or superclass) method and every implementation of it in a
/// descendant class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodImplementationsTree {
    root: MethodEntry,
    implementations: Vec<MethodEntry>,
}

impl MethodImplementationsTree {
    pub(crate) fn new(root: MethodEntry, implementations: Vec<MethodEntry>) -> Self {
        Self {
            root,
            implementations,
        }
    }

    /// The implemented method.
    pub fn root(&self) -> &MethodEntry {
        &self.root
    }

    /// The implementations, nearest class first.
    pub fn implementations(&self) -> &[MethodEntry] {
        &self.implementations
    }
}

impl fmt::Display for MethodImplementationsTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.root)?;
        for implementation in &self.implementations {
            writeln!(f, "  {}", implementation)?;
        }
        Ok(())
    }
}
