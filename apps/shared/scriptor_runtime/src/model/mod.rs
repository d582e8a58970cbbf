//! Reference capability graph
//!
//! The scripting layer never touches [`Node`] values directly: it holds
//! [`NodeRef`]s and goes through [`ModelGraph`] for every read and write.

pub mod catalog;
mod graph;
mod node;

pub use graph::{GraphSnapshot, ModelGraph, TextAttribute, DEFAULT_FOLDERS};
pub use node::{Capability, Node, NodeClass, NodeId, Property};

/// A node inside a specific model instance
#[derive(Debug, Clone)]
pub struct NodeRef {
    pub graph: ModelGraph,
    pub id: NodeId,
}

impl NodeRef {
    pub fn new(graph: ModelGraph, id: NodeId) -> Self {
        Self { graph, id }
    }

    /// Reference to the root of the same model
    pub fn root_of(graph: &ModelGraph) -> Self {
        Self::new(graph.clone(), graph.root())
    }

    /// Reference to another node of the same model
    pub fn sibling(&self, id: NodeId) -> Self {
        Self::new(self.graph.clone(), id)
    }

    pub fn exists(&self) -> bool {
        self.graph.contains(&self.id)
    }

    pub fn class(&self) -> Option<NodeClass> {
        self.graph.class_of(&self.id)
    }

    pub fn node(&self) -> Option<Node> {
        self.graph.node(&self.id)
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.graph.same_graph(&other.graph) && self.id == other.id
    }
}

impl Eq for NodeRef {}
