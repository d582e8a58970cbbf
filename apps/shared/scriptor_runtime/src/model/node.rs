//! Graph node types
//!
//! A node is a plain record: its class decides which capabilities it carries,
//! and every optional capability is stored as an `Option` so that "absent"
//! is distinguishable from "empty".

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh identifier in the `id-<hex>` form
    pub fn generate() -> Self {
        Self(format!("id-{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Closed classification of graph nodes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "class", content = "type", rename_all = "kebab-case")]
pub enum NodeClass {
    /// The model root
    Model,
    Folder,
    /// A concept element, carrying its element type (e.g. `business-actor`)
    Element(String),
    /// A concept relationship, carrying its relationship type
    Relationship(String),
    Diagram,
    /// A diagram box showing an element
    DiagramObject,
    /// A diagram line showing a relationship
    DiagramConnection,
    /// Any other node type (bounds, profiles, ...) with no scripting surface
    Other(String),
}

/// Capabilities a node class may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Identifiable,
    Nameable,
    Documentable,
    HasProperties,
    Containable,
}

impl NodeClass {
    /// Type name as seen by scripts
    pub fn type_name(&self) -> &str {
        match self {
            NodeClass::Model => "archimate-model",
            NodeClass::Folder => "folder",
            NodeClass::Element(t) | NodeClass::Relationship(t) | NodeClass::Other(t) => t,
            NodeClass::Diagram => "archimate-diagram-model",
            NodeClass::DiagramObject => "diagram-model-archimate-object",
            NodeClass::DiagramConnection => "diagram-model-archimate-connection",
        }
    }

    /// Capability table
    pub fn supports(&self, capability: Capability) -> bool {
        use Capability::*;

        match self {
            NodeClass::Model => matches!(capability, Identifiable | Nameable | HasProperties | Containable),
            NodeClass::Folder | NodeClass::Diagram => true,
            NodeClass::Element(_) | NodeClass::Relationship(_) => capability != Containable,
            NodeClass::DiagramObject => matches!(capability, Identifiable | Nameable | Containable),
            NodeClass::DiagramConnection => matches!(capability, Identifiable | Nameable | HasProperties),
            NodeClass::Other(_) => false,
        }
    }

    /// Elements and relationships
    pub fn is_concept(&self) -> bool {
        matches!(self, NodeClass::Element(_) | NodeClass::Relationship(_))
    }

    /// Objects and connections drawn on a diagram
    pub fn is_diagram_component(&self) -> bool {
        matches!(self, NodeClass::DiagramObject | NodeClass::DiagramConnection)
    }
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A key/value property pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Property {
    pub key: String,
    pub value: String,
}

impl Property {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A node of the model graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub class: NodeClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    /// Contained nodes, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<Property>>,
    /// Relationship source, or the diagram object a connection starts from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<NodeId>,
    /// Relationship target, or the diagram object a connection ends at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<NodeId>,
    /// Concept shown by a diagram component
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept: Option<NodeId>,
    /// Diagram components currently connected to this concept
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<NodeId>,
}

impl Node {
    /// Create a node with the capability defaults of its class
    pub fn new(id: NodeId, class: NodeClass) -> Self {
        let name = class.supports(Capability::Nameable).then(String::new);
        let documentation = class.supports(Capability::Documentable).then(String::new);
        let properties = class.supports(Capability::HasProperties).then(Vec::new);

        Self {
            id,
            class,
            parent: None,
            children: Vec::new(),
            name,
            documentation,
            properties,
            source: None,
            target: None,
            concept: None,
            references: Vec::new(),
        }
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.class.supports(capability)
    }

    pub fn type_name(&self) -> &str {
        self.class.type_name()
    }
}
