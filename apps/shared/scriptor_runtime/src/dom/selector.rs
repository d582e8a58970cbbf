//! Selector filters for child traversal
//!
//! Grammar:
//!
//! | selector | matches |
//! |---|---|
//! | `*` | every node |
//! | `concept` | elements and relationships |
//! | `element` | elements |
//! | `relationship` | relationships |
//! | `view` | diagrams |
//! | `folder` | folders |
//! | `#<id>` | the node with that id |
//! | `.<name>` | nodes with that exact name |
//! | `<type>` | nodes whose type name is `<type>` |
//!
//! Anything else does not compile. Callers treat a missing selector as
//! "match nothing".

use crate::model::{catalog, Node, NodeClass};

/// Type names a selector may name directly
const NODE_TYPE_NAMES: &[&str] = &[
    "archimate-model",
    "archimate-diagram-model",
    "diagram-model-archimate-object",
    "diagram-model-archimate-connection",
];

/// A compiled, stateless node predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    All,
    Concept,
    Element,
    Relationship,
    View,
    Folder,
    Id(String),
    Name(String),
    Type(String),
}

impl Selector {
    /// Compile a selector string, `None` when the syntax is not recognised
    pub fn compile(selector: &str) -> Option<Self> {
        let selector = selector.trim();

        let compiled = match selector {
            "*" => Selector::All,
            "concept" => Selector::Concept,
            "element" => Selector::Element,
            "relationship" => Selector::Relationship,
            "view" => Selector::View,
            "folder" => Selector::Folder,
            _ => {
                if let Some(id) = selector.strip_prefix('#') {
                    if id.is_empty() {
                        return None;
                    }
                    Selector::Id(id.to_string())
                } else if let Some(name) = selector.strip_prefix('.') {
                    if name.is_empty() {
                        return None;
                    }
                    Selector::Name(name.to_string())
                } else if is_known_type(selector) {
                    Selector::Type(selector.to_string())
                } else {
                    return None;
                }
            }
        };

        Some(compiled)
    }

    pub fn matches(&self, node: &Node) -> bool {
        match self {
            Selector::All => true,
            Selector::Concept => node.class.is_concept(),
            Selector::Element => matches!(node.class, NodeClass::Element(_)),
            Selector::Relationship => matches!(node.class, NodeClass::Relationship(_)),
            Selector::View => node.class == NodeClass::Diagram,
            Selector::Folder => node.class == NodeClass::Folder,
            Selector::Id(id) => node.id.as_str() == id,
            Selector::Name(name) => node.name.as_deref() == Some(name.as_str()),
            Selector::Type(type_name) => node.type_name() == type_name,
        }
    }
}

fn is_known_type(type_name: &str) -> bool {
    catalog::is_element_type(type_name)
        || catalog::is_relationship_type(type_name)
        || NODE_TYPE_NAMES.contains(&type_name)
}
