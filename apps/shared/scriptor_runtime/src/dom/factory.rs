use super::{DomContext, EntityProxy};
use crate::model::{NodeClass, NodeRef};

/// The scriptable node categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyKind {
    ModelRoot,
    Element,
    Relationship,
    Diagram,
    DiagramObject,
    DiagramConnection,
    Folder,
}

impl ProxyKind {
    /// Classify a node class, `None` for classes with no scripting surface
    pub fn of(class: &NodeClass) -> Option<Self> {
        match class {
            NodeClass::Model => Some(ProxyKind::ModelRoot),
            NodeClass::Element(_) => Some(ProxyKind::Element),
            NodeClass::Relationship(_) => Some(ProxyKind::Relationship),
            NodeClass::Diagram => Some(ProxyKind::Diagram),
            NodeClass::DiagramObject => Some(ProxyKind::DiagramObject),
            NodeClass::DiagramConnection => Some(ProxyKind::DiagramConnection),
            NodeClass::Folder => Some(ProxyKind::Folder),
            NodeClass::Other(_) => None,
        }
    }
}

/// Builds proxies for graph nodes
pub struct ProxyFactory;

impl ProxyFactory {
    /// Wrap a node, or `None` when the node is missing or not scriptable
    pub fn wrap(ctx: &DomContext, node: &NodeRef) -> Option<EntityProxy> {
        let kind = ProxyKind::of(&node.class()?)?;
        Some(EntityProxy::bound(ctx.clone(), kind, node.clone()))
    }
}
