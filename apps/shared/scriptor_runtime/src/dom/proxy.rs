use std::fmt;

use super::{DomContext, ProxyFactory, ProxyKind, Selector};
use crate::commands::{DeleteNodesCommand, SetAttributeCommand, SetPropertiesCommand, SetRelationshipOnConnectionCommand};
use crate::error::DomError;
use crate::model::{Capability, Node, NodeClass, NodeId, NodeRef, Property, TextAttribute};

/// Value returned by the symbolic attribute accessor
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Children(Vec<EntityProxy>),
}

/// Script-facing wrapper around at most one graph node
#[derive(Clone)]
pub struct EntityProxy {
    ctx: DomContext,
    kind: Option<ProxyKind>,
    node: Option<NodeRef>,
}

/// Which children a proxy kind exposes
fn accepts_child(kind: ProxyKind, class: &NodeClass) -> bool {
    match kind {
        ProxyKind::ModelRoot => *class == NodeClass::Folder,
        ProxyKind::Folder => matches!(
            class,
            NodeClass::Folder | NodeClass::Element(_) | NodeClass::Relationship(_) | NodeClass::Diagram
        ),
        ProxyKind::Diagram | ProxyKind::DiagramObject => *class == NodeClass::DiagramObject,
        ProxyKind::Element | ProxyKind::Relationship | ProxyKind::DiagramConnection => false,
    }
}

/// Append a pair; empty keys are ignored
fn push_property(properties: &mut Vec<Property>, key: &str, value: &str) {
    if !key.is_empty() {
        properties.push(Property::new(key, value));
    }
}

impl EntityProxy {
    pub(crate) fn bound(ctx: DomContext, kind: ProxyKind, node: NodeRef) -> Self {
        Self {
            ctx,
            kind: Some(kind),
            node: Some(node),
        }
    }

    /// A proxy that wraps nothing
    pub fn unbound(ctx: DomContext) -> Self {
        Self {
            ctx,
            kind: None,
            node: None,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.node.is_some()
    }

    pub fn kind(&self) -> Option<ProxyKind> {
        self.kind
    }

    pub fn node_ref(&self) -> Option<&NodeRef> {
        self.node.as_ref()
    }

    pub fn context(&self) -> &DomContext {
        &self.ctx
    }

    fn current(&self) -> Option<Node> {
        self.node.as_ref()?.node()
    }

    fn wrap(&self, id: NodeId) -> Option<EntityProxy> {
        let node = self.node.as_ref()?.sibling(id);
        ProxyFactory::wrap(&self.ctx, &node)
    }

    fn guard(&self) -> Result<(), DomError> {
        self.ctx.check_model_access(self.node.as_ref().map(|n| &n.graph))
    }

    // ------------------------------------------------------------------
    // Identity and text attributes
    // ------------------------------------------------------------------

    pub fn id(&self) -> Option<String> {
        let node = self.current()?;
        node.supports(Capability::Identifiable).then(|| node.id.to_string())
    }

    pub fn name(&self) -> Option<String> {
        self.current()?.name
    }

    pub fn documentation(&self) -> Option<String> {
        self.current()?.documentation
    }

    pub fn type_name(&self) -> Option<String> {
        Some(self.current()?.type_name().to_string())
    }

    pub fn set_name(&self, name: &str) -> Result<&Self, DomError> {
        self.set_text(TextAttribute::Name, name)
    }

    pub fn set_documentation(&self, documentation: &str) -> Result<&Self, DomError> {
        self.set_text(TextAttribute::Documentation, documentation)
    }

    fn set_text(&self, attribute: TextAttribute, value: &str) -> Result<&Self, DomError> {
        self.guard()?;

        let Some(node) = self.node.as_ref() else {
            return Ok(self);
        };
        match node.graph.text_attribute(&node.id, attribute) {
            Some(current) if current != value => {
                self.ctx
                    .execute(Box::new(SetAttributeCommand::new(node.clone(), attribute, value)))?;
            }
            _ => {}
        }
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    pub fn children(&self) -> Vec<EntityProxy> {
        let (Some(kind), Some(node)) = (self.kind, self.node.as_ref()) else {
            return Vec::new();
        };

        node.graph
            .children_of(&node.id)
            .into_iter()
            .filter(|id| node.graph.class_of(id).is_some_and(|class| accepts_child(kind, &class)))
            .filter_map(|id| self.wrap(id))
            .collect()
    }

    /// Children accepted by `selector`. A selector that does not compile
    /// matches nothing.
    pub fn children_matching(&self, selector: &str) -> Vec<EntityProxy> {
        let Some(selector) = Selector::compile(selector) else {
            return Vec::new();
        };

        self.children()
            .into_iter()
            .filter(|child| child.current().is_some_and(|node| selector.matches(&node)))
            .collect()
    }

    pub fn parent(&self) -> Option<EntityProxy> {
        let node = self.node.as_ref()?;
        self.wrap(node.graph.parent_of(&node.id)?)
    }

    /// The model this node belongs to
    pub fn model(&self) -> Option<EntityProxy> {
        let node = self.node.as_ref()?;
        if !node.exists() {
            return None;
        }
        self.wrap(node.graph.root())
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    /// Distinct keys in order of first occurrence
    pub fn get_property_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for property in self.get_properties() {
            if !keys.contains(&property.key) {
                keys.push(property.key);
            }
        }
        keys
    }

    /// Every value stored under `key`, in storage order
    pub fn get_property_values(&self, key: &str) -> Vec<String> {
        self.get_properties()
            .into_iter()
            .filter(|p| p.key == key)
            .map(|p| p.value)
            .collect()
    }

    pub fn get_properties(&self) -> Vec<Property> {
        self.node
            .as_ref()
            .and_then(|n| n.graph.properties(&n.id))
            .unwrap_or_default()
    }

    /// Replace every pair with `properties`, duplicates included
    pub fn set_properties(&self, properties: &[Property]) -> Result<&Self, DomError> {
        self.edit_properties(|current| {
            current.clear();
            for property in properties {
                push_property(current, &property.key, &property.value);
            }
        })
    }

    pub fn add_property(&self, key: &str, value: &str) -> Result<&Self, DomError> {
        self.edit_properties(|current| push_property(current, key, value))
    }

    /// Update every pair with `key`, or append one if there is none
    pub fn add_or_update_property(&self, key: &str, value: &str) -> Result<&Self, DomError> {
        self.edit_properties(|current| {
            let mut updated = false;
            for property in current.iter_mut().filter(|p| p.key == key) {
                property.value = value.to_string();
                updated = true;
            }
            if !updated {
                push_property(current, key, value);
            }
        })
    }

    /// Update every pair with `key`; nothing is appended
    pub fn update_property(&self, key: &str, value: &str) -> Result<&Self, DomError> {
        self.edit_properties(|current| {
            for property in current.iter_mut().filter(|p| p.key == key) {
                property.value = value.to_string();
            }
        })
    }

    /// Remove every pair with `key`, or only those also matching `value`
    pub fn remove_property(&self, key: &str, value: Option<&str>) -> Result<&Self, DomError> {
        self.edit_properties(|current| {
            current.retain(|p| p.key != key || value.is_some_and(|v| p.value != v));
        })
    }

    fn edit_properties(&self, edit: impl FnOnce(&mut Vec<Property>)) -> Result<&Self, DomError> {
        self.guard()?;

        let Some(node) = self.node.as_ref() else {
            return Ok(self);
        };
        let Some(current) = node.graph.properties(&node.id) else {
            return Ok(self);
        };

        let mut next = current.clone();
        edit(&mut next);
        if next != current {
            self.ctx
                .execute(Box::new(SetPropertiesCommand::new(node.clone(), next)))?;
        }
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Dynamic dispatch
    // ------------------------------------------------------------------

    /// Call a method by name. Unknown names are ignored.
    pub fn invoke(&self, method: &str, _args: &[serde_json::Value]) -> Result<&Self, DomError> {
        if method == "delete" {
            self.delete()?;
        }
        Ok(self)
    }

    /// Read an attribute by name; unknown names read as `None`
    pub fn attr(&self, name: &str) -> Option<AttrValue> {
        match name {
            "type" => self.type_name().map(AttrValue::Text),
            "id" => self.id().map(AttrValue::Text),
            "name" => self.name().map(AttrValue::Text),
            "documentation" => self.documentation().map(AttrValue::Text),
            "children" => Some(AttrValue::Children(self.children())),
            _ => None,
        }
    }

    /// Write an attribute by name; unknown names are ignored
    pub fn set_attr(&self, name: &str, value: &str) -> Result<&Self, DomError> {
        self.guard()?;
        match name {
            "name" => self.set_name(value),
            "documentation" => self.set_documentation(value),
            _ => Ok(self),
        }
    }

    // ------------------------------------------------------------------
    // Deletion
    // ------------------------------------------------------------------

    pub fn is_deletable(&self) -> bool {
        let (Some(kind), Some(node)) = (self.kind, self.node.as_ref()) else {
            return false;
        };
        match kind {
            ProxyKind::ModelRoot => false,
            ProxyKind::Folder => !node.graph.is_top_level_folder(&node.id),
            _ => true,
        }
    }

    /// Delete the node and everything depending on it, as one command
    pub fn delete(&self) -> Result<(), DomError> {
        if !self.is_deletable() {
            return Err(DomError::NotDeletable(self.to_string()));
        }
        self.guard()?;

        let Some(node) = self.node.as_ref().filter(|n| n.exists()) else {
            return Ok(());
        };
        self.ctx.execute(Box::new(DeleteNodesCommand::new(
            node.graph.clone(),
            vec![node.id.clone()],
        )))
    }

    // ------------------------------------------------------------------
    // Concepts and connections
    // ------------------------------------------------------------------

    /// Relationship shown by a diagram connection
    pub fn relationship(&self) -> Option<EntityProxy> {
        if self.kind != Some(ProxyKind::DiagramConnection) {
            return None;
        }
        self.wrap(self.current()?.concept?)
    }

    /// Point this diagram connection at another relationship of the same model
    pub fn set_relationship(&self, relationship: &EntityProxy) -> Result<&Self, DomError> {
        if self.kind != Some(ProxyKind::DiagramConnection) {
            return Err(DomError::Unsupported {
                operation: "setRelationship",
                target: self.to_string(),
            });
        }
        let (Some(connection), Some(target)) = (self.node.as_ref(), relationship.node.as_ref()) else {
            return Err(DomError::InvalidArgument("relationship proxy is not bound".into()));
        };
        if relationship.kind != Some(ProxyKind::Relationship)
            || !connection.graph.same_graph(&target.graph)
            || !target.exists()
        {
            return Err(DomError::InvalidArgument(format!(
                "'{}' is not a relationship of this model",
                relationship
            )));
        }
        self.guard()?;

        if connection.graph.connection_relationship(&connection.id)?.as_ref() == Some(&target.id) {
            return Ok(self);
        }
        let command = SetRelationshipOnConnectionCommand::new(connection.clone(), target.id.clone())?;
        self.ctx.execute(Box::new(command))?;
        Ok(self)
    }

    /// Source concept of a relationship, or source object of a connection
    pub fn source(&self) -> Option<EntityProxy> {
        match self.kind? {
            ProxyKind::Relationship | ProxyKind::DiagramConnection => self.wrap(self.current()?.source?),
            _ => None,
        }
    }

    /// Target concept of a relationship, or target object of a connection
    pub fn target(&self) -> Option<EntityProxy> {
        match self.kind? {
            ProxyKind::Relationship | ProxyKind::DiagramConnection => self.wrap(self.current()?.target?),
            _ => None,
        }
    }

    /// Concept drawn by a diagram component
    pub fn concept(&self) -> Option<EntityProxy> {
        match self.kind? {
            ProxyKind::DiagramObject | ProxyKind::DiagramConnection => self.wrap(self.current()?.concept?),
            _ => None,
        }
    }
}

impl PartialEq for EntityProxy {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        match (&self.node, &other.node) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for EntityProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}",
            self.type_name().unwrap_or_default(),
            self.name().unwrap_or_default()
        )
    }
}

impl fmt::Debug for EntityProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityProxy")
            .field("kind", &self.kind)
            .field("id", &self.node.as_ref().map(|n| n.id.as_str()))
            .finish()
    }
}
