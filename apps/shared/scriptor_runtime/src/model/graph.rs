//! In-memory capability graph
//!
//! `ModelGraph` is a cheap, cloneable handle over one model document. All
//! clones share the same store, so a proxy or a command holding a handle sees
//! every change made through any other handle.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::catalog;
use super::node::{Node, NodeClass, NodeId, Property};
use crate::error::ModelError;

/// Default top-level folders created by [`ModelGraph::with_default_folders`]
pub const DEFAULT_FOLDERS: &[&str] = &[
    "Strategy",
    "Business",
    "Application",
    "Technology & Physical",
    "Motivation",
    "Implementation & Migration",
    "Other",
    "Relations",
    "Views",
];

/// Text attributes a script can rewrite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAttribute {
    Name,
    Documentation,
}

impl TextAttribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextAttribute::Name => "name",
            TextAttribute::Documentation => "documentation",
        }
    }
}

/// Captured state of a deletion: the removed nodes plus every surviving node
/// that pointed at one of them
#[derive(Debug, Clone, PartialEq)]
pub struct GraphSnapshot {
    removed: Vec<Node>,
    survivors: Vec<Node>,
}

impl GraphSnapshot {
    pub fn removed_ids(&self) -> Vec<NodeId> {
        self.removed.iter().map(|n| n.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.removed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }
}

#[derive(Debug)]
struct GraphStore {
    root: NodeId,
    nodes: BTreeMap<NodeId, Node>,
    open: bool,
    read_only: bool,
}

impl GraphStore {
    fn get(&self, id: &NodeId) -> Result<&Node, ModelError> {
        self.nodes.get(id).ok_or_else(|| ModelError::NodeNotFound(id.clone()))
    }

    fn get_mut(&mut self, id: &NodeId) -> Result<&mut Node, ModelError> {
        self.nodes.get_mut(id).ok_or_else(|| ModelError::NodeNotFound(id.clone()))
    }

    fn insert_child(&mut self, parent: &NodeId, mut node: Node) -> Result<NodeId, ModelError> {
        let parent_class = self.get(parent)?.class.clone();
        if !can_contain(&parent_class, &node.class) {
            return Err(ModelError::InvalidParent {
                parent: parent.clone(),
                child: node.class.type_name().to_string(),
            });
        }

        let id = node.id.clone();
        node.parent = Some(parent.clone());
        self.get_mut(parent)?.children.push(id.clone());
        self.nodes.insert(id.clone(), node);
        Ok(id)
    }

    fn add_reference(&mut self, concept: &NodeId, component: &NodeId) -> Result<(), ModelError> {
        let concept = self.get_mut(concept)?;
        if !concept.references.contains(component) {
            concept.references.push(component.clone());
        }
        Ok(())
    }

    fn remove_reference(&mut self, concept: &NodeId, component: &NodeId) {
        if let Some(concept) = self.nodes.get_mut(concept) {
            concept.references.retain(|r| r != component);
        }
    }

    fn connection(&self, id: &NodeId) -> Result<&Node, ModelError> {
        let node = self.get(id)?;
        if node.class != NodeClass::DiagramConnection {
            return Err(ModelError::NotAConnection(id.clone()));
        }
        Ok(node)
    }

    /// Depth-first walk in containment order
    fn walk(&self, from: &NodeId, out: &mut Vec<NodeId>) {
        if let Some(node) = self.nodes.get(from) {
            out.push(node.id.clone());
            for child in &node.children {
                self.walk(child, out);
            }
        }
    }
}

/// Containment rules of the reference graph
fn can_contain(parent: &NodeClass, child: &NodeClass) -> bool {
    if matches!(child, NodeClass::Other(_)) {
        return true;
    }

    match parent {
        NodeClass::Model => matches!(child, NodeClass::Folder),
        NodeClass::Folder => matches!(
            child,
            NodeClass::Folder | NodeClass::Element(_) | NodeClass::Relationship(_) | NodeClass::Diagram
        ),
        NodeClass::Diagram => matches!(child, NodeClass::DiagramObject),
        NodeClass::DiagramObject => matches!(child, NodeClass::DiagramObject | NodeClass::DiagramConnection),
        _ => false,
    }
}

#[derive(Serialize, Deserialize)]
struct ModelDocument {
    root: NodeId,
    nodes: Vec<Node>,
}

/// Shared handle over one model
#[derive(Debug, Clone)]
pub struct ModelGraph {
    inner: Arc<RwLock<GraphStore>>,
}

impl ModelGraph {
    /// Create an empty, open, writable model
    pub fn new(name: &str) -> Self {
        let root = NodeId::generate();
        let mut node = Node::new(root.clone(), NodeClass::Model);
        node.name = Some(name.to_string());

        let mut nodes = BTreeMap::new();
        nodes.insert(root.clone(), node);

        Self {
            inner: Arc::new(RwLock::new(GraphStore {
                root,
                nodes,
                open: true,
                read_only: false,
            })),
        }
    }

    /// Create a model with the standard top-level folders
    pub fn with_default_folders(name: &str) -> Self {
        let graph = Self::new(name);
        {
            let mut store = graph.write();
            let root = store.root.clone();
            for folder_name in DEFAULT_FOLDERS {
                let mut folder = Node::new(NodeId::generate(), NodeClass::Folder);
                folder.name = Some(folder_name.to_string());
                // Model always accepts folders
                let _ = store.insert_child(&root, folder);
            }
        }
        graph
    }

    fn read(&self) -> RwLockReadGuard<'_, GraphStore> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, GraphStore> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// True when both handles point at the same model instance
    pub fn same_graph(&self, other: &ModelGraph) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ------------------------------------------------------------------
    // Building
    // ------------------------------------------------------------------

    pub fn add_folder(&self, parent: &NodeId, name: &str) -> Result<NodeId, ModelError> {
        let mut node = Node::new(NodeId::generate(), NodeClass::Folder);
        node.name = Some(name.to_string());
        self.write().insert_child(parent, node)
    }

    pub fn add_element(&self, parent: &NodeId, element_type: &str, name: &str) -> Result<NodeId, ModelError> {
        if !catalog::is_element_type(element_type) {
            return Err(ModelError::UnknownType {
                kind: "element",
                type_name: element_type.to_string(),
            });
        }

        let mut node = Node::new(NodeId::generate(), NodeClass::Element(element_type.to_string()));
        node.name = Some(name.to_string());
        self.write().insert_child(parent, node)
    }

    pub fn add_relationship(
        &self,
        parent: &NodeId,
        relationship_type: &str,
        source: &NodeId,
        target: &NodeId,
        name: &str,
    ) -> Result<NodeId, ModelError> {
        if !catalog::is_relationship_type(relationship_type) {
            return Err(ModelError::UnknownType {
                kind: "relationship",
                type_name: relationship_type.to_string(),
            });
        }

        let mut store = self.write();
        for end in [source, target] {
            if !store.get(end)?.class.is_concept() {
                return Err(ModelError::InvalidParent {
                    parent: end.clone(),
                    child: relationship_type.to_string(),
                });
            }
        }

        let mut node = Node::new(NodeId::generate(), NodeClass::Relationship(relationship_type.to_string()));
        node.name = Some(name.to_string());
        node.source = Some(source.clone());
        node.target = Some(target.clone());
        store.insert_child(parent, node)
    }

    pub fn add_diagram(&self, parent: &NodeId, name: &str) -> Result<NodeId, ModelError> {
        let mut node = Node::new(NodeId::generate(), NodeClass::Diagram);
        node.name = Some(name.to_string());
        self.write().insert_child(parent, node)
    }

    /// Place an element on a diagram (or nested inside another diagram object)
    pub fn add_diagram_object(&self, parent: &NodeId, element: &NodeId) -> Result<NodeId, ModelError> {
        let mut store = self.write();
        let concept = store.get(element)?;
        if !matches!(concept.class, NodeClass::Element(_)) {
            return Err(ModelError::InvalidParent {
                parent: parent.clone(),
                child: concept.class.type_name().to_string(),
            });
        }
        let name = concept.name.clone();

        let mut node = Node::new(NodeId::generate(), NodeClass::DiagramObject);
        node.name = name;
        node.concept = Some(element.clone());
        let id = store.insert_child(parent, node)?;
        store.add_reference(element, &id)?;
        Ok(id)
    }

    /// Draw a relationship between two diagram objects. The connection is
    /// owned by its source object.
    pub fn add_connection(
        &self,
        relationship: &NodeId,
        source_object: &NodeId,
        target_object: &NodeId,
    ) -> Result<NodeId, ModelError> {
        let mut store = self.write();
        if !matches!(store.get(relationship)?.class, NodeClass::Relationship(_)) {
            return Err(ModelError::InvalidParent {
                parent: source_object.clone(),
                child: store.get(relationship)?.class.type_name().to_string(),
            });
        }
        store.get(target_object)?;

        let mut node = Node::new(NodeId::generate(), NodeClass::DiagramConnection);
        node.concept = Some(relationship.clone());
        node.source = Some(source_object.clone());
        node.target = Some(target_object.clone());
        let id = store.insert_child(source_object, node)?;
        store.add_reference(relationship, &id)?;
        Ok(id)
    }

    /// Add a node with no scripting surface
    pub fn add_other(&self, parent: &NodeId, type_name: &str) -> Result<NodeId, ModelError> {
        let node = Node::new(NodeId::generate(), NodeClass::Other(type_name.to_string()));
        self.write().insert_child(parent, node)
    }

    // ------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------

    pub fn root(&self) -> NodeId {
        self.read().root.clone()
    }

    pub fn node(&self, id: &NodeId) -> Option<Node> {
        self.read().nodes.get(id).cloned()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.read().nodes.contains_key(id)
    }

    pub fn class_of(&self, id: &NodeId) -> Option<NodeClass> {
        self.read().nodes.get(id).map(|n| n.class.clone())
    }

    pub fn children_of(&self, id: &NodeId) -> Vec<NodeId> {
        self.read().nodes.get(id).map(|n| n.children.clone()).unwrap_or_default()
    }

    pub fn parent_of(&self, id: &NodeId) -> Option<NodeId> {
        self.read().nodes.get(id).and_then(|n| n.parent.clone())
    }

    /// All nodes with the given name, in containment order
    pub fn find_by_name(&self, name: &str) -> Vec<NodeId> {
        let store = self.read();
        let mut order = Vec::new();
        store.walk(&store.root, &mut order);
        order
            .into_iter()
            .filter(|id| store.nodes.get(id).and_then(|n| n.name.as_deref()) == Some(name))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().nodes.is_empty()
    }

    /// Folder directly under the model root
    pub fn is_top_level_folder(&self, id: &NodeId) -> bool {
        let store = self.read();
        store
            .nodes
            .get(id)
            .is_some_and(|n| n.class == NodeClass::Folder && n.parent.as_ref() == Some(&store.root))
    }

    // ------------------------------------------------------------------
    // Attributes and properties
    // ------------------------------------------------------------------

    pub fn text_attribute(&self, id: &NodeId, attribute: TextAttribute) -> Option<String> {
        let store = self.read();
        let node = store.nodes.get(id)?;
        match attribute {
            TextAttribute::Name => node.name.clone(),
            TextAttribute::Documentation => node.documentation.clone(),
        }
    }

    /// Write a text attribute. Nodes without the attribute are left untouched.
    pub fn set_text_attribute(&self, id: &NodeId, attribute: TextAttribute, value: &str) -> Result<(), ModelError> {
        let mut store = self.write();
        let node = store.get_mut(id)?;
        let slot = match attribute {
            TextAttribute::Name => &mut node.name,
            TextAttribute::Documentation => &mut node.documentation,
        };
        if let Some(current) = slot {
            *current = value.to_string();
        }
        Ok(())
    }

    pub fn set_name(&self, id: &NodeId, name: &str) -> Result<(), ModelError> {
        self.set_text_attribute(id, TextAttribute::Name, name)
    }

    pub fn set_documentation(&self, id: &NodeId, documentation: &str) -> Result<(), ModelError> {
        self.set_text_attribute(id, TextAttribute::Documentation, documentation)
    }

    pub fn properties(&self, id: &NodeId) -> Option<Vec<Property>> {
        self.read().nodes.get(id).and_then(|n| n.properties.clone())
    }

    /// Replace the property list. Nodes without properties are left untouched.
    pub fn set_properties(&self, id: &NodeId, properties: Vec<Property>) -> Result<(), ModelError> {
        let mut store = self.write();
        let node = store.get_mut(id)?;
        if let Some(current) = node.properties.as_mut() {
            *current = properties;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Connections
    // ------------------------------------------------------------------

    pub fn connection_relationship(&self, connection: &NodeId) -> Result<Option<NodeId>, ModelError> {
        Ok(self.read().connection(connection)?.concept.clone())
    }

    /// Deregister a connection from the relationship it currently shows
    pub fn disconnect(&self, connection: &NodeId) -> Result<(), ModelError> {
        let mut store = self.write();
        if let Some(concept) = store.connection(connection)?.concept.clone() {
            store.remove_reference(&concept, connection);
        }
        Ok(())
    }

    /// Point a connection at another relationship without touching references
    pub fn set_connection_relationship(&self, connection: &NodeId, relationship: &NodeId) -> Result<(), ModelError> {
        let mut store = self.write();
        store.connection(connection)?;
        let class = store.get(relationship)?.class.clone();
        if !matches!(class, NodeClass::Relationship(_)) {
            return Err(ModelError::UnknownType {
                kind: "relationship",
                type_name: class.type_name().to_string(),
            });
        }
        store.get_mut(connection)?.concept = Some(relationship.clone());
        Ok(())
    }

    /// Register a connection on the relationship it currently shows
    pub fn reconnect(&self, connection: &NodeId) -> Result<(), ModelError> {
        let mut store = self.write();
        if let Some(concept) = store.connection(connection)?.concept.clone() {
            store.add_reference(&concept, connection)?;
        }
        Ok(())
    }

    /// A connection is consistent when exactly its own relationship lists it
    pub fn is_connection_consistent(&self, connection: &NodeId) -> bool {
        let store = self.read();
        let Ok(node) = store.connection(connection) else {
            return false;
        };
        let Some(concept) = node.concept.as_ref() else {
            return false;
        };

        store.nodes.values().all(|other| {
            let listed = other.references.contains(connection);
            if &other.id == concept { listed } else { !listed }
        })
    }

    // ------------------------------------------------------------------
    // Deletion
    // ------------------------------------------------------------------

    /// Every node that must go when `targets` are deleted: descendants,
    /// relationships with an end in the set, diagram components showing a
    /// concept in the set, and connections attached to a removed object.
    pub fn deletion_closure(&self, targets: &[NodeId]) -> Vec<NodeId> {
        let store = self.read();
        let mut set: BTreeSet<NodeId> = targets.iter().filter(|id| store.nodes.contains_key(id)).cloned().collect();

        loop {
            let before = set.len();

            let mut descendants = Vec::new();
            for id in &set {
                store.walk(id, &mut descendants);
            }
            set.extend(descendants);

            let dependents: Vec<NodeId> = store
                .nodes
                .values()
                .filter(|n| !set.contains(&n.id))
                .filter(|n| {
                    let end_removed = |end: &Option<NodeId>| end.as_ref().is_some_and(|e| set.contains(e));
                    let shows_removed = n.class.is_diagram_component() && end_removed(&n.concept);
                    let wired_to_removed = matches!(n.class, NodeClass::Relationship(_) | NodeClass::DiagramConnection)
                        && (end_removed(&n.source) || end_removed(&n.target));
                    shows_removed || wired_to_removed
                })
                .map(|n| n.id.clone())
                .collect();
            set.extend(dependents);

            if set.len() == before {
                break;
            }
        }

        let mut order = Vec::new();
        store.walk(&store.root, &mut order);
        order.retain(|id| set.contains(id));
        order
    }

    /// Capture what `remove_nodes(ids)` is about to change
    pub fn snapshot(&self, ids: &[NodeId]) -> GraphSnapshot {
        let store = self.read();
        let set: BTreeSet<&NodeId> = ids.iter().collect();

        let removed = ids.iter().filter_map(|id| store.nodes.get(id).cloned()).collect();
        let survivors = store
            .nodes
            .values()
            .filter(|n| !set.contains(&n.id))
            .filter(|n| n.children.iter().chain(n.references.iter()).any(|r| set.contains(r)))
            .cloned()
            .collect();

        GraphSnapshot { removed, survivors }
    }

    /// Remove nodes and every reference to them. The root is never removed.
    pub fn remove_nodes(&self, ids: &[NodeId]) {
        let mut store = self.write();
        let root = store.root.clone();
        let set: BTreeSet<&NodeId> = ids.iter().filter(|id| **id != root).collect();

        for id in &set {
            store.nodes.remove(*id);
        }
        for node in store.nodes.values_mut() {
            node.children.retain(|c| !set.contains(c));
            node.references.retain(|r| !set.contains(r));
        }
    }

    /// Put back exactly what a snapshot captured
    pub fn restore_nodes(&self, snapshot: &GraphSnapshot) {
        let mut store = self.write();
        for node in snapshot.removed.iter().chain(snapshot.survivors.iter()) {
            store.nodes.insert(node.id.clone(), node.clone());
        }
    }

    // ------------------------------------------------------------------
    // Access flags
    // ------------------------------------------------------------------

    pub fn is_open(&self) -> bool {
        self.read().open
    }

    pub fn set_open(&self, open: bool) {
        self.write().open = open;
    }

    pub fn is_read_only(&self) -> bool {
        self.read().read_only
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.write().read_only = read_only;
    }

    // ------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------

    /// Serialize the model, nodes in containment order
    pub fn to_json(&self) -> Result<String, ModelError> {
        let store = self.read();
        let mut order = Vec::new();
        store.walk(&store.root, &mut order);
        let document = ModelDocument {
            root: store.root.clone(),
            nodes: order.iter().filter_map(|id| store.nodes.get(id).cloned()).collect(),
        };
        serde_json::to_string_pretty(&document).map_err(|e| ModelError::Document(e.to_string()))
    }

    /// Load a model document. The loaded model is open and writable.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let document: ModelDocument = serde_json::from_str(json).map_err(|e| ModelError::Document(e.to_string()))?;

        let nodes: BTreeMap<NodeId, Node> = document.nodes.into_iter().map(|n| (n.id.clone(), n)).collect();
        match nodes.get(&document.root) {
            Some(root) if root.class == NodeClass::Model => {}
            Some(_) => return Err(ModelError::Document(format!("root '{}' is not a model", document.root))),
            None => return Err(ModelError::NodeNotFound(document.root)),
        }
        for node in nodes.values() {
            if let Some(missing) = node.children.iter().find(|c| !nodes.contains_key(c)) {
                return Err(ModelError::Document(format!(
                    "node '{}' lists missing child '{}'",
                    node.id, missing
                )));
            }
        }

        Ok(Self {
            inner: Arc::new(RwLock::new(GraphStore {
                root: document.root,
                nodes,
                open: true,
                read_only: false,
            })),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        graph: ModelGraph,
        business: NodeId,
        actor: NodeId,
        role: NodeId,
        assignment: NodeId,
        view: NodeId,
        actor_obj: NodeId,
        role_obj: NodeId,
        connection: NodeId,
    }

    fn fixture() -> Fixture {
        let graph = ModelGraph::with_default_folders("Test");
        let business = graph.find_by_name("Business")[0].clone();
        let relations = graph.find_by_name("Relations")[0].clone();
        let views = graph.find_by_name("Views")[0].clone();

        let actor = graph.add_element(&business, "business-actor", "Clerk").unwrap();
        let role = graph.add_element(&business, "business-role", "Desk").unwrap();
        let assignment = graph
            .add_relationship(&relations, "assignment-relationship", &actor, &role, "")
            .unwrap();
        let view = graph.add_diagram(&views, "Main").unwrap();
        let actor_obj = graph.add_diagram_object(&view, &actor).unwrap();
        let role_obj = graph.add_diagram_object(&view, &role).unwrap();
        let connection = graph.add_connection(&assignment, &actor_obj, &role_obj).unwrap();

        Fixture {
            graph,
            business,
            actor,
            role,
            assignment,
            view,
            actor_obj,
            role_obj,
            connection,
        }
    }

    #[test]
    fn test_default_folders() {
        let graph = ModelGraph::with_default_folders("Test");
        let folders = graph.children_of(&graph.root());
        assert_eq!(folders.len(), DEFAULT_FOLDERS.len());
        assert!(folders.iter().all(|f| graph.is_top_level_folder(f)));
    }

    #[test]
    fn test_unknown_element_type_rejected() {
        let f = fixture();
        let err = f.graph.add_element(&f.business, "space-ship", "x").unwrap_err();
        assert!(matches!(err, ModelError::UnknownType { kind: "element", .. }));
    }

    #[test]
    fn test_containment_rules() {
        let f = fixture();
        let root = f.graph.root();
        assert!(f.graph.add_element(&root, "goal", "g").is_err());
        assert!(f.graph.add_folder(&f.actor, "nope").is_err());
        assert!(f.graph.add_other(&f.actor_obj, "bounds").is_ok());
    }

    #[test]
    fn test_connection_registered_on_relationship() {
        let f = fixture();
        let rel = f.graph.node(&f.assignment).unwrap();
        assert_eq!(rel.references, vec![f.connection.clone()]);
        assert!(f.graph.is_connection_consistent(&f.connection));
        assert_eq!(f.graph.parent_of(&f.connection), Some(f.actor_obj.clone()));
    }

    #[test]
    fn test_rewire_connection() {
        let f = fixture();
        let relations = f.graph.find_by_name("Relations")[0].clone();
        let other = f
            .graph
            .add_relationship(&relations, "serving-relationship", &f.role, &f.actor, "")
            .unwrap();

        f.graph.disconnect(&f.connection).unwrap();
        assert!(!f.graph.is_connection_consistent(&f.connection));
        f.graph.set_connection_relationship(&f.connection, &other).unwrap();
        f.graph.reconnect(&f.connection).unwrap();

        assert!(f.graph.is_connection_consistent(&f.connection));
        assert_eq!(f.graph.connection_relationship(&f.connection).unwrap(), Some(other));
        assert!(f.graph.node(&f.assignment).unwrap().references.is_empty());
    }

    #[test]
    fn test_not_a_connection() {
        let f = fixture();
        assert_eq!(
            f.graph.disconnect(&f.actor),
            Err(ModelError::NotAConnection(f.actor.clone()))
        );
    }

    #[test]
    fn test_deletion_closure_follows_dependents() {
        let f = fixture();
        let closure = f.graph.deletion_closure(std::slice::from_ref(&f.actor));
        assert!(closure.contains(&f.actor));
        assert!(closure.contains(&f.assignment));
        assert!(closure.contains(&f.actor_obj));
        assert!(closure.contains(&f.connection));
        assert!(!closure.contains(&f.role));
        assert!(!closure.contains(&f.role_obj));
        assert!(!closure.contains(&f.view));
    }

    #[test]
    fn test_remove_and_restore_is_exact() {
        let f = fixture();
        let before = f.graph.to_json().unwrap();

        let closure = f.graph.deletion_closure(std::slice::from_ref(&f.actor));
        let snapshot = f.graph.snapshot(&closure);
        f.graph.remove_nodes(&closure);
        assert!(!f.graph.contains(&f.actor));
        assert!(!f.graph.children_of(&f.view).contains(&f.actor_obj));

        f.graph.restore_nodes(&snapshot);
        assert_eq!(f.graph.to_json().unwrap(), before);
    }

    #[test]
    fn test_json_round_trip() {
        let f = fixture();
        f.graph
            .set_properties(&f.actor, vec![Property::new("a", "1"), Property::new("a", "2")])
            .unwrap();
        let json = f.graph.to_json().unwrap();
        let loaded = ModelGraph::from_json(&json).unwrap();

        assert_eq!(loaded.root(), f.graph.root());
        assert_eq!(loaded.node(&f.actor), f.graph.node(&f.actor));
        assert!(!loaded.same_graph(&f.graph));
        assert!(loaded.is_open());
    }

    #[test]
    fn test_from_json_rejects_missing_root() {
        let err = ModelGraph::from_json(r#"{"root":"nope","nodes":[]}"#).unwrap_err();
        assert!(matches!(err, ModelError::NodeNotFound(_)));
    }

    #[test]
    fn test_text_attribute_respects_capability() {
        let f = fixture();
        f.graph.set_documentation(&f.actor_obj, "ignored").unwrap();
        assert_eq!(f.graph.text_attribute(&f.actor_obj, TextAttribute::Documentation), None);
        f.graph.set_name(&f.actor, "Teller").unwrap();
        assert_eq!(f.graph.text_attribute(&f.actor, TextAttribute::Name).as_deref(), Some("Teller"));
    }
}
