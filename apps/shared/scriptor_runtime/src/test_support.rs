//! Shared fixtures for unit tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::config::ScriptingConfig;
use crate::dom::{EntityProxy, ProxyFactory, ProxyKind};
use crate::engine::{Binding, ScriptEngine, ScriptEngineProvider};
use crate::error::{DomError, RunError, ScriptError};
use crate::model::{ModelGraph, NodeClass, NodeId, NodeRef};

/// A small model:
///
/// ```text
/// Business/  Clerk (business-actor), Desk (business-role)
/// Relations/ Clerk -assignment-> Desk, Desk -serving-> Clerk
/// Views/     Main: [Clerk] --assignment--> [Desk]
/// ```
pub struct SampleModel {
    pub graph: ModelGraph,
    pub business: NodeId,
    pub relations: NodeId,
    pub actor: NodeId,
    pub role: NodeId,
    pub assignment: NodeId,
    pub serving: NodeId,
    pub view: NodeId,
    pub actor_obj: NodeId,
    pub role_obj: NodeId,
    pub connection: NodeId,
}

impl SampleModel {
    pub fn node(&self, id: &NodeId) -> NodeRef {
        NodeRef::new(self.graph.clone(), id.clone())
    }
}

pub fn sample_model() -> SampleModel {
    let graph = ModelGraph::with_default_folders("Test");
    let business = graph.find_by_name("Business")[0].clone();
    let relations = graph.find_by_name("Relations")[0].clone();
    let views = graph.find_by_name("Views")[0].clone();

    let actor = graph.add_element(&business, "business-actor", "Clerk").unwrap();
    let role = graph.add_element(&business, "business-role", "Desk").unwrap();
    let assignment = graph
        .add_relationship(&relations, "assignment-relationship", &actor, &role, "")
        .unwrap();
    let serving = graph
        .add_relationship(&relations, "serving-relationship", &role, &actor, "")
        .unwrap();
    let view = graph.add_diagram(&views, "Main").unwrap();
    let actor_obj = graph.add_diagram_object(&view, &actor).unwrap();
    let role_obj = graph.add_diagram_object(&view, &role).unwrap();
    let connection = graph.add_connection(&assignment, &actor_obj, &role_obj).unwrap();

    SampleModel {
        graph,
        business,
        relations,
        actor,
        role,
        assignment,
        serving,
        view,
        actor_obj,
        role_obj,
        connection,
    }
}

type Handler = Arc<dyn Fn(&ScriptScope) -> Result<(), ScriptError> + Send + Sync>;

/// Globals visible to a scripted handler
pub struct ScriptScope<'a> {
    globals: &'a HashMap<String, Binding>,
}

impl ScriptScope<'_> {
    pub fn get(&self, name: &str) -> Option<Binding> {
        self.globals.get(name).cloned()
    }

    pub fn entity(&self, name: &str) -> Result<EntityProxy, ScriptError> {
        match self.globals.get(name) {
            Some(Binding::Entity(proxy)) => Ok(proxy.clone()),
            _ => Err(ScriptError::Evaluation(format!("ReferenceError: {} is not defined", name))),
        }
    }

    /// First outgoing connection of a diagram object
    pub fn connection_from(&self, object: &EntityProxy) -> Result<EntityProxy, ScriptError> {
        let node = object.node_ref().ok_or_else(|| self.fail("unbound object"))?;
        node.graph
            .children_of(&node.id)
            .into_iter()
            .filter(|id| node.graph.class_of(id) == Some(NodeClass::DiagramConnection))
            .find_map(|id| ProxyFactory::wrap(object.context(), &node.sibling(id)))
            .filter(|p| p.kind() == Some(ProxyKind::DiagramConnection))
            .ok_or_else(|| self.fail("no connection"))
    }

    pub fn fail(&self, message: &str) -> ScriptError {
        ScriptError::Evaluation(message.to_string())
    }

    pub fn dom(&self) -> fn(DomError) -> ScriptError {
        |e| ScriptError::Evaluation(e.to_string())
    }
}

/// Provider whose "scripts" are Rust closures keyed by source text
pub struct ScriptedProvider {
    id: String,
    extensions: Vec<&'static str>,
    handlers: Arc<HashMap<String, Handler>>,
    log: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProvider {
    pub fn new(id: &str, extensions: &[&'static str]) -> Self {
        Self {
            id: id.to_string(),
            extensions: extensions.to_vec(),
            handlers: Arc::new(HashMap::new()),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register the behaviour of the script whose source is `source`
    pub fn on(
        mut self,
        source: &str,
        handler: impl Fn(&ScriptScope) -> Result<(), ScriptError> + Send + Sync + 'static,
    ) -> Self {
        let mut handlers: HashMap<String, Handler> = self.handlers.as_ref().clone();
        handlers.insert(source.to_string(), Arc::new(handler));
        self.handlers = Arc::new(handlers);
        self
    }

    /// Engine events: `put:<name>`, `remove:<name>`, `eval:<origin>:<source>`
    pub fn log(&self) -> Arc<Mutex<Vec<String>>> {
        self.log.clone()
    }
}

struct ScriptedEngine {
    globals: HashMap<String, Binding>,
    handlers: Arc<HashMap<String, Handler>>,
    log: Arc<Mutex<Vec<String>>>,
}

impl ScriptEngine for ScriptedEngine {
    fn put(&mut self, name: &str, value: &Binding) -> Result<(), ScriptError> {
        self.log.lock().unwrap().push(format!("put:{}", name));
        self.globals.insert(name.to_string(), value.clone());
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<(), ScriptError> {
        self.log.lock().unwrap().push(format!("remove:{}", name));
        self.globals.remove(name);
        Ok(())
    }

    fn eval(&mut self, source: &str, origin: &str) -> Result<(), ScriptError> {
        let source = source.trim();
        self.log.lock().unwrap().push(format!("eval:{}:{}", origin, source));
        let handler = self
            .handlers
            .get(source)
            .ok_or_else(|| ScriptError::Evaluation(format!("SyntaxError: unknown script '{}'", source)))?;
        handler(&ScriptScope { globals: &self.globals })
    }
}

impl ScriptEngineProvider for ScriptedProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        "Scripted"
    }

    fn extensions(&self) -> &[&str] {
        &self.extensions
    }

    fn create_engine(&self, _config: &ScriptingConfig) -> Result<Box<dyn ScriptEngine>, RunError> {
        Ok(Box::new(ScriptedEngine {
            globals: HashMap::new(),
            handlers: self.handlers.clone(),
            log: self.log.clone(),
        }))
    }

    fn run_source(&self, source: &str, origin: &str, engine: &mut dyn ScriptEngine) -> Result<(), ScriptError> {
        engine.eval(source, origin)
    }
}
