//! One CLI session: load a model, run a script against it, save it back

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

use scriptor_runtime::adapters::js::JsProvider;
use scriptor_runtime::commands::CommandStack;
use scriptor_runtime::dom::{DomRegistration, DomRootSupplier, ModelRootFactory, StaticDomRegistry};
use scriptor_runtime::{HostServices, ModelGraph, ProviderRegistry, RunReport, ScriptRunner, ScriptSource, ScriptingConfig};

/// Extension id of the DOM root registered by the CLI
pub const MODEL_DOM_ID: &str = "scriptor.dom.model";

/// Global name of the model DOM root
pub const MODEL_VARIABLE: &str = "model";

/// Name of a model created from scratch
pub const NEW_MODEL_NAME: &str = "New Model";

/// Load a model document, or create an empty model with the default folders
///
/// # Arguments
/// * `path` - Model document (JSON), `None` for a new model
pub fn load_model(path: Option<&Path>) -> Result<ModelGraph, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let json = fs::read_to_string(path).map_err(|e| format!("Cannot read model '{}': {}", path.display(), e))?;
            let graph = ModelGraph::from_json(&json)?;
            info!("Loaded model '{}' ({} nodes)", path.display(), graph.len());
            Ok(graph)
        }
        None => {
            debug!("No model given, creating '{}'", NEW_MODEL_NAME);
            Ok(ModelGraph::with_default_folders(NEW_MODEL_NAME))
        }
    }
}

/// Write the model document
pub fn save_model(graph: &ModelGraph, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    fs::write(path, graph.to_json()?).map_err(|e| format!("Cannot write model '{}': {}", path.display(), e))?;
    info!("Saved model to '{}'", path.display());
    Ok(())
}

/// A model, the runner bound to it, and its undo history
pub struct Session {
    graph: ModelGraph,
    runner: ScriptRunner,
    undo_stack: Arc<Mutex<CommandStack>>,
}

impl Session {
    /// Register the JavaScript provider and the `model` DOM root
    pub fn new(config: ScriptingConfig, graph: ModelGraph) -> Self {
        let mut providers = ProviderRegistry::new();
        providers.register(Arc::new(JsProvider::new()));

        let dom_roots = StaticDomRegistry::new().with(DomRegistration::new(
            MODEL_DOM_ID,
            MODEL_VARIABLE,
            DomRootSupplier::Factory(Arc::new(ModelRootFactory::new(graph.clone()))),
        ));

        let undo_stack = Arc::new(Mutex::new(CommandStack::new(config.undo_limit)));
        let host = HostServices::headless(undo_stack.clone());
        let runner = ScriptRunner::new(config, providers, Arc::new(dom_roots), host);

        Self {
            graph,
            runner,
            undo_stack,
        }
    }

    pub fn graph(&self) -> &ModelGraph {
        &self.graph
    }

    pub fn run(&self, source: ScriptSource) -> Result<RunReport, Box<dyn std::error::Error>> {
        Ok(self.runner.run(source)?)
    }

    /// Undo the last run, returning its label
    pub fn undo_last(&self) -> Result<Option<String>, Box<dyn std::error::Error>> {
        let mut stack = self.undo_stack.lock().unwrap_or_else(PoisonError::into_inner);
        let label = stack.undo()?;
        match &label {
            Some(label) => info!("Undone '{}'", label),
            None => warn!("Nothing to undo"),
        }
        Ok(label)
    }
}

/// Script source from the command line
pub fn script_source(script: Option<PathBuf>, eval: Option<String>) -> Option<ScriptSource> {
    script.map(ScriptSource::File).or(eval.map(ScriptSource::Inline))
}
