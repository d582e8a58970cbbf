//! Engine providers
//!
//! A provider knows one scripting language: it creates fresh engines and
//! evaluates files or inline source against them. The [`ProviderRegistry`]
//! picks the provider for a run, by file extension or by id.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::config::ScriptingConfig;
use crate::dom::EntityProxy;
use crate::error::{RunError, ScriptError};
use crate::script_files::script_label;

/// Opaque handle to a host object (window, shell, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostHandle {
    /// What kind of host object this is, e.g. `workbench`
    pub kind: String,
    /// Human readable description shown to scripts
    pub label: String,
}

impl HostHandle {
    pub fn new(kind: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            label: label.into(),
        }
    }
}

/// A value that can be bound to a global name in an engine
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Text(String),
    Entity(EntityProxy),
    Data(serde_json::Value),
    Host(HostHandle),
}

/// One script engine instance, created and dropped on the thread running the
/// script (no `Send` bound)
pub trait ScriptEngine {
    /// Bind a global name
    fn put(&mut self, name: &str, value: &Binding) -> Result<(), ScriptError>;

    /// Remove a global name, doing nothing if it is not defined
    fn remove(&mut self, name: &str) -> Result<(), ScriptError>;

    /// Evaluate source
    ///
    /// # Arguments
    /// * `source` - Script text
    /// * `origin` - Name reported in logs and error messages (file stem or inline label)
    fn eval(&mut self, source: &str, origin: &str) -> Result<(), ScriptError>;
}

/// Trait that all script engine providers must implement
pub trait ScriptEngineProvider: Send + Sync {
    /// Unique provider id, e.g. `scriptor.provider.js`
    fn id(&self) -> &str;

    /// Display name, e.g. `JavaScript`
    fn name(&self) -> &str;

    /// File extensions handled by this provider, with the leading dot
    fn extensions(&self) -> &[&str];

    /// Create a fresh engine for one run
    fn create_engine(&self, config: &ScriptingConfig) -> Result<Box<dyn ScriptEngine>, RunError>;

    /// Evaluate a script file
    ///
    /// The default reads the file and hands it to [`run_source`](Self::run_source).
    fn run_file(&self, path: &Path, engine: &mut dyn ScriptEngine) -> Result<(), ScriptError> {
        let source = fs::read_to_string(path).map_err(|e| ScriptError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        self.run_source(&source, &script_label(path), engine)
    }

    /// Evaluate inline source
    fn run_source(&self, source: &str, origin: &str, engine: &mut dyn ScriptEngine) -> Result<(), ScriptError>;

    /// True when this provider handles the extension of `path`
    fn handles(&self, path: &Path) -> bool {
        let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let dotted = format!(".{}", extension);
        self.extensions().iter().any(|e| e.eq_ignore_ascii_case(&dotted))
    }
}

/// Registry of the available providers
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn ScriptEngineProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider. A provider with the same id replaces the old one.
    pub fn register(&mut self, provider: Arc<dyn ScriptEngineProvider>) {
        self.providers.retain(|p| p.id() != provider.id());
        self.providers.push(provider);
    }

    /// Look a provider up by id
    pub fn provider_by_id(&self, id: &str) -> Option<Arc<dyn ScriptEngineProvider>> {
        self.providers.iter().find(|p| p.id() == id).cloned()
    }

    /// Look a provider up by the extension of `path`
    pub fn provider_for_file(&self, path: &Path) -> Option<Arc<dyn ScriptEngineProvider>> {
        self.providers.iter().find(|p| p.handles(path)).cloned()
    }

    /// Get list of all registered providers as `(id, name)` pairs
    pub fn list(&self) -> Vec<(&str, &str)> {
        self.providers.iter().map(|p| (p.id(), p.name())).collect()
    }

    /// Every extension with a provider
    pub fn extensions(&self) -> Vec<&str> {
        self.providers.iter().flat_map(|p| p.extensions().iter().copied()).collect()
    }
}
