//! DOM-root registrations
//!
//! Contributors register named objects that every script sees as globals. The
//! runner enumerates the registry at the start of each run; a registration
//! that fails to produce its object is logged and skipped.

use std::sync::Arc;

use super::{DomContext, ProxyFactory};
use crate::engine::Binding;
use crate::error::DomError;
use crate::model::{ModelGraph, NodeRef};

/// Builds a DOM root when a run starts
pub trait DomRootFactory: Send + Sync {
    fn dom_root(&self, ctx: &DomContext) -> Result<Binding, DomError>;
}

/// Where the object of a registration comes from
#[derive(Clone)]
pub enum DomRootSupplier {
    /// A ready-made value
    Object(Binding),
    /// A factory asked once per run
    Factory(Arc<dyn DomRootFactory>),
}

/// One registered DOM root
#[derive(Clone)]
pub struct DomRegistration {
    /// Id of the contributing extension, used in logs
    pub extension_id: String,
    /// Global name; registrations without one are skipped
    pub variable: Option<String>,
    pub supplier: DomRootSupplier,
}

impl DomRegistration {
    pub fn new(extension_id: impl Into<String>, variable: impl Into<String>, supplier: DomRootSupplier) -> Self {
        Self {
            extension_id: extension_id.into(),
            variable: Some(variable.into()),
            supplier,
        }
    }

    /// Produce the object for this run
    pub fn resolve(&self, ctx: &DomContext) -> Result<Binding, DomError> {
        match &self.supplier {
            DomRootSupplier::Object(binding) => Ok(binding.clone()),
            DomRootSupplier::Factory(factory) => factory.dom_root(ctx),
        }
    }
}

/// Source of DOM-root registrations
pub trait DomRootRegistry: Send + Sync {
    fn registered_roots(&self) -> Vec<DomRegistration>;
}

/// Registry holding a fixed list of registrations
#[derive(Clone, Default)]
pub struct StaticDomRegistry {
    roots: Vec<DomRegistration>,
}

impl StaticDomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, registration: DomRegistration) {
        self.roots.push(registration);
    }

    /// Builder-style registration
    pub fn with(mut self, registration: DomRegistration) -> Self {
        self.register(registration);
        self
    }
}

impl DomRootRegistry for StaticDomRegistry {
    fn registered_roots(&self) -> Vec<DomRegistration> {
        self.roots.clone()
    }
}

/// Supplies the proxy of a model's root
pub struct ModelRootFactory {
    graph: ModelGraph,
}

impl ModelRootFactory {
    pub fn new(graph: ModelGraph) -> Self {
        Self { graph }
    }
}

impl DomRootFactory for ModelRootFactory {
    fn dom_root(&self, ctx: &DomContext) -> Result<Binding, DomError> {
        let root = NodeRef::root_of(&self.graph);
        ProxyFactory::wrap(ctx, &root)
            .map(Binding::Entity)
            .ok_or_else(|| DomError::InvalidArgument(format!("model root '{}' is not scriptable", root.id)))
    }
}
