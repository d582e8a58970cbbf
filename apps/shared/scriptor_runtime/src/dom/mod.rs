//! Script-facing object model
//!
//! Scripts never see graph nodes. They see [`EntityProxy`] values produced by
//! the [`ProxyFactory`], and every mutation a proxy makes passes the
//! model-access guard in [`DomContext`] and is issued as a command through the
//! run's [`CommandRecorder`].

mod factory;
mod proxy;
mod registry;
mod selector;

pub use factory::{ProxyFactory, ProxyKind};
pub use proxy::{AttrValue, EntityProxy};
pub use registry::{DomRegistration, DomRootFactory, DomRootRegistry, DomRootSupplier, ModelRootFactory, StaticDomRegistry};
pub use selector::Selector;

use crate::commands::{CommandRecorder, ScriptCommand};
use crate::error::DomError;
use crate::model::ModelGraph;

/// Session state shared by every proxy of one run
#[derive(Clone, Default)]
pub struct DomContext {
    recorder: CommandRecorder,
}

impl DomContext {
    pub fn new(recorder: CommandRecorder) -> Self {
        Self { recorder }
    }

    pub fn recorder(&self) -> &CommandRecorder {
        &self.recorder
    }

    /// Fail unless a run is active and `graph` (when given) is open and
    /// writable
    pub fn check_model_access(&self, graph: Option<&ModelGraph>) -> Result<(), DomError> {
        if !self.recorder.is_active() {
            return Err(DomError::AccessDenied("no script is running".into()));
        }
        if let Some(graph) = graph {
            if !graph.is_open() {
                return Err(DomError::AccessDenied("model is closed".into()));
            }
            if graph.is_read_only() {
                return Err(DomError::AccessDenied("model is read-only".into()));
            }
        }
        Ok(())
    }

    /// Issue a command into the current run
    pub fn execute(&self, command: Box<dyn ScriptCommand>) -> Result<(), DomError> {
        self.recorder.execute(command)?;
        Ok(())
    }
}
