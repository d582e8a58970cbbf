//! Scriptor Runtime
//!
//! A scripting bridge that lets user scripts (JavaScript by default) inspect
//! and mutate a typed model graph. Scripts never see graph nodes: they get
//! entity proxies, and every change a proxy makes goes through an undoable
//! command that the command recorder collects into one undo unit per run.
//!
//! # Architecture
//!
//! - **model**: the capability graph (folders, elements, relationships,
//!   diagrams and their objects/connections)
//! - **dom**: entity proxies, the proxy factory, selectors and DOM-root
//!   registrations
//! - **commands**: mutation commands, the command recorder and the undo stack
//! - **engine**: engine providers and the [`ScriptRunner`] that drives a run
//! - **adapters**: concrete engine providers (QuickJS behind the `js` feature)

pub mod api;
pub mod commands;
pub mod config;
pub mod dom;
pub mod engine;
pub mod error;
pub mod model;
pub mod script_files;

// Conditional module imports based on features
#[cfg(feature = "js")]
pub mod adapters;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{ScriptingConfig, Validatable};
pub use dom::{DomContext, EntityProxy, ProxyFactory};
pub use engine::{
    Binding, HostServices, ProviderRegistry, RunOutcome, RunReport, ScriptEngine, ScriptEngineProvider, ScriptRunner,
    ScriptSource,
};
pub use error::{CommandError, ConfigError, DomError, LinkError, ModelError, RunError, ScriptError};
pub use model::{ModelGraph, NodeId, NodeRef};
