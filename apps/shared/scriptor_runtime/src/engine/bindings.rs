use std::path::{Path, MAIN_SEPARATOR};
use tracing::{debug, warn};

use super::{Binding, HostHandle, ScriptEngine};
use crate::dom::{DomContext, DomRootRegistry};

/// Global name of the workbench handle
pub const WORKBENCH: &str = "workbench";
/// Global name of the active window handle
pub const WORKBENCH_WINDOW: &str = "workbenchwindow";
/// Global name of the shell handle
pub const SHELL: &str = "shell";
/// Global name of the user scripts folder
pub const SCRIPTS_DIR: &str = "__SCRIPTS_DIR__";

/// Handles of a running UI host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiHandles {
    pub workbench: HostHandle,
    pub window: HostHandle,
    pub shell: HostHandle,
}

/// The globals of one run, built once before evaluation
#[derive(Debug, Clone, Default)]
pub struct RunBindings {
    entries: Vec<(String, Binding)>,
}

impl RunBindings {
    /// Collect host handles (only with a UI host) followed by every DOM root.
    /// A DOM root that fails to resolve is logged and skipped.
    pub fn build(
        ui: Option<&UiHandles>,
        scripts_dir: Option<&Path>,
        registry: &dyn DomRootRegistry,
        ctx: &DomContext,
    ) -> Self {
        let mut entries = Vec::new();

        if let Some(ui) = ui {
            entries.push((WORKBENCH.to_string(), Binding::Host(ui.workbench.clone())));
            entries.push((WORKBENCH_WINDOW.to_string(), Binding::Host(ui.window.clone())));
            entries.push((SHELL.to_string(), Binding::Host(ui.shell.clone())));

            if let Some(dir) = scripts_dir {
                let absolute = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());
                let mut text = absolute.display().to_string();
                if !text.ends_with(MAIN_SEPARATOR) {
                    text.push(MAIN_SEPARATOR);
                }
                entries.push((SCRIPTS_DIR.to_string(), Binding::Text(text)));
            }
        }

        for registration in registry.registered_roots() {
            let Some(variable) = registration.variable.clone() else {
                debug!("DOM root from '{}' has no variable name, skipped", registration.extension_id);
                continue;
            };
            match registration.resolve(ctx) {
                Ok(binding) => entries.push((variable, binding)),
                Err(e) => warn!(
                    "Failed to register DOM root '{}' from '{}': {}",
                    variable, registration.extension_id, e
                ),
            }
        }

        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, b)| b)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.entries.iter().map(|(n, b)| (n.as_str(), b))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bind every entry into `engine`. Entries the engine rejects are logged
    /// and skipped. Returns the number bound.
    pub fn apply(&self, engine: &mut dyn ScriptEngine) -> usize {
        let mut bound = 0;
        for (name, binding) in &self.entries {
            match engine.put(name, binding) {
                Ok(()) => bound += 1,
                Err(e) => warn!("Failed to bind global '{}': {}", name, e),
            }
        }
        bound
    }
}
