//! Execution engine
//!
//! [`ScriptRunner::run`] drives one script run:
//!
//! 1. pick the provider (by file extension, following link files, or by id
//!    for inline source)
//! 2. create a fresh engine
//! 3. build the [`RunBindings`] (host handles when a UI is running, then every
//!    DOM root) and bind them
//! 4. remove blocked globals such as `exit` and `quit`
//! 5. start console redirection, the command recorder and UI refresh batching
//! 6. evaluate
//! 7. stop refresh batching, hand the recorded commands to the undo stack,
//!    end console redirection

mod bindings;
mod lifecycle;
mod provider;
mod runner;

pub use bindings::{RunBindings, UiHandles, SCRIPTS_DIR, SHELL, WORKBENCH, WORKBENCH_WINDOW};
pub use lifecycle::{ConsoleOutput, LogConsole, NoRefresh, UiRefresh};
pub use provider::{Binding, HostHandle, ProviderRegistry, ScriptEngine, ScriptEngineProvider};
pub use runner::{HostServices, RunOutcome, RunReport, ScriptRunner, ScriptSource};
