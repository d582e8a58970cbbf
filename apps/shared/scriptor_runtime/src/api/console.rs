/// Console API abstraction
///
/// Bridges script `console.*` calls to Rust's tracing system. The fields
/// `runtime_type` and `script` let the log formatter print the line as
/// `js::<script>: message`. This module is engine-agnostic.

use tracing::{debug, error, info, warn};

/// Console API implementation
#[derive(Debug, Clone, Copy)]
pub struct ConsoleApi;

impl ConsoleApi {
    /// Log an error message
    pub fn error(runtime_type: &str, script: &str, message: &str) {
        error!(runtime_type = runtime_type, script = script, "{}", message);
    }

    /// Log a warning message
    pub fn warn(runtime_type: &str, script: &str, message: &str) {
        warn!(runtime_type = runtime_type, script = script, "{}", message);
    }

    /// Log an info message
    pub fn info(runtime_type: &str, script: &str, message: &str) {
        info!(runtime_type = runtime_type, script = script, "{}", message);
    }

    /// Log a debug message
    pub fn debug(runtime_type: &str, script: &str, message: &str) {
        debug!(runtime_type = runtime_type, script = script, "{}", message);
    }

    /// Dispatch on a level name, unknown levels log at info
    pub fn by_level(level: &str, runtime_type: &str, script: &str, message: &str) {
        match level {
            "error" => Self::error(runtime_type, script, message),
            "warn" => Self::warn(runtime_type, script, message),
            "debug" => Self::debug(runtime_type, script, message),
            _ => Self::info(runtime_type, script, message),
        }
    }
}
