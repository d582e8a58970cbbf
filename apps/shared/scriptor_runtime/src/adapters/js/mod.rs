//! JavaScript Provider (QuickJS)
//!
//! Provides JavaScript script execution using the QuickJS engine via rquickjs.

pub mod bindings;
mod config;
mod provider;

pub use bindings::EntityJs;
pub use config::JsEngineConfig;
pub use provider::{JsEngine, JsProvider, JS_PROVIDER_ID};
