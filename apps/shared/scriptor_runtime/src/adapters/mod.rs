//! Engine Adapters
//!
//! This module contains providers for concrete scripting engines.
//! Each adapter implements the ScriptEngineProvider trait and provides language-specific bindings.

#[cfg(feature = "js")]
pub mod js;

#[cfg(feature = "js")]
pub use js::{JsEngine, JsEngineConfig, JsProvider, JS_PROVIDER_ID};
