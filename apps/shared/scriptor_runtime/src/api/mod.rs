//! Host APIs shared by engine adapters
//!
//! APIs here are engine-agnostic. Engine-specific bindings (in adapters)
//! expose them to scripts.

pub mod console;

pub use console::ConsoleApi;
