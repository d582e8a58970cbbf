//! Scripting configuration
//!
//! Configuration files are JSON. They are validated against the JSON Schema
//! generated from [`ScriptingConfig`] before being deserialized, so a typo in
//! a field value is reported with the schema path rather than as a serde error.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::str::FromStr;
use std::path::PathBuf;

use crate::error::ConfigError;

/// Types that can be loaded from JSON and validated against their schema
pub trait Validatable: JsonSchema + for<'de> Deserialize<'de> {
    /// Load and validate from JSON file
    fn from_json_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_string(), e))?;

        Self::from_json_str(&content)
    }

    /// Load and validate from JSON string
    fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_json::from_str(json)?;

        let schema = schemars::schema_for!(Self);
        let schema_json = serde_json::to_value(&schema)?;

        let compiled = jsonschema::validator_for(&schema_json).map_err(|e| ConfigError::Validation(e.to_string()))?;

        compiled
            .validate(&value)
            .map_err(|e| ConfigError::Validation(format!("{}", e)))?;

        Ok(serde_json::from_value(value)?)
    }

    /// Generate JSON Schema for this type
    fn generate_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Self)
    }

    /// Generate JSON Schema as JSON string
    fn schema_json() -> Result<String, ConfigError> {
        let schema = Self::generate_schema();
        Ok(serde_json::to_string_pretty(&schema)?)
    }
}

const BYTE_UNITS: [(char, usize); 3] = [('G', 1 << 30), ('M', 1 << 20), ('K', 1 << 10)];

/// Engine limit in bytes, written in config files as `1048576` or `"1M"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ByteSizeInput", into = "String")]
pub struct ByteSize(pub usize);

/// Accepted spellings of a [`ByteSize`]
#[derive(Deserialize, JsonSchema)]
#[serde(untagged)]
enum ByteSizeInput {
    /// Plain byte count
    Bytes(u64),
    /// Count with a K, M or G suffix (powers of 1024)
    Text(String),
}

impl ByteSize {
    pub fn as_bytes(&self) -> usize {
        self.0
    }
}

impl FromStr for ByteSize {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        let (digits, unit) = match text.chars().last().map(|c| c.to_ascii_uppercase()) {
            Some(last) if last.is_ascii_alphabetic() => {
                let unit = BYTE_UNITS
                    .iter()
                    .find(|(suffix, _)| *suffix == last)
                    .map(|(_, unit)| *unit)
                    .ok_or_else(|| format!("Unknown size suffix in '{}'", text))?;
                (&text[..text.len() - 1], unit)
            }
            _ => (text, 1),
        };
        let count: usize = digits
            .trim()
            .parse()
            .map_err(|_| format!("Invalid byte size '{}'", text))?;
        Ok(ByteSize(count.saturating_mul(unit)))
    }
}

impl TryFrom<ByteSizeInput> for ByteSize {
    type Error = String;

    fn try_from(input: ByteSizeInput) -> Result<Self, Self::Error> {
        match input {
            ByteSizeInput::Bytes(count) => usize::try_from(count)
                .map(ByteSize)
                .map_err(|_| format!("Byte size {} is too large", count)),
            ByteSizeInput::Text(text) => text.parse(),
        }
    }
}

impl From<ByteSize> for String {
    fn from(size: ByteSize) -> Self {
        size.to_string()
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let largest = BYTE_UNITS
            .iter()
            .find(|(_, unit)| self.0 > 0 && self.0 % unit == 0);
        match largest {
            Some((suffix, unit)) => write!(f, "{}{}", self.0 / unit, suffix),
            None => write!(f, "{}", self.0),
        }
    }
}

impl JsonSchema for ByteSize {
    fn schema_name() -> String {
        "ByteSize".to_string()
    }

    fn json_schema(generator: &mut schemars::r#gen::SchemaGenerator) -> schemars::schema::Schema {
        ByteSizeInput::json_schema(generator)
    }
}

/// JavaScript engine limits
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JsConfig {
    /// Heap limit of one engine; 0 disables the limit
    #[serde(default = "default_memory_limit")]
    #[schemars(description = "Maximum heap size of one script engine. Accepts numbers or strings with K/M/G suffix (default: 64M, 0 = unlimited)")]
    pub memory_limit: ByteSize,

    /// Native stack limit of one engine; 0 disables the limit
    #[serde(default = "default_max_stack_size")]
    #[schemars(description = "Maximum stack size of one script engine (default: 1M, 0 = unlimited)")]
    pub max_stack_size: ByteSize,
}

impl Default for JsConfig {
    fn default() -> Self {
        Self {
            memory_limit: default_memory_limit(),
            max_stack_size: default_max_stack_size(),
        }
    }
}

/// Scripting configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[schemars(title = "Scriptor Configuration")]
#[schemars(description = "Configuration for running model scripts")]
pub struct ScriptingConfig {
    /// Logging level
    #[serde(default = "default_log_level")]
    #[schemars(description = "Log level: trace, debug, info, warn, error")]
    #[schemars(regex(pattern = r"^(trace|debug|info|warn|error)$"))]
    pub log_level: String,

    /// User scripts folder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Directory holding user scripts, exposed to scripts as __SCRIPTS_DIR__")]
    pub scripts_dir: Option<PathBuf>,

    /// Provider used for inline source
    #[serde(default = "default_provider")]
    #[schemars(description = "Id of the script provider used when the script is inline text")]
    pub default_provider: String,

    /// Undo label for inline source
    #[serde(default = "default_inline_label")]
    #[schemars(description = "Undo label used when the script is inline text rather than a file")]
    pub inline_label: String,

    /// Globals removed before a script runs
    #[serde(default = "default_blocked_globals")]
    #[schemars(description = "Global names removed from every engine before evaluation")]
    pub blocked_globals: Vec<String>,

    /// Maximum hops when following link files
    #[serde(default = "default_max_link_depth")]
    #[schemars(description = "Maximum number of link files followed for one script", range(min = 1, max = 64))]
    pub max_link_depth: u32,

    /// Undo the commands of a failed run
    #[serde(default)]
    #[schemars(description = "Roll back every change of a script that ends with an error (default: false)")]
    pub rollback_on_error: bool,

    /// Undo history size
    #[serde(default = "default_undo_limit")]
    #[schemars(description = "Number of undo units kept by the reference undo stack, 0 = unlimited")]
    pub undo_limit: usize,

    /// JavaScript engine settings
    #[serde(default)]
    pub js: JsConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_provider() -> String {
    "scriptor.provider.js".to_string()
}

fn default_inline_label() -> String {
    "Local Script".to_string()
}

fn default_blocked_globals() -> Vec<String> {
    vec!["exit".to_string(), "quit".to_string()]
}

fn default_max_link_depth() -> u32 {
    8
}

fn default_undo_limit() -> usize {
    100
}

fn default_memory_limit() -> ByteSize {
    ByteSize(64 * 1024 * 1024)
}

fn default_max_stack_size() -> ByteSize {
    ByteSize(1024 * 1024)
}

impl Default for ScriptingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            scripts_dir: None,
            default_provider: default_provider(),
            inline_label: default_inline_label(),
            blocked_globals: default_blocked_globals(),
            max_link_depth: default_max_link_depth(),
            rollback_on_error: false,
            undo_limit: default_undo_limit(),
            js: JsConfig::default(),
        }
    }
}

impl Validatable for ScriptingConfig {}
