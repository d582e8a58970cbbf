use thiserror::Error;

use crate::commands::CommandState;
use crate::model::NodeId;

/// Errors raised by the model graph itself
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Node '{child}' cannot be contained by '{parent}'")]
    InvalidParent { parent: NodeId, child: String },

    #[error("Unknown {kind} type: '{type_name}'")]
    UnknownType { kind: &'static str, type_name: String },

    #[error("Node '{0}' is not a diagram connection")]
    NotAConnection(NodeId),

    #[error("Model document error: {0}")]
    Document(String),
}

/// Errors raised while performing or undoing a mutation command
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Command '{label}' has been disposed")]
    Disposed { label: String },

    #[error("Command '{label}' cannot {action} while {state:?}")]
    InvalidState {
        label: String,
        action: &'static str,
        state: CommandState,
    },

    #[error("No script is running, command '{0}' was not executed")]
    NoActiveSession(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Errors surfaced to scripts by the DOM layer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomError {
    #[error("Model access denied: {0}")]
    AccessDenied(String),

    #[error("Cannot delete: {0}")]
    NotDeletable(String),

    #[error("'{operation}' is not supported by {target}")]
    Unsupported { operation: &'static str, target: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Outcome of a provider evaluation that did not complete normally
#[derive(Error, Debug)]
pub enum ScriptError {
    /// The sanctioned termination path requested by the script
    #[error("Script requested exit")]
    Exit,

    #[error("{0}")]
    Evaluation(String),

    #[error("Failed to read script '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that prevent a run from starting at all
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Script provider not found for {0}")]
    ProviderNotFound(String),

    #[error("Failed to create script engine '{provider}': {message}")]
    Engine { provider: String, message: String },

    #[error("A script is already running")]
    SessionActive,

    #[error(transparent)]
    Link(#[from] LinkError),
}

/// Errors loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read file '{0}': {1}")]
    Io(String, #[source] std::io::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Schema validation failed: {0}")]
    Validation(String),
}

/// Errors resolving script link files
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Failed to read link file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Link file '{0}' is empty")]
    Empty(String),

    #[error("Link chain starting at '{path}' exceeds {max_depth} hops")]
    TooDeep { path: String, max_depth: u32 },
}
