//! Mutation commands
//!
//! Every change a script makes to the model is a [`ScriptCommand`]. The
//! [`CommandRecorder`] collects the commands of one run and hands them to the
//! host's [`UndoStack`] as a single named [`CompoundCommand`].
//!
//! Lifecycle of a command:
//!
//! ```text
//! Pending --perform--> Performed --undo--> Undone --redo--> Performed ...
//!                          \                  /
//!                           +---dispose------+--> Disposed (terminal)
//! ```

mod attribute;
mod delete;
mod properties;
mod recorder;
mod relationship;
mod stack;

pub use attribute::SetAttributeCommand;
pub use delete::DeleteNodesCommand;
pub use properties::SetPropertiesCommand;
pub use recorder::CommandRecorder;
pub use relationship::SetRelationshipOnConnectionCommand;
pub use stack::{CommandStack, CompoundCommand, UndoStack};

use crate::error::CommandError;

/// Lifecycle state of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    Pending,
    Performed,
    Undone,
    Disposed,
}

/// A reversible change to the model
pub trait ScriptCommand: Send {
    /// Human readable label
    fn label(&self) -> &str;

    fn state(&self) -> CommandState;

    /// Apply the change. Valid from `Pending` and `Undone`.
    fn perform(&mut self) -> Result<(), CommandError>;

    /// Revert the change. Valid from `Performed`.
    fn undo(&mut self) -> Result<(), CommandError>;

    /// Re-apply an undone change
    fn redo(&mut self) -> Result<(), CommandError> {
        self.perform()
    }

    /// Release every captured reference. Terminal.
    fn dispose(&mut self);
}

/// Label and state bookkeeping shared by all commands
#[derive(Debug, Clone)]
pub struct CommandCore {
    label: String,
    state: CommandState,
}

impl CommandCore {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            state: CommandState::Pending,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> CommandState {
        self.state
    }

    pub fn check_perform(&self) -> Result<(), CommandError> {
        match self.state {
            CommandState::Pending | CommandState::Undone => Ok(()),
            state => Err(self.reject("perform", state)),
        }
    }

    pub fn check_undo(&self) -> Result<(), CommandError> {
        match self.state {
            CommandState::Performed => Ok(()),
            state => Err(self.reject("undo", state)),
        }
    }

    pub fn performed(&mut self) {
        self.state = CommandState::Performed;
    }

    pub fn undone(&mut self) {
        self.state = CommandState::Undone;
    }

    pub fn disposed(&mut self) {
        self.state = CommandState::Disposed;
    }

    fn reject(&self, action: &'static str, state: CommandState) -> CommandError {
        if state == CommandState::Disposed {
            CommandError::Disposed {
                label: self.label.clone(),
            }
        } else {
            CommandError::InvalidState {
                label: self.label.clone(),
                action,
                state,
            }
        }
    }

    /// Error for a command whose captured state is already gone
    pub fn released(&self) -> CommandError {
        CommandError::Disposed {
            label: self.label.clone(),
        }
    }
}
