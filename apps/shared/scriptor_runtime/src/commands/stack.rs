use tracing::{debug, warn};

use super::{CommandCore, CommandState, ScriptCommand};
use crate::error::CommandError;

/// A named, ordered group of commands that undo and redo as one
pub struct CompoundCommand {
    core: CommandCore,
    commands: Vec<Box<dyn ScriptCommand>>,
}

impl CompoundCommand {
    /// Wrap commands that have already been performed
    pub fn from_performed(label: impl Into<String>, commands: Vec<Box<dyn ScriptCommand>>) -> Self {
        let mut core = CommandCore::new(label);
        core.performed();
        Self { core, commands }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Labels of the contained commands, in issuance order
    pub fn labels(&self) -> Vec<&str> {
        self.commands.iter().map(|c| c.label()).collect()
    }
}

impl ScriptCommand for CompoundCommand {
    fn label(&self) -> &str {
        self.core.label()
    }

    fn state(&self) -> CommandState {
        self.core.state()
    }

    fn perform(&mut self) -> Result<(), CommandError> {
        self.core.check_perform()?;
        for command in self.commands.iter_mut() {
            command.perform()?;
        }
        self.core.performed();
        Ok(())
    }

    fn undo(&mut self) -> Result<(), CommandError> {
        self.core.check_undo()?;
        for command in self.commands.iter_mut().rev() {
            command.undo()?;
        }
        self.core.undone();
        Ok(())
    }

    fn redo(&mut self) -> Result<(), CommandError> {
        self.core.check_perform()?;
        for command in self.commands.iter_mut() {
            command.redo()?;
        }
        self.core.performed();
        Ok(())
    }

    fn dispose(&mut self) {
        for command in self.commands.iter_mut() {
            command.dispose();
        }
        self.commands.clear();
        self.core.disposed();
    }
}

/// The host side of undo: receives one unit per script run
pub trait UndoStack: Send {
    fn push(&mut self, unit: CompoundCommand);
}

/// Reference undo/redo history
///
/// A push drops the redo branch; units that fall off either end are disposed.
pub struct CommandStack {
    undo: Vec<CompoundCommand>,
    redo: Vec<CompoundCommand>,
    limit: usize,
}

impl CommandStack {
    /// `limit` of 0 keeps every unit
    pub fn new(limit: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            limit,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.undo.last().map(|u| u.label())
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.redo.last().map(|u| u.label())
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Most recent unit, if any
    pub fn peek(&self) -> Option<&CompoundCommand> {
        self.undo.last()
    }

    /// Undo the most recent unit and return its label
    pub fn undo(&mut self) -> Result<Option<String>, CommandError> {
        let Some(mut unit) = self.undo.pop() else {
            return Ok(None);
        };
        if let Err(e) = unit.undo() {
            warn!("Undo of '{}' failed, discarding: {}", unit.label(), e);
            unit.dispose();
            return Err(e);
        }
        let label = unit.label().to_string();
        self.redo.push(unit);
        Ok(Some(label))
    }

    /// Redo the most recently undone unit and return its label
    pub fn redo(&mut self) -> Result<Option<String>, CommandError> {
        let Some(mut unit) = self.redo.pop() else {
            return Ok(None);
        };
        if let Err(e) = unit.redo() {
            warn!("Redo of '{}' failed, discarding: {}", unit.label(), e);
            unit.dispose();
            return Err(e);
        }
        let label = unit.label().to_string();
        self.undo.push(unit);
        Ok(Some(label))
    }

    /// Dispose the whole history
    pub fn clear(&mut self) {
        for mut unit in self.undo.drain(..).chain(self.redo.drain(..)) {
            unit.dispose();
        }
    }
}

impl Default for CommandStack {
    fn default() -> Self {
        Self::new(0)
    }
}

impl UndoStack for CommandStack {
    fn push(&mut self, unit: CompoundCommand) {
        for mut stale in self.redo.drain(..) {
            stale.dispose();
        }

        debug!("Undo unit '{}' pushed ({} commands)", unit.label(), unit.len());
        self.undo.push(unit);

        if self.limit > 0 && self.undo.len() > self.limit {
            let overflow = self.undo.len() - self.limit;
            for mut old in self.undo.drain(..overflow) {
                old.dispose();
            }
        }
    }
}
