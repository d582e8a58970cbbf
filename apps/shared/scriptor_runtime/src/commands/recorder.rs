use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use super::{CompoundCommand, ScriptCommand, UndoStack};
use crate::error::CommandError;

#[derive(Default)]
struct RecorderState {
    active: bool,
    commands: Vec<Box<dyn ScriptCommand>>,
}

/// Collects the commands issued during one script run.
///
/// Clones share the same session. Only one session may be active at a time.
#[derive(Clone, Default)]
pub struct CommandRecorder {
    state: Arc<Mutex<RecorderState>>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RecorderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Begin a session. Returns false if one is already active.
    pub fn start(&self) -> bool {
        let mut state = self.lock();
        if state.active {
            warn!("Command recorder already active");
            return false;
        }
        state.active = true;
        state.commands.clear();
        debug!("Command recorder started");
        true
    }

    pub fn is_active(&self) -> bool {
        self.lock().active
    }

    /// Number of commands recorded so far in the current session
    pub fn len(&self) -> usize {
        self.lock().commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().commands.is_empty()
    }

    /// Perform a command and record it. A command that fails to perform is
    /// disposed and not recorded.
    pub fn execute(&self, mut command: Box<dyn ScriptCommand>) -> Result<(), CommandError> {
        let mut state = self.lock();
        if !state.active {
            let label = command.label().to_string();
            command.dispose();
            return Err(CommandError::NoActiveSession(label));
        }

        if let Err(e) = command.perform() {
            command.dispose();
            return Err(e);
        }
        debug!("Recorded command '{}'", command.label());
        state.commands.push(command);
        Ok(())
    }

    /// End the session and hand the recorded commands to `stack` as one
    /// unit named `label`. Nothing is pushed if no command was recorded.
    /// Returns the number of commands in the unit.
    pub fn finalise(&self, label: &str, stack: &mut dyn UndoStack) -> usize {
        let commands = {
            let mut state = self.lock();
            state.active = false;
            std::mem::take(&mut state.commands)
        };

        let count = commands.len();
        if count > 0 {
            stack.push(CompoundCommand::from_performed(label, commands));
        }
        debug!("Command recorder finalised '{}' with {} commands", label, count);
        count
    }

    /// End the session by undoing every recorded command, newest first.
    /// Returns the number of commands rolled back.
    pub fn rollback(&self) -> usize {
        let commands = {
            let mut state = self.lock();
            state.active = false;
            std::mem::take(&mut state.commands)
        };

        let count = commands.len();
        for mut command in commands.into_iter().rev() {
            if let Err(e) = command.undo() {
                warn!("Rollback of '{}' failed: {}", command.label(), e);
            }
            command.dispose();
        }
        debug!("Command recorder rolled back {} commands", count);
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{CommandStack, SetAttributeCommand, SetPropertiesCommand};
    use crate::model::{Property, TextAttribute};
    use crate::test_support::sample_model;

    #[test]
    fn test_inactive_recorder_rejects_commands() {
        let sample = sample_model();
        let recorder = CommandRecorder::new();
        let cmd = SetAttributeCommand::new(sample.node(&sample.actor), TextAttribute::Name, "x");
        assert!(matches!(
            recorder.execute(Box::new(cmd)),
            Err(CommandError::NoActiveSession(_))
        ));
        assert_eq!(sample.graph.text_attribute(&sample.actor, TextAttribute::Name).as_deref(), Some("Clerk"));
    }

    #[test]
    fn test_not_reentrant() {
        let recorder = CommandRecorder::new();
        assert!(recorder.start());
        assert!(!recorder.start());
    }

    #[test]
    fn test_finalise_pushes_one_unit_in_order() {
        let sample = sample_model();
        let recorder = CommandRecorder::new();
        let mut stack = CommandStack::default();

        recorder.start();
        recorder
            .execute(Box::new(SetAttributeCommand::new(sample.node(&sample.actor), TextAttribute::Name, "A")))
            .unwrap();
        recorder
            .execute(Box::new(SetPropertiesCommand::new(
                sample.node(&sample.actor),
                vec![Property::new("k", "v")],
            )))
            .unwrap();

        assert_eq!(recorder.finalise("my-script", &mut stack), 2);
        assert!(!recorder.is_active());
        assert_eq!(stack.undo_len(), 1);
        let unit = stack.peek().unwrap();
        assert_eq!(unit.label(), "my-script");
        assert_eq!(unit.labels(), vec!["Set name", "Set properties"]);

        stack.undo().unwrap();
        assert_eq!(sample.graph.text_attribute(&sample.actor, TextAttribute::Name).as_deref(), Some("Clerk"));
        assert_eq!(sample.graph.properties(&sample.actor).unwrap(), Vec::new());
    }

    #[test]
    fn test_finalise_without_commands_pushes_nothing() {
        let recorder = CommandRecorder::new();
        let mut stack = CommandStack::default();
        recorder.start();
        assert_eq!(recorder.finalise("empty", &mut stack), 0);
        assert!(!stack.can_undo());
    }

    #[test]
    fn test_rollback_restores_model() {
        let sample = sample_model();
        let before = sample.graph.to_json().unwrap();
        let recorder = CommandRecorder::new();

        recorder.start();
        recorder
            .execute(Box::new(SetAttributeCommand::new(sample.node(&sample.role), TextAttribute::Documentation, "d")))
            .unwrap();
        assert_eq!(recorder.rollback(), 1);
        assert_eq!(sample.graph.to_json().unwrap(), before);
    }
}
