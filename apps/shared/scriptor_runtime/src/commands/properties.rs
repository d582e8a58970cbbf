use super::{CommandCore, CommandState, ScriptCommand};
use crate::error::CommandError;
use crate::model::{NodeRef, Property};

struct Captured {
    node: NodeRef,
    before: Vec<Property>,
    after: Vec<Property>,
}

/// Replace the whole property list of a node, keeping the previous list as
/// the undo memento
pub struct SetPropertiesCommand {
    core: CommandCore,
    captured: Option<Captured>,
}

impl SetPropertiesCommand {
    pub fn new(node: NodeRef, after: Vec<Property>) -> Self {
        let before = node.graph.properties(&node.id).unwrap_or_default();
        Self {
            core: CommandCore::new("Set properties"),
            captured: Some(Captured { node, before, after }),
        }
    }

    /// True when applying the command would not change anything
    pub fn is_noop(&self) -> bool {
        self.captured.as_ref().is_none_or(|c| c.before == c.after)
    }

    fn write(&self, pick: impl Fn(&Captured) -> &Vec<Property>) -> Result<(), CommandError> {
        let captured = self.captured.as_ref().ok_or_else(|| self.core.released())?;
        captured
            .node
            .graph
            .set_properties(&captured.node.id, pick(captured).clone())?;
        Ok(())
    }
}

impl ScriptCommand for SetPropertiesCommand {
    fn label(&self) -> &str {
        self.core.label()
    }

    fn state(&self) -> CommandState {
        self.core.state()
    }

    fn perform(&mut self) -> Result<(), CommandError> {
        self.core.check_perform()?;
        self.write(|c| &c.after)?;
        self.core.performed();
        Ok(())
    }

    fn undo(&mut self) -> Result<(), CommandError> {
        self.core.check_undo()?;
        self.write(|c| &c.before)?;
        self.core.undone();
        Ok(())
    }

    fn dispose(&mut self) {
        self.captured = None;
        self.core.disposed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_model;

    #[test]
    fn test_memento_restores_duplicates_in_order() {
        let sample = sample_model();
        let original = vec![
            Property::new("k", "1"),
            Property::new("x", "2"),
            Property::new("k", "3"),
        ];
        sample.graph.set_properties(&sample.actor, original.clone()).unwrap();

        let mut cmd = SetPropertiesCommand::new(sample.node(&sample.actor), vec![Property::new("k", "z")]);
        assert!(!cmd.is_noop());
        cmd.perform().unwrap();
        assert_eq!(sample.graph.properties(&sample.actor).unwrap(), vec![Property::new("k", "z")]);

        cmd.undo().unwrap();
        assert_eq!(sample.graph.properties(&sample.actor).unwrap(), original);
    }

    #[test]
    fn test_noop_detection() {
        let sample = sample_model();
        let cmd = SetPropertiesCommand::new(sample.node(&sample.actor), Vec::new());
        assert!(cmd.is_noop());
    }
}
