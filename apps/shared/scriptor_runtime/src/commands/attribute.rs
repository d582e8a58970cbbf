use super::{CommandCore, CommandState, ScriptCommand};
use crate::error::CommandError;
use crate::model::{NodeRef, TextAttribute};

struct Captured {
    node: NodeRef,
    old_value: String,
    new_value: String,
}

/// Rewrite the name or documentation of a node
pub struct SetAttributeCommand {
    core: CommandCore,
    attribute: TextAttribute,
    captured: Option<Captured>,
}

impl SetAttributeCommand {
    pub fn new(node: NodeRef, attribute: TextAttribute, value: impl Into<String>) -> Self {
        let old_value = node.graph.text_attribute(&node.id, attribute).unwrap_or_default();
        Self {
            core: CommandCore::new(format!("Set {}", attribute.as_str())),
            attribute,
            captured: Some(Captured {
                node,
                old_value,
                new_value: value.into(),
            }),
        }
    }

    fn write(&self, pick: impl Fn(&Captured) -> &str) -> Result<(), CommandError> {
        let captured = self.captured.as_ref().ok_or_else(|| self.core.released())?;
        captured
            .node
            .graph
            .set_text_attribute(&captured.node.id, self.attribute, pick(captured))?;
        Ok(())
    }
}

impl ScriptCommand for SetAttributeCommand {
    fn label(&self) -> &str {
        self.core.label()
    }

    fn state(&self) -> CommandState {
        self.core.state()
    }

    fn perform(&mut self) -> Result<(), CommandError> {
        self.core.check_perform()?;
        self.write(|c| &c.new_value)?;
        self.core.performed();
        Ok(())
    }

    fn undo(&mut self) -> Result<(), CommandError> {
        self.core.check_undo()?;
        self.write(|c| &c.old_value)?;
        self.core.undone();
        Ok(())
    }

    fn dispose(&mut self) {
        self.captured = None;
        self.core.disposed();
    }
}
