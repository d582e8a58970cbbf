use super::{CommandCore, CommandState, ScriptCommand};
use crate::error::{CommandError, ModelError};
use crate::model::{NodeId, NodeRef};

struct Captured {
    connection: NodeRef,
    old_relationship: Option<NodeId>,
    new_relationship: NodeId,
}

/// Point a diagram connection at a different relationship.
///
/// Both directions run the same sequence: deregister the connection from the
/// relationship it shows, switch the reference, register it again. The
/// connection is never left detached between calls.
pub struct SetRelationshipOnConnectionCommand {
    core: CommandCore,
    captured: Option<Captured>,
}

impl SetRelationshipOnConnectionCommand {
    pub fn new(connection: NodeRef, relationship: NodeId) -> Result<Self, ModelError> {
        let old_relationship = connection.graph.connection_relationship(&connection.id)?;
        Ok(Self {
            core: CommandCore::new("Set relationship"),
            captured: Some(Captured {
                connection,
                old_relationship,
                new_relationship: relationship,
            }),
        })
    }

    fn rewire(&self, to_new: bool) -> Result<(), CommandError> {
        let captured = self.captured.as_ref().ok_or_else(|| self.core.released())?;
        let graph = &captured.connection.graph;
        let connection = &captured.connection.id;

        let relationship = if to_new {
            Some(&captured.new_relationship)
        } else {
            captured.old_relationship.as_ref()
        };
        if let Some(relationship) = relationship {
            if !graph.contains(relationship) {
                return Err(ModelError::NodeNotFound(relationship.clone()).into());
            }
        }

        graph.disconnect(connection)?;
        let switched = match relationship {
            Some(relationship) => graph.set_connection_relationship(connection, relationship),
            None => Ok(()),
        };
        // Reattach whatever the connection shows now, even after a failed switch
        graph.reconnect(connection)?;
        switched?;
        Ok(())
    }
}

impl ScriptCommand for SetRelationshipOnConnectionCommand {
    fn label(&self) -> &str {
        self.core.label()
    }

    fn state(&self) -> CommandState {
        self.core.state()
    }

    fn perform(&mut self) -> Result<(), CommandError> {
        self.core.check_perform()?;
        self.rewire(true)?;
        self.core.performed();
        Ok(())
    }

    fn undo(&mut self) -> Result<(), CommandError> {
        self.core.check_undo()?;
        self.rewire(false)?;
        self.core.undone();
        Ok(())
    }

    fn dispose(&mut self) {
        self.captured = None;
        self.core.disposed();
    }
}
