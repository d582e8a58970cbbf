use super::{CommandCore, CommandState, ScriptCommand};
use crate::error::CommandError;
use crate::model::{GraphSnapshot, ModelGraph, NodeId};

struct Captured {
    graph: ModelGraph,
    targets: Vec<NodeId>,
    snapshot: Option<GraphSnapshot>,
}

/// Delete nodes together with everything that depends on them
pub struct DeleteNodesCommand {
    core: CommandCore,
    captured: Option<Captured>,
}

impl DeleteNodesCommand {
    pub fn new(graph: ModelGraph, targets: Vec<NodeId>) -> Self {
        Self {
            core: CommandCore::new("Delete"),
            captured: Some(Captured {
                graph,
                targets,
                snapshot: None,
            }),
        }
    }

    /// Ids removed by the last perform
    pub fn removed(&self) -> Vec<NodeId> {
        self.captured
            .as_ref()
            .and_then(|c| c.snapshot.as_ref())
            .map(GraphSnapshot::removed_ids)
            .unwrap_or_default()
    }
}

impl ScriptCommand for DeleteNodesCommand {
    fn label(&self) -> &str {
        self.core.label()
    }

    fn state(&self) -> CommandState {
        self.core.state()
    }

    fn perform(&mut self) -> Result<(), CommandError> {
        self.core.check_perform()?;
        let released = self.core.released();
        let captured = self.captured.as_mut().ok_or(released)?;

        let closure = captured.graph.deletion_closure(&captured.targets);
        let snapshot = captured.graph.snapshot(&closure);
        captured.graph.remove_nodes(&closure);
        captured.snapshot = Some(snapshot);

        self.core.performed();
        Ok(())
    }

    fn undo(&mut self) -> Result<(), CommandError> {
        self.core.check_undo()?;
        let captured = self.captured.as_ref().ok_or_else(|| self.core.released())?;
        if let Some(snapshot) = captured.snapshot.as_ref() {
            captured.graph.restore_nodes(snapshot);
        }
        self.core.undone();
        Ok(())
    }

    fn dispose(&mut self) {
        self.captured = None;
        self.core.disposed();
    }
}
