//! Movement handlers

use crate::actions::{ActionHandler, HandlerContext, MoveAction};
use crate::battle::report::{DistanceChange, ReportRecord};
use crate::core::error::Result;
use crate::simulation::phase::Phase;

/// Move the formation and report it. A withdrawing formation's move is
/// reported as a retreat; the state change is the same.
fn move_formation(ctx: &mut HandlerContext<'_>, action: &MoveAction, to_cover: bool) -> Result<()> {
    let from = ctx.required(action.formation)?.position;
    let to = ctx.board.clamp(action.destination);

    // The reference formation may already be gone
    let reference = action
        .relative_to
        .and_then(|id| ctx.formations.get(id))
        .map(|f| (f.id, f.position));

    let formation = ctx.required_mut(action.formation)?;
    formation.position = to;
    formation.memory.in_cover = to_cover;
    let retreat = formation.withdrawing;

    let distance = reference.map(|(id, position)| DistanceChange {
        relative_to: id,
        before: from.distance(&position),
        after: to.distance(&position),
    });

    ctx.report(ReportRecord::Moved {
        formation: action.formation,
        from,
        to,
        distance,
        retreat,
        to_cover,
    });
    Ok(())
}

pub struct MoveActionHandler {
    action: MoveAction,
    finished: bool,
}

impl MoveActionHandler {
    pub fn new(action: MoveAction) -> Self {
        Self {
            action,
            finished: false,
        }
    }
}

impl ActionHandler for MoveActionHandler {
    fn cares(&self, phase: Phase) -> bool {
        phase.is_movement()
    }

    fn execute(&mut self, ctx: &mut HandlerContext<'_>) -> Result<()> {
        move_formation(ctx, &self.action, false)
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn set_finished(&mut self) {
        self.finished = true;
    }
}

/// Like a move, but leaves the formation flagged as in cover until it
/// moves again
pub struct MoveToCoverActionHandler {
    action: MoveAction,
    finished: bool,
}

impl MoveToCoverActionHandler {
    pub fn new(action: MoveAction) -> Self {
        Self {
            action,
            finished: false,
        }
    }
}

impl ActionHandler for MoveToCoverActionHandler {
    fn cares(&self, phase: Phase) -> bool {
        phase.is_movement()
    }

    fn execute(&mut self, ctx: &mut HandlerContext<'_>) -> Result<()> {
        move_formation(ctx, &self.action, true)
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn set_finished(&mut self) {
        self.finished = true;
    }
}
