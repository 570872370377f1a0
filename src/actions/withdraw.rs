//! Withdrawal handler
//!
//! A withdraw order flags the formation; movement toward an edge is left to
//! the decision layer. Any withdraw order resolved while the formation stands
//! on a board edge takes it off the board, and every element still alive
//! leaves in retreat.

use crate::actions::{ActionHandler, HandlerContext, WithdrawAction};
use crate::battle::ledger::RemovalCondition;
use crate::battle::report::ReportRecord;
use crate::core::error::Result;
use crate::core::types::EntityId;
use crate::simulation::phase::Phase;

pub struct WithdrawActionHandler {
    action: WithdrawAction,
    finished: bool,
}

impl WithdrawActionHandler {
    pub fn new(action: WithdrawAction) -> Self {
        Self {
            action,
            finished: false,
        }
    }
}

impl ActionHandler for WithdrawActionHandler {
    fn cares(&self, phase: Phase) -> bool {
        phase.is_end()
    }

    fn execute(&mut self, ctx: &mut HandlerContext<'_>) -> Result<()> {
        let id = self.action.formation;
        let formation = ctx.required_mut(id)?;

        if !formation.withdrawing {
            formation.withdrawing = true;
            tracing::info!(formation = ?id, "formation begins withdrawing");
            ctx.report(ReportRecord::WithdrawalStarted { formation: id });
        }

        let formation = ctx.required(id)?;
        if !ctx.board.is_edge(formation.position) {
            return Ok(());
        }

        let entities: Vec<EntityId> = formation
            .units
            .iter()
            .flat_map(|u| u.elements.iter().map(|e| e.entity))
            .collect();

        let mut withdrawn = 0;
        for entity in entities {
            if ctx.ledger.is_live(entity) {
                ctx.ledger
                    .set_removal_condition(entity, RemovalCondition::InRetreat);
                ctx.retreated.push(entity);
                withdrawn += 1;
            }
        }

        ctx.formations.remove(id);
        tracing::info!(formation = ?id, elements = withdrawn, "formation left the battle");
        if withdrawn > 0 {
            ctx.report(ReportRecord::Withdrew {
                formation: id,
                elements: withdrawn,
            });
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn set_finished(&mut self) {
        self.finished = true;
    }
}
