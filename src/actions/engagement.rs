//! Engagement and control handler

use crate::actions::{ActionHandler, EngagementControlAction, HandlerContext};
use crate::battle::engagement::{ContestResult, EngagementControl, EngagementRecord};
use crate::battle::report::ReportRecord;
use crate::battle::roll::Roll;
use crate::core::error::{Result, SimulationError};
use crate::simulation::phase::Phase;

/// Resolves a contested engagement roll-off between the acting formation
/// and its chosen opponent
pub struct EngagementAndControlActionHandler {
    action: EngagementControlAction,
    finished: bool,
}

impl EngagementAndControlActionHandler {
    pub fn new(action: EngagementControlAction) -> Self {
        Self {
            action,
            finished: false,
        }
    }
}

impl ActionHandler for EngagementAndControlActionHandler {
    fn cares(&self, phase: Phase) -> bool {
        phase.is_movement()
    }

    fn execute(&mut self, ctx: &mut HandlerContext<'_>) -> Result<()> {
        let action = self.action;
        let actor = ctx.required(action.formation)?;

        if action.mode == EngagementControl::None {
            ctx.required_mut(action.formation)?.engagement_control = EngagementControl::None;
            ctx.report(ReportRecord::EngagementControlCleared {
                formation: action.formation,
            });
            return Ok(());
        }

        if action.target == action.formation {
            ctx.report(ReportRecord::ActionSkipped {
                formation: action.formation,
                reason: "formation cannot engage itself".into(),
            });
            return Ok(());
        }

        // The opponent may have died earlier this round
        let Some(defender) = ctx.formations.get(action.target) else {
            ctx.report(ReportRecord::ActionSkipped {
                formation: action.formation,
                reason: format!("engagement target {:?} is gone", action.target),
            });
            return Ok(());
        };

        let attacker_target = ctx.to_hit.engagement_control(actor, defender, action.mode);
        let defender_target = ctx.to_hit.engagement_control(defender, actor, action.mode);

        let contest = ContestResult {
            attacker_roll: Roll::two_d6(ctx.dice),
            attacker_target: attacker_target.value,
            defender_roll: Roll::two_d6(ctx.dice),
            defender_target: defender_target.value,
        };
        let attacker_won = contest.attacker_wins();

        let record = EngagementRecord {
            round: ctx.round,
            initiator: action.formation,
            opponent: action.target,
            mode: action.mode,
            initiator_won: attacker_won,
        };

        let Some((attacker, defender)) = ctx
            .formations
            .get_pair_mut(action.formation, action.target)
        else {
            return Err(SimulationError::FormationNotFound(action.target));
        };

        attacker.engagement_control = action.mode;
        attacker.engagement_control_failed = !attacker_won;
        if attacker_won && action.mode.engages() {
            attacker.target = Some(defender.id);
            defender.target = Some(attacker.id);
        }
        attacker.memory.engagements.push(record);
        defender.memory.engagements.push(record);

        tracing::debug!(
            attacker = ?action.formation,
            defender = ?action.target,
            mode = ?action.mode,
            attacker_won,
            "engagement contest resolved"
        );

        ctx.report(ReportRecord::EngagementContest {
            attacker: action.formation,
            defender: action.target,
            mode: action.mode,
            contest,
            attacker_won,
        });
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn set_finished(&mut self) {
        self.finished = true;
    }
}
