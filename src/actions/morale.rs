//! Morale check and recovering nerve handlers

use crate::actions::{ActionHandler, HandlerContext, MoraleCheckAction, RecoveringNerveAction};
use crate::battle::morale::{check_morale, check_recovery};
use crate::battle::report::ReportRecord;
use crate::battle::roll::Roll;
use crate::core::error::Result;
use crate::simulation::phase::Phase;

pub struct MoraleCheckActionHandler {
    action: MoraleCheckAction,
    finished: bool,
}

impl MoraleCheckActionHandler {
    pub fn new(action: MoraleCheckAction) -> Self {
        Self {
            action,
            finished: false,
        }
    }
}

impl ActionHandler for MoraleCheckActionHandler {
    fn cares(&self, phase: Phase) -> bool {
        phase.is_end()
    }

    fn execute(&mut self, ctx: &mut HandlerContext<'_>) -> Result<()> {
        let formation = ctx.required(self.action.formation)?;
        let target = ctx.to_hit.morale(formation);
        let status = formation.morale;

        let roll = Roll::two_d6(ctx.dice);
        let result = check_morale(status, roll, target.value);
        ctx.required_mut(self.action.formation)?.morale = result.after;

        if result.changed() {
            tracing::debug!(
                formation = ?self.action.formation,
                from = ?result.before,
                to = ?result.after,
                "morale worsened"
            );
        }
        ctx.report(ReportRecord::MoraleChecked {
            formation: self.action.formation,
            result,
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

pub struct RecoveringNerveActionHandler {
    action: RecoveringNerveAction,
    finished: bool,
}

impl RecoveringNerveActionHandler {
    pub fn new(action: RecoveringNerveAction) -> Self {
        Self {
            action,
            finished: false,
        }
    }
}

impl ActionHandler for RecoveringNerveActionHandler {
    fn cares(&self, phase: Phase) -> bool {
        phase.is_end()
    }

    fn execute(&mut self, ctx: &mut HandlerContext<'_>) -> Result<()> {
        let formation = ctx.required(self.action.formation)?;
        if formation.morale.is_best() {
            return Ok(());
        }
        let target = ctx.to_hit.recovery(formation);
        let status = formation.morale;

        let roll = Roll::two_d6(ctx.dice);
        let result = check_recovery(status, roll, target.value);
        ctx.required_mut(self.action.formation)?.morale = result.after;

        ctx.report(ReportRecord::NerveRecovery {
            formation: self.action.formation,
            result,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::test_support::Field;
    use crate::actions::Action;
    use crate::battle::morale::MoraleStatus;
    use crate::core::types::FormationId;

    fn morale_check(formation: FormationId) -> Action {
        Action::MoraleCheck(MoraleCheckAction { formation })
    }

    fn recover(formation: FormationId) -> Action {
        Action::RecoveringNerve(RecoveringNerveAction { formation })
    }

    #[test]
    fn test_repeated_failures_walk_to_routed_and_stay() {
        let mut field = Field::new();
        let a = field.add(0, 5, 10, 4);

        for expected in [1, 2, 3, 3] {
            field.dice.push_total(2);
            field.run(Phase::End, morale_check(a)).unwrap();
            assert_eq!(field.formation(a).morale.index(), expected);
        }
        assert_eq!(field.formation(a).morale, MoraleStatus::Routed);
    }

    #[test]
    fn test_passed_check_keeps_morale() {
        let mut field = Field::new();
        let a = field.add(0, 5, 10, 4);
        field.dice.push_total(11);

        field.run(Phase::End, morale_check(a)).unwrap();

        assert_eq!(field.formation(a).morale, MoraleStatus::Normal);
        assert!(matches!(
            field.log.records().last(),
            Some(ReportRecord::MoraleChecked { .. })
        ));
    }

    #[test]
    fn test_recovery_improves_on_failed_roll() {
        let mut field = Field::new();
        let a = field.add(0, 5, 10, 4);
        field.formations.get_mut(a).unwrap().morale = MoraleStatus::Broken;
        // Default recovery target is 6; a 3 misses it
        field.dice.push_total(3);

        field.run(Phase::End, recover(a)).unwrap();

        assert_eq!(field.formation(a).morale, MoraleStatus::Shaken);
    }

    #[test]
    fn test_recovery_holds_on_successful_roll() {
        let mut field = Field::new();
        let a = field.add(0, 5, 10, 4);
        field.formations.get_mut(a).unwrap().morale = MoraleStatus::Broken;
        field.dice.push_total(9);

        field.run(Phase::End, recover(a)).unwrap();

        assert_eq!(field.formation(a).morale, MoraleStatus::Broken);
    }

    #[test]
    fn test_recovery_skipped_at_best_status() {
        let mut field = Field::new();
        let a = field.add(0, 5, 10, 4);
        field.dice.push_total(2);

        field.run(Phase::End, recover(a)).unwrap();

        assert_eq!(field.dice.remaining_faces(), 2);
        assert!(field.log.is_empty());
    }
}
