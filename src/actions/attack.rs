//! Standard unit attack handler
//!
//! Resolution order:
//! 1. pick a surviving target unit at random
//! 2. drop attacks beyond the longest supported range band
//! 3. ask for a target number; stop if the attack cannot succeed
//! 4. roll 2d6; below the target number is a miss
//! 5. build one damage increment per attacking element
//! 6. spread increments over the target's elements in shuffled order
//! 7. reduce the unit's armor pool
//! 8. flag a high-stress episode on heavy damage or a crippled formation
//! 9. destroy the unit at zero armor and credit the kill
//! 10. otherwise roll for a critical once below half armor

use crate::actions::{ActionHandler, HandlerContext, StandardAttackAction};
use crate::battle::damage::{apply_damage, damage_increments, roll_critical, CriticalEffect};
use crate::battle::ledger::RemovalCondition;
use crate::battle::report::ReportRecord;
use crate::battle::roll::{choose, Roll};
use crate::core::error::{Result, SimulationError};
use crate::core::types::{EntityId, FormationId, UnitId};
use crate::simulation::phase::Phase;

pub struct StandardUnitAttackHandler {
    action: StandardAttackAction,
    finished: bool,
}

impl StandardUnitAttackHandler {
    pub fn new(action: StandardAttackAction) -> Self {
        Self {
            action,
            finished: false,
        }
    }

    fn skip(&self, ctx: &mut HandlerContext<'_>, reason: impl Into<String>) -> Result<()> {
        let reason = reason.into();
        tracing::warn!(formation = ?self.action.formation, %reason, "attack skipped");
        ctx.report(ReportRecord::ActionSkipped {
            formation: self.action.formation,
            reason,
        });
        Ok(())
    }
}

/// Credit a destroyed unit to one random attacking element and mark the
/// unit's elements as devastated
fn destroy_unit(
    ctx: &mut HandlerContext<'_>,
    attackers: &[EntityId],
    target: FormationId,
    unit: UnitId,
) -> Result<()> {
    let formation = ctx.required_mut(target)?;
    formation.high_stress_episode = true;
    let victims: Vec<EntityId> = formation
        .unit(unit)
        .map(|u| u.elements.iter().map(|e| e.entity).collect())
        .unwrap_or_default();

    let killer = choose(ctx.dice, attackers).copied();
    let victim = choose(ctx.dice, &victims).copied();
    if let (Some(killer), Some(victim)) = (killer, victim) {
        ctx.ledger.record_kill(killer, victim);
        ctx.report(ReportRecord::KillCredited { killer, victim });
    }

    for entity in victims {
        if ctx.ledger.is_live(entity) {
            ctx.ledger
                .set_removal_condition(entity, RemovalCondition::Devastated);
        }
    }

    ctx.report(ReportRecord::UnitDestroyed {
        formation: target,
        unit,
    });
    Ok(())
}

impl ActionHandler for StandardUnitAttackHandler {
    fn cares(&self, phase: Phase) -> bool {
        phase.is_firing()
    }

    fn execute(&mut self, ctx: &mut HandlerContext<'_>) -> Result<()> {
        let action = self.action;
        let attacking_unit = ctx
            .required(action.formation)?
            .unit(action.unit)
            .cloned()
            .ok_or(SimulationError::UnitNotFound {
                formation: action.formation,
                unit: action.unit,
            })?;
        if attacking_unit.is_destroyed() {
            return self.skip(ctx, "attacking unit was destroyed");
        }
        if action.target == action.formation {
            return self.skip(ctx, "formation cannot attack itself");
        }

        // The target may have been destroyed or withdrawn earlier this round
        let Some(candidates) = ctx
            .formations
            .get(action.target)
            .map(|target| target.surviving_unit_ids())
        else {
            return self.skip(ctx, format!("target {:?} is gone", action.target));
        };
        let Some(&target_unit) = choose(ctx.dice, &candidates) else {
            return self.skip(ctx, "target has no surviving units");
        };

        if !action.range.is_supported() {
            return Ok(());
        }

        let target_number = {
            let attacker = ctx.required(action.formation)?;
            let target = ctx.required(action.target)?;
            ctx.to_hit
                .attack(attacker, Some(&attacking_unit), target, action.range)
        };
        if let Some(reason) = target_number.impossible.clone() {
            ctx.report(ReportRecord::AttackImpossible {
                attacker: action.formation,
                target: action.target,
                reason,
            });
            return Ok(());
        }

        let attacker_entities: Vec<EntityId> =
            attacking_unit.elements.iter().map(|e| e.entity).collect();

        let roll = Roll::two_d6(ctx.dice);
        {
            let target = ctx.required_mut(action.target)?;
            target.memory.last_attacker = Some(action.formation);
        }

        if !roll.is_target_rolled_or_better(target_number.value) {
            ctx.report(ReportRecord::AttackMissed {
                attacker: action.formation,
                target: action.target,
                target_unit,
                range: action.range,
                roll,
                target_number: target_number.value,
            });
            return Ok(());
        }

        let increments = damage_increments(&attacking_unit, action.range, ctx.dice);

        let round = ctx.round;
        let target = ctx
            .formations
            .get_mut(action.target)
            .ok_or(SimulationError::FormationNotFound(action.target))?;
        let was_crippled = target.crippled;
        let unit = target
            .unit_mut(target_unit)
            .ok_or(SimulationError::UnitNotFound {
                formation: action.target,
                unit: target_unit,
            })?;

        let applied = apply_damage(unit, &increments, ctx.dice);
        let armor_remaining = unit.armor;
        let high_stress =
            applied * 2 >= unit.armor || (was_crippled && unit.armor > 0);
        let destroyed = unit.is_destroyed();
        let below_half = unit.is_below_half_armor();

        if applied > 0 {
            target.memory.last_damaged_round = Some(round);
        }
        if high_stress {
            target.high_stress_episode = true;
        }
        if target.total_armor() * 2 < target.original_armor() {
            target.crippled = true;
        }

        ctx.report(ReportRecord::AttackHit {
            attacker: action.formation,
            target: action.target,
            target_unit,
            range: action.range,
            roll,
            target_number: target_number.value,
            damage: increments,
            applied,
            armor_remaining,
        });

        if destroyed {
            return destroy_unit(ctx, &attacker_entities, action.target, target_unit);
        }

        if below_half {
            let unit = ctx
                .formations
                .get_mut(action.target)
                .and_then(|target| target.unit_mut(target_unit))
                .ok_or(SimulationError::UnitNotFound {
                    formation: action.target,
                    unit: target_unit,
                })?;
            let (crit_roll, effect) = roll_critical(unit, ctx.dice);
            ctx.report(ReportRecord::CriticalHit {
                formation: action.target,
                unit: target_unit,
                roll: crit_roll,
                effect,
            });
            if effect == CriticalEffect::Destroyed {
                return destroy_unit(ctx, &attacker_entities, action.target, target_unit);
            }
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
