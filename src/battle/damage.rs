//! Damage and critical resolution against a single unit
//!
//! Pure rules: everything here works on one attacking unit and one target
//! unit. Stress flags, kill credit and reporting live in the attack handler.

use serde::{Deserialize, Serialize};

use crate::battle::constants::DAMAGE_CRIT_PENALTY;
use crate::battle::roll::{shuffle, weighted_index, DiceSource, Roll};
use crate::battle::units::{Element, RangeBand, Unit};

/// Outcome bucket of a critical-hit roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CriticalEffect {
    NoEffect,
    Targeting,
    Damage,
    TargetingAndDamage,
    Destroyed,
}

impl CriticalEffect {
    /// 2-4 nothing, 5-7 targeting, 8-9 damage, 10-11 both, 12 destroyed
    pub fn from_total(total: i32) -> Self {
        match total {
            i32::MIN..=4 => CriticalEffect::NoEffect,
            5..=7 => CriticalEffect::Targeting,
            8..=9 => CriticalEffect::Damage,
            10..=11 => CriticalEffect::TargetingAndDamage,
            _ => CriticalEffect::Destroyed,
        }
    }
}

/// Damage one element contributes at `range`
///
/// Uses the flat rating for the band when the element has one. Otherwise the
/// element's facing toward the target is unknown, so an arc is drawn with
/// probability proportional to its damage and that arc's total is used.
pub fn element_damage(element: &Element, range: RangeBand, dice: &mut dyn DiceSource) -> u32 {
    if let Some(flat) = element.damage.flat.at(range) {
        return flat;
    }

    let weights = element.damage.arcs.as_weights();
    match weighted_index(dice, &weights) {
        Some(arc) => weights[arc],
        None => 0,
    }
}

/// One damage increment per attacking element, less damage criticals
pub fn damage_increments(attacker: &Unit, range: RangeBand, dice: &mut dyn DiceSource) -> Vec<u32> {
    let penalty = attacker.damage_crits * DAMAGE_CRIT_PENALTY;
    attacker
        .elements
        .iter()
        .map(|e| element_damage(e, range, dice).saturating_sub(penalty))
        .collect()
}

/// Distribute damage increments over the target's elements in shuffled order
/// and reduce the unit's armor pool by what was absorbed.
///
/// Each increment lands whole on the first element that still has
/// structure; it never spills onto a second element. Returns total damage
/// applied.
pub fn apply_damage(target: &mut Unit, increments: &[u32], dice: &mut dyn DiceSource) -> u32 {
    let mut order: Vec<usize> = (0..target.elements.len()).collect();
    shuffle(dice, &mut order);

    let mut applied = 0;
    for &amount in increments.iter().filter(|&&a| a > 0) {
        let Some(&index) = order
            .iter()
            .find(|&&i| target.elements[i].has_structure())
        else {
            break;
        };
        applied += target.elements[index].absorb(amount);
    }

    target.reduce_armor(applied);
    applied
}

/// Roll a critical check and apply its effect to the unit
pub fn roll_critical(target: &mut Unit, dice: &mut dyn DiceSource) -> (Roll, CriticalEffect) {
    let roll = Roll::two_d6(dice);
    let effect = CriticalEffect::from_total(roll.total());
    apply_critical(target, effect);
    (roll, effect)
}

pub fn apply_critical(target: &mut Unit, effect: CriticalEffect) {
    match effect {
        CriticalEffect::NoEffect => {}
        CriticalEffect::Targeting => target.targeting_crits += 1,
        CriticalEffect::Damage => target.damage_crits += 1,
        CriticalEffect::TargetingAndDamage => {
            target.targeting_crits += 1;
            target.damage_crits += 1;
        }
        CriticalEffect::Destroyed => target.armor = 0,
    }
}
