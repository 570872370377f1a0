//! Target number computation
//!
//! The engine asks a `ToHitCalculator` for every target number it rolls
//! against. `StandardToHit` is the default rule set; a host game can plug in
//! its own terrain and line-of-sight aware calculator instead.

use serde::{Deserialize, Serialize};

use crate::battle::constants::{
    LONG_RANGE_MODIFIER, MAX_ROLLABLE_TARGET, MEDIUM_RANGE_MODIFIER, SHORT_RANGE_MODIFIER,
    TARGETING_CRIT_MODIFIER,
};
use crate::battle::engagement::EngagementControl;
use crate::battle::morale::MoraleStatus;
use crate::battle::roll::Roll;
use crate::battle::units::{Formation, RangeBand, Unit};
use crate::core::SimulationConfig;

/// A 2d6 target number, or the reason no roll can succeed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetNumber {
    pub value: i32,
    pub impossible: Option<String>,
}

impl TargetNumber {
    pub fn new(value: i32) -> Self {
        Self {
            value,
            impossible: None,
        }
    }

    pub fn impossible(reason: impl Into<String>) -> Self {
        Self {
            value: MAX_ROLLABLE_TARGET + 1,
            impossible: Some(reason.into()),
        }
    }

    /// Add a modifier, turning the number impossible once it passes 12
    pub fn add(mut self, modifier: i32) -> Self {
        self.value += modifier;
        if self.impossible.is_none() && self.value > MAX_ROLLABLE_TARGET {
            self.impossible = Some(format!("target number {} cannot be rolled", self.value));
        }
        self
    }

    pub fn cannot_succeed(&self) -> bool {
        self.impossible.is_some()
    }

    pub fn margin_of_success(&self, roll: &Roll) -> i32 {
        roll.margin(self.value)
    }
}

pub trait ToHitCalculator {
    /// Target number for `attacker` firing on `target` at `range`
    fn attack(
        &self,
        attacker: &Formation,
        attacking_unit: Option<&Unit>,
        target: &Formation,
        range: RangeBand,
    ) -> TargetNumber;

    /// Target number for `actor` trying to impose `mode` on `opponent`
    fn engagement_control(
        &self,
        actor: &Formation,
        opponent: &Formation,
        mode: EngagementControl,
    ) -> TargetNumber;

    fn morale(&self, formation: &Formation) -> TargetNumber;

    fn recovery(&self, formation: &Formation) -> TargetNumber;
}

/// Default target numbers: skill plus additive modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardToHit {
    pub cover_modifier: i32,
    pub base_morale_target: i32,
    pub base_recovery_target: i32,
}

impl StandardToHit {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            cover_modifier: config.cover_modifier,
            base_morale_target: config.base_morale_target,
            base_recovery_target: config.base_recovery_target,
        }
    }

    fn range_modifier(range: RangeBand) -> Option<i32> {
        match range {
            RangeBand::Short => Some(SHORT_RANGE_MODIFIER),
            RangeBand::Medium => Some(MEDIUM_RANGE_MODIFIER),
            RangeBand::Long => Some(LONG_RANGE_MODIFIER),
            RangeBand::Extreme => None,
        }
    }
}

impl Default for StandardToHit {
    fn default() -> Self {
        Self::from_config(&SimulationConfig::default())
    }
}

impl ToHitCalculator for StandardToHit {
    fn attack(
        &self,
        attacker: &Formation,
        attacking_unit: Option<&Unit>,
        target: &Formation,
        range: RangeBand,
    ) -> TargetNumber {
        if attacker.morale == MoraleStatus::Routed {
            return TargetNumber::impossible("attacker is routed");
        }
        let Some(range_modifier) = Self::range_modifier(range) else {
            return TargetNumber::impossible("target beyond long range");
        };

        let mut tn = TargetNumber::new(attacker.skill)
            .add(range_modifier)
            .add(attacker.morale.modifier());

        if target.memory.in_cover {
            tn = tn.add(self.cover_modifier);
        }
        if let Some(unit) = attacking_unit {
            tn = tn.add(unit.targeting_crits as i32 * TARGETING_CRIT_MODIFIER);
        }
        tn
    }

    fn engagement_control(
        &self,
        actor: &Formation,
        _opponent: &Formation,
        mode: EngagementControl,
    ) -> TargetNumber {
        TargetNumber::new(actor.skill)
            .add(mode.modifier())
            .add(actor.morale.modifier())
    }

    fn morale(&self, formation: &Formation) -> TargetNumber {
        let mut tn = TargetNumber::new(self.base_morale_target)
            .add(formation.skill - Formation::DEFAULT_SKILL)
            .add(formation.morale.modifier());
        if formation.crippled {
            tn = tn.add(1);
        }
        tn
    }

    fn recovery(&self, formation: &Formation) -> TargetNumber {
        // Recovery succeeds on a FAILED roll, so better crews get a higher target
        TargetNumber::new(self.base_recovery_target)
            .add(Formation::DEFAULT_SKILL - formation.skill)
    }
}
