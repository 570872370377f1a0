//! Engagement control between formations
//!
//! A contested roll-off: both sides roll 2d6 against their own target
//! numbers and the larger margin of success wins. Ties go to the defender.

use serde::{Deserialize, Serialize};

use crate::battle::roll::Roll;
use crate::core::types::{FormationId, Round};

/// How a formation tries to control its engagement with an enemy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EngagementControl {
    #[default]
    None,
    ForcedEngagement,
    Evade,
    Overrun,
    Standard,
}

impl EngagementControl {
    /// Target number modifier for the side attempting this mode
    pub fn modifier(&self) -> i32 {
        match self {
            EngagementControl::None => 0,
            EngagementControl::Standard => 0,
            EngagementControl::ForcedEngagement => 1,
            EngagementControl::Evade => 2,
            EngagementControl::Overrun => 3,
        }
    }

    /// Does winning with this mode lock both formations together?
    pub fn engages(&self) -> bool {
        !matches!(self, EngagementControl::None)
    }
}

/// Durable memory of one engagement attempt, kept by both sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementRecord {
    pub round: Round,
    pub initiator: FormationId,
    pub opponent: FormationId,
    pub mode: EngagementControl,
    pub initiator_won: bool,
}

/// Rolls and margins of a contested roll-off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestResult {
    pub attacker_roll: Roll,
    pub attacker_target: i32,
    pub defender_roll: Roll,
    pub defender_target: i32,
}

impl ContestResult {
    pub fn attacker_margin(&self) -> i32 {
        self.attacker_roll.margin(self.attacker_target)
    }

    pub fn defender_margin(&self) -> i32 {
        self.defender_roll.margin(self.defender_target)
    }

    /// The attacker must strictly exceed the defender's margin
    pub fn attacker_wins(&self) -> bool {
        self.attacker_margin() > self.defender_margin()
    }
}
