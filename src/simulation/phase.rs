//! Round phases and battle outcome

use serde::{Deserialize, Serialize};

use crate::core::types::SideId;

/// Phases of a round, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Deployment,
    Movement,
    Firing,
    End,
}

impl Phase {
    pub const ROUND: [Phase; 4] = [Phase::Deployment, Phase::Movement, Phase::Firing, Phase::End];

    pub fn is_movement(&self) -> bool {
        matches!(self, Phase::Movement)
    }

    pub fn is_firing(&self) -> bool {
        matches!(self, Phase::Firing)
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Phase::End)
    }

    /// Following phase; End wraps to the next round's Deployment
    pub fn next(&self) -> Phase {
        match self {
            Phase::Deployment => Phase::Movement,
            Phase::Movement => Phase::Firing,
            Phase::Firing => Phase::End,
            Phase::End => Phase::Deployment,
        }
    }
}

/// How a battle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BattleOutcome {
    #[default]
    Undecided,
    /// Only this side still holds the field
    Victory(SideId),
    /// Every formation was destroyed or withdrew
    NoVictor,
    /// The round limit was reached with several sides still fighting
    RoundLimit,
}

impl BattleOutcome {
    pub fn is_decided(&self) -> bool {
        !matches!(self, BattleOutcome::Undecided)
    }
}
