//! Morale ladder
//!
//! Formations move along a fixed ladder one step at a time. Routed is the
//! floor: failing again leaves a routed formation routed.

use serde::{Deserialize, Serialize};

use crate::battle::roll::Roll;

/// Ordered morale statuses, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum MoraleStatus {
    #[default]
    Normal,
    Shaken,
    Broken,
    Routed,
}

impl MoraleStatus {
    pub const LADDER: [MoraleStatus; 4] = [
        MoraleStatus::Normal,
        MoraleStatus::Shaken,
        MoraleStatus::Broken,
        MoraleStatus::Routed,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Self {
        Self::LADDER[index.min(Self::LADDER.len() - 1)]
    }

    pub fn is_best(&self) -> bool {
        *self == MoraleStatus::Normal
    }

    pub fn is_terminal(&self) -> bool {
        *self == MoraleStatus::Routed
    }

    /// One step down the ladder, pinned at Routed
    pub fn worsened(&self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// One step up the ladder, pinned at Normal
    pub fn improved(&self) -> Self {
        Self::from_index(self.index().saturating_sub(1))
    }

    /// Target number penalty applied to checks and attacks at this status
    pub fn modifier(&self) -> i32 {
        match self {
            MoraleStatus::Normal => 0,
            MoraleStatus::Shaken => 1,
            MoraleStatus::Broken => 2,
            MoraleStatus::Routed => 3,
        }
    }
}

/// Result of a morale or recovery roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoraleCheckResult {
    pub roll: Roll,
    pub target: i32,
    pub before: MoraleStatus,
    pub after: MoraleStatus,
}

impl MoraleCheckResult {
    pub fn changed(&self) -> bool {
        self.before != self.after
    }
}

/// A morale check: failing the roll worsens morale by one step
pub fn check_morale(status: MoraleStatus, roll: Roll, target: i32) -> MoraleCheckResult {
    let after = if roll.is_target_rolled_or_better(target) {
        status
    } else {
        status.worsened()
    };

    MoraleCheckResult {
        roll,
        target,
        before: status,
        after,
    }
}

/// Recovering nerve: a roll that does NOT reach the recovery target
/// improves morale by one step. Formations at Normal never roll.
pub fn check_recovery(status: MoraleStatus, roll: Roll, target: i32) -> MoraleCheckResult {
    let after = if roll.is_target_rolled_or_better(target) {
        status
    } else {
        status.improved()
    };

    MoraleCheckResult {
        roll,
        target,
        before: status,
        after,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roll(total: u8) -> Roll {
        Roll {
            dice: [total / 2, total - total / 2],
        }
    }

    #[test]
    fn test_failed_checks_walk_the_ladder() {
        let mut status = MoraleStatus::Normal;
        let expected = [1, 2, 3, 3];
        for index in expected {
            status = check_morale(status, roll(2), 8).after;
            assert_eq!(status.index(), index);
        }
        assert!(status.is_terminal());
    }

    #[test]
    fn test_passed_check_keeps_status() {
        let result = check_morale(MoraleStatus::Shaken, roll(8), 8);
        assert_eq!(result.after, MoraleStatus::Shaken);
        assert!(!result.changed());
    }

    #[test]
    fn test_recovery_improves_on_failed_roll() {
        let result = check_recovery(MoraleStatus::Broken, roll(3), 6);
        assert_eq!(result.after, MoraleStatus::Shaken);
    }

    #[test]
    fn test_recovery_holds_on_successful_roll() {
        let result = check_recovery(MoraleStatus::Broken, roll(9), 6);
        assert_eq!(result.after, MoraleStatus::Broken);
    }

    #[test]
    fn test_improve_pinned_at_normal() {
        assert_eq!(MoraleStatus::Normal.improved(), MoraleStatus::Normal);
        assert_eq!(MoraleStatus::Routed.worsened(), MoraleStatus::Routed);
    }

    #[test]
    fn test_ladder_order() {
        for (i, status) in MoraleStatus::LADDER.iter().enumerate() {
            assert_eq!(status.index(), i);
        }
        assert!(MoraleStatus::Normal < MoraleStatus::Routed);
    }
}
