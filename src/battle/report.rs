//! Structured battle reports
//!
//! The engine only writes reports. Turning them into text is the job of
//! whoever consumes the sink.

use serde::{Deserialize, Serialize};

use crate::battle::damage::CriticalEffect;
use crate::battle::engagement::{ContestResult, EngagementControl};
use crate::battle::hex::HexCoord;
use crate::battle::morale::MoraleCheckResult;
use crate::battle::roll::Roll;
use crate::battle::units::RangeBand;
use crate::core::types::{EntityId, FormationId, Round, UnitId};
use crate::simulation::phase::{BattleOutcome, Phase};

/// Distance to a reference formation before and after a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistanceChange {
    pub relative_to: FormationId,
    pub before: u32,
    pub after: u32,
}

impl DistanceChange {
    pub fn is_closing(&self) -> bool {
        self.after < self.before
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReportRecord {
    BattleStarted {
        formations: usize,
    },
    RoundStarted,
    Deployed {
        formation: FormationId,
        position: HexCoord,
    },
    Moved {
        formation: FormationId,
        from: HexCoord,
        to: HexCoord,
        distance: Option<DistanceChange>,
        retreat: bool,
        to_cover: bool,
    },
    EngagementControlCleared {
        formation: FormationId,
    },
    EngagementContest {
        attacker: FormationId,
        defender: FormationId,
        mode: EngagementControl,
        contest: ContestResult,
        attacker_won: bool,
    },
    MoraleChecked {
        formation: FormationId,
        result: MoraleCheckResult,
    },
    NerveRecovery {
        formation: FormationId,
        result: MoraleCheckResult,
    },
    AttackImpossible {
        attacker: FormationId,
        target: FormationId,
        reason: String,
    },
    AttackMissed {
        attacker: FormationId,
        target: FormationId,
        target_unit: UnitId,
        range: RangeBand,
        roll: Roll,
        target_number: i32,
    },
    AttackHit {
        attacker: FormationId,
        target: FormationId,
        target_unit: UnitId,
        range: RangeBand,
        roll: Roll,
        target_number: i32,
        damage: Vec<u32>,
        applied: u32,
        armor_remaining: u32,
    },
    CriticalHit {
        formation: FormationId,
        unit: UnitId,
        roll: Roll,
        effect: CriticalEffect,
    },
    UnitDestroyed {
        formation: FormationId,
        unit: UnitId,
    },
    KillCredited {
        killer: EntityId,
        victim: EntityId,
    },
    WithdrawalStarted {
        formation: FormationId,
    },
    Withdrew {
        formation: FormationId,
        elements: usize,
    },
    FormationDestroyed {
        formation: FormationId,
    },
    ActionSkipped {
        formation: FormationId,
        reason: String,
    },
    ActionAborted {
        action: String,
        error: String,
    },
    BattleEnded {
        outcome: BattleOutcome,
    },
}

/// A report stamped with when it happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub round: Round,
    pub phase: Phase,
    pub record: ReportRecord,
}

/// Append-only sink for battle reports
pub trait Reporter {
    fn report(&mut self, round: Round, phase: Phase, record: ReportRecord);
}

/// In-memory report log
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BattleLog {
    pub entries: Vec<ReportEntry>,
}

impl BattleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &ReportRecord> {
        self.entries.iter().map(|e| &e.record)
    }
}

impl Reporter for BattleLog {
    fn report(&mut self, round: Round, phase: Phase, record: ReportRecord) {
        self.entries.push(ReportEntry {
            round,
            phase,
            record,
        });
    }
}

/// Sink that forwards every report to `tracing` at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&mut self, round: Round, phase: Phase, record: ReportRecord) {
        tracing::debug!(round, ?phase, ?record, "battle report");
    }
}
