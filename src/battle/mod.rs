//! Battle model - formations, dice and the rules applied by action handlers
//!
//! Formations are groups of units made of elements. All randomness flows
//! through one `DiceSource`; to-hit numbers come from a `ToHitCalculator`;
//! outcomes leave the engine as report records and ledger updates.

pub mod board;
pub mod constants;
pub mod damage;
pub mod engagement;
pub mod hex;
pub mod ledger;
pub mod morale;
pub mod report;
pub mod roll;
pub mod to_hit;
pub mod units;

// Re-exports for convenient access
pub use board::Board;
pub use constants::*;
pub use damage::CriticalEffect;
pub use engagement::{ContestResult, EngagementControl, EngagementRecord};
pub use hex::HexCoord;
pub use ledger::{EntityLedger, KillLedger, RemovalCondition};
pub use morale::{MoraleCheckResult, MoraleStatus};
pub use report::{BattleLog, ReportEntry, ReportRecord, Reporter, TracingReporter};
pub use roll::{DiceCheckpoint, DiceSource, Roll, ScriptedDice, SeededDice};
pub use to_hit::{StandardToHit, TargetNumber, ToHitCalculator};
pub use units::{
    ArcDamage, DamageProfile, Element, Formation, FormationMemory, RangeBand, RangeDamage, Unit,
};
