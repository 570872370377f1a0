//! Actions and their handlers
//!
//! An `Action` is an immutable intent produced by the decision layer. Each
//! variant has exactly one handler type; `Action::into_handler` is the
//! dispatch table, so adding a variant without a handler fails to compile.

pub mod attack;
pub mod engagement;
pub mod morale;
pub mod movement;
pub mod withdraw;

use serde::{Deserialize, Serialize};

use crate::battle::board::Board;
use crate::battle::engagement::EngagementControl;
use crate::battle::hex::HexCoord;
use crate::battle::ledger::EntityLedger;
use crate::battle::report::{ReportRecord, Reporter};
use crate::battle::roll::DiceSource;
use crate::battle::to_hit::ToHitCalculator;
use crate::battle::units::{Formation, RangeBand};
use crate::core::error::{Result, SimulationError};
use crate::core::types::{EntityId, FormationId, Round, UnitId};
use crate::core::SimulationConfig;
use crate::simulation::phase::Phase;
use crate::simulation::store::FormationStore;

pub use attack::StandardUnitAttackHandler;
pub use engagement::EngagementAndControlActionHandler;
pub use morale::{MoraleCheckActionHandler, RecoveringNerveActionHandler};
pub use movement::{MoveActionHandler, MoveToCoverActionHandler};
pub use withdraw::WithdrawActionHandler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveAction {
    pub formation: FormationId,
    pub destination: HexCoord,
    /// Formation the move is reported relative to, if any
    pub relative_to: Option<FormationId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementControlAction {
    pub formation: FormationId,
    pub target: FormationId,
    pub mode: EngagementControl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoraleCheckAction {
    pub formation: FormationId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveringNerveAction {
    pub formation: FormationId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardAttackAction {
    pub formation: FormationId,
    pub unit: UnitId,
    pub target: FormationId,
    pub range: RangeBand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawAction {
    pub formation: FormationId,
}

/// An intent to be resolved by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Move(MoveAction),
    MoveToCover(MoveAction),
    EngagementControl(EngagementControlAction),
    MoraleCheck(MoraleCheckAction),
    RecoveringNerve(RecoveringNerveAction),
    StandardAttack(StandardAttackAction),
    Withdraw(WithdrawAction),
}

impl Action {
    /// The acting formation
    pub fn actor(&self) -> FormationId {
        match self {
            Action::Move(a) | Action::MoveToCover(a) => a.formation,
            Action::EngagementControl(a) => a.formation,
            Action::MoraleCheck(a) => a.formation,
            Action::RecoveringNerve(a) => a.formation,
            Action::StandardAttack(a) => a.formation,
            Action::Withdraw(a) => a.formation,
        }
    }

    /// Build the handler that resolves this action
    pub fn into_handler(self) -> Box<dyn ActionHandler> {
        match self {
            Action::Move(a) => Box::new(MoveActionHandler::new(a)),
            Action::MoveToCover(a) => Box::new(MoveToCoverActionHandler::new(a)),
            Action::EngagementControl(a) => Box::new(EngagementAndControlActionHandler::new(a)),
            Action::MoraleCheck(a) => Box::new(MoraleCheckActionHandler::new(a)),
            Action::RecoveringNerve(a) => Box::new(RecoveringNerveActionHandler::new(a)),
            Action::StandardAttack(a) => Box::new(StandardUnitAttackHandler::new(a)),
            Action::Withdraw(a) => Box::new(WithdrawActionHandler::new(a)),
        }
    }
}

/// Everything a handler may read or mutate while executing
pub struct HandlerContext<'a> {
    pub formations: &'a mut FormationStore,
    pub board: &'a Board,
    pub config: &'a SimulationConfig,
    pub phase: Phase,
    pub round: Round,
    pub dice: &'a mut dyn DiceSource,
    pub to_hit: &'a dyn ToHitCalculator,
    pub ledger: &'a mut dyn EntityLedger,
    pub reporter: &'a mut dyn Reporter,
    /// Element graveyard: entities that left the battle in retreat
    pub retreated: &'a mut Vec<EntityId>,
}

impl HandlerContext<'_> {
    pub fn report(&mut self, record: ReportRecord) {
        self.reporter.report(self.round, self.phase, record);
    }

    /// A formation that must exist. Absence is an invariant violation.
    pub fn required(&self, id: FormationId) -> Result<&Formation> {
        self.formations
            .get(id)
            .ok_or(SimulationError::FormationNotFound(id))
    }

    pub fn required_mut(&mut self, id: FormationId) -> Result<&mut Formation> {
        self.formations
            .get_mut(id)
            .ok_or(SimulationError::FormationNotFound(id))
    }
}

/// Resolves one action
pub trait ActionHandler {
    /// Is this handler eligible to run in `phase`?
    fn cares(&self, phase: Phase) -> bool;

    /// Perform the state transition. Called at most once.
    fn execute(&mut self, ctx: &mut HandlerContext<'_>) -> Result<()>;

    fn is_finished(&self) -> bool;

    fn set_finished(&mut self);
}

#[cfg(test)]
pub(crate) mod test_support {
    //! A small battlefield for handler tests

    use super::*;
    use crate::battle::ledger::KillLedger;
    use crate::battle::report::BattleLog;
    use crate::battle::roll::ScriptedDice;
    use crate::battle::to_hit::StandardToHit;
    use crate::battle::units::{DamageProfile, Element, RangeDamage, Unit};
    use crate::core::types::{ElementId, SideId};

    pub struct Field {
        pub formations: FormationStore,
        pub board: Board,
        pub config: SimulationConfig,
        pub dice: ScriptedDice,
        pub to_hit: StandardToHit,
        pub ledger: KillLedger,
        pub log: BattleLog,
        pub retreated: Vec<EntityId>,
    }

    impl Field {
        pub fn new() -> Self {
            let config = SimulationConfig::default();
            Self {
                formations: FormationStore::new(),
                board: Board::from_config(&config),
                to_hit: StandardToHit::from_config(&config),
                config,
                dice: ScriptedDice::new(),
                ledger: KillLedger::new(),
                log: BattleLog::new(),
                retreated: Vec::new(),
            }
        }

        /// One unit, one element with `armor` and flat short damage `damage`
        pub fn add(&mut self, side: u32, q: i32, armor: u32, damage: u32) -> FormationId {
            let entity = EntityId::from_index(self.formations.len() as u64 + 1);
            let element = Element::new(ElementId(0), entity, armor, 2).with_damage(DamageProfile {
                flat: RangeDamage::new(damage, damage, damage),
                ..DamageProfile::default()
            });
            let mut formation = Formation::new(FormationId(0), SideId(side));
            formation.position = HexCoord::new(q, 0);
            formation.deployed = true;
            formation
                .units
                .push(Unit::from_elements(UnitId(0), vec![element]));
            self.formations.insert(formation)
        }

        pub fn run(&mut self, phase: Phase, action: Action) -> Result<()> {
            let mut handler = action.into_handler();
            assert!(handler.cares(phase), "handler does not care about {:?}", phase);
            let mut ctx = HandlerContext {
                formations: &mut self.formations,
                board: &self.board,
                config: &self.config,
                phase,
                round: 1,
                dice: &mut self.dice,
                to_hit: &self.to_hit,
                ledger: &mut self.ledger,
                reporter: &mut self.log,
                retreated: &mut self.retreated,
            };
            let result = handler.execute(&mut ctx);
            handler.set_finished();
            result
        }

        pub fn formation(&self, id: FormationId) -> &Formation {
            self.formations.get(id).expect("formation should be alive")
        }
    }
}
