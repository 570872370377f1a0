//! Simulation manager - owns the battle and advances it
//!
//! Each round: deployment -> movement -> firing -> end
//!
//! Actions are queued by the caller or a `Decider` and resolved by their
//! handlers. A handler only runs in the phase it cares about; anything
//! queued early waits in the pending list. After every phase the manager
//! sweeps destroyed formations into the graveyard and checks whether the
//! battle is over.

use serde::{Deserialize, Serialize};

use crate::actions::{
    Action, ActionHandler, HandlerContext, MoraleCheckAction, RecoveringNerveAction,
    WithdrawAction,
};
use crate::battle::board::Board;
use crate::battle::engagement::EngagementControl;
use crate::battle::hex::HexCoord;
use crate::battle::ledger::{EntityLedger, KillLedger, RemovalCondition};
use crate::battle::report::{BattleLog, ReportRecord, Reporter};
use crate::battle::roll::{DiceCheckpoint, DiceSource, SeededDice};
use crate::battle::to_hit::{StandardToHit, ToHitCalculator};
use crate::battle::units::Formation;
use crate::core::error::Result;
use crate::core::types::{EntityId, FormationId, Round};
use crate::core::SimulationConfig;
use crate::simulation::decider::{BattleView, Decider};
use crate::simulation::phase::{BattleOutcome, Phase};
use crate::simulation::store::FormationStore;

/// A queued action with the handler that will resolve it
struct PendingAction {
    action: Action,
    handler: Box<dyn ActionHandler>,
}

impl PendingAction {
    fn new(action: Action) -> Self {
        Self {
            action,
            handler: action.into_handler(),
        }
    }
}

/// Battle state at a phase boundary, enough to resume the battle
///
/// The reporter and the rules-engine ledger belong to the caller and are
/// not part of the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub config: SimulationConfig,
    pub round: Round,
    pub phase: Phase,
    pub started: bool,
    pub outcome: BattleOutcome,
    pub formations: FormationStore,
    pub retreated: Vec<EntityId>,
    pub pending: Vec<Action>,
    pub dice: Option<DiceCheckpoint>,
}

impl BattleSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

pub struct SimulationManager<R: Reporter = BattleLog, L: EntityLedger = KillLedger> {
    config: SimulationConfig,
    board: Board,
    formations: FormationStore,
    phase: Phase,
    round: Round,
    dice: Box<dyn DiceSource>,
    to_hit: Box<dyn ToHitCalculator>,
    reporter: R,
    ledger: L,
    pending: Vec<PendingAction>,
    /// Entities that left the battle in retreat
    retreated: Vec<EntityId>,
    outcome: BattleOutcome,
    started: bool,
}

impl SimulationManager {
    /// Manager with an in-memory report log and kill ledger
    pub fn new(config: SimulationConfig) -> Result<Self> {
        Self::with_parts(config, BattleLog::new(), KillLedger::new())
    }
}

impl<R: Reporter, L: EntityLedger> SimulationManager<R, L> {
    /// Manager writing to `reporter` and propagating removals to `ledger`.
    /// Dice are seeded from the config.
    pub fn with_parts(config: SimulationConfig, reporter: R, ledger: L) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            board: Board::from_config(&config),
            dice: Box::new(SeededDice::new(config.seed)),
            to_hit: Box::new(StandardToHit::from_config(&config)),
            config,
            formations: FormationStore::new(),
            phase: Phase::Deployment,
            round: 1,
            reporter,
            ledger,
            pending: Vec::new(),
            retreated: Vec::new(),
            outcome: BattleOutcome::Undecided,
            started: false,
        })
    }

    pub fn with_dice(mut self, dice: impl DiceSource + 'static) -> Self {
        self.dice = Box::new(dice);
        self
    }

    pub fn with_to_hit(mut self, to_hit: impl ToHitCalculator + 'static) -> Self {
        self.to_hit = Box::new(to_hit);
        self
    }

    // === REGISTRY ===

    /// Register a formation at setup; its position is clamped onto the board
    pub fn add_formation(&mut self, mut formation: Formation) -> FormationId {
        formation.position = self.board.clamp(formation.position);
        self.formations.insert(formation)
    }

    /// Relocate a formation. Off-board locations are clamped, never rejected.
    pub fn set_formation_at(&mut self, id: FormationId, location: HexCoord) {
        if !self.formations.set_formation_at(id, location, &self.board) {
            tracing::debug!(formation = ?id, "relocation of missing formation ignored");
        }
    }

    /// Move a formation to the graveyard. Idempotent.
    pub fn remove_formation(&mut self, id: FormationId) {
        if self.formations.remove(id) {
            tracing::debug!(formation = ?id, "formation removed");
        }
    }

    /// Look up a live formation. `None` is a normal answer for formations
    /// destroyed or withdrawn earlier.
    pub fn get_formation(&self, id: FormationId) -> Option<&Formation> {
        self.formations.get(id)
    }

    pub fn formations(&self) -> &FormationStore {
        &self.formations
    }

    pub fn graveyard(&self) -> &[Formation] {
        self.formations.graveyard()
    }

    // === ACCESSORS ===

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> Round {
        self.round
    }

    pub fn outcome(&self) -> BattleOutcome {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_decided()
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Hand the report sink back once the battle is done
    pub fn into_reporter(self) -> R {
        self.reporter
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn retreated(&self) -> &[EntityId] {
        &self.retreated
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn view(&self) -> BattleView<'_> {
        BattleView {
            formations: &self.formations,
            board: &self.board,
            config: &self.config,
            round: self.round,
        }
    }

    // === ACTIONS ===

    /// Queue an action. It resolves during the next `process_pending` in a
    /// phase its handler cares about.
    pub fn enqueue(&mut self, action: Action) {
        self.pending.push(PendingAction::new(action));
    }

    pub fn enqueue_all(&mut self, actions: impl IntoIterator<Item = Action>) {
        for action in actions {
            self.enqueue(action);
        }
    }

    fn report(&mut self, record: ReportRecord) {
        self.reporter.report(self.round, self.phase, record);
    }

    fn context(&mut self) -> HandlerContext<'_> {
        HandlerContext {
            formations: &mut self.formations,
            board: &self.board,
            config: &self.config,
            phase: self.phase,
            round: self.round,
            dice: self.dice.as_mut(),
            to_hit: self.to_hit.as_ref(),
            ledger: &mut self.ledger,
            reporter: &mut self.reporter,
            retreated: &mut self.retreated,
        }
    }

    /// Resolve every pending action whose handler cares about the current
    /// phase, in queue order. The rest stay queued.
    ///
    /// Actions from formations that have since died are dropped with a
    /// report. A handler error aborts that action only.
    pub fn process_pending(&mut self) {
        let queue = std::mem::take(&mut self.pending);
        let mut deferred = Vec::new();

        for mut pending in queue {
            let actor = pending.action.actor();
            if self.formations.is_in_graveyard(actor) {
                tracing::warn!(
                    action = ?pending.action,
                    "actor has left the battle, action dropped"
                );
                self.report(ReportRecord::ActionSkipped {
                    formation: actor,
                    reason: "acting formation has left the battle".into(),
                });
                continue;
            }

            if !pending.handler.cares(self.phase) {
                deferred.push(pending);
                continue;
            }

            tracing::debug!(action = ?pending.action, phase = ?self.phase, "resolving action");

            let result = {
                let mut ctx = self.context();
                pending.handler.execute(&mut ctx)
            };
            pending.handler.set_finished();

            if let Err(err) = result {
                tracing::error!(action = ?pending.action, error = %err, "action aborted");
                self.report(ReportRecord::ActionAborted {
                    action: format!("{:?}", pending.action),
                    error: err.to_string(),
                });
            }
        }

        self.pending = deferred;
    }

    // === PHASES ===

    fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        let formations = self.formations.len();
        tracing::info!(formations, seed = self.config.seed, "battle started");
        self.report(ReportRecord::BattleStarted { formations });
    }

    fn deploy(&mut self) {
        let mut deployed = Vec::new();
        for formation in self.formations.iter_mut().filter(|f| !f.deployed) {
            formation.deployed = true;
            deployed.push((formation.id, formation.position));
        }
        for (formation, position) in deployed {
            self.report(ReportRecord::Deployed {
                formation,
                position,
            });
        }
    }

    /// Morale checks for stressed formations and a recovery roll for every
    /// other formation below Normal, routed ones included
    fn queue_end_of_round_checks(&mut self) {
        let mut actions = Vec::new();
        for formation in self.formations.iter().filter(|f| f.is_active()) {
            if formation.high_stress_episode {
                actions.push(Action::MoraleCheck(MoraleCheckAction {
                    formation: formation.id,
                }));
            } else if !formation.morale.is_best() {
                actions.push(Action::RecoveringNerve(RecoveringNerveAction {
                    formation: formation.id,
                }));
            }
        }
        self.enqueue_all(actions);
    }

    fn queue_routed_withdrawals(&mut self) {
        let routed: Vec<Action> = self
            .formations
            .iter()
            .filter(|f| f.is_active() && f.morale.is_terminal())
            .map(|f| Action::Withdraw(WithdrawAction { formation: f.id }))
            .collect();
        self.enqueue_all(routed);
    }

    /// Sweep formations with no surviving units into the graveyard
    pub fn remove_destroyed_formations(&mut self) {
        let destroyed: Vec<FormationId> = self
            .formations
            .iter()
            .filter(|f| f.is_destroyed())
            .map(|f| f.id)
            .collect();

        for id in destroyed {
            let entities: Vec<EntityId> = self
                .formations
                .get(id)
                .map(|f| {
                    f.units
                        .iter()
                        .flat_map(|u| u.elements.iter().map(|e| e.entity))
                        .collect()
                })
                .unwrap_or_default();
            for entity in entities {
                if self.ledger.is_live(entity) {
                    self.ledger
                        .set_removal_condition(entity, RemovalCondition::Devastated);
                }
            }

            self.formations.remove(id);
            tracing::info!(formation = ?id, "formation destroyed");
            self.report(ReportRecord::FormationDestroyed { formation: id });
        }
    }

    /// Clear per-round flags once the end phase has consumed them, and drop
    /// locks on formations that are gone
    fn clear_round_flags(&mut self) {
        let live = self.formations.ids();
        for formation in self.formations.iter_mut() {
            formation.high_stress_episode = false;
            formation.engagement_control_failed = false;
            if formation.target.is_some_and(|target| !live.contains(&target)) {
                formation.target = None;
                formation.engagement_control = EngagementControl::None;
            }
        }
    }

    /// Battle end: nobody left, one side left fighting, or out of rounds
    fn check_battle_end(&self) -> Option<BattleOutcome> {
        if self.formations.is_empty() {
            return Some(BattleOutcome::NoVictor);
        }

        let sides = self.formations.fighting_sides();
        match sides.as_slice() {
            [] => return Some(BattleOutcome::NoVictor),
            [side] => return Some(BattleOutcome::Victory(*side)),
            _ => {}
        }

        if self.phase.is_end() && self.round >= self.config.max_rounds {
            return Some(BattleOutcome::RoundLimit);
        }
        None
    }

    fn finish(&mut self, outcome: BattleOutcome) {
        self.outcome = outcome;
        tracing::info!(?outcome, round = self.round, "battle ended");
        self.report(ReportRecord::BattleEnded { outcome });
    }

    /// Run the current phase: ask the decider for actions, resolve what is
    /// pending, do the phase's bookkeeping, then move to the next phase
    pub fn step_phase(&mut self, decider: &mut dyn Decider) -> BattleOutcome {
        if self.is_finished() {
            return self.outcome;
        }
        self.start();

        if self.phase == Phase::Deployment {
            self.report(ReportRecord::RoundStarted);
            self.deploy();
        }

        let planned = decider.plan(self.phase, &self.view());
        tracing::debug!(
            round = self.round,
            phase = ?self.phase,
            actions = planned.len(),
            "phase planned"
        );
        self.enqueue_all(planned);

        if self.phase.is_end() {
            self.queue_end_of_round_checks();
        }
        self.process_pending();

        if self.phase.is_end() {
            self.queue_routed_withdrawals();
            self.process_pending();
        }

        self.remove_destroyed_formations();

        if let Some(outcome) = self.check_battle_end() {
            self.finish(outcome);
            return outcome;
        }

        if self.phase.is_end() {
            self.clear_round_flags();
            self.round += 1;
        }
        self.phase = self.phase.next();
        BattleOutcome::Undecided
    }

    /// Run one full round, or what is left of the current one
    pub fn run_round(&mut self, decider: &mut dyn Decider) -> BattleOutcome {
        let round = self.round;
        while !self.is_finished() && self.round == round {
            self.step_phase(decider);
        }
        self.outcome
    }

    /// Run until the battle ends
    pub fn run(&mut self, decider: &mut dyn Decider) -> BattleOutcome {
        while !self.is_finished() {
            self.run_round(decider);
        }
        self.outcome
    }

    // === SNAPSHOTS ===

    pub fn snapshot(&self) -> BattleSnapshot {
        BattleSnapshot {
            config: self.config.clone(),
            round: self.round,
            phase: self.phase,
            started: self.started,
            outcome: self.outcome,
            formations: self.formations.clone(),
            retreated: self.retreated.clone(),
            pending: self.pending.iter().map(|p| p.action).collect(),
            dice: self.dice.checkpoint(),
        }
    }

    /// Resume from a snapshot. Seeded dice continue where the snapshot left
    /// them; other dice sources are kept as they are.
    pub fn restore(&mut self, snapshot: BattleSnapshot) -> Result<()> {
        snapshot.config.validate()?;
        self.board = Board::from_config(&snapshot.config);
        self.config = snapshot.config;
        self.round = snapshot.round;
        self.phase = snapshot.phase;
        self.started = snapshot.started;
        self.outcome = snapshot.outcome;
        self.formations = snapshot.formations;
        self.retreated = snapshot.retreated;
        self.pending = snapshot.pending.into_iter().map(PendingAction::new).collect();
        if let Some(checkpoint) = snapshot.dice {
            self.dice = Box::new(SeededDice::resume(checkpoint));
        }
        tracing::debug!(round = self.round, phase = ?self.phase, "battle restored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::morale::MoraleStatus;
    use crate::battle::roll::ScriptedDice;
    use crate::battle::units::{Element, Unit};
    use crate::core::types::{ElementId, SideId, UnitId};

    struct Idle;

    impl Decider for Idle {
        fn plan(&mut self, _phase: Phase, _view: &BattleView<'_>) -> Vec<Action> {
            Vec::new()
        }
    }

    fn manager(totals: &[u8]) -> SimulationManager {
        SimulationManager::new(SimulationConfig::default())
            .unwrap()
            .with_dice(ScriptedDice::with_totals(totals))
    }

    /// One unit of two elements; entities start at `first_entity`
    fn add(manager: &mut SimulationManager, side: u32, q: i32, first_entity: u64) -> FormationId {
        let elements = (0..2)
            .map(|i| {
                Element::new(
                    ElementId(i),
                    EntityId::from_index(first_entity + i as u64),
                    5,
                    2,
                )
            })
            .collect();
        let mut formation = Formation::new(FormationId(0), SideId(side));
        formation.position = HexCoord::new(q, 0);
        formation
            .units
            .push(Unit::from_elements(UnitId(0), elements));
        manager.add_formation(formation)
    }

    fn formation_mut(manager: &mut SimulationManager, id: FormationId) -> &mut Formation {
        manager.formations.get_mut(id).unwrap()
    }

    #[test]
    fn test_high_stress_triggers_morale_check_at_end() {
        // No faces queued: every roll is a 2 and fails
        let mut manager = manager(&[]);
        let a = add(&mut manager, 0, 5, 1);
        let b = add(&mut manager, 1, 20, 3);
        formation_mut(&mut manager, a).high_stress_episode = true;

        assert_eq!(manager.run_round(&mut Idle), BattleOutcome::Undecided);

        let checks: Vec<FormationId> = manager
            .reporter()
            .records()
            .filter_map(|r| match r {
                ReportRecord::MoraleChecked { formation, .. } => Some(*formation),
                _ => None,
            })
            .collect();
        assert_eq!(checks, vec![a]);
        assert_eq!(manager.get_formation(a).unwrap().morale, MoraleStatus::Shaken);
        assert_eq!(manager.get_formation(b).unwrap().morale, MoraleStatus::Normal);
        assert!(!manager.get_formation(a).unwrap().high_stress_episode);
        assert!(!manager
            .reporter()
            .records()
            .any(|r| matches!(r, ReportRecord::NerveRecovery { .. })));
    }

    #[test]
    fn test_routed_formation_rolls_recovery_then_withdraws() {
        // Recovery target is 6; a 12 makes it, so the formation stays routed
        let mut manager = manager(&[12]);
        let a = add(&mut manager, 0, 5, 1);
        add(&mut manager, 0, 6, 3);
        add(&mut manager, 1, 20, 5);
        formation_mut(&mut manager, a).morale = MoraleStatus::Routed;

        assert_eq!(manager.run_round(&mut Idle), BattleOutcome::Undecided);

        let records: Vec<&ReportRecord> = manager.reporter().records().collect();
        let recovery = records.iter().position(|r| {
            matches!(r, ReportRecord::NerveRecovery { formation, result }
                if *formation == a && result.after == MoraleStatus::Routed)
        });
        let withdrawal = records.iter().position(
            |r| matches!(r, ReportRecord::WithdrawalStarted { formation } if *formation == a),
        );
        assert!(recovery.is_some(), "routed formation should roll to recover");
        assert!(withdrawal.is_some(), "still routed, so it should withdraw");
        assert!(recovery < withdrawal);
        assert!(manager.get_formation(a).unwrap().withdrawing);
    }

    #[test]
    fn test_routed_formation_that_recovers_stays_in_battle() {
        // A 2 misses the recovery target, which improves morale
        let mut manager = manager(&[2]);
        let a = add(&mut manager, 0, 5, 1);
        add(&mut manager, 1, 20, 3);
        formation_mut(&mut manager, a).morale = MoraleStatus::Routed;

        manager.run_round(&mut Idle);

        let formation = manager.get_formation(a).unwrap();
        assert_eq!(formation.morale, MoraleStatus::Broken);
        assert!(!formation.withdrawing);
        assert!(!manager
            .reporter()
            .records()
            .any(|r| matches!(r, ReportRecord::WithdrawalStarted { .. })));
    }

    #[test]
    fn test_clear_round_flags_drops_dead_targets() {
        let mut manager = manager(&[]);
        let a = add(&mut manager, 0, 5, 1);
        let b = add(&mut manager, 1, 7, 3);
        let c = add(&mut manager, 1, 9, 5);
        {
            let formation = formation_mut(&mut manager, a);
            formation.high_stress_episode = true;
            formation.engagement_control_failed = true;
            formation.engagement_control = EngagementControl::Standard;
            formation.target = Some(b);
        }
        {
            let formation = formation_mut(&mut manager, c);
            formation.engagement_control = EngagementControl::Overrun;
            formation.target = Some(a);
        }
        manager.remove_formation(b);

        manager.clear_round_flags();

        let a = manager.get_formation(a).unwrap();
        assert!(!a.high_stress_episode);
        assert!(!a.engagement_control_failed);
        assert_eq!(a.target, None);
        assert_eq!(a.engagement_control, EngagementControl::None);

        let c = manager.get_formation(c).unwrap();
        assert_eq!(c.target, Some(a.id));
        assert_eq!(c.engagement_control, EngagementControl::Overrun);
    }

    #[test]
    fn test_destroyed_formation_devastates_live_elements() {
        let mut manager = manager(&[]);
        let a = add(&mut manager, 0, 5, 1);
        let b = add(&mut manager, 1, 20, 3);
        formation_mut(&mut manager, a).units[0].armor = 0;
        manager
            .ledger
            .set_removal_condition(EntityId::from_index(2), RemovalCondition::InRetreat);

        manager.remove_destroyed_formations();

        assert!(manager.get_formation(a).is_none());
        assert!(manager.get_formation(b).is_some());
        assert!(manager.graveyard().iter().any(|f| f.id == a));
        assert_eq!(
            manager.ledger().removal_condition(EntityId::from_index(1)),
            Some(RemovalCondition::Devastated)
        );
        assert_eq!(
            manager.ledger().removal_condition(EntityId::from_index(2)),
            Some(RemovalCondition::InRetreat)
        );
        assert_eq!(manager.ledger().removal_condition(EntityId::from_index(3)), None);
        assert!(manager.reporter().records().any(
            |r| matches!(r, ReportRecord::FormationDestroyed { formation } if *formation == a)
        ));
    }
}
