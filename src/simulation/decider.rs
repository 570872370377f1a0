//! Decision layer seam
//!
//! The engine never chooses what formations do. A `Decider` looks at a
//! read-only view of the battle at the start of each phase and returns the
//! actions to queue. `BasicCommander` is a plain greedy commander, enough to
//! run a headless battle end to end.

use crate::actions::{
    Action, EngagementControlAction, MoveAction, StandardAttackAction, WithdrawAction,
};
use crate::battle::board::Board;
use crate::battle::constants::FORMATION_MOVE_HEXES;
use crate::battle::engagement::EngagementControl;
use crate::battle::morale::MoraleStatus;
use crate::battle::units::{Formation, RangeBand};
use crate::core::types::Round;
use crate::core::SimulationConfig;
use crate::simulation::phase::Phase;
use crate::simulation::store::FormationStore;

/// What a decider may see
#[derive(Clone, Copy)]
pub struct BattleView<'a> {
    pub formations: &'a FormationStore,
    pub board: &'a Board,
    pub config: &'a SimulationConfig,
    pub round: Round,
}

impl<'a> BattleView<'a> {
    /// Closest live enemy that is still fighting; ties go to the lower id
    pub fn nearest_enemy(&self, formation: &Formation) -> Option<&'a Formation> {
        self.formations
            .enemies_of(formation.side)
            .filter(|enemy| !enemy.withdrawing && !enemy.is_destroyed())
            .min_by_key(|enemy| (formation.position.distance(&enemy.position), enemy.id))
    }

    /// The formation's locked target if it is still alive, else the nearest enemy
    pub fn current_target(&self, formation: &Formation) -> Option<&'a Formation> {
        formation
            .target
            .and_then(|id| self.formations.get(id))
            .filter(|target| target.side != formation.side)
            .or_else(|| self.nearest_enemy(formation))
    }

    pub fn range_to(&self, from: &Formation, to: &Formation) -> RangeBand {
        RangeBand::from_distance(from.position.distance(&to.position), self.config)
    }
}

/// Produces actions for a phase
pub trait Decider {
    fn plan(&mut self, phase: Phase, view: &BattleView<'_>) -> Vec<Action>;
}

/// Greedy commander shared by every side
///
/// - closes on the nearest enemy, into cover once badly hurt
/// - contests engagement once at short range
/// - fires every surviving unit at its target when in range
/// - pulls back broken, badly hurt formations; routed ones are left to the
///   end-of-round bookkeeping
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicCommander;

impl BasicCommander {
    pub fn new() -> Self {
        Self
    }

    fn is_retreating(formation: &Formation) -> bool {
        formation.withdrawing || formation.morale == MoraleStatus::Routed
    }

    fn plan_movement(&self, view: &BattleView<'_>, formation: &Formation) -> Vec<Action> {
        if Self::is_retreating(formation) {
            let edge = view.board.nearest_edge(formation.position);
            if edge == formation.position {
                return Vec::new();
            }
            return vec![Action::Move(MoveAction {
                formation: formation.id,
                destination: formation.position.step_toward(&edge, FORMATION_MOVE_HEXES),
                relative_to: None,
            })];
        }

        let Some(enemy) = view.nearest_enemy(formation) else {
            return Vec::new();
        };

        let mut actions = Vec::new();
        let distance = formation.position.distance(&enemy.position);

        if distance > 1 {
            let steps = FORMATION_MOVE_HEXES.min(distance - 1);
            let movement = MoveAction {
                formation: formation.id,
                destination: formation.position.step_toward(&enemy.position, steps),
                relative_to: Some(enemy.id),
            };
            if formation.total_armor() * 2 < formation.original_armor() {
                actions.push(Action::MoveToCover(movement));
            } else {
                actions.push(Action::Move(movement));
            }
        }

        let closing = distance.saturating_sub(FORMATION_MOVE_HEXES);
        if closing <= view.config.short_range && formation.target != Some(enemy.id) {
            actions.push(Action::EngagementControl(EngagementControlAction {
                formation: formation.id,
                target: enemy.id,
                mode: EngagementControl::Standard,
            }));
        }

        actions
    }

    fn plan_firing(&self, view: &BattleView<'_>, formation: &Formation) -> Vec<Action> {
        if Self::is_retreating(formation) {
            return Vec::new();
        }
        let Some(target) = view.current_target(formation) else {
            return Vec::new();
        };
        let range = view.range_to(formation, target);
        if !range.is_supported() {
            return Vec::new();
        }

        formation
            .surviving_units()
            .map(|unit| {
                Action::StandardAttack(StandardAttackAction {
                    formation: formation.id,
                    unit: unit.id,
                    target: target.id,
                    range,
                })
            })
            .collect()
    }

    fn plan_end(&self, view: &BattleView<'_>, formation: &Formation) -> Option<Action> {
        if formation.morale == MoraleStatus::Routed {
            return None;
        }

        let badly_hurt = formation.total_armor() * 2 < formation.original_armor();
        let at_edge = view.board.is_edge(formation.position);
        let pull_back = formation.morale == MoraleStatus::Broken && badly_hurt;

        if (formation.withdrawing && at_edge) || (!formation.withdrawing && pull_back) {
            Some(Action::Withdraw(WithdrawAction {
                formation: formation.id,
            }))
        } else {
            None
        }
    }
}

impl Decider for BasicCommander {
    fn plan(&mut self, phase: Phase, view: &BattleView<'_>) -> Vec<Action> {
        let mut actions = Vec::new();
        for formation in view.formations.iter().filter(|f| f.is_active()) {
            match phase {
                Phase::Deployment => {}
                Phase::Movement => actions.extend(self.plan_movement(view, formation)),
                Phase::Firing => actions.extend(self.plan_firing(view, formation)),
                Phase::End => actions.extend(self.plan_end(view, formation)),
            }
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::hex::HexCoord;
    use crate::battle::units::{Element, Unit};
    use crate::core::types::{ElementId, EntityId, FormationId, SideId, UnitId};

    struct Scenario {
        formations: FormationStore,
        board: Board,
        config: SimulationConfig,
    }

    impl Scenario {
        fn new() -> Self {
            let config = SimulationConfig::default();
            Self {
                formations: FormationStore::new(),
                board: Board::from_config(&config),
                config,
            }
        }

        fn add(&mut self, side: u32, q: i32, units: u32) -> FormationId {
            let mut formation = Formation::new(FormationId(0), SideId(side));
            formation.position = HexCoord::new(q, 0);
            formation.deployed = true;
            for i in 0..units {
                let element = Element::new(ElementId(0), EntityId::from_index(i as u64), 10, 2);
                formation
                    .units
                    .push(Unit::from_elements(UnitId(i), vec![element]));
            }
            self.formations.insert(formation)
        }

        fn plan(&self, phase: Phase) -> Vec<Action> {
            let view = BattleView {
                formations: &self.formations,
                board: &self.board,
                config: &self.config,
                round: 1,
            };
            BasicCommander::new().plan(phase, &view)
        }
    }

    #[test]
    fn test_movement_closes_on_nearest_enemy() {
        let mut scenario = Scenario::new();
        let a = scenario.add(0, 2, 1);
        let near = scenario.add(1, 20, 1);
        scenario.add(1, 28, 1);

        let actions = scenario.plan(Phase::Movement);
        let mv = actions
            .iter()
            .find_map(|action| match action {
                Action::Move(m) if m.formation == a => Some(*m),
                _ => None,
            })
            .unwrap();
        assert_eq!(mv.destination, HexCoord::new(6, 0));
        assert_eq!(mv.relative_to, Some(near));
    }

    #[test]
    fn test_movement_stops_adjacent() {
        let mut scenario = Scenario::new();
        let a = scenario.add(0, 10, 1);
        scenario.add(1, 12, 1);

        let actions = scenario.plan(Phase::Movement);
        let mv = actions
            .iter()
            .find_map(|action| match action {
                Action::Move(m) if m.formation == a => Some(*m),
                _ => None,
            })
            .unwrap();
        assert_eq!(mv.destination, HexCoord::new(11, 0));
        assert!(actions.iter().any(|action| matches!(
            action,
            Action::EngagementControl(e) if e.formation == a
        )));
    }

    #[test]
    fn test_hurt_formation_moves_to_cover() {
        let mut scenario = Scenario::new();
        let a = scenario.add(0, 2, 1);
        scenario.add(1, 20, 1);
        scenario.formations.get_mut(a).unwrap().units[0].armor = 3;

        let actions = scenario.plan(Phase::Movement);
        assert!(actions
            .iter()
            .any(|action| matches!(action, Action::MoveToCover(m) if m.formation == a)));
    }

    #[test]
    fn test_withdrawing_formation_heads_for_edge() {
        let mut scenario = Scenario::new();
        let a = scenario.add(0, 5, 1);
        scenario.add(1, 20, 1);
        scenario.formations.get_mut(a).unwrap().withdrawing = true;

        let actions = scenario.plan(Phase::Movement);
        let mv = actions
            .iter()
            .find_map(|action| match action {
                Action::Move(m) if m.formation == a => Some(*m),
                _ => None,
            })
            .unwrap();
        assert_eq!(mv.destination, HexCoord::new(1, 0));
        assert_eq!(mv.relative_to, None);
    }

    #[test]
    fn test_firing_uses_every_surviving_unit() {
        let mut scenario = Scenario::new();
        let a = scenario.add(0, 5, 3);
        let b = scenario.add(1, 8, 1);
        scenario.formations.get_mut(a).unwrap().units[1].armor = 0;

        let attacks: Vec<_> = scenario
            .plan(Phase::Firing)
            .into_iter()
            .filter_map(|action| match action {
                Action::StandardAttack(attack) if attack.formation == a => Some(attack),
                _ => None,
            })
            .collect();
        assert_eq!(attacks.len(), 2);
        assert!(attacks
            .iter()
            .all(|attack| attack.target == b && attack.range == RangeBand::Short));
    }

    #[test]
    fn test_no_attacks_beyond_long_range() {
        let mut scenario = Scenario::new();
        scenario.add(0, 0, 1);
        scenario.add(1, 29, 1);

        assert!(scenario.plan(Phase::Firing).is_empty());
    }

    #[test]
    fn test_broken_and_hurt_formation_withdraws() {
        let mut scenario = Scenario::new();
        let a = scenario.add(0, 5, 1);
        scenario.add(1, 8, 1);
        {
            let formation = scenario.formations.get_mut(a).unwrap();
            formation.morale = MoraleStatus::Broken;
            formation.units[0].armor = 2;
        }

        let actions = scenario.plan(Phase::End);
        assert_eq!(
            actions,
            vec![Action::Withdraw(WithdrawAction { formation: a })]
        );
    }
}
