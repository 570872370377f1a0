//! Bookkeeping link back to the detailed rules engine
//!
//! Elements only carry an `EntityId`. Kill credit and removal conditions are
//! pushed through an `EntityLedger` so the full simulation can pick them up
//! after the battle.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::EntityId;

/// Why an entity left the battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalCondition {
    Unknown,
    InRetreat,
    Devastated,
    Salvageable,
    Ejected,
    Captured,
    Pushed,
    NeverJoined,
}

impl RemovalCondition {
    /// Conditions after which an entity can no longer leave the field alive
    pub const TERMINAL: [RemovalCondition; 7] = [
        RemovalCondition::InRetreat,
        RemovalCondition::Devastated,
        RemovalCondition::Salvageable,
        RemovalCondition::Ejected,
        RemovalCondition::Captured,
        RemovalCondition::Pushed,
        RemovalCondition::NeverJoined,
    ];

    pub fn is_terminal(&self) -> bool {
        Self::TERMINAL.contains(self)
    }
}

/// Rules-engine entity lookup, used only for final bookkeeping
pub trait EntityLedger {
    fn removal_condition(&self, entity: EntityId) -> Option<RemovalCondition>;

    fn set_removal_condition(&mut self, entity: EntityId, condition: RemovalCondition);

    fn record_kill(&mut self, killer: EntityId, victim: EntityId);

    /// Is the entity still on the field?
    fn is_live(&self, entity: EntityId) -> bool {
        !self
            .removal_condition(entity)
            .is_some_and(|c| c.is_terminal())
    }
}

/// In-memory ledger
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KillLedger {
    removals: AHashMap<EntityId, RemovalCondition>,
    kills: Vec<(EntityId, EntityId)>,
}

impl KillLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kills in the order they were credited, as (killer, victim)
    pub fn kills(&self) -> &[(EntityId, EntityId)] {
        &self.kills
    }
}

impl EntityLedger for KillLedger {
    fn removal_condition(&self, entity: EntityId) -> Option<RemovalCondition> {
        self.removals.get(&entity).copied()
    }

    fn set_removal_condition(&mut self, entity: EntityId, condition: RemovalCondition) {
        self.removals.insert(entity, condition);
    }

    fn record_kill(&mut self, killer: EntityId, victim: EntityId) {
        self.kills.push((killer, victim));
    }
}
