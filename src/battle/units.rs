//! Unit hierarchy: Element → Unit → Formation
//!
//! Elements are the smallest simulated combatants, each standing in for one
//! entity of the detailed rules engine. Units are the target granularity
//! for attacks. Formations move, engage and check morale as one.

use serde::{Deserialize, Serialize};

use crate::battle::engagement::{EngagementControl, EngagementRecord};
use crate::battle::hex::HexCoord;
use crate::battle::morale::MoraleStatus;
use crate::core::config::SimulationConfig;
use crate::core::types::{ElementId, EntityId, FormationId, Round, SideId, UnitId};

/// Range band of an attack, nearest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RangeBand {
    Short,
    Medium,
    Long,
    Extreme,
}

impl RangeBand {
    /// Furthest band a standard attack may use
    pub const MAX_SUPPORTED: RangeBand = RangeBand::Long;

    pub fn is_supported(&self) -> bool {
        *self <= Self::MAX_SUPPORTED
    }

    /// Band for a hex distance under the configured thresholds
    pub fn from_distance(distance: u32, config: &SimulationConfig) -> Self {
        if distance <= config.short_range {
            RangeBand::Short
        } else if distance <= config.medium_range {
            RangeBand::Medium
        } else if distance <= config.long_range {
            RangeBand::Long
        } else {
            RangeBand::Extreme
        }
    }
}

/// Flat damage ratings per range band. `None` means the element has no
/// rating at that band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RangeDamage {
    pub short: Option<u32>,
    pub medium: Option<u32>,
    pub long: Option<u32>,
    pub extreme: Option<u32>,
}

impl RangeDamage {
    pub fn new(short: u32, medium: u32, long: u32) -> Self {
        Self {
            short: Some(short),
            medium: Some(medium),
            long: Some(long),
            extreme: None,
        }
    }

    pub fn at(&self, band: RangeBand) -> Option<u32> {
        match band {
            RangeBand::Short => self.short,
            RangeBand::Medium => self.medium,
            RangeBand::Long => self.long,
            RangeBand::Extreme => self.extreme,
        }
    }
}

/// Summed damage of each firing arc
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArcDamage {
    pub front: u32,
    pub left: u32,
    pub right: u32,
    pub rear: u32,
}

impl ArcDamage {
    pub fn as_weights(&self) -> [u32; 4] {
        [self.front, self.left, self.right, self.rear]
    }
}

/// Directional damage profile of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DamageProfile {
    pub flat: RangeDamage,
    pub arcs: ArcDamage,
}

/// Smallest simulated combatant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub name: String,
    pub entity: EntityId,
    pub armor: u32,
    pub structure: u32,
    pub damage: DamageProfile,
}

impl Element {
    pub fn new(id: ElementId, entity: EntityId, armor: u32, structure: u32) -> Self {
        Self {
            id,
            name: String::new(),
            entity,
            armor,
            structure,
            damage: DamageProfile::default(),
        }
    }

    pub fn with_damage(mut self, damage: DamageProfile) -> Self {
        self.damage = damage;
        self
    }

    pub fn has_structure(&self) -> bool {
        self.structure > 0
    }

    /// Absorb one damage increment, armor first. Never splits the increment
    /// between armor and structure and never drives either below zero.
    /// Returns the damage actually absorbed.
    pub fn absorb(&mut self, amount: u32) -> u32 {
        if self.armor > 0 {
            let taken = amount.min(self.armor);
            self.armor -= taken;
            taken
        } else {
            let taken = amount.min(self.structure);
            self.structure -= taken;
            taken
        }
    }
}

/// A sub-group of elements, the granularity attacks resolve against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub armor: u32,
    pub original_armor: u32,
    pub targeting_crits: u32,
    pub damage_crits: u32,
    pub elements: Vec<Element>,
}

impl Unit {
    pub fn new(id: UnitId, armor: u32) -> Self {
        Self {
            id,
            name: String::new(),
            armor,
            original_armor: armor,
            targeting_crits: 0,
            damage_crits: 0,
            elements: Vec::new(),
        }
    }

    /// Build a unit whose armor pool is the sum of its elements' armor
    pub fn from_elements(id: UnitId, elements: Vec<Element>) -> Self {
        let armor = elements.iter().map(|e| e.armor).sum();
        let mut unit = Self::new(id, armor);
        unit.elements = elements;
        unit
    }

    pub fn is_destroyed(&self) -> bool {
        self.armor == 0
    }

    /// Reduce the armor pool, clamped at zero
    pub fn reduce_armor(&mut self, amount: u32) {
        self.armor = self.armor.saturating_sub(amount);
    }

    pub fn is_below_half_armor(&self) -> bool {
        self.armor * 2 < self.original_armor
    }
}

/// Transient context a formation carries between handlers and rounds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormationMemory {
    pub engagements: Vec<EngagementRecord>,
    pub in_cover: bool,
    pub last_attacker: Option<FormationId>,
    pub last_damaged_round: Option<Round>,
}

/// A group of units treated as one entity for movement and engagement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formation {
    pub id: FormationId,
    pub name: String,
    pub side: SideId,
    pub skill: i32,
    pub position: HexCoord,
    pub target: Option<FormationId>,
    pub morale: MoraleStatus,
    pub engagement_control: EngagementControl,
    pub engagement_control_failed: bool,
    pub deployed: bool,
    pub withdrawing: bool,
    pub crippled: bool,
    pub high_stress_episode: bool,
    pub units: Vec<Unit>,
    pub memory: FormationMemory,
}

impl Formation {
    /// Default skill of an average crew
    pub const DEFAULT_SKILL: i32 = 4;

    pub fn new(id: FormationId, side: SideId) -> Self {
        Self {
            id,
            name: String::new(),
            side,
            skill: Self::DEFAULT_SKILL,
            position: HexCoord::default(),
            target: None,
            morale: MoraleStatus::default(),
            engagement_control: EngagementControl::default(),
            engagement_control_failed: false,
            deployed: false,
            withdrawing: false,
            crippled: false,
            high_stress_episode: false,
            units: Vec::new(),
            memory: FormationMemory::default(),
        }
    }

    pub fn surviving_units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|u| !u.is_destroyed())
    }

    pub fn surviving_unit_ids(&self) -> Vec<UnitId> {
        self.surviving_units().map(|u| u.id).collect()
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    /// Has every unit been destroyed?
    pub fn is_destroyed(&self) -> bool {
        self.surviving_units().next().is_none()
    }

    pub fn total_armor(&self) -> u32 {
        self.units.iter().map(|u| u.armor).sum()
    }

    pub fn original_armor(&self) -> u32 {
        self.units.iter().map(|u| u.original_armor).sum()
    }

    /// Can this formation still act on the board?
    pub fn is_active(&self) -> bool {
        self.deployed && !self.is_destroyed()
    }
}
