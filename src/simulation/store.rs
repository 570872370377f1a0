//! Formation arena
//!
//! Formations live in slots indexed by `FormationId`. Removing one moves it
//! to the graveyard; its id then resolves to nothing, forever.

use serde::{Deserialize, Serialize};

use crate::battle::board::Board;
use crate::battle::hex::HexCoord;
use crate::battle::units::Formation;
use crate::core::types::{FormationId, SideId};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormationStore {
    slots: Vec<Option<Formation>>,
    graveyard: Vec<Formation>,
}

impl FormationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a formation, assigning it the next id
    pub fn insert(&mut self, mut formation: Formation) -> FormationId {
        let id = FormationId(self.slots.len() as u32);
        formation.id = id;
        self.slots.push(Some(formation));
        id
    }

    pub fn get(&self, id: FormationId) -> Option<&Formation> {
        self.slots.get(id.0 as usize).and_then(|slot| slot.as_ref())
    }

    pub fn get_mut(&mut self, id: FormationId) -> Option<&mut Formation> {
        self.slots
            .get_mut(id.0 as usize)
            .and_then(|slot| slot.as_mut())
    }

    /// Two distinct live formations, mutably
    pub fn get_pair_mut(
        &mut self,
        a: FormationId,
        b: FormationId,
    ) -> Option<(&mut Formation, &mut Formation)> {
        let (ia, ib) = (a.0 as usize, b.0 as usize);
        if ia == ib || ia >= self.slots.len() || ib >= self.slots.len() {
            return None;
        }

        let (low, high) = (ia.min(ib), ia.max(ib));
        let (head, tail) = self.slots.split_at_mut(high);
        let first = head[low].as_mut()?;
        let second = tail[0].as_mut()?;
        if ia < ib {
            Some((first, second))
        } else {
            Some((second, first))
        }
    }

    /// Move a formation to the graveyard. Removing twice is a no-op.
    pub fn remove(&mut self, id: FormationId) -> bool {
        match self.slots.get_mut(id.0 as usize).and_then(|slot| slot.take()) {
            Some(formation) => {
                self.graveyard.push(formation);
                true
            }
            None => false,
        }
    }

    /// Relocate a formation, clamping the location onto the board
    pub fn set_formation_at(&mut self, id: FormationId, location: HexCoord, board: &Board) -> bool {
        match self.get_mut(id) {
            Some(formation) => {
                if !board.in_bounds(location) {
                    tracing::debug!(formation = ?id, ?location, "relocation clamped");
                }
                formation.position = board.clamp(location);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: FormationId) -> bool {
        self.get(id).is_some()
    }

    pub fn is_in_graveyard(&self, id: FormationId) -> bool {
        self.graveyard.iter().any(|f| f.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Formation> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Formation> {
        self.slots.iter_mut().filter_map(|slot| slot.as_mut())
    }

    pub fn ids(&self) -> Vec<FormationId> {
        self.iter().map(|f| f.id).collect()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn graveyard(&self) -> &[Formation] {
        &self.graveyard
    }

    /// Live formations not on `side`
    pub fn enemies_of(&self, side: SideId) -> impl Iterator<Item = &Formation> {
        self.iter().filter(move |f| f.side != side)
    }

    /// Sides that still have a formation on the field that is not withdrawing
    pub fn fighting_sides(&self) -> Vec<SideId> {
        let mut sides: Vec<SideId> = self
            .iter()
            .filter(|f| !f.withdrawing)
            .map(|f| f.side)
            .collect();
        sides.sort();
        sides.dedup();
        sides
    }
}
