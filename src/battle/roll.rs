//! Dice rolls and the injectable random source
//!
//! Every random decision in a battle goes through one `DiceSource`, so a
//! fixed seed replays the whole battle.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// The only source of nondeterminism in the engine
pub trait DiceSource {
    /// One six-sided die, 1..=6
    fn die(&mut self) -> u8;

    /// Uniform index in `0..bound`. `bound` is never zero.
    fn below(&mut self, bound: usize) -> usize;

    /// Position to resume from, if this source can be resumed
    fn checkpoint(&self) -> Option<DiceCheckpoint> {
        None
    }
}

/// Stream position of a seeded source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceCheckpoint {
    pub seed: u64,
    pub word_pos: u128,
}

/// Seeded dice backed by ChaCha8
#[derive(Debug, Clone)]
pub struct SeededDice {
    seed: u64,
    rng: ChaCha8Rng,
}

impl SeededDice {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Continue a stream exactly where `checkpoint` left it
    pub fn resume(checkpoint: DiceCheckpoint) -> Self {
        let mut dice = Self::new(checkpoint.seed);
        dice.rng.set_word_pos(checkpoint.word_pos);
        dice
    }
}

impl DiceSource for SeededDice {
    fn die(&mut self) -> u8 {
        self.rng.gen_range(1..=6)
    }

    fn below(&mut self, bound: usize) -> usize {
        self.rng.gen_range(0..bound)
    }

    fn checkpoint(&self) -> Option<DiceCheckpoint> {
        Some(DiceCheckpoint {
            seed: self.seed,
            word_pos: self.rng.get_word_pos(),
        })
    }
}

/// Dice that replay queued faces and picks
///
/// Runs out of faces by rolling 1s. Without queued picks, selections take the
/// last candidate, which leaves shuffles in their original order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    faces: VecDeque<u8>,
    picks: VecDeque<usize>,
}

impl ScriptedDice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue 2d6 totals; each total is split into two faces
    pub fn with_totals(totals: &[u8]) -> Self {
        let mut dice = Self::new();
        for &total in totals {
            dice.push_total(total);
        }
        dice
    }

    pub fn push_total(&mut self, total: u8) {
        let total = total.clamp(2, 12);
        let first = total / 2;
        self.faces.push_back(first);
        self.faces.push_back(total - first);
    }

    pub fn push_face(&mut self, face: u8) {
        self.faces.push_back(face.clamp(1, 6));
    }

    pub fn push_pick(&mut self, pick: usize) {
        self.picks.push_back(pick);
    }

    /// Faces not yet consumed
    pub fn remaining_faces(&self) -> usize {
        self.faces.len()
    }
}

impl DiceSource for ScriptedDice {
    fn die(&mut self) -> u8 {
        self.faces.pop_front().unwrap_or(1)
    }

    fn below(&mut self, bound: usize) -> usize {
        match self.picks.pop_front() {
            Some(pick) => pick.min(bound - 1),
            None => bound - 1,
        }
    }
}

/// Uniformly pick one of `items`
pub fn choose<'a, T>(dice: &mut dyn DiceSource, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(dice.below(items.len()))
}

/// Pick an index with probability proportional to its weight.
/// Returns `None` when every weight is zero.
pub fn weighted_index(dice: &mut dyn DiceSource, weights: &[u32]) -> Option<usize> {
    let total: u64 = weights.iter().map(|&w| w as u64).sum();
    if total == 0 {
        return None;
    }

    let mut ticket = dice.below(total as usize) as u64;
    for (index, &weight) in weights.iter().enumerate() {
        if ticket < weight as u64 {
            return Some(index);
        }
        ticket -= weight as u64;
    }
    None
}

/// Fisher-Yates shuffle driven by the dice source
pub fn shuffle<T>(dice: &mut dyn DiceSource, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = dice.below(i + 1);
        items.swap(i, j);
    }
}

/// A single 2d6 roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roll {
    pub dice: [u8; 2],
}

impl Roll {
    pub fn two_d6(dice: &mut dyn DiceSource) -> Self {
        Self {
            dice: [dice.die(), dice.die()],
        }
    }

    pub fn total(&self) -> i32 {
        self.dice.iter().map(|&d| d as i32).sum()
    }

    /// Success means meeting or beating the target number
    pub fn is_target_rolled_or_better(&self, target: i32) -> bool {
        self.total() >= target
    }

    /// Margin of success: roll total minus target number
    pub fn margin(&self, target: i32) -> i32 {
        self.total() - target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_dice_deterministic() {
        let mut a = SeededDice::new(7);
        let mut b = SeededDice::new(7);
        for _ in 0..100 {
            assert_eq!(a.die(), b.die());
            assert_eq!(a.below(17), b.below(17));
        }
    }

    #[test]
    fn test_resumed_dice_continue_the_stream() {
        let mut original = SeededDice::new(7);
        for _ in 0..5 {
            original.die();
        }
        let checkpoint = original.checkpoint().unwrap();
        let mut resumed = SeededDice::resume(checkpoint);

        let a: Vec<u8> = (0..10).map(|_| original.die()).collect();
        let b: Vec<u8> = (0..10).map(|_| resumed.die()).collect();
        assert_eq!(a, b);
        assert!(ScriptedDice::new().checkpoint().is_none());
    }

    #[test]
    fn test_seeded_dice_faces_in_range() {
        let mut dice = SeededDice::new(3);
        for _ in 0..500 {
            let face = dice.die();
            assert!((1..=6).contains(&face));
        }
    }

    #[test]
    fn test_scripted_totals_round_trip() {
        let mut dice = ScriptedDice::with_totals(&[9, 2, 12]);
        assert_eq!(Roll::two_d6(&mut dice).total(), 9);
        assert_eq!(Roll::two_d6(&mut dice).total(), 2);
        assert_eq!(Roll::two_d6(&mut dice).total(), 12);
        assert_eq!(dice.remaining_faces(), 0);
    }

    #[test]
    fn test_roll_target_and_margin() {
        let roll = Roll { dice: [4, 5] };
        assert!(roll.is_target_rolled_or_better(9));
        assert!(!roll.is_target_rolled_or_better(10));
        assert_eq!(roll.margin(7), 2);
        assert_eq!(roll.margin(11), -2);
    }

    #[test]
    fn test_weighted_index_skips_zero_weights() {
        let mut dice = ScriptedDice::new();
        dice.push_pick(0);
        dice.push_pick(4);
        // weights: [0, 3, 0, 2] -> tickets 0..3 belong to index 1, 3..5 to index 3
        assert_eq!(weighted_index(&mut dice, &[0, 3, 0, 2]), Some(1));
        assert_eq!(weighted_index(&mut dice, &[0, 3, 0, 2]), Some(3));
        assert_eq!(weighted_index(&mut dice, &[0, 0]), None);
    }

    #[test]
    fn test_shuffle_keeps_all_items() {
        let mut dice = SeededDice::new(11);
        let mut items = vec![1, 2, 3, 4, 5, 6];
        shuffle(&mut dice, &mut items);
        let mut sorted = items.clone();
        sorted.sort();
        assert_eq!(sorted, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_scripted_shuffle_defaults_to_identity() {
        let mut dice = ScriptedDice::new();
        let mut items = vec!['a', 'b', 'c'];
        shuffle(&mut dice, &mut items);
        assert_eq!(items, vec!['a', 'b', 'c']);
    }
}
