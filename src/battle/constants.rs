//! Battle rule constants - fixed values of the abstract combat rules

/// A 2d6 target number above this can never be rolled
pub const MAX_ROLLABLE_TARGET: i32 = 12;

/// Range modifiers, added to attack target numbers
pub const SHORT_RANGE_MODIFIER: i32 = 0;
pub const MEDIUM_RANGE_MODIFIER: i32 = 2;
pub const LONG_RANGE_MODIFIER: i32 = 4;

/// Each targeting critical worsens the unit's attacks by this much
pub const TARGETING_CRIT_MODIFIER: i32 = 2;

/// Each damage critical removes this much damage from every increment
pub const DAMAGE_CRIT_PENALTY: u32 = 1;

/// Hexes a formation covers in one movement phase
pub const FORMATION_MOVE_HEXES: u32 = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_modifiers_grow_with_range() {
        assert!(SHORT_RANGE_MODIFIER < MEDIUM_RANGE_MODIFIER);
        assert!(MEDIUM_RANGE_MODIFIER < LONG_RANGE_MODIFIER);
    }

    #[test]
    fn test_short_range_attack_is_rollable() {
        assert!(SHORT_RANGE_MODIFIER + 4 <= MAX_ROLLABLE_TARGET);
    }
}
