// Property-based tests for damage, morale and critical resolution
use autoresolve::battle::damage::apply_damage;
use autoresolve::battle::morale::{check_morale, check_recovery};
use autoresolve::battle::*;
use autoresolve::core::types::{ElementId, EntityId, UnitId};
use proptest::prelude::*;

fn unit_from(stats: &[(u32, u32)]) -> Unit {
    let elements = stats
        .iter()
        .enumerate()
        .map(|(i, &(armor, structure))| {
            Element::new(ElementId(i as u32), EntityId::from_index(i as u64), armor, structure)
        })
        .collect();
    Unit::from_elements(UnitId(0), elements)
}

proptest! {
    #[test]
    fn proptest_damage_never_raises_or_underflows(
        stats in prop::collection::vec((0u32..20, 0u32..6), 1..5),
        increments in prop::collection::vec(0u32..15, 0..6),
        seed in any::<u64>(),
    ) {
        let mut unit = unit_from(&stats);
        let before_armor = unit.armor;
        let before: Vec<(u32, u32)> =
            unit.elements.iter().map(|e| (e.armor, e.structure)).collect();
        let mut dice = SeededDice::new(seed);

        let applied = apply_damage(&mut unit, &increments, &mut dice);

        prop_assert!(applied <= increments.iter().sum::<u32>());
        prop_assert_eq!(unit.armor, before_armor.saturating_sub(applied));
        prop_assert!(unit.armor <= unit.original_armor);
        for (element, (armor, structure)) in unit.elements.iter().zip(before) {
            prop_assert!(element.armor <= armor);
            prop_assert!(element.structure <= structure);
        }
    }

    #[test]
    fn proptest_morale_moves_at_most_one_step(
        index in 0usize..4,
        a in 1u8..=6,
        b in 1u8..=6,
        target in 2i32..=12,
    ) {
        let status = MoraleStatus::from_index(index);
        let roll = Roll { dice: [a, b] };

        for result in [check_morale(status, roll, target), check_recovery(status, roll, target)] {
            let step = result.after.index() as i32 - result.before.index() as i32;
            prop_assert!(step.abs() <= 1);
            prop_assert!(result.after.index() < MoraleStatus::LADDER.len());
        }

        let worse = check_morale(status, roll, target);
        prop_assert!(worse.after.index() >= status.index());
        if status.is_terminal() {
            prop_assert_eq!(worse.after, MoraleStatus::Routed);
        }
    }

    #[test]
    fn proptest_reduce_armor_clamps_at_zero(
        armor in 1u32..30,
        damage in 0u32..40,
    ) {
        let mut unit = Unit::new(UnitId(0), armor);
        unit.reduce_armor(damage);
        prop_assert_eq!(unit.armor, armor.saturating_sub(damage));
        prop_assert_eq!(unit.is_destroyed(), damage >= armor);
    }
}

#[test]
fn test_critical_buckets_partition_two_to_twelve() {
    let buckets: [(std::ops::RangeInclusive<i32>, CriticalEffect); 5] = [
        (2..=4, CriticalEffect::NoEffect),
        (5..=7, CriticalEffect::Targeting),
        (8..=9, CriticalEffect::Damage),
        (10..=11, CriticalEffect::TargetingAndDamage),
        (12..=12, CriticalEffect::Destroyed),
    ];

    for total in 2..=12 {
        let matching: Vec<_> = buckets.iter().filter(|(range, _)| range.contains(&total)).collect();
        assert_eq!(matching.len(), 1, "total {}", total);
        assert_eq!(CriticalEffect::from_total(total), matching[0].1);
    }
}
