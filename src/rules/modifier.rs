use crate::types::DailyModifier;
use rand::seq::IndexedRandom;
use rand::Rng;

/// Chance that a day carries a modifier
pub const MODIFIER_CHANCE: f64 = 0.5;

/// Roll the modifier for a new day, if any
pub fn roll_modifier<R: Rng + ?Sized>(rng: &mut R) -> Option<DailyModifier> {
    if rng.random_bool(MODIFIER_CHANCE) {
        DailyModifier::ALL.choose(rng).copied()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_roll_produces_both_outcomes() {
        let mut rng = StdRng::seed_from_u64(11);
        let rolls: Vec<_> = (0..200).map(|_| roll_modifier(&mut rng)).collect();

        assert!(rolls.iter().any(|r| r.is_none()));
        for modifier in DailyModifier::ALL {
            assert!(rolls.contains(&Some(modifier)));
        }
    }
}
