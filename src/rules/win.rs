use crate::types::{Faction, Player, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    Winner(Faction),
}

/// Decide whether the game is over.
///
/// Vampires are counted against the living villagers, protector and seer; the
/// mole counts on neither side. No vampires left means the village wins; the
/// vampires win as soon as they are at least as many as the village.
pub fn evaluate(players: &[Player]) -> Verdict {
    let alive = players.iter().filter(|p| p.is_alive);
    let (vampires, village) = alive.fold((0usize, 0usize), |(v, t), p| match p.role {
        Some(Role::Vampire) => (v + 1, t),
        Some(Role::Villager | Role::Protector | Role::Seer) => (v, t + 1),
        Some(Role::Mole) | None => (v, t),
    });

    if vampires == 0 {
        Verdict::Winner(Faction::Village)
    } else if vampires >= village {
        Verdict::Winner(Faction::Vampires)
    } else {
        Verdict::Continue
    }
}
