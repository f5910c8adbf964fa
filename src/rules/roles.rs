use crate::error::{GameError, GameResult};
use crate::types::{ParticipantId, Role};
use rand::seq::SliceRandom;
use rand::Rng;

/// A mole is dealt once the table is larger than this
pub const MOLE_THRESHOLD: usize = 6;

/// Deal roles to `players`.
///
/// The deck holds `faction_size` vampires, one protector, one seer, a mole for
/// tables above [`MOLE_THRESHOLD`], and villagers for the rest. If the special
/// roles don't fit, they are dropped from the end of that list so the vampire
/// count is always exact. The deck is shuffled, so pairing is independent of
/// join order. Output keeps the order of `players`.
pub fn assign_roles<R: Rng + ?Sized>(
    players: &[ParticipantId],
    faction_size: usize,
    rng: &mut R,
) -> GameResult<Vec<(ParticipantId, Role)>> {
    let total = players.len();
    if total <= faction_size {
        return Err(GameError::InsufficientPlayers {
            players: total,
            needed: faction_size + 1,
        });
    }

    let mut deck = vec![Role::Vampire; faction_size];
    deck.push(Role::Protector);
    deck.push(Role::Seer);
    if total > MOLE_THRESHOLD {
        deck.push(Role::Mole);
    }
    deck.truncate(total);
    deck.resize(total, Role::Villager);
    deck.shuffle(rng);

    Ok(players.iter().cloned().zip(deck).collect())
}
