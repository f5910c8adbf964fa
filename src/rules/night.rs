use crate::types::{NightAction, NightActionKind, ParticipantId, Role};

/// What happened overnight
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NightOutcome {
    /// Player the vampires went after, if anyone
    pub attacked: Option<ParticipantId>,
    pub deaths: Vec<ParticipantId>,
    pub saved: Vec<ParticipantId>,
}

/// Resolve one night's submitted actions.
///
/// The attack lands on the most-requested kill target. Among equally requested
/// targets the one whose first kill request came earliest in `actions` wins.
/// A protected target survives. Inspections are answered at submission time
/// (see [`inspect`]) and take no part here.
pub fn resolve_night(actions: &[NightAction]) -> NightOutcome {
    let mut kills: Vec<(&ParticipantId, u32)> = Vec::new();
    for action in actions.iter().filter(|a| a.kind == NightActionKind::Kill) {
        match kills.iter_mut().find(|(t, _)| *t == &action.target) {
            Some((_, n)) => *n += 1,
            None => kills.push((&action.target, 1)),
        }
    }

    // max_by_key keeps the last maximum, so fold to keep the first
    let attacked = kills
        .iter()
        .fold(None::<(&ParticipantId, u32)>, |best, &(target, n)| match best {
            Some((_, best_n)) if best_n >= n => best,
            _ => Some((target, n)),
        })
        .map(|(target, _)| target.clone());

    let Some(target) = attacked else {
        return NightOutcome::default();
    };

    let protected = actions
        .iter()
        .any(|a| a.kind == NightActionKind::Protect && a.target == target);

    if protected {
        NightOutcome {
            attacked: Some(target.clone()),
            deaths: Vec::new(),
            saved: vec![target],
        }
    } else {
        NightOutcome {
            attacked: Some(target.clone()),
            deaths: vec![target],
            saved: Vec::new(),
        }
    }
}

/// Seer's reading: true if the target belongs to the hidden faction.
///
/// The mole reads as clean.
pub fn inspect(target_role: Option<Role>) -> bool {
    target_role.is_some_and(|r| r.is_vampire())
}
