use crate::types::ParticipantId;
use std::collections::HashSet;

/// One day's voting outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TallyOutcome {
    Eliminated(ParticipantId),
    /// Several targets share the top count; nobody is eliminated
    Tie(Vec<ParticipantId>),
    NoVotes,
}

/// Count `ballots` (voter, target) from voters in `electorate`.
///
/// Ties never fall back to chance. Tied targets are listed in the order their
/// first ballot was cast.
pub fn tally(
    ballots: &[(ParticipantId, ParticipantId)],
    electorate: &HashSet<ParticipantId>,
) -> TallyOutcome {
    let mut counts: Vec<(&ParticipantId, u32)> = Vec::new();
    for (voter, target) in ballots {
        if !electorate.contains(voter) {
            continue;
        }
        match counts.iter_mut().find(|(t, _)| *t == target) {
            Some((_, n)) => *n += 1,
            None => counts.push((target, 1)),
        }
    }

    let Some(max) = counts.iter().map(|(_, n)| *n).max() else {
        return TallyOutcome::NoVotes;
    };

    let mut leaders: Vec<ParticipantId> = counts
        .into_iter()
        .filter(|(_, n)| *n == max)
        .map(|(t, _)| t.clone())
        .collect();

    if leaders.len() == 1 {
        TallyOutcome::Eliminated(leaders.remove(0))
    } else {
        TallyOutcome::Tie(leaders)
    }
}
