//! Match graph operations shared by every format: result validation, slot filling along
//! advancement edges, bye resolution, progress and placement bookkeeping.

use crate::models::{
    Bracket, BracketError, Match, MatchId, MatchResult, MatchStatus, Placement, Progress, Score,
    Slot, SlotRef, Standing, TeamId, Tiebreakers,
};
use std::collections::HashMap;

/// A validated result, ready to be recorded.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Outcome {
    Win { winner: TeamId, loser: TeamId },
    Draw { slot1: TeamId, slot2: TeamId },
}

/// Append a match to the arena. Its id must be the next free index.
pub(crate) fn push_match(bracket: &mut Bracket, m: Match) -> MatchId {
    debug_assert_eq!(m.id, bracket.next_match_id(), "match ids must follow arena order");
    let id = m.id;
    bracket.matches.push(m);
    id
}

pub(crate) fn find_match(bracket: &Bracket, id: MatchId) -> Result<&Match, BracketError> {
    bracket.get_match(id).ok_or(BracketError::MatchNotFound(id))
}

/// Check a submission against the match without touching anything.
pub(crate) fn validate_result(
    bracket: &Bracket,
    result: &MatchResult,
) -> Result<Outcome, BracketError> {
    let id = result.match_id;
    let m = find_match(bracket, id)?;
    match m.status {
        MatchStatus::Completed | MatchStatus::Bye => return Err(BracketError::AlreadyCompleted(id)),
        MatchStatus::Waiting => {
            return Err(BracketError::invalid_result(id, "match is still waiting for its teams"))
        }
        MatchStatus::Pending => {}
    }
    let (slot1, slot2) = match (m.slot1, m.slot2) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(BracketError::invalid_result(id, "match is missing a team")),
    };
    let other = m
        .opponent_of(result.winner)
        .ok_or_else(|| BracketError::invalid_result(id, format!("team {} is not in this match", result.winner)))?;
    if let Some(loser) = result.loser {
        if loser != other {
            return Err(BracketError::invalid_result(
                id,
                format!("team {loser} cannot be the loser of this match"),
            ));
        }
    }

    if result.is_draw {
        if !bracket.format.allows_draws() {
            return Err(BracketError::invalid_result(
                id,
                format!("{} matches cannot be drawn", bracket.format),
            ));
        }
        if let Some(score) = result.score {
            if score.slot1 != score.slot2 {
                return Err(BracketError::invalid_result(id, "a draw needs an even score"));
            }
        }
        return Ok(Outcome::Draw { slot1, slot2 });
    }

    if let Some(score) = result.score {
        let (winner_score, loser_score) = if result.winner == slot1 {
            (score.slot1, score.slot2)
        } else {
            (score.slot2, score.slot1)
        };
        if winner_score <= loser_score {
            return Err(BracketError::invalid_result(id, "score does not favour the winner"));
        }
    }
    Ok(Outcome::Win {
        winner: result.winner,
        loser: other,
    })
}

/// Mark the match completed and update both teams' records.
pub(crate) fn record_outcome(
    bracket: &mut Bracket,
    id: MatchId,
    outcome: Outcome,
    score: Option<Score>,
) {
    let points = bracket.points;
    let (slot1, slot2) = {
        let m = &mut bracket.matches[id.0];
        m.status = MatchStatus::Completed;
        m.score = score;
        match outcome {
            Outcome::Win { winner, loser } => {
                m.winner = Some(winner);
                m.loser = Some(loser);
            }
            Outcome::Draw { .. } => m.draw = true,
        }
        (m.slot1, m.slot2)
    };

    match outcome {
        Outcome::Win { winner, loser } => {
            if let Some(r) = bracket.record_mut(winner) {
                r.add_win(points.win);
            }
            if let Some(r) = bracket.record_mut(loser) {
                r.add_loss(points.loss);
            }
        }
        Outcome::Draw { slot1, slot2 } => {
            for team in [slot1, slot2] {
                if let Some(r) = bracket.record_mut(team) {
                    r.add_draw(points.draw);
                }
            }
        }
    }

    if let (Some(score), Some(a), Some(b)) = (score, slot1, slot2) {
        if let Some(r) = bracket.record_mut(a) {
            r.add_goals(score.slot1, score.slot2);
        }
        if let Some(r) = bracket.record_mut(b) {
            r.add_goals(score.slot2, score.slot1);
        }
    }
    log::debug!("Match {} completed in bracket {}", id, bracket.id);
}

fn place(bracket: &mut Bracket, source: usize, target: SlotRef, team: TeamId) {
    assert!(
        target.match_id.0 > source && target.match_id.0 < bracket.matches.len(),
        "advancement edge from {} points to invalid match {}",
        source,
        target.match_id
    );
    let slot = bracket.matches[target.match_id.0].slot_mut(target.slot);
    debug_assert!(slot.is_none(), "slot {:?} of {} filled twice", target.slot, target.match_id);
    *slot = Some(team);
}

/// Push a completed match's winner and loser along its advancement edges, then settle the
/// graph. Returns the matches that became playable.
pub(crate) fn advance(bracket: &mut Bracket, id: MatchId) -> Vec<MatchId> {
    let m = &bracket.matches[id.0];
    let edges = [
        (m.advance_winner_to, m.winner),
        (m.advance_loser_to, m.loser),
    ];
    for (target, team) in edges {
        if let (Some(target), Some(team)) = (target, team) {
            place(bracket, id.0, target, team);
        }
    }
    settle(bracket)
}

/// Resolve every `Waiting` match whose slots are all decided: both teams present makes it
/// `Pending`; one permanently empty slot makes it a `Bye` that forwards the present team.
///
/// Edges only point forward in the arena, so one ordered sweep reaches a fixed point.
pub(crate) fn settle(bracket: &mut Bracket) -> Vec<MatchId> {
    let mut feeders: HashMap<(usize, Slot), usize> = HashMap::new();
    for m in &bracket.matches {
        for target in [m.advance_winner_to, m.advance_loser_to].into_iter().flatten() {
            feeders.insert((target.match_id.0, target.slot), m.id.0);
        }
    }

    let mut unlocked = Vec::new();
    for idx in 0..bracket.matches.len() {
        if bracket.matches[idx].status != MatchStatus::Waiting {
            continue;
        }
        let decided = |slot: Slot, bracket: &Bracket| -> Option<Option<TeamId>> {
            match bracket.matches[idx].slot(slot) {
                Some(team) => Some(Some(team)),
                None => match feeders.get(&(idx, slot)) {
                    Some(&src) if !bracket.matches[src].status.is_resolved() => None,
                    _ => Some(None),
                },
            }
        };
        let (one, two) = match (decided(Slot::One, bracket), decided(Slot::Two, bracket)) {
            (Some(one), Some(two)) => (one, two),
            _ => continue,
        };

        match (one, two) {
            (Some(_), Some(_)) => {
                bracket.matches[idx].status = MatchStatus::Pending;
                unlocked.push(MatchId(idx));
            }
            (one, two) => {
                let walkover = one.or(two);
                let m = &mut bracket.matches[idx];
                m.status = MatchStatus::Bye;
                m.winner = walkover;
                let target = m.advance_winner_to;
                log::debug!("Match {} resolved as a bye for {:?}", m.id, walkover);
                if let (Some(target), Some(team)) = (target, walkover) {
                    place(bracket, idx, target, team);
                }
            }
        }
    }
    unlocked
}

/// Every match is `Completed` or `Bye`.
pub(crate) fn all_resolved(bracket: &Bracket) -> bool {
    bracket.matches.iter().all(|m| m.status.is_resolved())
}

/// Playable matches in play order: round, then section, then position.
pub(crate) fn pending_matches(bracket: &Bracket) -> Vec<&Match> {
    let mut pending: Vec<&Match> = bracket
        .matches
        .iter()
        .filter(|m| m.status == MatchStatus::Pending)
        .collect();
    pending.sort_by_key(|m| (m.round, m.section, m.position));
    pending
}

/// Progress over played matches; byes are excluded from both counts.
pub(crate) fn match_progress(matches: &[Match], is_complete: bool) -> Progress {
    let played: Vec<&Match> = matches
        .iter()
        .filter(|m| m.status != MatchStatus::Bye)
        .collect();
    let completed_matches = played
        .iter()
        .filter(|m| m.status == MatchStatus::Completed)
        .count();
    let total_matches = played.len();
    let percentage = if total_matches > 0 {
        completed_matches as f64 / total_matches as f64 * 100.0
    } else {
        0.0
    };
    Progress {
        completed_matches,
        total_matches,
        percentage,
        is_complete,
    }
}

/// Finishing ranges for an elimination-style bracket.
///
/// `knockout_tier` returns `Some(tier)` for a completed match whose loser leaves the
/// bracket; later tiers finish higher. Teams still alive rank ahead of every knocked-out team.
pub(crate) fn elimination_placements(
    bracket: &Bracket,
    champion: Option<TeamId>,
    knockout_tier: impl Fn(&Match) -> Option<u32>,
) -> HashMap<TeamId, Placement> {
    let mut knocked_out: HashMap<TeamId, u32> = HashMap::new();
    for m in &bracket.matches {
        if m.status != MatchStatus::Completed {
            continue;
        }
        if let (Some(loser), Some(tier)) = (m.loser, knockout_tier(m)) {
            knocked_out.insert(loser, tier);
        }
    }

    let alive = bracket.teams.len() - knocked_out.len();
    let mut placements = HashMap::new();
    if let Some(champion) = champion {
        placements.insert(champion, Placement { from: 1, to: 1 });
    }
    for (&team, &tier) in &knocked_out {
        let better = knocked_out.values().filter(|&&t| t > tier).count();
        let same = knocked_out.values().filter(|&&t| t == tier).count();
        let from = (alive + better + 1) as u32;
        placements.insert(
            team,
            Placement {
                from,
                to: from + same as u32 - 1,
            },
        );
    }
    placements
}

/// Structural integrity check. Returns one message per violated invariant.
pub fn validate_bracket(bracket: &Bracket) -> Vec<String> {
    let mut errors = Vec::new();
    for (idx, m) in bracket.matches.iter().enumerate() {
        if m.id.0 != idx {
            errors.push(format!("match at index {idx} carries id {}", m.id));
        }
        if m.slot1.is_some() && m.slot1 == m.slot2 {
            errors.push(format!("match {} has the same team in both slots", m.id));
        }
        if m.status == MatchStatus::Completed && m.winner.is_none() && !m.draw {
            errors.push(format!("completed match {} has no winner", m.id));
        }
        if m.winner.is_some() && m.winner == m.loser {
            errors.push(format!("match {} has the same winner and loser", m.id));
        }
        if m.status == MatchStatus::Pending && (m.slot1.is_none() || m.slot2.is_none()) {
            errors.push(format!("pending match {} is missing a team", m.id));
        }
        for target in [m.advance_winner_to, m.advance_loser_to].into_iter().flatten() {
            if target.match_id.0 <= idx || target.match_id.0 >= bracket.matches.len() {
                errors.push(format!(
                    "match {} advances to invalid match {}",
                    m.id, target.match_id
                ));
            }
        }
    }
    errors
}

/// Standings ordered by finishing range, then wins, then seed. Teams still alive sort as if
/// they were placed first.
pub(crate) fn placement_standings(
    bracket: &Bracket,
    placements: &HashMap<TeamId, Placement>,
) -> Vec<Standing> {
    let mut rows: Vec<Standing> = bracket
        .records
        .iter()
        .map(|record| Standing {
            rank: 0,
            team_id: record.team_id,
            seed: bracket.seed_of(record.team_id),
            record: record.clone(),
            tiebreakers: Tiebreakers {
                goal_difference: record.goal_difference(),
                ..Tiebreakers::default()
            },
            placement: placements.get(&record.team_id).copied(),
        })
        .collect();
    rows.sort_by_key(|s| {
        (
            s.placement.map_or(1, |p| p.from),
            std::cmp::Reverse(s.record.wins),
            s.seed,
        )
    });
    for (idx, row) in rows.iter_mut().enumerate() {
        row.rank = idx as u32 + 1;
    }
    rows
}
