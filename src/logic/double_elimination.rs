//! Double elimination: upper bracket, lower bracket fed by upper-bracket losers, grand final
//! with a conditional reset match.
//!
//! For a bracket of size `b = 2^k` the lower bracket has `2(k-1)` rounds. Round 1 pairs the
//! upper round 1 losers. Every even round `2(r-1)` takes the losers of upper round `r` in
//! slot one against the survivors of the previous lower round in slot two. Odd rounds after
//! the first halve the field. The lower final's winner meets the upper champion in the grand
//! final; if the lower side wins, one reset match is appended.

use crate::logic::graph::{self, push_match};
use crate::logic::seeding::seeded_roster;
use crate::logic::single_elimination::build_tree;
use crate::models::{
    AdvancementEffects, BestOf, Bracket, BracketError, BracketSection, Format, Match, MatchId,
    MatchResult, MatchStatus, Slot, SlotRef, Standing, Team, TeamId,
};
use serde::{Deserialize, Serialize};

/// Where an upper-bracket loser drops to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DropTarget {
    pub lower_round: u32,
    pub position: u32,
    pub slot: Slot,
}

/// Number of lower-bracket rounds for a bracket size.
pub fn lower_round_count(bracket_size: u32) -> u32 {
    let upper_rounds = bracket_size.max(1).trailing_zeros();
    2 * upper_rounds.saturating_sub(1)
}

/// Matches in lower round `lower_round` (1-based): `b / 2^(floor((j+1)/2) + 1)`.
pub fn lower_match_count(bracket_size: u32, lower_round: u32) -> u32 {
    bracket_size >> ((lower_round + 1) / 2 + 1)
}

/// Lower-bracket slot for the loser of upper round `upper_round`, match `position`.
///
/// Round 1 losers pair up in lower round 1. Later upper rounds drop into lower round
/// `2(r-1)`, slot one, with the order reversed on even upper rounds so teams that met early
/// are kept apart. `None` when there is no lower bracket (two-team bracket).
pub fn lower_drop_target(bracket_size: u32, upper_round: u32, position: u32) -> Option<DropTarget> {
    if bracket_size < 4 || upper_round == 0 || position == 0 {
        return None;
    }
    if upper_round == 1 {
        return Some(DropTarget {
            lower_round: 1,
            position: (position + 1) / 2,
            slot: Slot::from_position(position),
        });
    }
    let count = bracket_size >> upper_round;
    if count == 0 || position > count {
        return None;
    }
    let position = if upper_round % 2 == 0 {
        count + 1 - position
    } else {
        position
    };
    Some(DropTarget {
        lower_round: 2 * (upper_round - 1),
        position,
        slot: Slot::One,
    })
}

fn upper_round_name(round: u32, total_rounds: u32) -> String {
    if round == total_rounds {
        "Upper Finals".to_string()
    } else {
        format!("Upper Round {round}")
    }
}

fn lower_round_name(round: u32, total_rounds: u32) -> String {
    if round == total_rounds {
        "Lower Finals".to_string()
    } else {
        format!("Lower Round {round}")
    }
}

/// Generate a double elimination bracket. Needs at least 2 teams.
pub fn generate(teams: &[Team], best_of: BestOf) -> Result<Bracket, BracketError> {
    let ordered = seeded_roster(teams, 2)?;
    let mut bracket = Bracket::new(Format::DoubleElimination, best_of, ordered);
    let upper = build_tree(&mut bracket, BracketSection::Upper, upper_round_name);
    let bracket_size = bracket.bracket_size;
    let lower_rounds = lower_round_count(bracket_size);

    let mut lower: Vec<Vec<MatchId>> = Vec::new();
    for round in 1..=lower_rounds {
        let ids = (1..=lower_match_count(bracket_size, round))
            .map(|position| {
                let m = Match::new(
                    bracket.next_match_id(),
                    round,
                    position,
                    lower_round_name(round, lower_rounds),
                    BracketSection::Lower,
                );
                push_match(&mut bracket, m)
            })
            .collect();
        lower.push(ids);
    }

    let grand_final = bracket.next_match_id();
    push_match(
        &mut bracket,
        Match::new(grand_final, 1, 1, "Grand Finals", BracketSection::GrandFinal),
    );

    for (r, ids) in upper.iter().enumerate() {
        let round = r as u32 + 1;
        for (p, &id) in ids.iter().enumerate() {
            let position = p as u32 + 1;
            let loser_to = match lower_drop_target(bracket_size, round, position) {
                Some(drop) => SlotRef::new(
                    lower[drop.lower_round as usize - 1][drop.position as usize - 1],
                    drop.slot,
                ),
                None => SlotRef::new(grand_final, Slot::Two),
            };
            bracket.matches[id.0].advance_loser_to = Some(loser_to);
        }
    }
    if let Some(&upper_final) = upper.last().and_then(|ids| ids.first()) {
        bracket.matches[upper_final.0].advance_winner_to =
            Some(SlotRef::new(grand_final, Slot::One));
    }

    for (j, ids) in lower.iter().enumerate() {
        let round = j as u32 + 1;
        for (p, &id) in ids.iter().enumerate() {
            let position = p as u32 + 1;
            let winner_to = if round == lower_rounds {
                SlotRef::new(grand_final, Slot::Two)
            } else if round % 2 == 1 {
                SlotRef::new(lower[j + 1][p], Slot::Two)
            } else {
                SlotRef::new(lower[j + 1][p / 2], Slot::from_position(position))
            };
            bracket.matches[id.0].advance_winner_to = Some(winner_to);
        }
    }

    graph::settle(&mut bracket);
    log::info!(
        "Generated double elimination bracket {}: {} teams, size {}, {} upper and {} lower rounds, {}",
        bracket.id,
        bracket.teams.len(),
        bracket_size,
        bracket.total_rounds,
        lower_rounds,
        best_of
    );
    Ok(bracket)
}

fn ensure_format(bracket: &Bracket) -> Result<(), BracketError> {
    if bracket.format != Format::DoubleElimination {
        return Err(BracketError::WrongFormat {
            expected: Format::DoubleElimination,
            actual: bracket.format,
        });
    }
    Ok(())
}

fn grand_final(bracket: &Bracket, round: u32) -> Option<&Match> {
    bracket
        .matches
        .iter()
        .find(|m| m.section == BracketSection::GrandFinal && m.round == round)
}

/// Record a result. A lower-side win in the grand final appends the reset match.
pub fn apply_result(
    bracket: &mut Bracket,
    result: &MatchResult,
) -> Result<AdvancementEffects, BracketError> {
    ensure_format(bracket)?;
    let outcome = graph::validate_result(bracket, result)?;
    graph::record_outcome(bracket, result.match_id, outcome, result.score);
    let mut unlocked = graph::advance(bracket, result.match_id);

    let m = &bracket.matches[result.match_id.0];
    let is_first_grand_final = m.section == BracketSection::GrandFinal && m.round == 1;
    let lower_side_won = m.winner.is_some() && m.winner == m.slot2;
    let loser = m.loser;
    let loser_continues = m.advance_loser_to.is_some();

    let mut reset_match = None;
    if is_first_grand_final && lower_side_won {
        let id = trigger_reset(bracket)?;
        unlocked.push(id);
        reset_match = Some(id);
    }

    let eliminated: Vec<TeamId> = if loser_continues || reset_match.is_some() {
        Vec::new()
    } else {
        loser.into_iter().collect()
    };
    let bracket_complete = champion(bracket).is_some();
    if bracket_complete {
        log::info!("Double elimination bracket {} is complete", bracket.id);
    }
    Ok(AdvancementEffects {
        completed: Some(result.match_id),
        unlocked,
        eliminated,
        reset_match,
        bracket_complete,
    })
}

/// Append the grand final reset after the lower-bracket champion won the first grand final.
///
/// Idempotent: once the reset exists its id is returned again and nothing is appended.
pub fn trigger_reset(bracket: &mut Bracket) -> Result<MatchId, BracketError> {
    ensure_format(bracket)?;
    if bracket.reset_occurred {
        return grand_final(bracket, 2)
            .map(|m| m.id)
            .ok_or(BracketError::ResetNotApplicable);
    }
    let first = grand_final(bracket, 1).ok_or(BracketError::ResetNotApplicable)?;
    let (upper_side, lower_side) = match (first.status, first.slot1, first.slot2, first.winner) {
        (MatchStatus::Completed, Some(upper), Some(lower), Some(winner)) if winner == lower => {
            (upper, lower)
        }
        _ => return Err(BracketError::ResetNotApplicable),
    };

    let id = bracket.next_match_id();
    push_match(
        bracket,
        Match::between(
            id,
            2,
            1,
            "Grand Finals Reset",
            BracketSection::GrandFinal,
            upper_side,
            lower_side,
        ),
    );
    bracket.reset_occurred = true;
    log::info!(
        "Bracket reset triggered in {}: team {} vs team {}",
        bracket.id,
        upper_side,
        lower_side
    );
    Ok(id)
}

/// Winner of the upper bracket final.
pub fn upper_champion(bracket: &Bracket) -> Option<TeamId> {
    bracket
        .matches
        .iter()
        .filter(|m| m.section == BracketSection::Upper && m.round == bracket.total_rounds)
        .find_map(|m| m.status.is_resolved().then_some(m.winner).flatten())
}

/// Winner of the lower bracket final.
pub fn lower_champion(bracket: &Bracket) -> Option<TeamId> {
    let last_round = lower_round_count(bracket.bracket_size);
    bracket
        .matches
        .iter()
        .filter(|m| m.section == BracketSection::Lower && m.round == last_round)
        .find_map(|m| m.status.is_resolved().then_some(m.winner).flatten())
}

/// Tournament winner: the upper side winning the first grand final, or the reset winner.
pub fn champion(bracket: &Bracket) -> Option<TeamId> {
    if bracket.reset_occurred {
        return grand_final(bracket, 2)
            .filter(|m| m.status == MatchStatus::Completed)
            .and_then(|m| m.winner);
    }
    grand_final(bracket, 1)
        .filter(|m| m.status == MatchStatus::Completed && m.winner == m.slot1)
        .and_then(|m| m.winner)
}

/// Standings by elimination point: grand final loser 2nd, lower final loser 3rd, and so on.
pub fn standings(bracket: &Bracket) -> Vec<Standing> {
    let reset = bracket.reset_occurred;
    let placements = graph::elimination_placements(bracket, champion(bracket), |m| match m.section {
        BracketSection::Lower => Some(m.round),
        BracketSection::GrandFinal if m.round == 1 && reset => None,
        BracketSection::GrandFinal => Some(100 + m.round),
        _ => None,
    });
    graph::placement_standings(bracket, &placements)
}
