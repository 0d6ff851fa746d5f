//! GSL group: a fixed five-match double-elimination bracket for four teams.
//!
//! ```text
//! Opening 1 (1v4) --W--> Winners' match --W--> 1st
//!          \                  \--L--> Decider (slot 1)
//! Opening 2 (2v3) --W--/     Decider --W--> 2nd, L--> 3rd
//!          \--L--> Elimination match --W--> Decider (slot 2), L--> 4th
//! ```

use crate::logic::graph::{self, push_match};
use crate::logic::seeding::{classic_seed_pairs, seeded_roster};
use crate::models::{
    AdvancementEffects, BestOf, Bracket, BracketError, BracketSection, Format, Match, MatchId,
    MatchResult, MatchStatus, Placement, Slot, SlotRef, Standing, Team, TeamId,
};
use std::collections::HashMap;

pub const GSL_GROUP_SIZE: usize = 4;

const WINNERS_MATCH: MatchId = MatchId(2);
const ELIMINATION_MATCH: MatchId = MatchId(3);
const DECIDER_MATCH: MatchId = MatchId(4);

/// Build the bracket for exactly four already-ordered teams.
pub(crate) fn build(teams: Vec<Team>, best_of: BestOf, section: BracketSection) -> Bracket {
    debug_assert_eq!(teams.len(), GSL_GROUP_SIZE);
    let mut bracket = Bracket::new(Format::Gsl, best_of, teams);
    bracket.total_rounds = 3;
    bracket.current_round = 3;

    for (i, (seed_a, seed_b)) in classic_seed_pairs(GSL_GROUP_SIZE as u32).into_iter().enumerate() {
        let position = i as u32 + 1;
        let mut m = Match::new(
            bracket.next_match_id(),
            1,
            position,
            format!("Opening Match {position}"),
            section,
        );
        m.slot1 = bracket.teams.get(seed_a as usize - 1).map(|t| t.id);
        m.slot2 = bracket.teams.get(seed_b as usize - 1).map(|t| t.id);
        m.advance_winner_to = Some(SlotRef::new(WINNERS_MATCH, Slot::from_position(position)));
        m.advance_loser_to = Some(SlotRef::new(ELIMINATION_MATCH, Slot::from_position(position)));
        push_match(&mut bracket, m);
    }

    let mut winners = Match::new(WINNERS_MATCH, 2, 1, "Winners' Match", section);
    winners.advance_loser_to = Some(SlotRef::new(DECIDER_MATCH, Slot::One));
    push_match(&mut bracket, winners);

    let mut elimination = Match::new(ELIMINATION_MATCH, 2, 2, "Elimination Match", section);
    elimination.advance_winner_to = Some(SlotRef::new(DECIDER_MATCH, Slot::Two));
    push_match(&mut bracket, elimination);

    push_match(
        &mut bracket,
        Match::new(DECIDER_MATCH, 3, 1, "Decider Match", section),
    );
    graph::settle(&mut bracket);
    bracket
}

/// Generate a standalone GSL group. Needs exactly 4 teams.
pub fn generate(teams: &[Team], best_of: BestOf) -> Result<Bracket, BracketError> {
    let ordered = seeded_roster(teams, GSL_GROUP_SIZE)?;
    if ordered.len() != GSL_GROUP_SIZE {
        return Err(BracketError::InvalidConfiguration(format!(
            "a GSL group has exactly {GSL_GROUP_SIZE} teams, got {}",
            ordered.len()
        )));
    }
    let bracket = build(ordered, best_of, BracketSection::Main);
    log::info!("Generated GSL group {}: {}", bracket.id, best_of);
    Ok(bracket)
}

fn ensure_format(bracket: &Bracket) -> Result<(), BracketError> {
    if bracket.format != Format::Gsl {
        return Err(BracketError::WrongFormat {
            expected: Format::Gsl,
            actual: bracket.format,
        });
    }
    Ok(())
}

pub fn apply_result(
    bracket: &mut Bracket,
    result: &MatchResult,
) -> Result<AdvancementEffects, BracketError> {
    ensure_format(bracket)?;
    let outcome = graph::validate_result(bracket, result)?;
    graph::record_outcome(bracket, result.match_id, outcome, result.score);
    let unlocked = graph::advance(bracket, result.match_id);

    let m = &bracket.matches[result.match_id.0];
    let eliminated: Vec<TeamId> = if m.advance_loser_to.is_none() {
        m.loser.into_iter().collect()
    } else {
        Vec::new()
    };
    Ok(AdvancementEffects {
        completed: Some(result.match_id),
        unlocked,
        eliminated,
        reset_match: None,
        bracket_complete: graph::all_resolved(bracket),
    })
}

fn decided(bracket: &Bracket, id: MatchId) -> Option<&Match> {
    bracket
        .get_match(id)
        .filter(|m| m.status == MatchStatus::Completed)
}

/// Teams through so far: the winners' match winner, then the decider winner.
pub fn qualified(bracket: &Bracket) -> Vec<TeamId> {
    [WINNERS_MATCH, DECIDER_MATCH]
        .into_iter()
        .filter_map(|id| decided(bracket, id).and_then(|m| m.winner))
        .collect()
}

/// Winners' match winner 1st, decider winner 2nd, decider loser 3rd, elimination match
/// loser 4th. Undecided teams have no placement yet.
pub fn standings(bracket: &Bracket) -> Vec<Standing> {
    let mut placements = HashMap::new();
    let mut place = |team: Option<TeamId>, rank: u32| {
        if let Some(team) = team {
            placements.insert(team, Placement { from: rank, to: rank });
        }
    };
    if let Some(m) = decided(bracket, WINNERS_MATCH) {
        place(m.winner, 1);
    }
    if let Some(m) = decided(bracket, DECIDER_MATCH) {
        place(m.winner, 2);
        place(m.loser, 3);
    }
    if let Some(m) = decided(bracket, ELIMINATION_MATCH) {
        place(m.loser, 4);
    }
    graph::placement_standings(bracket, &placements)
}
