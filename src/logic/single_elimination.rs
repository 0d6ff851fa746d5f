//! Single elimination: classic seeded bracket, byes resolved at generation, linear advancement.

use crate::logic::graph::{self, push_match};
use crate::logic::seeding::{ceil_log2, classic_seed_pairs, next_power_of_two, seeded_roster};
use crate::models::{
    AdvancementEffects, BestOf, Bracket, BracketError, BracketSection, Format, Match, MatchId,
    MatchResult, MatchStatus, Slot, SlotRef, Standing, Team, TeamId,
};

/// Display name of a round from its distance to the final.
pub fn round_name(round: u32, total_rounds: u32) -> String {
    match total_rounds + 1 - round {
        1 => "Finals".to_string(),
        2 => "Semifinals".to_string(),
        3 => "Quarterfinals".to_string(),
        distance => format!("Round of {}", 1u64 << distance),
    }
}

/// Build the seeded knockout tree shared by single elimination and the upper bracket of
/// double elimination. Returns the match ids of every round, round 1 first.
///
/// Round `r` match `p` feeds slot `p` parity of round `r + 1` match `ceil(p / 2)`. Teams
/// missing from a seed pair leave that slot empty for `settle` to turn into a bye.
pub(crate) fn build_tree(
    bracket: &mut Bracket,
    section: BracketSection,
    name: impl Fn(u32, u32) -> String,
) -> Vec<Vec<MatchId>> {
    let bracket_size = next_power_of_two(bracket.teams.len() as u32);
    let total_rounds = ceil_log2(bracket_size);
    bracket.bracket_size = bracket_size;
    bracket.total_rounds = total_rounds;
    bracket.current_round = total_rounds;

    let mut rounds: Vec<Vec<MatchId>> = Vec::new();
    let first: Vec<MatchId> = classic_seed_pairs(bracket_size)
        .into_iter()
        .enumerate()
        .map(|(i, (seed_a, seed_b))| {
            let mut m = Match::new(
                bracket.next_match_id(),
                1,
                i as u32 + 1,
                name(1, total_rounds),
                section,
            );
            m.slot1 = bracket.teams.get(seed_a as usize - 1).map(|t| t.id);
            m.slot2 = bracket.teams.get(seed_b as usize - 1).map(|t| t.id);
            push_match(bracket, m)
        })
        .collect();
    rounds.push(first);

    for round in 2..=total_rounds {
        let count = bracket_size >> round;
        let ids = (1..=count)
            .map(|position| {
                let m = Match::new(
                    bracket.next_match_id(),
                    round,
                    position,
                    name(round, total_rounds),
                    section,
                );
                push_match(bracket, m)
            })
            .collect();
        rounds.push(ids);
    }

    for pair in rounds.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);
        for (i, &id) in current.iter().enumerate() {
            let position = i as u32 + 1;
            let target = next[(position as usize - 1) / 2];
            bracket.matches[id.0].advance_winner_to =
                Some(SlotRef::new(target, Slot::from_position(position)));
        }
    }
    rounds
}

/// Generate a single elimination bracket. Needs at least 2 teams.
pub fn generate(teams: &[Team], best_of: BestOf) -> Result<Bracket, BracketError> {
    let ordered = seeded_roster(teams, 2)?;
    let mut bracket = Bracket::new(Format::SingleElimination, best_of, ordered);
    build_tree(&mut bracket, BracketSection::Main, round_name);
    graph::settle(&mut bracket);

    log::info!(
        "Generated single elimination bracket {}: {} teams, size {}, {} rounds, {}",
        bracket.id,
        bracket.teams.len(),
        bracket.bracket_size,
        bracket.total_rounds,
        best_of
    );
    Ok(bracket)
}

fn ensure_format(bracket: &Bracket) -> Result<(), BracketError> {
    if bracket.format != Format::SingleElimination {
        return Err(BracketError::WrongFormat {
            expected: Format::SingleElimination,
            actual: bracket.format,
        });
    }
    Ok(())
}

/// Record a result and move the winner on. Draws are rejected.
pub fn apply_result(
    bracket: &mut Bracket,
    result: &MatchResult,
) -> Result<AdvancementEffects, BracketError> {
    ensure_format(bracket)?;
    let outcome = graph::validate_result(bracket, result)?;
    graph::record_outcome(bracket, result.match_id, outcome, result.score);
    let unlocked = graph::advance(bracket, result.match_id);

    let eliminated: Vec<TeamId> = bracket.matches[result.match_id.0].loser.into_iter().collect();
    let bracket_complete = champion(bracket).is_some();
    if bracket_complete {
        log::info!("Single elimination bracket {} is complete", bracket.id);
    }
    Ok(AdvancementEffects {
        completed: Some(result.match_id),
        unlocked,
        eliminated,
        reset_match: None,
        bracket_complete,
    })
}

/// Winner of the final, once it is decided.
pub fn champion(bracket: &Bracket) -> Option<TeamId> {
    let last = bracket.matches.last()?;
    if last.status.is_resolved() {
        last.winner
    } else {
        None
    }
}

/// Standings by elimination round: final loser 2nd, semifinal losers 3rd-4th, and so on.
pub fn standings(bracket: &Bracket) -> Vec<Standing> {
    let placements = graph::elimination_placements(bracket, champion(bracket), |m| {
        (m.status == MatchStatus::Completed).then_some(m.round)
    });
    graph::placement_standings(bracket, &placements)
}
