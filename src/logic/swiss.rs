//! Swiss system: rounds paired one at a time from the current standings.
//!
//! Round 1 pairs the top half of the seeds against the bottom half. Every later round is
//! paired by a bounded backtracking search that keeps similar scores together and avoids
//! rematches; when no rematch-free pairing is found it falls back to a greedy pass that
//! accepts rematches and reports how many it took.

use crate::logic::graph::{self, push_match};
use crate::logic::seeding::{ceil_log2, seeded_roster};
use crate::models::{
    AdvancementEffects, BestOf, Bracket, BracketError, BracketSection, Format, Match, MatchId,
    MatchResult, MatchStatus, PairingHistory, Standing, Team, TeamId, Tiebreakers,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Nodes the pairing search may visit before giving up on a rematch-free pairing.
const PAIRING_SEARCH_BUDGET: u32 = 10_000;

/// Outcome of pairing one round.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SwissRound {
    pub round: u32,
    pub matches: Vec<MatchId>,
    pub bye: Option<TeamId>,
    /// Pairings in this round that repeat an earlier one.
    pub rematches: usize,
}

/// `ceil(log2(n)) + 1`, capped at `n - 1`.
pub fn default_rounds(team_count: usize) -> u32 {
    let n = team_count as u32;
    (ceil_log2(n) + 1).min(n.saturating_sub(1))
}

/// Generate a Swiss bracket and pair round 1. Needs at least 4 teams.
pub fn generate(
    teams: &[Team],
    rounds: Option<u32>,
    best_of: BestOf,
) -> Result<Bracket, BracketError> {
    let ordered = seeded_roster(teams, 4)?;
    let n = ordered.len();
    let total_rounds = match rounds {
        Some(0) => {
            return Err(BracketError::InvalidConfiguration(
                "a Swiss tournament needs at least one round".to_string(),
            ))
        }
        Some(r) => r.min(n as u32 - 1),
        None => default_rounds(n),
    };

    let mut bracket = Bracket::new(Format::Swiss, best_of, ordered);
    bracket.total_rounds = total_rounds;
    bracket.current_round = 1;

    let ids: Vec<TeamId> = bracket.teams.iter().map(|t| t.id).collect();
    let (paired, bye) = if n % 2 == 1 {
        (&ids[..n - 1], ids.last().copied())
    } else {
        (&ids[..], None)
    };
    let half = paired.len() / 2;
    let pairs: Vec<(TeamId, TeamId)> = (0..half).map(|i| (paired[i], paired[i + half])).collect();
    let matches = push_round(&mut bracket, 1, &pairs, bye);

    log::info!(
        "Generated Swiss bracket {}: {} teams, {} rounds, {}, round 1 has {} matches",
        bracket.id,
        n,
        total_rounds,
        best_of,
        matches.len()
    );
    Ok(bracket)
}

fn push_round(
    bracket: &mut Bracket,
    round: u32,
    pairs: &[(TeamId, TeamId)],
    bye: Option<TeamId>,
) -> Vec<MatchId> {
    let name = format!("Round {round}");
    let mut ids = Vec::with_capacity(pairs.len());
    for (i, &(a, b)) in pairs.iter().enumerate() {
        let m = Match::between(
            bracket.next_match_id(),
            round,
            i as u32 + 1,
            name.clone(),
            BracketSection::Main,
            a,
            b,
        );
        ids.push(push_match(bracket, m));
        bracket.pairings.insert(a, b);
    }

    if let Some(team) = bye {
        let mut m = Match::new(
            bracket.next_match_id(),
            round,
            pairs.len() as u32 + 1,
            name,
            BracketSection::Main,
        );
        m.slot1 = Some(team);
        m.winner = Some(team);
        m.status = MatchStatus::Bye;
        push_match(bracket, m);
        let points = bracket.points.bye;
        if let Some(record) = bracket.record_mut(team) {
            record.add_bye(points);
        }
        log::debug!("Team {} receives the round {} bye", team, round);
    }
    ids
}

fn ensure_format(bracket: &Bracket) -> Result<(), BracketError> {
    if bracket.format != Format::Swiss {
        return Err(BracketError::WrongFormat {
            expected: Format::Swiss,
            actual: bracket.format,
        });
    }
    Ok(())
}

/// Every match of `round` has been played (or was a bye). False for rounds not paired yet.
pub fn is_round_complete(bracket: &Bracket, round: u32) -> bool {
    let mut matches = bracket.matches_in_round(round).peekable();
    matches.peek().is_some() && matches.all(|m| m.status.is_resolved())
}

/// Last configured round has been paired and played.
pub fn is_complete(bracket: &Bracket) -> bool {
    bracket.current_round >= bracket.total_rounds && is_round_complete(bracket, bracket.current_round)
}

/// Pair the next round from the current standings.
pub fn generate_next_round(bracket: &mut Bracket) -> Result<SwissRound, BracketError> {
    ensure_format(bracket)?;
    if bracket.current_round >= bracket.total_rounds {
        return Err(BracketError::TournamentAlreadyComplete);
    }
    if !is_round_complete(bracket, bracket.current_round) {
        return Err(BracketError::RoundInProgress {
            round: bracket.current_round,
        });
    }
    let round = bracket.current_round + 1;

    let mut ranked: Vec<TeamId> = standings(bracket).iter().map(|s| s.team_id).collect();
    let bye = if ranked.len() % 2 == 1 {
        let idx = ranked
            .iter()
            .rposition(|&id| bracket.record(id).map_or(true, |r| r.byes == 0))
            .unwrap_or(ranked.len() - 1);
        Some(ranked.remove(idx))
    } else {
        None
    };

    let (pairs, rematches) = match pair_without_rematches(&ranked, &bracket.pairings) {
        Some(pairs) => (pairs, 0),
        None => {
            let (pairs, rematches) = pair_greedy(&ranked, &bracket.pairings);
            log::warn!(
                "Swiss bracket {} round {}: no rematch-free pairing found, accepted {} rematch(es)",
                bracket.id,
                round,
                rematches
            );
            (pairs, rematches)
        }
    };

    let matches = push_round(bracket, round, &pairs, bye);
    bracket.current_round = round;
    log::info!(
        "Paired Swiss round {}/{} of bracket {}: {} matches",
        round,
        bracket.total_rounds,
        bracket.id,
        matches.len()
    );
    Ok(SwissRound {
        round,
        matches,
        bye,
        rematches,
    })
}

/// Depth-first search over the ranking: the top unpaired team takes the nearest-ranked
/// opponent it has not met, backtracking when the rest cannot be paired.
fn pair_without_rematches(
    ranked: &[TeamId],
    history: &PairingHistory,
) -> Option<Vec<(TeamId, TeamId)>> {
    fn search(
        ranked: &[TeamId],
        paired: &mut [bool],
        history: &PairingHistory,
        out: &mut Vec<(TeamId, TeamId)>,
        budget: &mut u32,
    ) -> bool {
        let first = match paired.iter().position(|p| !p) {
            Some(first) => first,
            None => return true,
        };
        paired[first] = true;
        for next in first + 1..ranked.len() {
            if paired[next] || history.contains(ranked[first], ranked[next]) {
                continue;
            }
            if *budget == 0 {
                break;
            }
            *budget -= 1;
            paired[next] = true;
            out.push((ranked[first], ranked[next]));
            if search(ranked, paired, history, out, budget) {
                return true;
            }
            out.pop();
            paired[next] = false;
        }
        paired[first] = false;
        false
    }

    let mut paired = vec![false; ranked.len()];
    let mut out = Vec::with_capacity(ranked.len() / 2);
    let mut budget = PAIRING_SEARCH_BUDGET;
    search(ranked, &mut paired, history, &mut out, &mut budget).then_some(out)
}

/// Top-down pass: nearest unplayed opponent if any, otherwise the nearest opponent.
fn pair_greedy(ranked: &[TeamId], history: &PairingHistory) -> (Vec<(TeamId, TeamId)>, usize) {
    let mut paired = vec![false; ranked.len()];
    let mut pairs = Vec::with_capacity(ranked.len() / 2);
    let mut rematches = 0;
    for first in 0..ranked.len() {
        if paired[first] {
            continue;
        }
        let open = |j: &usize| !paired[*j] && *j != first;
        let fresh = (first + 1..ranked.len())
            .filter(open)
            .find(|&j| !history.contains(ranked[first], ranked[j]));
        let opponent = match fresh {
            Some(j) => j,
            None => match (first + 1..ranked.len()).find(open) {
                Some(j) => {
                    rematches += 1;
                    j
                }
                None => continue,
            },
        };
        paired[first] = true;
        paired[opponent] = true;
        pairs.push((ranked[first], ranked[opponent]));
    }
    (pairs, rematches)
}

/// Record a result. Draws are allowed.
pub fn apply_result(
    bracket: &mut Bracket,
    result: &MatchResult,
) -> Result<AdvancementEffects, BracketError> {
    ensure_format(bracket)?;
    let outcome = graph::validate_result(bracket, result)?;
    graph::record_outcome(bracket, result.match_id, outcome, result.score);
    let bracket_complete = is_complete(bracket);
    if bracket_complete {
        log::info!("Swiss bracket {} is complete", bracket.id);
    }
    Ok(AdvancementEffects {
        completed: Some(result.match_id),
        bracket_complete,
        ..AdvancementEffects::default()
    })
}

/// Buchholz and Sonneborn-Berger for every team, from completed matches.
fn tiebreakers(bracket: &Bracket) -> HashMap<TeamId, Tiebreakers> {
    let points: HashMap<TeamId, f64> = bracket
        .records
        .iter()
        .map(|r| (r.team_id, r.points))
        .collect();
    let mut out: HashMap<TeamId, Tiebreakers> = bracket
        .records
        .iter()
        .map(|r| {
            (
                r.team_id,
                Tiebreakers {
                    goal_difference: r.goal_difference(),
                    ..Tiebreakers::default()
                },
            )
        })
        .collect();

    for m in bracket
        .matches
        .iter()
        .filter(|m| m.status == MatchStatus::Completed)
    {
        let (a, b) = match (m.slot1, m.slot2) {
            (Some(a), Some(b)) => (a, b),
            _ => continue,
        };
        for (team, opponent) in [(a, b), (b, a)] {
            let opponent_points = points.get(&opponent).copied().unwrap_or_default();
            let weight = if m.draw {
                0.5
            } else if m.winner == Some(team) {
                1.0
            } else {
                0.0
            };
            if let Some(t) = out.get_mut(&team) {
                t.buchholz += opponent_points;
                t.sonneborn_berger += opponent_points * weight;
            }
        }
    }
    out
}

/// Ranked by points, Buchholz, Sonneborn-Berger, then seed.
pub fn standings(bracket: &Bracket) -> Vec<Standing> {
    let mut breaks = tiebreakers(bracket);
    let mut rows: Vec<Standing> = bracket
        .records
        .iter()
        .map(|record| Standing {
            rank: 0,
            team_id: record.team_id,
            seed: bracket.seed_of(record.team_id),
            record: record.clone(),
            tiebreakers: breaks.remove(&record.team_id).unwrap_or_default(),
            placement: None,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.record
            .points
            .total_cmp(&a.record.points)
            .then(b.tiebreakers.buchholz.total_cmp(&a.tiebreakers.buchholz))
            .then(
                b.tiebreakers
                    .sonneborn_berger
                    .total_cmp(&a.tiebreakers.sonneborn_berger),
            )
            .then(a.seed.cmp(&b.seed))
    });
    for (idx, row) in rows.iter_mut().enumerate() {
        row.rank = idx as u32 + 1;
    }
    rows
}
