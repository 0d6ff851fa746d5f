//! Round robin: every team meets every other team once (or twice with a return leg).
//!
//! Scheduling uses the circle method. Team 0 stays fixed, the others rotate one position
//! per round, and position `i` plays position `m - 1 - i`. An odd field is padded with an
//! empty position whose pairings are skipped, which gives one team a rest each round.

use crate::logic::graph::{self, push_match, Outcome};
use crate::logic::seeding::seeded_roster;
use crate::models::{
    AdvancementEffects, BestOf, Bracket, BracketError, BracketSection, Format, Match,
    MatchResult, MatchStatus, Standing, Team, TeamId, Tiebreakers,
};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Pairings of the single-leg schedule as seed indices, one `Vec` per round.
pub fn circle_rounds(team_count: usize) -> Vec<Vec<(usize, usize)>> {
    let mut positions: Vec<Option<usize>> = (0..team_count).map(Some).collect();
    if team_count % 2 == 1 {
        positions.push(None);
    }
    let m = positions.len();
    if m < 2 {
        return Vec::new();
    }
    let rest = &positions[1..];
    (0..m - 1)
        .map(|shift| {
            let arrangement: Vec<Option<usize>> = std::iter::once(positions[0])
                .chain((0..m - 1).map(|j| rest[(j + shift) % (m - 1)]))
                .collect();
            (0..m / 2)
                .filter_map(|i| match (arrangement[i], arrangement[m - 1 - i]) {
                    (Some(a), Some(b)) => Some((a, b)),
                    _ => None,
                })
                .collect()
        })
        .collect()
}

/// Build the round robin schedule for already-ordered teams. No minimum size, so group
/// stages can use it for small groups.
pub(crate) fn build(
    teams: Vec<Team>,
    best_of: BestOf,
    double_leg: bool,
    section: BracketSection,
) -> Bracket {
    let mut bracket = Bracket::new(Format::RoundRobin, best_of, teams);
    bracket.double_leg = double_leg;
    let ids: Vec<TeamId> = bracket.teams.iter().map(|t| t.id).collect();

    let first_leg = circle_rounds(ids.len());
    let legs = if double_leg { 2 } else { 1 };
    let mut round = 0;
    for leg in 0..legs {
        for pairs in &first_leg {
            round += 1;
            for (i, &(a, b)) in pairs.iter().enumerate() {
                let (home, away) = if leg == 0 { (ids[a], ids[b]) } else { (ids[b], ids[a]) };
                let m = Match::between(
                    bracket.next_match_id(),
                    round,
                    i as u32 + 1,
                    format!("Round {round}"),
                    section,
                    home,
                    away,
                );
                push_match(&mut bracket, m);
            }
        }
    }
    bracket.total_rounds = round;
    bracket.current_round = round;
    bracket
}

/// Generate a round robin bracket. Needs at least 3 teams.
pub fn generate(teams: &[Team], best_of: BestOf, double_leg: bool) -> Result<Bracket, BracketError> {
    let ordered = seeded_roster(teams, 3)?;
    let bracket = build(ordered, best_of, double_leg, BracketSection::Main);
    log::info!(
        "Generated round robin bracket {}: {} teams, {} rounds, {} matches, {}{}",
        bracket.id,
        bracket.teams.len(),
        bracket.total_rounds,
        bracket.matches.len(),
        best_of,
        if double_leg { ", double leg" } else { "" }
    );
    Ok(bracket)
}

fn ensure_format(bracket: &Bracket) -> Result<(), BracketError> {
    if bracket.format != Format::RoundRobin {
        return Err(BracketError::WrongFormat {
            expected: Format::RoundRobin,
            actual: bracket.format,
        });
    }
    Ok(())
}

/// Record a result and update the head-to-head registry.
pub fn apply_result(
    bracket: &mut Bracket,
    result: &MatchResult,
) -> Result<AdvancementEffects, BracketError> {
    ensure_format(bracket)?;
    let outcome = graph::validate_result(bracket, result)?;
    graph::record_outcome(bracket, result.match_id, outcome, result.score);
    match outcome {
        Outcome::Win { winner, loser } => bracket.head_to_head.record_win(winner, loser),
        Outcome::Draw { slot1, slot2 } => bracket.head_to_head.record_draw(slot1, slot2),
    }
    let bracket_complete = graph::all_resolved(bracket);
    if bracket_complete {
        log::info!("Round robin bracket {} is complete", bracket.id);
    }
    Ok(AdvancementEffects {
        completed: Some(result.match_id),
        bracket_complete,
        ..AdvancementEffects::default()
    })
}

/// Ranked by points, goal difference, goals for, head-to-head (two-way ties only), wins,
/// then seed.
pub fn standings(bracket: &Bracket) -> Vec<Standing> {
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
            placement: None,
        })
        .collect();

    let primary = |a: &Standing, b: &Standing| {
        b.record
            .points
            .total_cmp(&a.record.points)
            .then(b.tiebreakers.goal_difference.cmp(&a.tiebreakers.goal_difference))
            .then(b.record.goals_for.cmp(&a.record.goals_for))
    };
    let tied_with: Vec<usize> = rows
        .iter()
        .map(|a| rows.iter().filter(|b| primary(a, *b) == Ordering::Equal).count())
        .collect();
    let tie_sizes: HashMap<TeamId, usize> = rows
        .iter()
        .zip(tied_with)
        .map(|(row, size)| (row.team_id, size))
        .collect();

    rows.sort_by(|a, b| {
        primary(a, b)
            .then_with(|| {
                if tie_sizes.get(&a.team_id) == Some(&2) {
                    bracket.head_to_head.compare(b.team_id, a.team_id)
                } else {
                    Ordering::Equal
                }
            })
            .then(b.record.wins.cmp(&a.record.wins))
            .then(a.seed.cmp(&b.seed))
    });
    for (idx, row) in rows.iter_mut().enumerate() {
        row.rank = idx as u32 + 1;
    }
    rows
}

/// A standings row with the derived display figures.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetailedStanding {
    #[serde(flatten)]
    pub standing: Standing,
    pub points_per_game: f64,
    pub win_percentage: f64,
    /// Last five results, oldest first: `W`, `D` or `L`.
    pub form: String,
}

fn form(bracket: &Bracket, team: TeamId) -> String {
    let results: Vec<char> = bracket
        .matches
        .iter()
        .filter(|m| m.status == MatchStatus::Completed && m.involves(team))
        .map(|m| {
            if m.draw {
                'D'
            } else if m.winner == Some(team) {
                'W'
            } else {
                'L'
            }
        })
        .collect();
    let skip = results.len().saturating_sub(5);
    results[skip..].iter().collect()
}

pub fn detailed_standings(bracket: &Bracket) -> Vec<DetailedStanding> {
    standings(bracket)
        .into_iter()
        .map(|standing| {
            let played = standing.record.matches_played;
            let (points_per_game, win_percentage) = if played > 0 {
                (
                    standing.record.points / f64::from(played),
                    f64::from(standing.record.wins) / f64::from(played) * 100.0,
                )
            } else {
                (0.0, 0.0)
            };
            DetailedStanding {
                form: form(bracket, standing.team_id),
                standing,
                points_per_game,
                win_percentage,
            }
        })
        .collect()
}

/// Calendar date assigned to one round.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RoundDate {
    pub round: u32,
    pub date: NaiveDate,
}

/// Dates for every round: round 1 on `start`, then one round every `days_per_round` days.
pub fn schedule(
    bracket: &Bracket,
    start: NaiveDate,
    days_per_round: u32,
) -> Result<Vec<RoundDate>, BracketError> {
    if days_per_round == 0 {
        return Err(BracketError::InvalidConfiguration(
            "days per round must be at least 1".to_string(),
        ));
    }
    (1..=bracket.total_rounds)
        .map(|round| {
            let offset = u64::from(round - 1) * u64::from(days_per_round);
            start
                .checked_add_days(Days::new(offset))
                .map(|date| RoundDate { round, date })
                .ok_or_else(|| {
                    BracketError::InvalidConfiguration(format!(
                        "round {round} falls outside the supported date range"
                    ))
                })
        })
        .collect()
}
