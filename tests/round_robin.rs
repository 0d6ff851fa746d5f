//! Integration tests for round robin: circle scheduling, points and tiebreakers.

use bracket_engine::logic::round_robin;
use bracket_engine::{BestOf, Bracket, BracketError, MatchId, MatchResult, Team, TeamId};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

fn seeded_teams(n: u64) -> Vec<Team> {
    (1..=n)
        .map(|i| Team::seeded(i, format!("Team {i}"), i as u32))
        .collect()
}

fn find_match(bracket: &Bracket, a: TeamId, b: TeamId) -> MatchId {
    bracket
        .matches
        .iter()
        .find(|m| m.involves(a) && m.involves(b))
        .map(|m| m.id)
        .unwrap()
}

fn beat(bracket: &mut Bracket, winner: TeamId, loser: TeamId) {
    let id = find_match(bracket, winner, loser);
    round_robin::apply_result(bracket, &MatchResult::win(id, winner)).unwrap();
}

fn order(bracket: &Bracket) -> Vec<TeamId> {
    round_robin::standings(bracket)
        .iter()
        .map(|s| s.team_id)
        .collect()
}

#[test]
fn five_teams_single_leg() {
    let bracket = round_robin::generate(&seeded_teams(5), BestOf::Bo1, false).unwrap();
    assert_eq!(bracket.matches.len(), 10);
    assert_eq!(bracket.total_rounds, 5);
    for round in 1..=5 {
        let teams: Vec<TeamId> = bracket.matches_in_round(round).flat_map(|m| m.teams()).collect();
        assert_eq!(teams.len(), 4, "one team rests in round {round}");
        assert_eq!(teams.iter().collect::<HashSet<_>>().len(), 4);
    }
    let pairs: HashSet<(TeamId, TeamId)> = bracket
        .matches
        .iter()
        .map(|m| {
            let (a, b) = (m.slot1.unwrap(), m.slot2.unwrap());
            (a.min(b), a.max(b))
        })
        .collect();
    assert_eq!(pairs.len(), 10);
}

#[test]
fn double_leg_reverses_the_fixtures() {
    let bracket = round_robin::generate(&seeded_teams(4), BestOf::Bo1, true).unwrap();
    assert_eq!(bracket.matches.len(), 12);
    assert_eq!(bracket.total_rounds, 6);
    let mut fixtures: HashMap<(TeamId, TeamId), u32> = HashMap::new();
    for m in &bracket.matches {
        *fixtures.entry((m.slot1.unwrap(), m.slot2.unwrap())).or_default() += 1;
    }
    assert_eq!(fixtures.len(), 12);
    for &(home, away) in fixtures.keys() {
        assert!(fixtures.contains_key(&(away, home)));
    }
}

#[test]
fn needs_three_teams() {
    assert_eq!(
        round_robin::generate(&seeded_teams(2), BestOf::Bo1, false).unwrap_err(),
        BracketError::InsufficientTeams {
            required: 3,
            actual: 2
        }
    );
}

#[test]
fn points_are_three_one_zero() {
    let mut bracket = round_robin::generate(&seeded_teams(3), BestOf::Bo1, false).unwrap();
    beat(&mut bracket, 1, 2);
    let id = find_match(&bracket, 2, 3);
    round_robin::apply_result(&mut bracket, &MatchResult::draw(id, 2)).unwrap();
    assert_eq!(bracket.record(1).unwrap().points, 3.0);
    assert_eq!(bracket.record(2).unwrap().points, 1.0);
    assert_eq!(bracket.record(3).unwrap().points, 1.0);
    assert_eq!(bracket.head_to_head.get(2, 3).unwrap().draws, 1);
}

#[test]
fn head_to_head_splits_a_two_way_tie() {
    let mut bracket = round_robin::generate(&seeded_teams(4), BestOf::Bo1, false).unwrap();
    beat(&mut bracket, 1, 4);
    beat(&mut bracket, 2, 3);
    beat(&mut bracket, 1, 2);
    beat(&mut bracket, 4, 3);
    beat(&mut bracket, 3, 1);
    let effects = {
        let id = find_match(&bracket, 2, 4);
        round_robin::apply_result(&mut bracket, &MatchResult::win(id, 2)).unwrap()
    };
    assert!(effects.bracket_complete);
    // 1 and 2 have 6 points, 3 and 4 have 3; 4 beat 3 directly.
    assert_eq!(order(&bracket), vec![1, 2, 4, 3]);
}

#[test]
fn three_way_tie_ignores_head_to_head() {
    let mut bracket = round_robin::generate(&seeded_teams(3), BestOf::Bo1, false).unwrap();
    beat(&mut bracket, 3, 1);
    beat(&mut bracket, 1, 2);
    beat(&mut bracket, 2, 3);
    assert_eq!(order(&bracket), vec![1, 2, 3]);
}

#[test]
fn goal_difference_beats_head_to_head() {
    let mut bracket = round_robin::generate(&seeded_teams(3), BestOf::Bo1, false).unwrap();
    let score = |bracket: &Bracket, winner: TeamId, loser: TeamId, won: u32, lost: u32| {
        let id = find_match(bracket, winner, loser);
        let m = bracket.get_match(id).unwrap();
        let result = MatchResult::win(id, winner);
        if m.slot1 == Some(winner) {
            result.with_score(won, lost)
        } else {
            result.with_score(lost, won)
        }
    };
    let r = score(&bracket, 2, 3, 5, 0);
    round_robin::apply_result(&mut bracket, &r).unwrap();
    let r = score(&bracket, 3, 1, 1, 0);
    round_robin::apply_result(&mut bracket, &r).unwrap();
    let r = score(&bracket, 1, 2, 1, 0);
    round_robin::apply_result(&mut bracket, &r).unwrap();

    // Everyone has 3 points; goal difference: 2 => +4, 1 => 0, 3 => -4.
    assert_eq!(order(&bracket), vec![2, 1, 3]);
    let top = &round_robin::standings(&bracket)[0];
    assert_eq!(top.tiebreakers.goal_difference, 4);
}

#[test]
fn detailed_standings_report_form() {
    let mut bracket = round_robin::generate(&seeded_teams(3), BestOf::Bo1, false).unwrap();
    beat(&mut bracket, 1, 2);
    beat(&mut bracket, 1, 3);
    let id = find_match(&bracket, 2, 3);
    round_robin::apply_result(&mut bracket, &MatchResult::draw(id, 3)).unwrap();

    let rows = round_robin::detailed_standings(&bracket);
    assert_eq!(rows[0].standing.team_id, 1);
    assert_eq!(rows[0].form, "WW");
    assert_eq!(rows[0].points_per_game, 3.0);
    assert_eq!(rows[0].win_percentage, 100.0);
    let team2 = rows.iter().find(|r| r.standing.team_id == 2).unwrap();
    assert_eq!(team2.form.len(), 2);
    assert!(team2.form.contains('L') && team2.form.contains('D'));
    assert_eq!(team2.win_percentage, 0.0);
}

#[test]
fn schedule_spaces_rounds_evenly() {
    let bracket = round_robin::generate(&seeded_teams(5), BestOf::Bo1, false).unwrap();
    let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let dates = round_robin::schedule(&bracket, start, 7).unwrap();
    assert_eq!(dates.len(), 5);
    assert_eq!(dates[0].date, start);
    assert_eq!(dates[4].date, NaiveDate::from_ymd_opt(2024, 3, 29).unwrap());
    assert!(matches!(
        round_robin::schedule(&bracket, start, 0),
        Err(BracketError::InvalidConfiguration(_))
    ));
}
