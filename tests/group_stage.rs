//! Integration tests for group stages: distribution, GSL groups, advancement and playoffs.

use bracket_engine::logic::{group_stage, gsl};
use bracket_engine::{
    next_matches, BestOf, BracketError, Format, GroupStage, GroupStageConfig, MatchId,
    MatchResult, PlayoffFormat, StagePhase, SubFormat, Team, TeamId,
};
use std::collections::HashSet;

fn seeded_teams(n: u64) -> Vec<Team> {
    (1..=n)
        .map(|i| Team::seeded(i, format!("Team {i}"), i as u32))
        .collect()
}

fn gsl_config(group_count: u32) -> GroupStageConfig {
    GroupStageConfig {
        group_count,
        sub_format: SubFormat::Gsl,
        ..GroupStageConfig::default()
    }
}

/// Play every group match with the lower id winning.
fn play_groups_by_seed(stage: &mut GroupStage) {
    loop {
        let playable = group_stage::next_group_matches(stage);
        if playable.is_empty() {
            return;
        }
        for (group, id) in playable {
            let m = stage.groups[group].bracket.get_match(id).unwrap();
            let winner = m.slot1.unwrap().min(m.slot2.unwrap());
            group_stage::apply_result(stage, group, &MatchResult::win(id, winner)).unwrap();
        }
    }
}

#[test]
fn gsl_always_advances_two_and_eliminates_two() {
    for pattern in 0u32..32 {
        let mut bracket = gsl::generate(&seeded_teams(4), BestOf::Bo1).unwrap();
        let mut eliminated = Vec::new();
        loop {
            let playable: Vec<(MatchId, TeamId)> = next_matches(&bracket)
                .iter()
                .map(|m| {
                    let first = (pattern >> m.id.0) & 1 == 0;
                    (m.id, if first { m.slot1.unwrap() } else { m.slot2.unwrap() })
                })
                .collect();
            if playable.is_empty() {
                break;
            }
            for (id, winner) in playable {
                let effects = gsl::apply_result(&mut bracket, &MatchResult::win(id, winner)).unwrap();
                eliminated.extend(effects.eliminated);
            }
        }

        let qualified = gsl::qualified(&bracket);
        assert_eq!(qualified.len(), 2, "pattern {pattern:05b}");
        assert_eq!(eliminated.len(), 2, "pattern {pattern:05b}");
        let everyone: HashSet<TeamId> = qualified.iter().chain(&eliminated).copied().collect();
        assert_eq!(everyone.len(), 4);

        let places: Vec<u32> = gsl::standings(&bracket)
            .iter()
            .map(|s| s.placement.unwrap().from)
            .collect();
        assert_eq!(places, vec![1, 2, 3, 4]);
    }
}

#[test]
fn gsl_opening_matches_pair_one_four_and_two_three() {
    let bracket = gsl::generate(&seeded_teams(4), BestOf::Bo3).unwrap();
    assert_eq!(bracket.matches.len(), 5);
    assert_eq!((bracket.matches[0].slot1, bracket.matches[0].slot2), (Some(1), Some(4)));
    assert_eq!((bracket.matches[1].slot1, bracket.matches[1].slot2), (Some(2), Some(3)));
    assert!(matches!(
        gsl::generate(&seeded_teams(5), BestOf::Bo1),
        Err(BracketError::InvalidConfiguration(_))
    ));
}

#[test]
fn snake_distribution_balances_groups() {
    let stage = group_stage::generate(&seeded_teams(16), &gsl_config(4)).unwrap();
    let groups: Vec<(char, Vec<TeamId>)> = stage
        .groups
        .iter()
        .map(|g| (g.name, g.bracket.teams.iter().map(|t| t.id).collect()))
        .collect();
    assert_eq!(
        groups,
        vec![
            ('A', vec![1, 8, 9, 16]),
            ('B', vec![2, 7, 10, 15]),
            ('C', vec![3, 6, 11, 14]),
            ('D', vec![4, 5, 12, 13]),
        ]
    );
    assert!(stage.groups.iter().all(|g| g.bracket.format == Format::Gsl));
}

#[test]
fn gsl_groups_feed_a_seeded_playoff() {
    let mut stage = group_stage::generate(&seeded_teams(16), &gsl_config(4)).unwrap();
    assert_eq!(
        group_stage::apply_playoff_result(&mut stage, &MatchResult::win(MatchId(0), 1))
            .unwrap_err(),
        BracketError::GroupsIncomplete
    );
    play_groups_by_seed(&mut stage);

    assert!(stage.all_groups_finalized());
    assert_eq!(stage.phase, StagePhase::Playoffs);
    let group_a: Vec<(TeamId, u32)> = stage.groups[0]
        .advancing
        .iter()
        .map(|a| (a.team.id, a.group_rank))
        .collect();
    assert_eq!(group_a, vec![(1, 1), (8, 2)]);

    let playoff = stage.playoff.as_ref().unwrap();
    assert_eq!(playoff.format, Format::SingleElimination);
    let seeds: Vec<TeamId> = playoff.teams.iter().map(|t| t.id).collect();
    assert_eq!(seeds, vec![1, 2, 3, 4, 8, 7, 6, 5]);

    loop {
        let playable: Vec<(MatchId, TeamId)> = next_matches(stage.playoff.as_ref().unwrap())
            .iter()
            .map(|m| (m.id, m.slot1.unwrap().min(m.slot2.unwrap())))
            .collect();
        if playable.is_empty() {
            break;
        }
        for (id, winner) in playable {
            group_stage::apply_playoff_result(&mut stage, &MatchResult::win(id, winner)).unwrap();
        }
    }
    let progress = group_stage::progress(&stage);
    assert!(progress.overall.is_complete);
    assert!(progress.playoff.unwrap().is_complete);
}

#[test]
fn round_robin_groups_rank_by_points() {
    let mut stage = group_stage::generate(&seeded_teams(12), &GroupStageConfig::default()).unwrap();
    assert_eq!(stage.groups.len(), 4);
    assert!(stage
        .groups
        .iter()
        .all(|g| g.bracket.format == Format::RoundRobin && g.bracket.matches.len() == 3));

    let before = group_stage::progress(&stage);
    assert_eq!(before.overall.total_matches, 12);
    assert_eq!(before.overall.completed_matches, 0);
    assert!(before.groups.iter().all(|g| g.total_matches == 3));

    play_groups_by_seed(&mut stage);
    let winners: Vec<TeamId> = stage.advancing.iter().map(|a| a.team.id).collect();
    assert_eq!(winners.len(), 8);
    assert_eq!(stage.groups[0].advancing[0].team.id, 1);
    assert_eq!(stage.groups[0].advancing[0].points, 6.0);
    assert_eq!(stage.groups[0].advancing[1].team.id, 8);

    let standings = group_stage::group_standings(&stage, 3).unwrap();
    let order: Vec<TeamId> = standings.iter().map(|s| s.team_id).collect();
    assert_eq!(order, vec![4, 5, 12]);
}

#[test]
fn double_elimination_playoff_on_request() {
    let config = GroupStageConfig {
        group_count: 2,
        advance_per_group: 2,
        playoff_format: Some(PlayoffFormat::DoubleElimination),
        ..GroupStageConfig::default()
    };
    let mut stage = group_stage::generate(&seeded_teams(8), &config).unwrap();
    play_groups_by_seed(&mut stage);
    let playoff = stage.playoff.as_ref().unwrap();
    assert_eq!(playoff.format, Format::DoubleElimination);
    assert_eq!(playoff.teams.len(), 4);
}

#[test]
fn no_playoff_without_a_playoff_format() {
    let config = GroupStageConfig {
        group_count: 2,
        playoff_format: None,
        ..GroupStageConfig::default()
    };
    let mut stage = group_stage::generate(&seeded_teams(6), &config).unwrap();
    play_groups_by_seed(&mut stage);
    assert!(stage.all_groups_finalized());
    assert!(stage.playoff.is_none());
    assert_eq!(stage.phase, StagePhase::Groups);
    assert_eq!(stage.advancing.len(), 4);
}

#[test]
fn rejects_bad_configurations() {
    assert_eq!(
        group_stage::generate(&seeded_teams(7), &GroupStageConfig::default()).unwrap_err(),
        BracketError::InsufficientTeams {
            required: 8,
            actual: 7
        }
    );
    let zero_advance = GroupStageConfig {
        advance_per_group: 0,
        ..GroupStageConfig::default()
    };
    assert!(matches!(
        group_stage::generate(&seeded_teams(8), &zero_advance),
        Err(BracketError::InvalidConfiguration(_))
    ));
    let too_many = GroupStageConfig {
        advance_per_group: 3,
        ..GroupStageConfig::default()
    };
    assert!(matches!(
        group_stage::generate(&seeded_teams(8), &too_many),
        Err(BracketError::InvalidConfiguration(_))
    ));
    let gsl_one = GroupStageConfig {
        advance_per_group: 1,
        ..gsl_config(2)
    };
    assert!(matches!(
        group_stage::generate(&seeded_teams(8), &gsl_one),
        Err(BracketError::InvalidConfiguration(_))
    ));
}

#[test]
fn finalizing_needs_a_finished_group() {
    let mut stage = group_stage::generate(&seeded_teams(8), &gsl_config(2)).unwrap();
    assert_eq!(
        group_stage::finalize_group(&mut stage, 0).unwrap_err(),
        BracketError::BracketIncomplete
    );
    assert_eq!(
        group_stage::finalize_group(&mut stage, 9).unwrap_err(),
        BracketError::GroupNotFound(9)
    );
    play_groups_by_seed(&mut stage);
    let again = group_stage::finalize_group(&mut stage, 0).unwrap();
    assert_eq!(again, stage.groups[0].advancing);
    assert_eq!(stage.advancing.len(), 4);
}

#[test]
fn playoff_needs_two_advancing_teams() {
    let lone_qualifier = GroupStageConfig {
        group_count: 1,
        advance_per_group: 1,
        ..GroupStageConfig::default()
    };
    assert!(matches!(
        group_stage::generate(&seeded_teams(2), &lone_qualifier),
        Err(BracketError::InvalidConfiguration(_))
    ));
    let no_playoff = GroupStageConfig {
        playoff_format: None,
        ..lone_qualifier
    };
    assert!(group_stage::generate(&seeded_teams(2), &no_playoff).is_ok());
}

#[test]
fn rejected_results_leave_the_stage_untouched() {
    let mut stage = group_stage::generate(&seeded_teams(8), &gsl_config(2)).unwrap();
    let before = stage.to_json().unwrap();
    assert!(matches!(
        group_stage::apply_result(&mut stage, 0, &MatchResult::win(MatchId(0), 2)),
        Err(BracketError::InvalidResult { .. })
    ));
    assert_eq!(
        group_stage::apply_result(&mut stage, 5, &MatchResult::win(MatchId(0), 1)).unwrap_err(),
        BracketError::GroupNotFound(5)
    );
    assert_eq!(stage.to_json().unwrap(), before);
}

#[test]
fn unbuildable_playoff_does_not_fail_the_committed_result() {
    let config = GroupStageConfig {
        group_count: 1,
        ..GroupStageConfig::default()
    };
    let mut stage = group_stage::generate(&seeded_teams(2), &config).unwrap();
    // A stage restored from storage can carry settings that never passed generation.
    stage.config.advance_per_group = 1;

    let effects = group_stage::apply_result(&mut stage, 0, &MatchResult::win(MatchId(0), 1)).unwrap();
    assert!(effects.bracket_complete);
    assert!(stage.groups[0].finalized);
    assert!(stage.playoff.is_none());
    assert_eq!(stage.phase, StagePhase::Groups);
    assert_eq!(
        group_stage::apply_result(&mut stage, 0, &MatchResult::win(MatchId(0), 1)).unwrap_err(),
        BracketError::AlreadyCompleted(MatchId(0))
    );
}

#[test]
fn config_defaults_match_between_serde_and_default() {
    let parsed: GroupStageConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(parsed, GroupStageConfig::default());
    assert_eq!(parsed.playoff_format, Some(PlayoffFormat::SingleElimination));
    let none: GroupStageConfig = serde_json::from_str(r#"{"playoff_format": null}"#).unwrap();
    assert_eq!(none.playoff_format, None);
}
