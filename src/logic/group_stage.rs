//! Group stage: snake-seeded groups, each playing round robin or a GSL bracket, feeding a
//! playoff bracket once every group has finished.

use crate::logic::graph;
use crate::logic::gsl::{self, GSL_GROUP_SIZE};
use crate::logic::seeding::{seeded_roster, snake_distribute};
use crate::logic::{double_elimination, round_robin, single_elimination};
use crate::models::{
    AdvancementEffects, AdvancingTeam, BestOf, Bracket, BracketError, BracketSection, Format,
    Group, GroupProgress, GroupStage, GroupStageConfig, MatchId, MatchResult, PlayoffFormat,
    Standing, StagePhase, StageProgress, SubFormat, Team,
};
use uuid::Uuid;

const MAX_GROUPS: u32 = 26;

fn group_name(index: usize) -> char {
    char::from(b'A' + index as u8)
}

fn validate_config(config: &GroupStageConfig, team_count: usize) -> Result<(), BracketError> {
    if config.group_count == 0 || config.group_count > MAX_GROUPS {
        return Err(BracketError::InvalidConfiguration(format!(
            "group count must be between 1 and {MAX_GROUPS}, got {}",
            config.group_count
        )));
    }
    let smallest_group = team_count / config.group_count as usize;
    if config.advance_per_group == 0 || config.advance_per_group as usize > smallest_group {
        return Err(BracketError::InvalidConfiguration(format!(
            "teams advancing per group must be between 1 and {smallest_group}, got {}",
            config.advance_per_group
        )));
    }
    if config.playoff_format.is_some() && config.group_count * config.advance_per_group < 2 {
        return Err(BracketError::InvalidConfiguration(
            "a playoff needs at least 2 advancing teams".to_string(),
        ));
    }
    if config.sub_format == SubFormat::Gsl && config.advance_per_group != 2 {
        return Err(BracketError::InvalidConfiguration(
            "GSL groups advance exactly 2 teams".to_string(),
        ));
    }
    Ok(())
}

/// Distribute the teams into groups and build every group's bracket. Needs at least two
/// teams per group.
pub fn generate(teams: &[Team], config: &GroupStageConfig) -> Result<GroupStage, BracketError> {
    if config.group_count == 0 {
        return Err(BracketError::InvalidConfiguration(
            "a group stage needs at least one group".to_string(),
        ));
    }
    let ordered = seeded_roster(teams, 2 * config.group_count as usize)?;
    validate_config(config, ordered.len())?;

    let groups: Vec<Group> = snake_distribute(&ordered, config.group_count as usize)
        .into_iter()
        .enumerate()
        .map(|(index, members)| {
            let name = group_name(index);
            let section = BracketSection::Group(name);
            let bracket = if config.sub_format == SubFormat::Gsl && members.len() == GSL_GROUP_SIZE {
                gsl::build(members, config.best_of, section)
            } else {
                round_robin::build(members, config.best_of, false, section)
            };
            Group {
                index,
                name,
                bracket,
                finalized: false,
                advancing: Vec::new(),
            }
        })
        .collect();

    let stage = GroupStage {
        id: Uuid::new_v4(),
        config: config.clone(),
        groups,
        advancing: Vec::new(),
        phase: StagePhase::Groups,
        playoff: None,
    };
    log::info!(
        "Generated group stage {}: {} teams in {} groups ({:?}), {} advance per group",
        stage.id,
        ordered.len(),
        stage.groups.len(),
        config.sub_format,
        config.advance_per_group
    );
    Ok(stage)
}

fn group_mut(stage: &mut GroupStage, index: usize) -> Result<&mut Group, BracketError> {
    stage
        .groups
        .get_mut(index)
        .ok_or(BracketError::GroupNotFound(index))
}

/// Record a result in one group. A group whose last match this was is finalized, and the
/// playoff bracket is built once the last group finalizes.
///
/// The result is committed once the group accepts it, so a playoff that cannot be built is
/// logged and left unbuilt instead of failing the call; `build_playoff_bracket` can retry it.
pub fn apply_result(
    stage: &mut GroupStage,
    group_index: usize,
    result: &MatchResult,
) -> Result<AdvancementEffects, BracketError> {
    let group = group_mut(stage, group_index)?;
    let effects = match group.bracket.format {
        Format::Gsl => gsl::apply_result(&mut group.bracket, result)?,
        _ => round_robin::apply_result(&mut group.bracket, result)?,
    };

    if effects.bracket_complete && !group.finalized {
        finalize_group(stage, group_index)?;
        if stage.all_groups_finalized() && stage.playoff.is_none() {
            if let Some(format) = stage.config.playoff_format {
                match build_playoff_bracket(&stage.advancing, format, stage.config.best_of) {
                    Ok(playoff) => {
                        stage.playoff = Some(playoff);
                        stage.phase = StagePhase::Playoffs;
                    }
                    Err(err) => log::error!("Group stage {} has no playoff: {}", stage.id, err),
                }
            }
        }
    }
    Ok(effects)
}

/// Standings of one group, in its sub-format's order.
pub fn group_standings(stage: &GroupStage, group_index: usize) -> Result<Vec<Standing>, BracketError> {
    let group = stage
        .group(group_index)
        .ok_or(BracketError::GroupNotFound(group_index))?;
    Ok(match group.bracket.format {
        Format::Gsl => gsl::standings(&group.bracket),
        _ => round_robin::standings(&group.bracket),
    })
}

/// Rank a finished group and record its top `advance_per_group` teams. Calling it again
/// returns the same teams.
pub fn finalize_group(
    stage: &mut GroupStage,
    group_index: usize,
) -> Result<Vec<AdvancingTeam>, BracketError> {
    let standings = group_standings(stage, group_index)?;
    let take = stage.config.advance_per_group as usize;
    let group = group_mut(stage, group_index)?;
    if group.finalized {
        return Ok(group.advancing.clone());
    }
    if !graph::all_resolved(&group.bracket) {
        return Err(BracketError::BracketIncomplete);
    }

    let advancing: Vec<AdvancingTeam> = standings
        .iter()
        .take(take)
        .filter_map(|s| {
            group.bracket.team(s.team_id).map(|team| AdvancingTeam {
                team: team.clone(),
                group_name: group.name,
                group_rank: s.rank,
                points: s.record.points,
            })
        })
        .collect();
    group.finalized = true;
    group.advancing = advancing.clone();
    log::info!(
        "Group {} finalized, advancing: {:?}",
        group.name,
        advancing.iter().map(|a| a.team.id).collect::<Vec<_>>()
    );
    stage.advancing.extend(advancing.iter().cloned());
    Ok(advancing)
}

/// Seed the advancing teams into a playoff bracket: group winners first, then runners-up,
/// each tier ordered by points and then group.
pub fn build_playoff_bracket(
    advancing: &[AdvancingTeam],
    format: PlayoffFormat,
    best_of: BestOf,
) -> Result<Bracket, BracketError> {
    let mut ordered: Vec<&AdvancingTeam> = advancing.iter().collect();
    ordered.sort_by(|a, b| {
        a.group_rank
            .cmp(&b.group_rank)
            .then(b.points.total_cmp(&a.points))
            .then(a.group_name.cmp(&b.group_name))
    });
    let seeded: Vec<Team> = ordered
        .iter()
        .enumerate()
        .map(|(i, a)| Team::seeded(a.team.id, a.team.display_name.clone(), i as u32 + 1))
        .collect();

    let bracket = match format {
        PlayoffFormat::SingleElimination => single_elimination::generate(&seeded, best_of)?,
        PlayoffFormat::DoubleElimination => double_elimination::generate(&seeded, best_of)?,
    };
    log::info!(
        "Built {} playoff bracket {} from {} advancing teams",
        bracket.format,
        bracket.id,
        seeded.len()
    );
    Ok(bracket)
}

/// Record a playoff result.
pub fn apply_playoff_result(
    stage: &mut GroupStage,
    result: &MatchResult,
) -> Result<AdvancementEffects, BracketError> {
    if !stage.all_groups_finalized() {
        return Err(BracketError::GroupsIncomplete);
    }
    let playoff = stage.playoff.as_mut().ok_or_else(|| {
        BracketError::InvalidConfiguration("this group stage has no playoff bracket".to_string())
    })?;
    match playoff.format {
        Format::DoubleElimination => double_elimination::apply_result(playoff, result),
        _ => single_elimination::apply_result(playoff, result),
    }
}

/// Playable group matches, by group index.
pub fn next_group_matches(stage: &GroupStage) -> Vec<(usize, MatchId)> {
    stage
        .groups
        .iter()
        .flat_map(|g| {
            graph::pending_matches(&g.bracket)
                .into_iter()
                .map(move |m| (g.index, m.id))
        })
        .collect()
}

/// Per-group and overall completion, plus the playoff's once it exists.
pub fn progress(stage: &GroupStage) -> StageProgress {
    let groups: Vec<GroupProgress> = stage
        .groups
        .iter()
        .map(|g| {
            let p = graph::match_progress(&g.bracket.matches, g.finalized);
            GroupProgress {
                group_name: g.name,
                completed_matches: p.completed_matches,
                total_matches: p.total_matches,
                percentage: p.percentage,
            }
        })
        .collect();

    let all_matches: Vec<_> = stage
        .groups
        .iter()
        .flat_map(|g| g.bracket.matches.iter().cloned())
        .collect();
    let overall = graph::match_progress(&all_matches, stage.all_groups_finalized());
    let playoff = stage
        .playoff
        .as_ref()
        .map(|b| graph::match_progress(&b.matches, crate::logic::is_complete(b)));
    StageProgress {
        groups,
        overall,
        playoff,
    }
}
