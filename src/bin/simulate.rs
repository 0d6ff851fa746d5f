//! Command-line driver: builds a bracket from a CSV roster and plays it out, the better
//! seed winning every match, then prints the final state and standings as JSON.
//! Run with: cargo run --bin simulate -- roster.csv [config.json]
//! The roster has an `id,display_name,seed` header; seed may be empty.
//! Override the config with env: BRACKET_FORMAT (e.g. swiss, group_stage), BRACKET_BEST_OF (e.g. BO3).

use bracket_engine::logic::{group_stage, swiss};
use bracket_engine::{
    apply_result, is_complete, next_matches, standings, BestOf, Bracket, BracketError, Format,
    FormatConfig, GroupStageConfig, Match, MatchId, MatchResult, Team, TeamId,
};
use serde_json::{json, Value};
use std::error::Error;
use std::process::ExitCode;

const GROUP_STAGE: &str = "group_stage";

fn default_config() -> Value {
    json!({ "format": "single_elimination", "best_of": "BO3" })
}

fn read_roster(path: &str) -> Result<Vec<Team>, Box<dyn Error>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut teams = Vec::new();
    for row in reader.deserialize() {
        let team: Team = row?;
        teams.push(team);
    }
    log::info!("Loaded {} teams from {}", teams.len(), path);
    Ok(teams)
}

/// Config file (or the default), with env overrides applied on top.
fn read_config(path: Option<&str>) -> Result<Value, Box<dyn Error>> {
    let mut config = match path {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => default_config(),
    };
    let Value::Object(fields) = &mut config else {
        return Err("config must be a JSON object".into());
    };
    if let Ok(format) = std::env::var("BRACKET_FORMAT") {
        fields.insert("format".to_string(), Value::String(format));
    }
    if let Ok(best_of) = std::env::var("BRACKET_BEST_OF") {
        let best_of: BestOf = best_of.parse()?;
        fields.insert("best_of".to_string(), Value::String(best_of.to_string()));
    }
    Ok(config)
}

/// Better (lower) seed of the two teams.
fn favourite(bracket: &Bracket, m: &Match) -> Option<TeamId> {
    m.teams().min_by_key(|&team| bracket.seed_of(team))
}

/// Play every remaining match, pairing further Swiss rounds as they open up.
fn play_out(bracket: &mut Bracket) -> Result<(), BracketError> {
    loop {
        let playable: Vec<(MatchId, TeamId)> = next_matches(bracket)
            .into_iter()
            .filter_map(|m| favourite(bracket, m).map(|winner| (m.id, winner)))
            .collect();
        if playable.is_empty() {
            if bracket.format == Format::Swiss && !is_complete(bracket) {
                swiss::generate_next_round(bracket)?;
                continue;
            }
            return Ok(());
        }
        for (id, winner) in playable {
            apply_result(bracket, &MatchResult::win(id, winner))?;
        }
    }
}

fn run_group_stage(teams: &[Team], config: Value) -> Result<Value, Box<dyn Error>> {
    let config: GroupStageConfig = serde_json::from_value(config)?;
    let mut stage = group_stage::generate(teams, &config)?;
    loop {
        let playable = group_stage::next_group_matches(&stage);
        if playable.is_empty() {
            break;
        }
        for (group, id) in playable {
            let bracket = &stage.groups[group].bracket;
            let winner = bracket
                .get_match(id)
                .and_then(|m| favourite(bracket, m))
                .ok_or(BracketError::MatchNotFound(id))?;
            group_stage::apply_result(&mut stage, group, &MatchResult::win(id, winner))?;
        }
    }
    if let Some(playoff) = stage.playoff.as_mut() {
        play_out(playoff)?;
    }

    let group_standings = (0..stage.groups.len())
        .map(|i| group_stage::group_standings(&stage, i))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(json!({
        "progress": group_stage::progress(&stage),
        "group_standings": group_standings,
        "playoff_standings": stage.playoff.as_ref().map(standings),
        "stage": stage,
    }))
}

fn run_bracket(teams: &[Team], config: Value) -> Result<Value, Box<dyn Error>> {
    let config: FormatConfig = serde_json::from_value(config)?;
    let mut bracket = bracket_engine::generate(teams, &config)?;
    play_out(&mut bracket)?;
    Ok(json!({
        "progress": bracket_engine::progress(&bracket),
        "standings": standings(&bracket),
        "bracket": bracket,
    }))
}

fn run() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    let roster = args
        .get(1)
        .ok_or("usage: simulate <roster.csv> [config.json]")?;
    let teams = read_roster(roster)?;
    let config = read_config(args.get(2).map(String::as_str))?;

    let is_group_stage = config.get("format").and_then(Value::as_str) == Some(GROUP_STAGE);
    let output = if is_group_stage {
        run_group_stage(&teams, config)?
    } else {
        run_bracket(&teams, config)?
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("simulate: {e}");
            ExitCode::FAILURE
        }
    }
}
