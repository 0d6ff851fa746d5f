//! Bracket generation and progression, one module per format, plus a format-dispatching
//! surface for callers that only hold a `Bracket`.

pub mod double_elimination;
mod graph;
pub mod group_stage;
pub mod gsl;
pub mod round_robin;
pub mod seeding;
pub mod single_elimination;
pub mod swiss;

pub use graph::validate_bracket;

use crate::models::{
    AdvancementEffects, Bracket, BracketError, Format, FormatConfig, Match, MatchResult,
    Progress, Standing, Team, TeamId,
};

/// Generate a bracket for the configured format.
pub fn generate(teams: &[Team], config: &FormatConfig) -> Result<Bracket, BracketError> {
    match *config {
        FormatConfig::SingleElimination { best_of } => single_elimination::generate(teams, best_of),
        FormatConfig::DoubleElimination { best_of } => double_elimination::generate(teams, best_of),
        FormatConfig::Swiss { rounds, best_of } => swiss::generate(teams, rounds, best_of),
        FormatConfig::RoundRobin {
            best_of,
            double_leg,
        } => round_robin::generate(teams, best_of, double_leg),
    }
}

/// Apply one match result. On error the bracket is left exactly as it was.
pub fn apply_result(
    bracket: &mut Bracket,
    result: &MatchResult,
) -> Result<AdvancementEffects, BracketError> {
    match bracket.format {
        Format::SingleElimination => single_elimination::apply_result(bracket, result),
        Format::DoubleElimination => double_elimination::apply_result(bracket, result),
        Format::Swiss => swiss::apply_result(bracket, result),
        Format::RoundRobin => round_robin::apply_result(bracket, result),
        Format::Gsl => gsl::apply_result(bracket, result),
    }
}

pub fn standings(bracket: &Bracket) -> Vec<Standing> {
    match bracket.format {
        Format::SingleElimination => single_elimination::standings(bracket),
        Format::DoubleElimination => double_elimination::standings(bracket),
        Format::Swiss => swiss::standings(bracket),
        Format::RoundRobin => round_robin::standings(bracket),
        Format::Gsl => gsl::standings(bracket),
    }
}

/// Matches ready to be played, ordered by round, section and position.
pub fn next_matches(bracket: &Bracket) -> Vec<&Match> {
    graph::pending_matches(bracket)
}

pub fn is_complete(bracket: &Bracket) -> bool {
    match bracket.format {
        Format::SingleElimination => single_elimination::champion(bracket).is_some(),
        Format::DoubleElimination => double_elimination::champion(bracket).is_some(),
        Format::Swiss => swiss::is_complete(bracket),
        Format::RoundRobin | Format::Gsl => graph::all_resolved(bracket),
    }
}

pub fn progress(bracket: &Bracket) -> Progress {
    graph::match_progress(&bracket.matches, is_complete(bracket))
}

/// Final order of every team, for seeding a following stage.
pub fn final_ranking(bracket: &Bracket) -> Result<Vec<TeamId>, BracketError> {
    if !is_complete(bracket) {
        return Err(BracketError::BracketIncomplete);
    }
    Ok(standings(bracket).into_iter().map(|s| s.team_id).collect())
}
