//! Bracket: the match arena for one format instance, plus its bookkeeping.

use crate::models::config::{BestOf, PointsTable};
use crate::models::game::{Match, MatchId};
use crate::models::team::{PlayerRecord, Team, TeamId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Errors returned by bracket operations. None of them leave the bracket modified.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum BracketError {
    #[error("Need at least {required} teams, got {actual}")]
    InsufficientTeams { required: usize, actual: usize },
    #[error("Team {0} is entered more than once")]
    DuplicateTeam(TeamId),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Invalid best-of format {0:?} (expected BO1, BO3, BO5, BO7 or BO9)")]
    InvalidBestOf(String),
    #[error("Match {0} not found")]
    MatchNotFound(MatchId),
    #[error("Match {0} already has a result")]
    AlreadyCompleted(MatchId),
    #[error("Invalid result for match {match_id}: {reason}")]
    InvalidResult { match_id: MatchId, reason: String },
    #[error("Tournament is already complete")]
    TournamentAlreadyComplete,
    #[error("Round {round} still has matches without a result")]
    RoundInProgress { round: u32 },
    #[error("Bracket reset only applies after the lower bracket side wins the grand final")]
    ResetNotApplicable,
    #[error("Bracket is not complete")]
    BracketIncomplete,
    #[error("Operation requires a {expected} bracket, this one is {actual}")]
    WrongFormat { expected: Format, actual: Format },
    #[error("Group {0} not found")]
    GroupNotFound(usize),
    #[error("Not every group has finished")]
    GroupsIncomplete,
}

impl BracketError {
    pub(crate) fn invalid_result(match_id: MatchId, reason: impl Into<String>) -> Self {
        BracketError::InvalidResult {
            match_id,
            reason: reason.into(),
        }
    }
}

/// Unique identifier for a bracket.
pub type BracketId = Uuid;

/// Competition format of a bracket.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    SingleElimination,
    DoubleElimination,
    Swiss,
    RoundRobin,
    /// Four-team group mini bracket.
    Gsl,
}

impl Format {
    /// Whether a match of this format may end in a draw.
    pub fn allows_draws(self) -> bool {
        matches!(self, Format::Swiss | Format::RoundRobin)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::SingleElimination => "single elimination",
            Format::DoubleElimination => "double elimination",
            Format::Swiss => "Swiss",
            Format::RoundRobin => "round robin",
            Format::Gsl => "GSL",
        };
        f.write_str(name)
    }
}

/// Unordered team pairs already scheduled against each other (Swiss rematch avoidance).
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairingHistory(BTreeSet<(TeamId, TeamId)>);

impl PairingHistory {
    fn key(a: TeamId, b: TeamId) -> (TeamId, TeamId) {
        (a.min(b), a.max(b))
    }

    pub fn insert(&mut self, a: TeamId, b: TeamId) -> bool {
        self.0.insert(Self::key(a, b))
    }

    pub fn contains(&self, a: TeamId, b: TeamId) -> bool {
        self.0.contains(&Self::key(a, b))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Results between one unordered pair of teams; `team_a` is the lower id.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct HeadToHeadEntry {
    pub team_a: TeamId,
    pub team_b: TeamId,
    pub a_wins: u32,
    pub b_wins: u32,
    pub draws: u32,
}

/// Round-robin head-to-head registry, updated once per completed match.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeadToHead(Vec<HeadToHeadEntry>);

impl HeadToHead {
    fn entry_mut(&mut self, a: TeamId, b: TeamId) -> &mut HeadToHeadEntry {
        let (team_a, team_b) = (a.min(b), a.max(b));
        let idx = match self
            .0
            .iter()
            .position(|e| e.team_a == team_a && e.team_b == team_b)
        {
            Some(idx) => idx,
            None => {
                self.0.push(HeadToHeadEntry {
                    team_a,
                    team_b,
                    a_wins: 0,
                    b_wins: 0,
                    draws: 0,
                });
                self.0.len() - 1
            }
        };
        &mut self.0[idx]
    }

    pub fn get(&self, a: TeamId, b: TeamId) -> Option<&HeadToHeadEntry> {
        let (team_a, team_b) = (a.min(b), a.max(b));
        self.0
            .iter()
            .find(|e| e.team_a == team_a && e.team_b == team_b)
    }

    pub fn record_win(&mut self, winner: TeamId, loser: TeamId) {
        let entry = self.entry_mut(winner, loser);
        if entry.team_a == winner {
            entry.a_wins += 1;
        } else {
            entry.b_wins += 1;
        }
    }

    pub fn record_draw(&mut self, a: TeamId, b: TeamId) {
        self.entry_mut(a, b).draws += 1;
    }

    /// Wins of `a` against `b` compared to wins of `b` against `a`.
    /// `Greater` means `a` has the better head-to-head.
    pub fn compare(&self, a: TeamId, b: TeamId) -> Ordering {
        match self.get(a, b) {
            None => Ordering::Equal,
            Some(e) if e.team_a == a => e.a_wins.cmp(&e.b_wins),
            Some(e) => e.b_wins.cmp(&e.a_wins),
        }
    }

    pub fn entries(&self) -> &[HeadToHeadEntry] {
        &self.0
    }
}

/// Full state of one bracket: teams, match arena, records and format metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    pub id: BracketId,
    pub format: Format,
    pub best_of: BestOf,
    pub points: PointsTable,
    /// Teams in seeding order; a team's effective seed is its index + 1.
    pub teams: Vec<Team>,
    /// Match arena, indexed by `MatchId`. Advancement edges always point forward.
    pub matches: Vec<Match>,
    /// Elimination formats: first-round slots (next power of two). Otherwise the team count.
    pub bracket_size: u32,
    /// Elimination: upper/main rounds. Swiss: configured rounds. Round robin and GSL: scheduled rounds.
    pub total_rounds: u32,
    /// Swiss: latest paired round. Other formats: equal to `total_rounds`.
    pub current_round: u32,
    /// Double elimination: the grand final reset match has been appended.
    pub reset_occurred: bool,
    pub double_leg: bool,
    /// One record per team, in seeding order.
    pub records: Vec<PlayerRecord>,
    pub pairings: PairingHistory,
    pub head_to_head: HeadToHead,
}

impl Bracket {
    /// Empty bracket for already-ordered teams.
    pub fn new(format: Format, best_of: BestOf, teams: Vec<Team>) -> Self {
        let records = teams.iter().map(|t| PlayerRecord::new(t.id)).collect();
        let size = teams.len() as u32;
        Self {
            id: Uuid::new_v4(),
            format,
            best_of,
            points: PointsTable::for_format(format),
            teams,
            matches: Vec::new(),
            bracket_size: size,
            total_rounds: 0,
            current_round: 0,
            reset_occurred: false,
            double_leg: false,
            records,
            pairings: PairingHistory::default(),
            head_to_head: HeadToHead::default(),
        }
    }

    pub fn get_match(&self, id: MatchId) -> Option<&Match> {
        self.matches.get(id.0)
    }

    pub fn get_match_mut(&mut self, id: MatchId) -> Option<&mut Match> {
        self.matches.get_mut(id.0)
    }

    /// Id the next pushed match will get.
    pub fn next_match_id(&self) -> MatchId {
        MatchId(self.matches.len())
    }

    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    /// Effective seed (1-based position in seeding order).
    pub fn seed_of(&self, id: TeamId) -> u32 {
        self.teams
            .iter()
            .position(|t| t.id == id)
            .map(|idx| idx as u32 + 1)
            .unwrap_or(u32::MAX)
    }

    pub fn record(&self, id: TeamId) -> Option<&PlayerRecord> {
        self.records.iter().find(|r| r.team_id == id)
    }

    pub fn record_mut(&mut self, id: TeamId) -> Option<&mut PlayerRecord> {
        self.records.iter_mut().find(|r| r.team_id == id)
    }

    pub fn matches_in_round(&self, round: u32) -> impl Iterator<Item = &Match> {
        self.matches.iter().filter(move |m| m.round == round)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// What one applied result changed.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct AdvancementEffects {
    pub completed: Option<MatchId>,
    /// Matches that became `Pending` (both teams known) because of this result.
    pub unlocked: Vec<MatchId>,
    /// Teams knocked out by this result.
    pub eliminated: Vec<TeamId>,
    /// Double elimination: the reset match appended by this result.
    pub reset_match: Option<MatchId>,
    pub bracket_complete: bool,
}

/// Played-match progress. Bye matches are not counted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub completed_matches: usize,
    pub total_matches: usize,
    pub percentage: f64,
    pub is_complete: bool,
}

/// Finishing range in an elimination format (e.g. 3rd-4th).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub from: u32,
    pub to: u32,
}

/// Tiebreak values shown next to a standing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Tiebreakers {
    pub buchholz: f64,
    pub sonneborn_berger: f64,
    pub goal_difference: i64,
}

/// One row of a ranked standings table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub rank: u32,
    pub team_id: TeamId,
    pub seed: u32,
    pub record: PlayerRecord,
    pub tiebreakers: Tiebreakers,
    /// Elimination and GSL: settled finishing range, `None` while still alive.
    pub placement: Option<Placement>,
}
