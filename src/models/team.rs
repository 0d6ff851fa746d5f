//! Team and PlayerRecord data structures.

use serde::{Deserialize, Serialize};

/// Unique identifier for a team (supplied by the caller).
pub type TeamId = u64;

/// A team entered into a bracket. Immutable reference data.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    #[serde(alias = "name")]
    pub display_name: String,
    /// 1 = strongest. Unseeded teams are ordered after every seeded team.
    #[serde(default)]
    pub seed: Option<u32>,
}

impl Team {
    pub fn new(id: TeamId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            seed: None,
        }
    }

    pub fn seeded(id: TeamId, display_name: impl Into<String>, seed: u32) -> Self {
        Self {
            seed: Some(seed),
            ..Self::new(id, display_name)
        }
    }
}

/// Running record of one team inside a bracket.
///
/// Updated exactly once per completed match (or awarded bye) involving the team.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub team_id: TeamId,
    pub points: f64,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub matches_played: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    /// Swiss only: byes received so far.
    pub byes: u32,
}

impl PlayerRecord {
    pub fn new(team_id: TeamId) -> Self {
        Self {
            team_id,
            ..Self::default()
        }
    }

    pub fn goal_difference(&self) -> i64 {
        i64::from(self.goals_for) - i64::from(self.goals_against)
    }

    pub fn add_win(&mut self, points: f64) {
        self.wins += 1;
        self.matches_played += 1;
        self.points += points;
    }

    pub fn add_loss(&mut self, points: f64) {
        self.losses += 1;
        self.matches_played += 1;
        self.points += points;
    }

    pub fn add_draw(&mut self, points: f64) {
        self.draws += 1;
        self.matches_played += 1;
        self.points += points;
    }

    /// A bye counts as a played win worth `points`.
    pub fn add_bye(&mut self, points: f64) {
        self.byes += 1;
        self.wins += 1;
        self.matches_played += 1;
        self.points += points;
    }

    pub fn add_goals(&mut self, scored: u32, conceded: u32) {
        self.goals_for += scored;
        self.goals_against += conceded;
    }
}
