//! Group stage: groups owning their own sub-brackets, plus the playoff bracket.

use crate::models::bracket::{Bracket, BracketId, Progress};
use crate::models::config::GroupStageConfig;
use crate::models::team::Team;
use serde::{Deserialize, Serialize};

/// A team that finished high enough in its group to reach the playoffs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdvancingTeam {
    pub team: Team,
    pub group_name: char,
    pub group_rank: u32,
    pub points: f64,
}

/// Current phase of a group stage.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StagePhase {
    #[default]
    Groups,
    Playoffs,
}

/// One group and its sub-bracket (round robin or GSL).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub index: usize,
    /// A, B, C, ...
    pub name: char,
    pub bracket: Bracket,
    pub finalized: bool,
    pub advancing: Vec<AdvancingTeam>,
}

/// Full group stage state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupStage {
    pub id: BracketId,
    pub config: GroupStageConfig,
    pub groups: Vec<Group>,
    /// Teams advancing from every finalized group, in finalization order.
    pub advancing: Vec<AdvancingTeam>,
    pub phase: StagePhase,
    pub playoff: Option<Bracket>,
}

impl GroupStage {
    pub fn group(&self, index: usize) -> Option<&Group> {
        self.groups.get(index)
    }

    pub fn all_groups_finalized(&self) -> bool {
        self.groups.iter().all(|g| g.finalized)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Completion of one group (for progress reporting).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupProgress {
    pub group_name: char,
    pub completed_matches: usize,
    pub total_matches: usize,
    pub percentage: f64,
}

/// Progress of a whole group stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageProgress {
    pub groups: Vec<GroupProgress>,
    /// All group matches together.
    pub overall: Progress,
    pub playoff: Option<Progress>,
}
