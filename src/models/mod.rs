//! Data structures for the bracket engine: teams, matches, brackets, group stages.

mod bracket;
mod config;
mod game;
mod group;
mod team;

pub use bracket::{
    AdvancementEffects, Bracket, BracketError, BracketId, Format, HeadToHead, HeadToHeadEntry,
    PairingHistory, Placement, Progress, Standing, Tiebreakers,
};
pub use config::{BestOf, FormatConfig, GroupStageConfig, PlayoffFormat, PointsTable, SubFormat};
pub use game::{BracketSection, Match, MatchId, MatchResult, MatchStatus, Score, Slot, SlotRef};
pub use group::{AdvancingTeam, Group, GroupProgress, GroupStage, StagePhase, StageProgress};
pub use team::{PlayerRecord, Team, TeamId};
