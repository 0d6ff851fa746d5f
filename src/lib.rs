//! Tournament bracket engine: library with models and bracket logic.

pub mod logic;
pub mod models;

pub use logic::{
    apply_result, final_ranking, generate, is_complete, next_matches, progress, standings,
    validate_bracket,
};
pub use models::{
    AdvancementEffects, AdvancingTeam, BestOf, Bracket, BracketError, BracketId, BracketSection,
    Format, FormatConfig, Group, GroupProgress, GroupStage, GroupStageConfig, HeadToHead,
    HeadToHeadEntry, Match, MatchId, MatchResult, MatchStatus, PairingHistory, Placement,
    PlayerRecord, PlayoffFormat, PointsTable, Progress, Score, Slot, SlotRef, StagePhase,
    StageProgress, Standing, SubFormat, Team, TeamId, Tiebreakers,
};
