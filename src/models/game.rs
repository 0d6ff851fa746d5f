//! Match nodes, their status machine, and result submissions.

use crate::models::team::TeamId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a match inside its bracket's arena.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub usize);

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which of a match's two slots.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    One,
    Two,
}

impl Slot {
    /// Odd positions feed slot one, even positions slot two.
    pub fn from_position(position: u32) -> Self {
        if position % 2 == 1 {
            Slot::One
        } else {
            Slot::Two
        }
    }
}

/// Target of an advancement edge: a slot in a later match.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct SlotRef {
    pub match_id: MatchId,
    pub slot: Slot,
}

impl SlotRef {
    pub fn new(match_id: MatchId, slot: Slot) -> Self {
        Self { match_id, slot }
    }
}

/// Lifecycle of a match.
///
/// `Waiting -> Pending -> Completed`, or `Waiting -> Bye` when a slot can never be filled.
/// `Bye` and `Completed` are terminal.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// At least one slot is still unresolved.
    #[default]
    Waiting,
    /// Both slots filled, ready to play.
    Pending,
    /// One slot permanently absent; resolved as a walkover without play.
    Bye,
    Completed,
}

impl MatchStatus {
    /// Terminal: the match will never change again.
    pub fn is_resolved(self) -> bool {
        matches!(self, MatchStatus::Bye | MatchStatus::Completed)
    }
}

/// Part of the bracket a match belongs to. Ordered upper before lower before grand final.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketSection {
    /// Single elimination, Swiss and round robin matches.
    Main,
    Upper,
    Lower,
    GrandFinal,
    /// Matches of one group in a group stage, by group letter.
    Group(char),
}

/// Final score of a match, in slot order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub slot1: u32,
    pub slot2: u32,
}

/// A single node of the match graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub round: u32,
    /// 1-based position inside its round and section.
    pub position: u32,
    /// Display only.
    pub round_name: String,
    pub section: BracketSection,
    pub slot1: Option<TeamId>,
    pub slot2: Option<TeamId>,
    pub winner: Option<TeamId>,
    pub loser: Option<TeamId>,
    pub draw: bool,
    pub score: Option<Score>,
    pub status: MatchStatus,
    pub advance_winner_to: Option<SlotRef>,
    pub advance_loser_to: Option<SlotRef>,
}

impl Match {
    pub fn new(
        id: MatchId,
        round: u32,
        position: u32,
        round_name: impl Into<String>,
        section: BracketSection,
    ) -> Self {
        Self {
            id,
            round,
            position,
            round_name: round_name.into(),
            section,
            slot1: None,
            slot2: None,
            winner: None,
            loser: None,
            draw: false,
            score: None,
            status: MatchStatus::Waiting,
            advance_winner_to: None,
            advance_loser_to: None,
        }
    }

    /// A match whose two teams are known at creation.
    pub fn between(
        id: MatchId,
        round: u32,
        position: u32,
        round_name: impl Into<String>,
        section: BracketSection,
        slot1: TeamId,
        slot2: TeamId,
    ) -> Self {
        Self {
            slot1: Some(slot1),
            slot2: Some(slot2),
            status: MatchStatus::Pending,
            ..Self::new(id, round, position, round_name, section)
        }
    }

    pub fn slot(&self, slot: Slot) -> Option<TeamId> {
        match slot {
            Slot::One => self.slot1,
            Slot::Two => self.slot2,
        }
    }

    pub fn slot_mut(&mut self, slot: Slot) -> &mut Option<TeamId> {
        match slot {
            Slot::One => &mut self.slot1,
            Slot::Two => &mut self.slot2,
        }
    }

    pub fn involves(&self, team: TeamId) -> bool {
        self.slot1 == Some(team) || self.slot2 == Some(team)
    }

    /// The other team of a match `team` plays in.
    pub fn opponent_of(&self, team: TeamId) -> Option<TeamId> {
        if self.slot1 == Some(team) {
            self.slot2
        } else if self.slot2 == Some(team) {
            self.slot1
        } else {
            None
        }
    }

    pub fn teams(&self) -> impl Iterator<Item = TeamId> {
        self.slot1.into_iter().chain(self.slot2)
    }
}

/// A result submitted for one match.
///
/// For a draw, `winner` only has to name one of the two teams.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub match_id: MatchId,
    pub winner: TeamId,
    #[serde(default)]
    pub loser: Option<TeamId>,
    #[serde(default)]
    pub is_draw: bool,
    #[serde(default)]
    pub score: Option<Score>,
}

impl MatchResult {
    pub fn win(match_id: MatchId, winner: TeamId) -> Self {
        Self {
            match_id,
            winner,
            loser: None,
            is_draw: false,
            score: None,
        }
    }

    pub fn draw(match_id: MatchId, team: TeamId) -> Self {
        Self {
            is_draw: true,
            ..Self::win(match_id, team)
        }
    }

    pub fn with_loser(mut self, loser: TeamId) -> Self {
        self.loser = Some(loser);
        self
    }

    pub fn with_score(mut self, slot1: u32, slot2: u32) -> Self {
        self.score = Some(Score { slot1, slot2 });
        self
    }
}
