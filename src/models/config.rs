//! Format configuration: best-of token, points tables, per-format settings.

use crate::models::bracket::{BracketError, Format};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Series length token. Validated here, interpreted by whoever scores the games.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum BestOf {
    #[default]
    #[serde(rename = "BO1")]
    Bo1,
    #[serde(rename = "BO3")]
    Bo3,
    #[serde(rename = "BO5")]
    Bo5,
    #[serde(rename = "BO7")]
    Bo7,
    #[serde(rename = "BO9")]
    Bo9,
}

impl BestOf {
    pub fn games(self) -> u32 {
        match self {
            BestOf::Bo1 => 1,
            BestOf::Bo3 => 3,
            BestOf::Bo5 => 5,
            BestOf::Bo7 => 7,
            BestOf::Bo9 => 9,
        }
    }

    pub fn wins_needed(self) -> u32 {
        self.games() / 2 + 1
    }
}

impl FromStr for BestOf {
    type Err = BracketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BO1" => Ok(BestOf::Bo1),
            "BO3" => Ok(BestOf::Bo3),
            "BO5" => Ok(BestOf::Bo5),
            "BO7" => Ok(BestOf::Bo7),
            "BO9" => Ok(BestOf::Bo9),
            _ => Err(BracketError::InvalidBestOf(s.to_string())),
        }
    }
}

impl fmt::Display for BestOf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BO{}", self.games())
    }
}

/// Points awarded per outcome.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointsTable {
    pub win: f64,
    pub draw: f64,
    pub loss: f64,
    pub bye: f64,
}

impl PointsTable {
    pub fn for_format(format: Format) -> Self {
        match format {
            Format::Swiss => Self {
                win: 1.0,
                draw: 0.5,
                loss: 0.0,
                bye: 1.0,
            },
            Format::RoundRobin => Self {
                win: 3.0,
                draw: 1.0,
                loss: 0.0,
                bye: 0.0,
            },
            Format::SingleElimination | Format::DoubleElimination | Format::Gsl => Self {
                win: 1.0,
                draw: 0.0,
                loss: 0.0,
                bye: 0.0,
            },
        }
    }
}

/// How each group of a group stage is played.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubFormat {
    #[default]
    RoundRobin,
    /// Four-team double-elimination mini bracket; other group sizes fall back to round robin.
    Gsl,
}

/// Bracket the group stage's advancing teams are seeded into.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayoffFormat {
    #[default]
    SingleElimination,
    DoubleElimination,
}

fn default_group_count() -> u32 {
    4
}

fn default_advance_per_group() -> u32 {
    2
}

fn default_playoff_format() -> Option<PlayoffFormat> {
    Some(PlayoffFormat::SingleElimination)
}

/// Settings of a group stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupStageConfig {
    #[serde(default = "default_group_count")]
    pub group_count: u32,
    #[serde(default = "default_advance_per_group")]
    pub advance_per_group: u32,
    #[serde(default)]
    pub best_of: BestOf,
    #[serde(default)]
    pub sub_format: SubFormat,
    /// Built automatically once every group is finalized.
    #[serde(default = "default_playoff_format")]
    pub playoff_format: Option<PlayoffFormat>,
}

impl Default for GroupStageConfig {
    fn default() -> Self {
        Self {
            group_count: default_group_count(),
            advance_per_group: default_advance_per_group(),
            best_of: BestOf::Bo1,
            sub_format: SubFormat::RoundRobin,
            playoff_format: default_playoff_format(),
        }
    }
}

/// One-stage format selection, e.g. `{"format": "swiss", "rounds": 5, "best_of": "BO3"}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum FormatConfig {
    SingleElimination {
        #[serde(default)]
        best_of: BestOf,
    },
    DoubleElimination {
        #[serde(default)]
        best_of: BestOf,
    },
    Swiss {
        #[serde(default)]
        rounds: Option<u32>,
        #[serde(default)]
        best_of: BestOf,
    },
    RoundRobin {
        #[serde(default)]
        best_of: BestOf,
        #[serde(default)]
        double_leg: bool,
    },
}

impl Default for FormatConfig {
    fn default() -> Self {
        FormatConfig::SingleElimination {
            best_of: BestOf::Bo3,
        }
    }
}

impl FormatConfig {
    pub fn best_of(&self) -> BestOf {
        match self {
            FormatConfig::SingleElimination { best_of }
            | FormatConfig::DoubleElimination { best_of }
            | FormatConfig::Swiss { best_of, .. }
            | FormatConfig::RoundRobin { best_of, .. } => *best_of,
        }
    }

    pub fn set_best_of(&mut self, value: BestOf) {
        match self {
            FormatConfig::SingleElimination { best_of }
            | FormatConfig::DoubleElimination { best_of }
            | FormatConfig::Swiss { best_of, .. }
            | FormatConfig::RoundRobin { best_of, .. } => *best_of = value,
        }
    }
}
