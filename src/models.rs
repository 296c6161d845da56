use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardType {
    Public,
    Private,
    Final,
}

impl LeaderboardType {
    pub const ALL: [LeaderboardType; 3] = [Self::Public, Self::Private, Self::Final];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Final => "final",
        }
    }

    /// Snapshot type whose latest document supplies the previous ranks.
    pub fn comparison_type(self) -> LeaderboardType {
        match self {
            Self::Public | Self::Private => Self::Public,
            Self::Final => Self::Private,
        }
    }

    pub fn has_bonus(self) -> bool {
        self == Self::Final
    }
}

impl fmt::Display for LeaderboardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeaderboardType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            "final" => Ok(Self::Final),
            other => Err(format!("unknown leaderboard type: {other}")),
        }
    }
}

/// One competition's contribution to a team. Both fields are `None` when the
/// team does not appear in that competition's export.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceScore {
    pub source_id: String,
    pub score: Option<f64>,
    pub attempts: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamRow {
    pub name: String,
    pub sources: Vec<SourceScore>,
}

/// Outer join of every competition export, one row per team name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedTable {
    pub source_ids: Vec<String>,
    pub rows: Vec<TeamRow>,
}

impl MergedTable {
    pub fn is_all_null(&self) -> bool {
        self.rows.iter().all(|row| {
            row.sources
                .iter()
                .all(|source| source.score.is_none() && source.attempts.is_none())
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamScore {
    pub name: String,
    pub score: f64,
    pub attempts: i64,
    pub bonus: Option<f64>,
    pub final_score: Option<f64>,
}

impl TeamScore {
    pub fn new(name: impl Into<String>, score: f64, attempts: i64) -> Self {
        Self {
            name: name.into(),
            score,
            attempts,
            bonus: None,
            final_score: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingEntry {
    pub name: String,
    pub score: f64,
    pub num_attempts: i64,
    pub delta: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_score: Option<f64>,
}

impl From<TeamScore> for StandingEntry {
    fn from(team: TeamScore) -> Self {
        Self {
            name: team.name,
            score: team.score,
            num_attempts: team.attempts,
            delta: "-".to_string(),
            bonus: team.bonus,
            final_score: team.final_score,
        }
    }
}

/// Persisted leaderboard document. Rank is `1 + position` in `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "type")]
    pub kind: LeaderboardType,
    pub timestamp: String,
    pub data: Vec<StandingEntry>,
}
