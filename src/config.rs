use std::path::{Path, PathBuf};

use crate::bonus::EVENT_BONUS_WEIGHT;
use crate::error::{LeaderboardError, Result};
use crate::models::{LeaderboardType, StandingEntry};
use crate::rank::MAX_NUM_OF_TEAMS;

pub const ROOT_FOLDER_PATH: &str = "data";

/// What to do when a run produces no standings at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EmptyPolicy {
    /// Refuse empty standings for every type.
    Reject,
    /// Refuse only empty public standings.
    PublicOnly,
    /// Accept empty standings.
    Allow,
}

impl EmptyPolicy {
    pub fn check(self, kind: LeaderboardType, standings: &[StandingEntry], source_dir: &Path) -> Result<()> {
        let rejects = match self {
            Self::Reject => true,
            Self::PublicOnly => kind == LeaderboardType::Public,
            Self::Allow => false,
        };

        if !standings.is_empty() || !rejects {
            return Ok(());
        }

        let hint = match kind {
            LeaderboardType::Public => "review the competitions on the platform".to_string(),
            LeaderboardType::Private | LeaderboardType::Final => {
                format!("review the CSV files in {}", source_dir.display())
            }
        };
        Err(LeaderboardError::EmptyStandings { kind, hint })
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    /// Overrides the per-type competition folder when set.
    pub competitions_dir: Option<PathBuf>,
    pub size: usize,
    pub bonus_weight: f64,
    pub empty_policy: EmptyPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(ROOT_FOLDER_PATH),
            competitions_dir: None,
            size: MAX_NUM_OF_TEAMS,
            bonus_weight: EVENT_BONUS_WEIGHT,
            empty_policy: EmptyPolicy::Reject,
        }
    }
}

impl Settings {
    pub fn competitions_dir(&self, kind: LeaderboardType) -> PathBuf {
        if let Some(dir) = &self.competitions_dir {
            return dir.clone();
        }
        match kind {
            LeaderboardType::Public => self.data_dir.join("public").join("csv"),
            LeaderboardType::Private | LeaderboardType::Final => self.data_dir.join("private"),
        }
    }

    pub fn mapping_path(&self) -> PathBuf {
        self.data_dir.join("final").join("mapping.csv")
    }

    pub fn bonus_dir(&self) -> PathBuf {
        self.data_dir.join("final").join("bonus")
    }
}
