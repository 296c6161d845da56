use std::path::PathBuf;

use thiserror::Error;

use crate::models::LeaderboardType;

/// Failure kinds raised while building or storing a leaderboard.
///
/// All of these are detected before anything is written to the store.
#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("InvalidFile: {}", path.display())]
    InvalidFile { path: PathBuf },

    #[error("FileDoesNotExist: {}", path.display())]
    FileDoesNotExist { path: PathBuf },

    #[error("DirectoryDoesNotExist: {}", path.display())]
    DirectoryDoesNotExist { path: PathBuf },

    #[error("InvalidCollection: {name}")]
    InvalidCollection { name: String },

    #[error("InvalidMapping: {} row for team {team}: {message}", path.display())]
    InvalidMapping {
        path: PathBuf,
        team: String,
        message: String,
    },

    #[error("no standings for the {kind} leaderboard, {hint}")]
    EmptyStandings {
        kind: LeaderboardType,
        hint: String,
    },

    #[error("failed to read {}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl LeaderboardError {
    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, LeaderboardError>;
