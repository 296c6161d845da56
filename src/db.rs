use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::America::Toronto;
use rand::Rng;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::error::{LeaderboardError, Result};
use crate::models::{LeaderboardType, Snapshot, StandingEntry, TeamScore};
use crate::{delta, rank};

/// The only collection snapshots may be written to or read from.
pub const COLLECTION: &str = "leaderboard";

pub const TIMESTAMP_FORMAT: &str = "%b %d %Y %I:%M:%S %p";

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    fn collection_name(&self) -> &str;

    async fn insert_one(&self, snapshot: &Snapshot) -> Result<()>;

    /// Most recently inserted snapshot of `kind`.
    async fn find_latest(&self, kind: LeaderboardType) -> Result<Option<Snapshot>>;

    async fn count_documents(&self, kind: LeaderboardType) -> Result<i64>;
}

pub fn ensure_collection(store: &dyn SnapshotStore) -> Result<()> {
    if store.collection_name() != COLLECTION {
        return Err(LeaderboardError::InvalidCollection {
            name: store.collection_name().to_string(),
        });
    }
    Ok(())
}

/// Local Eastern time (EST or EDT, whichever is in effect at `now`).
pub fn eastern_timestamp(now: DateTime<Utc>) -> String {
    now.with_timezone(&Toronto).format(TIMESTAMP_FORMAT).to_string()
}

/// Appends a new snapshot. Existing documents are never touched.
pub async fn publish(
    store: &dyn SnapshotStore,
    kind: LeaderboardType,
    data: Vec<StandingEntry>,
) -> Result<Snapshot> {
    ensure_collection(store)?;

    let snapshot = Snapshot {
        kind,
        timestamp: eastern_timestamp(Utc::now()),
        data,
    };
    store.insert_one(&snapshot).await?;
    info!(kind = %kind, teams = snapshot.data.len(), timestamp = %snapshot.timestamp, "published snapshot");
    Ok(snapshot)
}

pub async fn latest(store: &dyn SnapshotStore, kind: LeaderboardType) -> Result<Option<Snapshot>> {
    ensure_collection(store)?;

    if store.count_documents(kind).await? == 0 {
        return Ok(None);
    }
    store.find_latest(kind).await
}

pub struct PgSnapshotStore {
    pool: PgPool,
    collection: String,
}

impl PgSnapshotStore {
    pub fn new(pool: PgPool, collection: impl Into<String>) -> Self {
        Self {
            pool,
            collection: collection.into(),
        }
    }
}

#[async_trait]
impl SnapshotStore for PgSnapshotStore {
    fn collection_name(&self) -> &str {
        &self.collection
    }

    async fn insert_one(&self, snapshot: &Snapshot) -> Result<()> {
        let query = format!(
            "INSERT INTO {} (id, type, timestamp, recorded_at, data) VALUES ($1, $2, $3, $4, $5)",
            self.collection
        );
        sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(snapshot.kind.as_str())
            .bind(&snapshot.timestamp)
            .bind(Utc::now())
            .bind(Json(&snapshot.data))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_latest(&self, kind: LeaderboardType) -> Result<Option<Snapshot>> {
        let query = format!(
            "SELECT type, timestamp, data FROM {} WHERE type = $1 ORDER BY recorded_at DESC LIMIT 1",
            self.collection
        );
        let row = sqlx::query(&query)
            .bind(kind.as_str())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let stored_type: String = row.try_get("type")?;
        let kind = stored_type
            .parse::<LeaderboardType>()
            .map_err(|err| sqlx::Error::Decode(err.into()))?;
        let Json(data): Json<Vec<StandingEntry>> = row.try_get("data")?;

        Ok(Some(Snapshot {
            kind,
            timestamp: row.try_get("timestamp")?,
            data,
        }))
    }

    async fn count_documents(&self, kind: LeaderboardType) -> Result<i64> {
        let query = format!("SELECT COUNT(*) AS total FROM {} WHERE type = $1", self.collection);
        let total: i64 = sqlx::query(&query)
            .bind(kind.as_str())
            .fetch_one(&self.pool)
            .await?
            .try_get("total")?;
        Ok(total)
    }
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Random standings for one leaderboard type, ranked and rounded like a real
/// run. Final scores draw from a lower ceiling so bonuses matter.
pub fn mock_standings(kind: LeaderboardType, num_of_teams: usize, rng: &mut impl Rng) -> Vec<StandingEntry> {
    let ceiling = if kind.has_bonus() { 94.0 } else { 100.0 };

    let teams: Vec<TeamScore> = (1..=num_of_teams)
        .map(|idx| {
            let score: f64 = (0..3).map(|_| rng.random_range(0.0..ceiling)).sum();
            let mut team = TeamScore::new(format!("Team-{idx}"), score, rng.random_range(1..40));
            if kind.has_bonus() {
                let bonus = rng.random_range(0.1..2.0_f64).powi(rng.random_range(1..4));
                team.bonus = Some(bonus);
                team.final_score = Some(score * bonus);
            }
            team
        })
        .collect();

    rank::rank(teams, kind, num_of_teams)
        .into_iter()
        .map(|team| StandingEntry {
            delta: delta::format_delta(rng.random_range(-12..12)),
            ..StandingEntry::from(team)
        })
        .collect()
}

pub async fn seed(store: &dyn SnapshotStore, num_of_teams: usize) -> Result<Vec<Snapshot>> {
    let mut snapshots = Vec::new();
    for kind in LeaderboardType::ALL {
        let data = mock_standings(kind, num_of_teams, &mut rand::rng());
        snapshots.push(publish(store, kind, data).await?);
    }
    Ok(snapshots)
}

#[cfg(test)]
pub mod memory {
    use std::sync::Mutex;

    use super::*;

    /// Append-only store kept in memory, newest last.
    pub struct InMemorySnapshotStore {
        collection: String,
        documents: Mutex<Vec<Snapshot>>,
    }

    impl InMemorySnapshotStore {
        pub fn new() -> Self {
            Self::named(COLLECTION)
        }

        pub fn named(collection: &str) -> Self {
            Self {
                collection: collection.to_string(),
                documents: Mutex::new(Vec::new()),
            }
        }

        pub fn documents(&self) -> Vec<Snapshot> {
            self.documents.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SnapshotStore for InMemorySnapshotStore {
        fn collection_name(&self) -> &str {
            &self.collection
        }

        async fn insert_one(&self, snapshot: &Snapshot) -> Result<()> {
            self.documents.lock().unwrap().push(snapshot.clone());
            Ok(())
        }

        async fn find_latest(&self, kind: LeaderboardType) -> Result<Option<Snapshot>> {
            Ok(self
                .documents
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|doc| doc.kind == kind)
                .cloned())
        }

        async fn count_documents(&self, kind: LeaderboardType) -> Result<i64> {
            Ok(self.documents.lock().unwrap().iter().filter(|doc| doc.kind == kind).count() as i64)
        }
    }
}
