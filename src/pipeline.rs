use tracing::{debug, info};

use crate::aggregate::{aggregate_scores, PercentSum};
use crate::bonus::compute_final_scores;
use crate::config::Settings;
use crate::db::{self, SnapshotStore};
use crate::delta::with_deltas;
use crate::error::Result;
use crate::files::abs_file_paths;
use crate::merge::merge_competitions;
use crate::models::{LeaderboardType, MergedTable, Snapshot, StandingEntry};
use crate::rank::rank;

/// Aggregates, applies bonuses (final only), ranks and compares against the
/// latest snapshot of the comparison type. An all-null table gives an empty
/// list without touching the store.
pub async fn compute_standings(
    store: &dyn SnapshotStore,
    kind: LeaderboardType,
    table: &MergedTable,
    settings: &Settings,
) -> Result<Vec<StandingEntry>> {
    let scores = aggregate_scores(table, &PercentSum);
    if scores.is_empty() {
        return Ok(Vec::new());
    }

    db::ensure_collection(store)?;

    let scores = if kind.has_bonus() {
        compute_final_scores(scores, &settings.mapping_path(), &settings.bonus_dir(), settings.bonus_weight)?
    } else {
        scores
    };

    let ranked = rank(scores, kind, settings.size);
    let compare_to = kind.comparison_type();
    let prior = db::latest(store, compare_to).await?;
    debug!(kind = %kind, compare_to = %compare_to, has_prior = prior.is_some(), "computing rank deltas");

    Ok(with_deltas(ranked, prior.as_ref()))
}

/// Reads the competition folder for `kind` and computes its standings,
/// applying the configured empty-standings policy.
pub async fn build_standings(
    store: &dyn SnapshotStore,
    kind: LeaderboardType,
    settings: &Settings,
) -> Result<Vec<StandingEntry>> {
    let source_dir = settings.competitions_dir(kind);
    let paths = abs_file_paths(&source_dir, "csv")?;
    info!(kind = %kind, files = paths.len(), dir = %source_dir.display(), "merging competition exports");

    let table = merge_competitions(&paths)?;
    let standings = compute_standings(store, kind, &table, settings).await?;
    settings.empty_policy.check(kind, &standings, &source_dir)?;

    info!(kind = %kind, teams = standings.len(), "standings ready");
    Ok(standings)
}

pub async fn publish_standings(
    store: &dyn SnapshotStore,
    kind: LeaderboardType,
    settings: &Settings,
) -> Result<Snapshot> {
    let standings = build_standings(store, kind, settings).await?;
    db::publish(store, kind, standings).await
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::config::EmptyPolicy;
    use crate::db::memory::InMemorySnapshotStore;
    use crate::error::LeaderboardError;
    use crate::merge::{outer_join, CompetitionRow};
    use crate::models::TeamScore;
    use pretty_assertions::assert_eq;

    fn write(path: &Path, body: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    fn sample_data_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for folder in ["public/csv", "private"] {
            write(
                &dir.path().join(folder).join("comp1.csv"),
                "TeamName,Score,SubmissionCount\nAlpha,0.50,3\nBeta,0.40,5\n",
            );
            write(
                &dir.path().join(folder).join("comp2.csv"),
                "TeamName,Score,SubmissionCount\nAlpha,0.30,2\nBeta,0.45,1\n",
            );
        }
        write(
            &dir.path().join("final").join("mapping.csv"),
            "Email,Team,Team Size\nal@uni.ca,Alpha,2\nalex@uni.ca,Alpha,2\nbe@uni.ca,Beta,3\n",
        );
        write(
            &dir.path().join("final").join("bonus").join("kickoff.csv"),
            "Email\nal@uni.ca\nbe@uni.ca\n",
        );
        dir
    }

    fn settings_for(dir: &Path) -> Settings {
        Settings {
            data_dir: dir.to_path_buf(),
            ..Settings::default()
        }
    }

    fn summary(standings: &[StandingEntry]) -> Vec<(&str, f64, i64, &str)> {
        standings
            .iter()
            .map(|e| (e.name.as_str(), e.score, e.num_attempts, e.delta.as_str()))
            .collect()
    }

    #[tokio::test]
    async fn public_run_ranks_two_competitions() {
        let dir = sample_data_dir();
        let store = InMemorySnapshotStore::new();

        let standings = build_standings(&store, LeaderboardType::Public, &settings_for(dir.path()))
            .await
            .unwrap();
        assert_eq!(summary(&standings), vec![("Beta", 85.0, 6, "-"), ("Alpha", 80.0, 5, "-")]);
        assert!(standings.iter().all(|e| e.bonus.is_none()));
        assert!(store.documents().is_empty());
    }

    #[tokio::test]
    async fn final_run_applies_attendance_bonus_and_compares_to_private() {
        let dir = sample_data_dir();
        let store = InMemorySnapshotStore::new();
        let settings = settings_for(dir.path());

        db::publish(
            &store,
            LeaderboardType::Private,
            vec![
                StandingEntry::from(TeamScore::new("Beta", 85.0, 6)),
                StandingEntry::from(TeamScore::new("Alpha", 80.0, 5)),
            ],
        )
        .await
        .unwrap();
        db::publish(
            &store,
            LeaderboardType::Public,
            vec![StandingEntry::from(TeamScore::new("Alpha", 80.0, 5))],
        )
        .await
        .unwrap();

        let standings = build_standings(&store, LeaderboardType::Final, &settings).await.unwrap();
        assert_eq!(standings[0].name, "Beta");
        assert_eq!(standings[0].bonus, Some(1.02));
        assert_eq!(standings[0].final_score, Some(86.7));
        assert_eq!(standings[0].delta, "-");
        assert_eq!(standings[1].name, "Alpha");
        assert_eq!(standings[1].bonus, Some(1.03));
        assert_eq!(standings[1].final_score, Some(82.4));
    }

    #[tokio::test]
    async fn private_run_compares_to_latest_public() {
        let dir = sample_data_dir();
        let store = InMemorySnapshotStore::new();
        db::publish(
            &store,
            LeaderboardType::Public,
            vec![
                StandingEntry::from(TeamScore::new("Beta", 1.0, 1)),
                StandingEntry::from(TeamScore::new("Alpha", 1.0, 1)),
            ],
        )
        .await
        .unwrap();
        db::publish(
            &store,
            LeaderboardType::Public,
            vec![
                StandingEntry::from(TeamScore::new("Alpha", 1.0, 1)),
                StandingEntry::from(TeamScore::new("Beta", 1.0, 1)),
            ],
        )
        .await
        .unwrap();

        let snapshot = publish_standings(&store, LeaderboardType::Private, &settings_for(dir.path()))
            .await
            .unwrap();
        assert_eq!(summary(&snapshot.data), vec![("Beta", 85.0, 6, "+1"), ("Alpha", 80.0, 5, "-1")]);
        assert_eq!(store.count_documents(LeaderboardType::Private).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn all_null_table_is_empty_without_store_checks() {
        let store = InMemorySnapshotStore::named("wrong");
        let table = outer_join(
            MergedTable::default(),
            "comp1",
            vec![CompetitionRow {
                team_name: "Alpha".to_string(),
                score: None,
                submission_count: None,
            }],
        );
        let standings = compute_standings(&store, LeaderboardType::Private, &table, &Settings::default())
            .await
            .unwrap();
        assert!(standings.is_empty());
    }

    #[tokio::test]
    async fn empty_folder_follows_policy_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("public").join("csv")).unwrap();
        let store = InMemorySnapshotStore::new();

        let err = publish_standings(&store, LeaderboardType::Public, &settings_for(dir.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, LeaderboardError::EmptyStandings { .. }));
        assert!(store.documents().is_empty());

        let settings = Settings {
            empty_policy: EmptyPolicy::Allow,
            ..settings_for(dir.path())
        };
        let snapshot = publish_standings(&store, LeaderboardType::Public, &settings).await.unwrap();
        assert!(snapshot.data.is_empty());
    }

    #[tokio::test]
    async fn final_without_mapping_fails_before_publishing() {
        let dir = sample_data_dir();
        std::fs::remove_file(dir.path().join("final").join("mapping.csv")).unwrap();
        let store = InMemorySnapshotStore::new();

        let err = publish_standings(&store, LeaderboardType::Final, &settings_for(dir.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, LeaderboardError::FileDoesNotExist { .. }));
        assert!(store.documents().is_empty());
    }

    #[tokio::test]
    async fn wrong_collection_is_fatal() {
        let dir = sample_data_dir();
        let store = InMemorySnapshotStore::named("leaderboards");
        let err = build_standings(&store, LeaderboardType::Public, &settings_for(dir.path()))
            .await
            .unwrap_err();
        assert!(matches!(err, LeaderboardError::InvalidCollection { .. }));
    }

    #[tokio::test]
    async fn page_size_truncates_output() {
        let dir = sample_data_dir();
        let store = InMemorySnapshotStore::new();
        let settings = Settings {
            size: 1,
            ..settings_for(dir.path())
        };
        let standings = build_standings(&store, LeaderboardType::Public, &settings).await.unwrap();
        assert_eq!(standings.len(), 1);
        assert_eq!(standings[0].name, "Beta");
    }
}
