use tracing::debug;

use crate::models::{MergedTable, SourceScore, TeamScore};

/// Turns a team's per-competition scores into one unified score. Missing
/// scores count as zero and the result must not depend on source order.
pub trait ScorePolicy {
    fn combine(&self, sources: &[SourceScore]) -> f64;
}

/// Sums fractional competition metrics and reports them as a percentage.
#[derive(Debug, Clone, Copy)]
pub struct PercentSum;

pub const PERCENT_SCALE: f64 = 100.0;

impl ScorePolicy for PercentSum {
    fn combine(&self, sources: &[SourceScore]) -> f64 {
        let raw: f64 = sources.iter().filter_map(|source| source.score).sum();
        raw * PERCENT_SCALE
    }
}

pub fn total_attempts(sources: &[SourceScore]) -> i64 {
    sources.iter().filter_map(|source| source.attempts).sum()
}

/// Collapses the merged table into one score and attempt count per team.
/// A table with no non-null cell yields no rows.
pub fn aggregate_scores(table: &MergedTable, policy: &impl ScorePolicy) -> Vec<TeamScore> {
    if table.is_all_null() {
        return Vec::new();
    }

    table
        .rows
        .iter()
        .map(|row| {
            let absent: Vec<&str> = row
                .sources
                .iter()
                .filter(|source| source.score.is_none())
                .map(|source| source.source_id.as_str())
                .collect();
            if !absent.is_empty() {
                debug!(team = %row.name, absent = ?absent, "no score in some competitions");
            }
            TeamScore::new(row.name.clone(), policy.combine(&row.sources), total_attempts(&row.sources))
        })
        .collect()
}
