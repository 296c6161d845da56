use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::error::{LeaderboardError, Result};
use crate::files::has_extension;
use crate::models::{MergedTable, SourceScore, TeamRow};

/// The three columns kept from a competition leaderboard export. Any other
/// columns in the file are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct CompetitionRow {
    #[serde(rename = "TeamName")]
    pub team_name: String,
    #[serde(rename = "Score", default, deserialize_with = "missing_or_score")]
    pub score: Option<f64>,
    #[serde(rename = "SubmissionCount", default, deserialize_with = "missing_or_count")]
    pub submission_count: Option<i64>,
}

/// Cell values exports use for "no value". They are read as missing, not as
/// errors or NaN.
const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>", "N/A",
    "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn present_cell<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .map(|value| value.trim().to_string())
        .filter(|value| !MISSING_TOKENS.contains(&value.as_str())))
}

fn missing_or_score<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(cell) = present_cell(deserializer)? else {
        return Ok(None);
    };
    let value: f64 = cell
        .parse()
        .map_err(|_| serde::de::Error::custom(format!("invalid score: {cell}")))?;
    Ok(Some(value).filter(|score| !score.is_nan()))
}

fn missing_or_count<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(cell) = present_cell(deserializer)? else {
        return Ok(None);
    };
    if let Ok(count) = cell.parse::<i64>() {
        return Ok(Some(count));
    }
    // Columns holding a missing cell are sometimes written as floats ("3.0").
    match cell.parse::<f64>() {
        Ok(value) if value.is_nan() => Ok(None),
        Ok(value) if value.fract() == 0.0 && value.is_finite() => Ok(Some(value as i64)),
        _ => Err(serde::de::Error::custom(format!("invalid submission count: {cell}"))),
    }
}

pub fn load_competition(path: &Path) -> Result<Vec<CompetitionRow>> {
    if !has_extension(path, "csv") {
        return Err(LeaderboardError::InvalidFile {
            path: path.to_path_buf(),
        });
    }

    let mut reader = csv::Reader::from_path(path).map_err(|err| LeaderboardError::csv(path, err))?;
    let mut rows = Vec::new();
    for result in reader.deserialize::<CompetitionRow>() {
        rows.push(result.map_err(|err| LeaderboardError::csv(path, err))?);
    }
    Ok(rows)
}

/// Loads every export and outer-joins them on team name.
///
/// Every path is validated before any file is read, so a bad path never
/// leaves a half-merged table behind.
pub fn merge_competitions(paths: &[PathBuf]) -> Result<MergedTable> {
    if let Some(bad) = paths.iter().find(|path| !has_extension(path, "csv")) {
        return Err(LeaderboardError::InvalidFile { path: bad.clone() });
    }

    let mut table = MergedTable::default();
    let mut used_ids = HashSet::new();

    for path in paths {
        let rows = load_competition(path)?;
        let source_id = competition_id(path, &mut used_ids);
        debug!(source = %source_id, teams = rows.len(), "loaded competition export");
        table = outer_join(table, &source_id, rows);
    }

    Ok(table)
}

/// Competition id from the file stem, suffixed when two files share a stem.
fn competition_id(path: &Path, used: &mut HashSet<String>) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut candidate = stem.clone();
    let mut counter = 2;
    while !used.insert(candidate.clone()) {
        candidate = format!("{stem}-{counter}");
        counter += 1;
    }
    candidate
}

pub fn outer_join(mut table: MergedTable, source_id: &str, rows: Vec<CompetitionRow>) -> MergedTable {
    let prior_sources = table.source_ids.len();
    table.source_ids.push(source_id.to_string());

    let missing = |id: &str| SourceScore {
        source_id: id.to_string(),
        score: None,
        attempts: None,
    };

    for row in table.rows.iter_mut() {
        row.sources.push(missing(source_id));
    }

    let mut index: HashMap<String, usize> = table
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| (row.name.clone(), idx))
        .collect();
    let mut seen = HashSet::new();

    for row in rows {
        if !seen.insert(row.team_name.clone()) {
            warn!(source = source_id, team = %row.team_name, "duplicate team in export, keeping first row");
            continue;
        }

        let idx = *index.entry(row.team_name.clone()).or_insert_with(|| {
            let mut sources: Vec<SourceScore> = table.source_ids[..prior_sources]
                .iter()
                .map(|id| missing(id.as_str()))
                .collect();
            sources.push(missing(source_id));
            table.rows.push(TeamRow {
                name: row.team_name.clone(),
                sources,
            });
            table.rows.len() - 1
        });

        let slot = &mut table.rows[idx].sources[prior_sources];
        slot.score = row.score;
        slot.attempts = row.submission_count;
    }

    table
}
