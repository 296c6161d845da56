use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{LeaderboardError, Result};
use crate::files::abs_file_paths;
use crate::models::TeamScore;

/// Multiplier weight a single event contributes for a fully present team.
pub const EVENT_BONUS_WEIGHT: f64 = 0.06;

#[derive(Debug, Clone, Deserialize)]
pub struct MappingRow {
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Team")]
    pub team: String,
    #[serde(rename = "Team Size")]
    pub team_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceRow {
    #[serde(rename = "Email")]
    pub email: String,
}

/// Share of one team that showed up to one event.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialBonus {
    pub team: String,
    pub team_size: u32,
    pub attendees: u32,
}

impl PartialBonus {
    pub fn fraction(&self) -> f64 {
        f64::from(self.attendees) / f64::from(self.team_size)
    }
}

pub fn load_mapping(path: &Path) -> Result<Vec<MappingRow>> {
    if !path.is_file() {
        return Err(LeaderboardError::FileDoesNotExist {
            path: path.to_path_buf(),
        });
    }

    let mut reader = csv::Reader::from_path(path).map_err(|err| LeaderboardError::csv(path, err))?;
    let mut rows = Vec::new();
    for result in reader.deserialize::<MappingRow>() {
        let row = result.map_err(|err| LeaderboardError::csv(path, err))?;
        if row.team_size == 0 {
            return Err(LeaderboardError::InvalidMapping {
                path: path.to_path_buf(),
                team: row.team,
                message: "team size must be at least 1".to_string(),
            });
        }
        rows.push(row);
    }
    Ok(rows)
}

pub fn load_attendance(path: &Path) -> Result<Vec<AttendanceRow>> {
    let mut reader = csv::Reader::from_path(path).map_err(|err| LeaderboardError::csv(path, err))?;
    reader
        .deserialize::<AttendanceRow>()
        .map(|result| result.map_err(|err| LeaderboardError::csv(path, err)))
        .collect()
}

/// Inner-joins one event's attendees against the mapping and counts attendees
/// per `(team, team size)`. Duplicate emails are counted every time they occur.
pub fn event_partial_bonuses(mapping: &[MappingRow], attendance: &[AttendanceRow]) -> Vec<PartialBonus> {
    let mut by_email: HashMap<&str, Vec<&MappingRow>> = HashMap::new();
    for row in mapping {
        by_email.entry(row.email.as_str()).or_default().push(row);
    }

    let mut counts: BTreeMap<(&str, u32), u32> = BTreeMap::new();
    for attendee in attendance {
        for row in by_email.get(attendee.email.as_str()).into_iter().flatten() {
            *counts.entry((row.team.as_str(), row.team_size)).or_insert(0) += 1;
        }
    }

    counts
        .into_iter()
        .map(|((team, team_size), attendees)| PartialBonus {
            team: team.to_string(),
            team_size,
            attendees,
        })
        .collect()
}

/// One fold step: multiplies each attending team's factor by
/// `1 + weight * fraction`. Teams not on the leaderboard are skipped.
pub fn apply_event(mut factors: HashMap<String, f64>, partials: &[PartialBonus], weight: f64) -> HashMap<String, f64> {
    for partial in partials {
        match factors.get_mut(&partial.team) {
            Some(factor) => *factor *= 1.0 + weight * partial.fraction(),
            None => debug!(team = %partial.team, "attending team has no leaderboard entry"),
        }
    }
    factors
}

/// Folds every event into a per-team bonus factor starting from 1.0.
pub fn accumulate_bonuses<'a>(
    teams: impl IntoIterator<Item = &'a str>,
    events: &[Vec<PartialBonus>],
    weight: f64,
) -> HashMap<String, f64> {
    let initial: HashMap<String, f64> = teams.into_iter().map(|team| (team.to_string(), 1.0)).collect();
    events
        .iter()
        .fold(initial, |factors, partials| apply_event(factors, partials, weight))
}

pub fn apply_bonuses(scores: Vec<TeamScore>, factors: &HashMap<String, f64>) -> Vec<TeamScore> {
    scores
        .into_iter()
        .map(|mut team| {
            let bonus = factors.get(&team.name).copied().unwrap_or(1.0);
            team.bonus = Some(bonus);
            team.final_score = Some(team.score * bonus);
            team
        })
        .collect()
}

/// Reads the mapping and every event file, then attaches `bonus` and
/// `final_score` to each team.
pub fn compute_final_scores(
    scores: Vec<TeamScore>,
    mapping_path: &Path,
    events_dir: &Path,
    weight: f64,
) -> Result<Vec<TeamScore>> {
    let mapping = load_mapping(mapping_path)?;

    let event_files: Vec<PathBuf> = abs_file_paths(events_dir, "csv")?;
    if event_files.is_empty() {
        return Err(LeaderboardError::FileDoesNotExist {
            path: events_dir.join("*.csv"),
        });
    }

    let mut events = Vec::with_capacity(event_files.len());
    for path in &event_files {
        let attendance = load_attendance(path)?;
        let partials = event_partial_bonuses(&mapping, &attendance);
        debug!(event = %path.display(), teams = partials.len(), "computed event attendance");
        events.push(partials);
    }

    let factors = accumulate_bonuses(scores.iter().map(|team| team.name.as_str()), &events, weight);
    info!(events = events.len(), teams = factors.len(), "applied attendance bonuses");
    Ok(apply_bonuses(scores, &factors))
}
