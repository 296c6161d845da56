use std::collections::HashMap;

use crate::models::{Snapshot, StandingEntry, TeamScore};

/// Renders a rank change: `-` for none, `+k` for a climb, `-k` for a drop.
pub fn format_delta(change: i64) -> String {
    match change {
        0 => "-".to_string(),
        up if up > 0 => format!("+{up}"),
        down => down.to_string(),
    }
}

/// Builds standings from ranked teams, comparing positions against `prior`.
/// Teams missing from `prior`, or every team when there is no prior snapshot,
/// get `-`.
pub fn with_deltas(ranked: Vec<TeamScore>, prior: Option<&Snapshot>) -> Vec<StandingEntry> {
    let mut previous: HashMap<&str, usize> = HashMap::new();
    if let Some(snapshot) = prior {
        for (idx, entry) in snapshot.data.iter().enumerate() {
            previous.entry(entry.name.as_str()).or_insert(idx);
        }
    }

    ranked
        .into_iter()
        .enumerate()
        .map(|(idx, team)| {
            let delta = previous
                .get(team.name.as_str())
                .map(|&prev| format_delta(prev as i64 - idx as i64))
                .unwrap_or_else(|| "-".to_string());
            StandingEntry {
                delta,
                ..StandingEntry::from(team)
            }
        })
        .collect()
}
