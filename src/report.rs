use std::fmt::Write;

use crate::models::{LeaderboardType, Snapshot, StandingEntry};

fn headers(kind: LeaderboardType) -> Vec<&'static str> {
    let mut headers = vec!["Rank", "Name", "Score", "Attempts", "Delta"];
    if kind.has_bonus() {
        headers.extend(["Bonus", "Final Score"]);
    }
    headers
}

fn cells(rank: usize, entry: &StandingEntry, kind: LeaderboardType) -> Vec<String> {
    let mut cells = vec![
        rank.to_string(),
        entry.name.clone(),
        entry.score.to_string(),
        entry.num_attempts.to_string(),
        entry.delta.clone(),
    ];
    if kind.has_bonus() {
        cells.push(entry.bonus.map(|v| v.to_string()).unwrap_or_default());
        cells.push(entry.final_score.map(|v| v.to_string()).unwrap_or_default());
    }
    cells
}

/// Left-aligned text table of standings, rank taken from position.
pub fn render_table(kind: LeaderboardType, standings: &[StandingEntry]) -> String {
    let headers = headers(kind);
    let rows: Vec<Vec<String>> = standings
        .iter()
        .enumerate()
        .map(|(idx, entry)| cells(idx + 1, entry, kind))
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let border = widths
        .iter()
        .map(|w| "-".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("+");
    let _ = writeln!(output, "+{border}+");
    let header_line = headers
        .iter()
        .zip(&widths)
        .map(|(h, &w)| format!(" {h:<w$} "))
        .collect::<Vec<_>>()
        .join("|");
    let _ = writeln!(output, "|{header_line}|");
    let _ = writeln!(output, "+{border}+");

    if rows.is_empty() {
        let _ = writeln!(output, "No teams on this leaderboard.");
    }
    for row in &rows {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!(" {cell:<w$} "))
            .collect::<Vec<_>>()
            .join("|");
        let _ = writeln!(output, "|{line}|");
    }
    if !rows.is_empty() {
        let _ = writeln!(output, "+{border}+");
    }

    output
}

pub fn render_snapshot(snapshot: &Snapshot) -> String {
    let mut output = String::new();
    let title = capitalize(snapshot.kind.as_str());
    let _ = writeln!(output, "{title} Leaderboard ({})", snapshot.timestamp);
    output.push_str(&render_table(snapshot.kind, &snapshot.data));
    output
}

pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
