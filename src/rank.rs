use std::cmp::Ordering;

use crate::models::{LeaderboardType, TeamScore};

/// Maximum number of teams kept on a published leaderboard.
pub const MAX_NUM_OF_TEAMS: usize = 40;

/// Decimal places kept on scores, bonuses and final scores.
pub const DECIMALS: i32 = 5;

/// Rounds half away from zero to `DECIMALS` places.
pub fn round_decimals(value: f64) -> f64 {
    let factor = 10_f64.powi(DECIMALS);
    (value * factor).round() / factor
}

fn compare(kind: LeaderboardType, a: &TeamScore, b: &TeamScore) -> Ordering {
    let by_score = b.score.total_cmp(&a.score);
    let by_attempts = a.attempts.cmp(&b.attempts);

    match kind {
        LeaderboardType::Public | LeaderboardType::Private => by_score.then(by_attempts),
        LeaderboardType::Final => {
            let a_final = a.final_score.unwrap_or(a.score);
            let b_final = b.final_score.unwrap_or(b.score);
            b_final.total_cmp(&a_final).then(by_score).then(by_attempts)
        }
    }
}

/// Sorts, truncates to `size` and rounds. Rounding happens after the sort so
/// equal rounded values keep their pre-rounding order.
pub fn rank(mut teams: Vec<TeamScore>, kind: LeaderboardType, size: usize) -> Vec<TeamScore> {
    teams.sort_by(|a, b| compare(kind, a, b));
    teams.truncate(size);

    for team in teams.iter_mut() {
        team.score = round_decimals(team.score);
        team.bonus = team.bonus.map(round_decimals);
        team.final_score = team.final_score.map(round_decimals);
    }

    teams
}
