//! Testing helpers.

use std::num::NonZeroUsize;

use assert_float_eq::*;
use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::domain::MatchRecord;

/// Midnight UTC on the `n`-th day after the first matchday of a fictitious season.
pub fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap() + Duration::days(n)
}

/// A rolling window of `n` matches; panics on zero.
pub fn window(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

pub fn assert_slice_f64_relative(expected: &[f64], actual: &[f64], epsilon: f64) {
    assert_eq!(
        expected.len(),
        actual.len(),
        "lengths do not match: {} ≠ {}",
        expected.len(),
        actual.len()
    );
    for (index, &expected) in expected.iter().enumerate() {
        let actual = actual[index];
        if actual != expected {
            assert_float_relative_eq!(expected, actual, epsilon);
        }
    }
}

/// Six matches for Alpha with results W, L, D, W, L, W, on alternating venues.
pub fn alpha_season() -> Vec<MatchRecord> {
    vec![
        MatchRecord::finished(day(1), "Alpha", "Beta", 2, 0),
        MatchRecord::finished(day(8), "Gamma", "Alpha", 3, 1),
        MatchRecord::finished(day(15), "Alpha", "Delta", 1, 1),
        MatchRecord::finished(day(22), "Beta", "Alpha", 0, 2),
        MatchRecord::finished(day(29), "Alpha", "Gamma", 0, 1),
        MatchRecord::finished(day(36), "Delta", "Alpha", 1, 3),
    ]
}

/// A double round-robin between four teams, where stronger teams (lower index) tend to win.
pub fn round_robin() -> Vec<MatchRecord> {
    let teams = ["Alpha", "Beta", "Gamma", "Delta"];
    let mut matches = vec![];
    let mut matchday = 0;
    for leg in 0..2 {
        for (home_index, home) in teams.iter().enumerate() {
            for (away_index, away) in teams.iter().enumerate() {
                if home_index == away_index {
                    continue;
                }
                let home_goals = (3 + away_index as u8).saturating_sub(home_index as u8) % 4;
                let away_goals = ((away_index + leg) % 2) as u8;
                matches.push(MatchRecord::finished(day(matchday), *home, *away, home_goals, away_goals));
                matchday += 1;
            }
        }
    }
    matches
}
