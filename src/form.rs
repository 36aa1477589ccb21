//! Rolling form: trailing-window statistics for every team observation, computed strictly from
//! the observations that precede it.
//!
//! Each team's observations are ordered by `(date, match_index)`. Because the match index is the
//! position of the match after a stable date sort, matches sharing a timestamp are ordered by
//! their ingestion order. The snapshot at position _k_ of a team's timeline summarises positions
//! `max(0, k - N)..k`; the observation at _k_ itself never contributes.

use std::num::NonZeroUsize;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::expand::TeamObservation;

/// Window-bounded averages and rates over a team's preceding observations.
#[derive(Clone, Debug, PartialEq)]
pub struct RollingSnapshot {
    /// Number of observations folded into this snapshot.
    pub window_len: usize,
    pub goals_for_avg: f64,
    pub goals_against_avg: f64,
    pub goal_diff_avg: f64,
    pub win_rate: f64,
    pub points_avg: f64,
    /// Sum (not mean) of points over the window.
    pub momentum: f64,
    pub clean_sheet_rate: f64,
    pub conceded_avg: f64,
    /// Points weighted linearly by recency: the oldest observation has weight 1, the most
    /// recent has weight `window_len`.
    pub weighted_points: f64,
}
impl RollingSnapshot {
    /// Summarises a window ordered from oldest to most recent. An empty window has no snapshot.
    pub fn summarise(window: &[&TeamObservation]) -> Option<Self> {
        if window.is_empty() {
            return None;
        }

        let len = window.len() as f64;
        let (mut goals_for, mut goals_against, mut goal_diff) = (0.0, 0.0, 0.0);
        let (mut wins, mut points, mut clean_sheets) = (0.0, 0.0, 0.0);
        let (mut weighted_points, mut weight_sum) = (0.0, 0.0);
        for (index, observation) in window.iter().enumerate() {
            let weight = (index + 1) as f64;
            let observation_points = observation.points() as f64;
            goals_for += observation.goals_for as f64;
            goals_against += observation.goals_against as f64;
            goal_diff += observation.goal_diff() as f64;
            if observation.outcome().signum() > 0 {
                wins += 1.0;
            }
            if observation.clean_sheet() {
                clean_sheets += 1.0;
            }
            points += observation_points;
            weighted_points += observation_points * weight;
            weight_sum += weight;
        }

        Some(Self {
            window_len: window.len(),
            goals_for_avg: goals_for / len,
            goals_against_avg: goals_against / len,
            goal_diff_avg: goal_diff / len,
            win_rate: wins / len,
            points_avg: points / len,
            momentum: points,
            clean_sheet_rate: clean_sheets / len,
            conceded_avg: goals_against / len,
            weighted_points: weighted_points / weight_sum,
        })
    }
}

/// Indices into `observations`, grouped by team and ordered chronologically within each team.
pub fn timelines(observations: &[TeamObservation]) -> FxHashMap<&str, Vec<usize>> {
    let mut timelines: FxHashMap<&str, Vec<usize>> = FxHashMap::default();
    for (index, observation) in observations.iter().enumerate() {
        timelines
            .entry(observation.team.as_str())
            .or_default()
            .push(index);
    }
    for indices in timelines.values_mut() {
        indices.sort_by_key(|&index| {
            let observation = &observations[index];
            (observation.date, observation.match_index)
        });
    }
    timelines
}

/// Annotates every observation with the snapshot of (up to) `window` observations of the same
/// team that precede it. The returned vector is parallel to `observations`; a team's first
/// observation has no snapshot.
pub fn annotate(observations: &[TeamObservation], window: NonZeroUsize) -> Vec<Option<RollingSnapshot>> {
    let window = window.get();
    let timelines = timelines(observations);
    let mut snapshots = vec![None; observations.len()];
    let mut prior = Vec::with_capacity(window);
    for indices in timelines.values() {
        for (position, &index) in indices.iter().enumerate() {
            let start = position.saturating_sub(window);
            prior.clear();
            prior.extend(indices[start..position].iter().map(|&prior_index| &observations[prior_index]));
            snapshots[index] = RollingSnapshot::summarise(&prior);
        }
    }
    debug!(
        "annotated {} observations across {} teams (window {window})",
        observations.len(),
        timelines.len()
    );
    snapshots
}

#[cfg(test)]
mod tests;
