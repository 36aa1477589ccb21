//! Turns matches into team-centric observations.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::{MatchRecord, Side, TeamOutcome};

/// One match viewed from one team's perspective.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TeamObservation {
    /// Position of the source match in the prepared match list.
    pub match_index: usize,
    pub date: DateTime<Utc>,
    pub team: String,
    pub side: Side,
    pub goals_for: u8,
    pub goals_against: u8,
}
impl TeamObservation {
    pub fn is_home(&self) -> bool {
        self.side == Side::Home
    }

    pub fn outcome(&self) -> TeamOutcome {
        match self.goals_for.cmp(&self.goals_against) {
            std::cmp::Ordering::Greater => TeamOutcome::Win,
            std::cmp::Ordering::Equal => TeamOutcome::Draw,
            std::cmp::Ordering::Less => TeamOutcome::Loss,
        }
    }

    pub fn points(&self) -> u8 {
        self.outcome().points()
    }

    pub fn goal_diff(&self) -> i16 {
        self.goals_for as i16 - self.goals_against as i16
    }

    pub fn clean_sheet(&self) -> bool {
        self.goals_against == 0
    }
}

/// Keeps only finished matches and orders them by date. The sort is stable, so matches sharing a
/// timestamp retain their ingestion order; the resulting position is the match index used as the
/// secondary ordering key everywhere downstream.
pub fn prepare(matches: &[MatchRecord]) -> Vec<MatchRecord> {
    let mut prepared: Vec<_> = matches
        .iter()
        .filter(|record| record.is_finished())
        .cloned()
        .collect();
    prepared.sort_by_key(|record| record.date);
    debug!(
        "prepared {} finished matches out of {}",
        prepared.len(),
        matches.len()
    );
    prepared
}

/// Expands each match into its home-side and away-side observations, in that order. The match
/// index of each observation is the position of its match in `matches`.
pub fn expand(matches: &[MatchRecord]) -> Vec<TeamObservation> {
    let mut observations = Vec::with_capacity(matches.len() * 2);
    for (match_index, record) in matches.iter().enumerate() {
        for side in [Side::Home, Side::Away] {
            let (goals_for, goals_against) = record.goals(side);
            observations.push(TeamObservation {
                match_index,
                date: record.date,
                team: record.team(side).to_string(),
                side,
                goals_for,
                goals_against,
            });
        }
    }
    observations
}
