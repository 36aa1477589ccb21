//! Season summaries of a single team.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::domain::{MatchRecord, Side, TeamOutcome};

/// Tallies over a set of matches played by one team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub played: usize,
    pub goals_for: usize,
    pub goals_against: usize,
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
}
impl Tally {
    fn record(&mut self, goals_for: u8, goals_against: u8, outcome: TeamOutcome) {
        self.played += 1;
        self.goals_for += goals_for as usize;
        self.goals_against += goals_against as usize;
        match outcome {
            TeamOutcome::Win => self.wins += 1,
            TeamOutcome::Draw => self.draws += 1,
            TeamOutcome::Loss => self.losses += 1,
        }
    }

    pub fn win_rate(&self) -> f64 {
        percent(self.wins, self.played)
    }

    pub fn draw_rate(&self) -> f64 {
        percent(self.draws, self.played)
    }

    pub fn loss_rate(&self) -> f64 {
        percent(self.losses, self.played)
    }
}

impl AddAssign<&Tally> for Tally {
    fn add_assign(&mut self, rhs: &Tally) {
        self.played += rhs.played;
        self.goals_for += rhs.goals_for;
        self.goals_against += rhs.goals_against;
        self.wins += rhs.wins;
        self.draws += rhs.draws;
        self.losses += rhs.losses;
    }
}

/// Percentage of `part` in `whole`, rounded to one decimal place; 0 when `whole` is 0.
fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 1000.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSummary {
    pub team: String,
    pub home: Tally,
    pub away: Tally,
}
impl TeamSummary {
    pub fn total(&self) -> Tally {
        let mut total = self.home.clone();
        total += &self.away;
        total
    }

    pub fn venue(&self, side: Side) -> &Tally {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }
}

/// Summarises the finished matches of `team`. A team that has not played has an all-zero summary.
pub fn summarise(matches: &[MatchRecord], team: &str) -> TeamSummary {
    let mut summary = TeamSummary {
        team: team.to_string(),
        home: Tally::default(),
        away: Tally::default(),
    };
    for record in matches.iter().filter(|record| record.is_finished()) {
        for side in [Side::Home, Side::Away] {
            if record.team(side) == team {
                let (goals_for, goals_against) = record.goals(side);
                let outcome = record.result().outcome_for(side);
                match side {
                    Side::Home => summary.home.record(goals_for, goals_against, outcome),
                    Side::Away => summary.away.record(goals_for, goals_against, outcome),
                }
            }
        }
    }
    summary
}
