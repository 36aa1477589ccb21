//! Top-scorer enrichment.

use rustc_hash::FxHashMap;

/// Goals of each team's best individual scorer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScorerTable {
    best: FxHashMap<String, u16>,
}
impl ScorerTable {
    /// Records a scorer's tally, retaining it only if it betters the team's current best.
    pub fn record(&mut self, team: impl Into<String>, goals: u16) {
        let best = self.best.entry(team.into()).or_default();
        *best = u16::max(*best, goals);
    }

    /// The team's best scorer's goals, or 0 for a team with no recorded scorers.
    pub fn top_goals(&self, team: &str) -> f64 {
        self.best.get(team).copied().unwrap_or_default() as f64
    }

    pub fn len(&self) -> usize {
        self.best.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, u16)> for ScorerTable {
    fn from_iter<T: IntoIterator<Item = (S, u16)>>(iter: T) -> Self {
        let mut table = ScorerTable::default();
        for (team, goals) in iter {
            table.record(team, goals);
        }
        table
    }
}
