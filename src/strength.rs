//! League-relative strength, composite ability and the power ranking.
//!
//! Each derivation stage first checks that the columns it reads are populated across the whole
//! table. A stage whose inputs are absent is skipped in its entirety, leaving the table as it
//! found it, and the reason is recorded in the [`DerivationReport`].

use std::fmt::{Display, Formatter};

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::domain::Side;
use crate::feature::{Feature, FeatureRow, FeatureTable, SideFeature};

/// Added to every population mean used as a divisor.
pub const EPSILON: f64 = 1e-6;

const ATTACK_WEIGHT: f64 = 0.4;
const FORM_WEIGHT: f64 = 0.3;
const SCORER_WEIGHT: f64 = 0.3;

#[derive(Clone, Debug, PartialEq)]
pub enum SkipReason {
    MissingColumns(Vec<Feature>),
    EmptyPopulation,
    NoScorerTable,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingColumns(columns) => {
                write!(f, "missing columns")?;
                for (index, column) in columns.iter().enumerate() {
                    write!(f, "{}{column}", if index == 0 { " " } else { ", " })?;
                }
                Ok(())
            }
            SkipReason::EmptyPopulation => write!(f, "no defined values in the population"),
            SkipReason::NoScorerTable => write!(f, "no scorer table was joined"),
        }
    }
}

/// Outcome of a derivation stage.
#[derive(Clone, Debug, PartialEq)]
pub enum Derived<T> {
    Computed(T),
    /// The stage's columns were populated with neutral values because an input was absent.
    Defaulted(SkipReason),
    /// The stage's columns were left untouched.
    Skipped(SkipReason),
}
impl<T> Derived<T> {
    pub fn is_computed(&self) -> bool {
        matches!(self, Derived::Computed(_))
    }

    pub fn computed(&self) -> Option<&T> {
        match self {
            Derived::Computed(value) => Some(value),
            _ => None,
        }
    }

    pub fn default_reason(&self) -> Option<&SkipReason> {
        match self {
            Derived::Defaulted(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            Derived::Skipped(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Population means of the rolling goal averages, by the side the averages describe.
#[derive(Clone, Debug, PartialEq)]
pub struct GoalMeans {
    pub home_goals_for: f64,
    pub home_goals_against: f64,
    pub away_goals_for: f64,
    pub away_goals_against: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DerivationReport {
    pub strength: Derived<GoalMeans>,
    /// On success, the best single top-scorer tally in the population.
    pub scorers: Derived<f64>,
    pub ability: Derived<()>,
    pub ranking: Derived<PowerRanking>,
}
impl DerivationReport {
    /// Stages whose columns were left untouched.
    pub fn skipped(&self) -> Vec<(&'static str, &SkipReason)> {
        Self::collect([
            ("strength", self.strength.skip_reason()),
            ("scorers", self.scorers.skip_reason()),
            ("ability", self.ability.skip_reason()),
            ("ranking", self.ranking.skip_reason()),
        ])
    }

    /// Stages whose columns hold neutral values.
    pub fn defaulted(&self) -> Vec<(&'static str, &SkipReason)> {
        Self::collect([
            ("strength", self.strength.default_reason()),
            ("scorers", self.scorers.default_reason()),
            ("ability", self.ability.default_reason()),
            ("ranking", self.ranking.default_reason()),
        ])
    }

    fn collect<'a>(
        stages: [(&'static str, Option<&'a SkipReason>); 4],
    ) -> Vec<(&'static str, &'a SkipReason)> {
        stages
            .into_iter()
            .filter_map(|(stage, reason)| reason.map(|reason| (stage, reason)))
            .collect()
    }
}

impl Default for DerivationReport {
    fn default() -> Self {
        Self {
            strength: Derived::Skipped(SkipReason::EmptyPopulation),
            scorers: Derived::Skipped(SkipReason::EmptyPopulation),
            ability: Derived::Skipped(SkipReason::EmptyPopulation),
            ranking: Derived::Skipped(SkipReason::EmptyPopulation),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RankedTeam {
    pub team: String,
    pub strength: f64,
    pub rank: usize,
}

/// Teams ordered by strength, strongest first. Equal strengths share the lowest rank of their
/// group, and the next distinct strength is ranked after the whole group.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PowerRanking {
    entries: Vec<RankedTeam>,
    index: FxHashMap<String, usize>,
}
impl PowerRanking {
    pub fn from_strengths(strengths: impl IntoIterator<Item = (String, f64)>) -> Self {
        let mut entries: Vec<_> = strengths
            .into_iter()
            .map(|(team, strength)| RankedTeam { team, strength, rank: 0 })
            .collect();
        entries.sort_by(|a, b| {
            b.strength
                .total_cmp(&a.strength)
                .then_with(|| a.team.cmp(&b.team))
        });
        for position in 0..entries.len() {
            let tied = position > 0 && entries[position].strength == entries[position - 1].strength;
            let rank = if tied { entries[position - 1].rank } else { position + 1 };
            entries[position].rank = rank;
        }
        let index = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.team.clone(), position))
            .collect();
        Self { entries, index }
    }

    pub fn rank(&self, team: &str) -> Option<usize> {
        self.index.get(team).map(|&position| self.entries[position].rank)
    }

    /// Rank divided by the number of ranked teams.
    pub fn rank_norm(&self, team: &str) -> Option<f64> {
        self.rank(team).map(|rank| rank as f64 / self.entries.len() as f64)
    }

    pub fn entries(&self) -> &[RankedTeam] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Composite ability of one side. Undefined strength ratios count as league average (1.0);
/// undefined points and scorer terms count as 0.
pub fn xg_ability(
    attack_strength: Option<f64>,
    opponent_defense_weakness: Option<f64>,
    weighted_points: Option<f64>,
    top_scorer_norm: Option<f64>,
) -> f64 {
    ATTACK_WEIGHT * attack_strength.unwrap_or(1.0) * opponent_defense_weakness.unwrap_or(1.0)
        + FORM_WEIGHT * weighted_points.unwrap_or(0.0)
        + SCORER_WEIGHT * top_scorer_norm.unwrap_or(0.0)
}

/// Runs every derivation stage over the table, in dependency order.
pub fn derive(table: &mut FeatureTable, scorers_joined: bool) -> DerivationReport {
    let report = DerivationReport {
        strength: derive_strength(table),
        scorers: derive_scorer_norm(table, scorers_joined),
        ability: derive_ability(table),
        ranking: derive_ranking(table),
    };
    for (stage, reason) in report.skipped() {
        warn!("skipped {stage} derivation: {reason}");
    }
    for (stage, reason) in report.defaulted() {
        warn!("defaulted {stage} derivation: {reason}");
    }
    report
}

fn check_columns(table: &FeatureTable, required: &[Feature]) -> Result<(), SkipReason> {
    if table.is_empty() {
        return Err(SkipReason::EmptyPopulation);
    }
    let missing = table.columns.missing(required);
    if !missing.is_empty() {
        return Err(SkipReason::MissingColumns(missing));
    }
    Ok(())
}

fn column_mean(rows: &[FeatureRow], feature: Feature) -> Option<f64> {
    let (sum, count) = rows
        .iter()
        .filter_map(|row| row.get(feature))
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

fn derive_strength(table: &mut FeatureTable) -> Derived<GoalMeans> {
    let [home_for, away_for] = Feature::both(SideFeature::GoalsForAvg);
    let [home_against, away_against] = Feature::both(SideFeature::GoalsAgainstAvg);
    if let Err(reason) = check_columns(table, &[home_for, home_against, away_for, away_against]) {
        return Derived::Skipped(reason);
    }
    let means = match (
        column_mean(&table.rows, home_for),
        column_mean(&table.rows, home_against),
        column_mean(&table.rows, away_for),
        column_mean(&table.rows, away_against),
    ) {
        (Some(home_goals_for), Some(home_goals_against), Some(away_goals_for), Some(away_goals_against)) => GoalMeans {
            home_goals_for,
            home_goals_against,
            away_goals_for,
            away_goals_against,
        },
        _ => return Derived::Skipped(SkipReason::EmptyPopulation),
    };

    for row in &mut table.rows {
        for (side, goals_for_mean, goals_against_mean) in [
            (Side::Home, means.home_goals_for, means.home_goals_against),
            (Side::Away, means.away_goals_for, means.away_goals_against),
        ] {
            let attack = row
                .get_side(side, SideFeature::GoalsForAvg)
                .map(|goals_for| goals_for / (goals_for_mean + EPSILON));
            let weakness = row
                .get_side(side, SideFeature::GoalsAgainstAvg)
                .map(|goals_against| goals_against / (goals_against_mean + EPSILON));
            row.set_side(side, SideFeature::AttackStrength, attack);
            row.set_side(side, SideFeature::DefenseWeakness, weakness);
        }
    }
    table.columns.extend(Feature::both(SideFeature::AttackStrength));
    table.columns.extend(Feature::both(SideFeature::DefenseWeakness));
    debug!("league goal means {means:?}");
    Derived::Computed(means)
}

fn derive_scorer_norm(table: &mut FeatureTable, scorers_joined: bool) -> Derived<f64> {
    let goals = Feature::both(SideFeature::TopScorerGoals);
    if let Err(reason) = check_columns(table, &goals) {
        return Derived::Skipped(reason);
    }
    let best = table
        .rows
        .iter()
        .flat_map(|row| goals.iter().filter_map(|&feature| row.get(feature)))
        .fold(0.0, f64::max);
    for row in &mut table.rows {
        for side in [Side::Home, Side::Away] {
            let own = row.get_side(side, SideFeature::TopScorerGoals).unwrap_or(0.0);
            row.set_side(side, SideFeature::TopScorerNorm, Some(own / (best + EPSILON)));
        }
    }
    table.columns.extend(Feature::both(SideFeature::TopScorerNorm));
    if scorers_joined {
        Derived::Computed(best)
    } else {
        Derived::Defaulted(SkipReason::NoScorerTable)
    }
}

fn derive_ability(table: &mut FeatureTable) -> Derived<()> {
    let mut required = Feature::both(SideFeature::WeightedPoints).to_vec();
    required.extend(Feature::both(SideFeature::TopScorerNorm));
    if let Err(reason) = check_columns(table, &required) {
        return Derived::Skipped(reason);
    }
    for row in &mut table.rows {
        for side in [Side::Home, Side::Away] {
            let ability = xg_ability(
                row.get_side(side, SideFeature::AttackStrength),
                row.get_side(side.opposite(), SideFeature::DefenseWeakness),
                row.get_side(side, SideFeature::WeightedPoints),
                row.get_side(side, SideFeature::TopScorerNorm),
            );
            row.set_side(side, SideFeature::XgAbility, Some(ability));
        }
    }
    table.columns.extend(Feature::both(SideFeature::XgAbility));
    Derived::Computed(())
}

/// Mean recency-weighted points of every team over all of its appearances, home and away.
/// Teams whose weighted points are undefined throughout are omitted.
pub fn team_strengths(rows: &[FeatureRow]) -> Vec<(String, f64)> {
    let mut totals: FxHashMap<&str, (f64, usize)> = FxHashMap::default();
    for row in rows {
        for side in [Side::Home, Side::Away] {
            if let Some(points) = row.get_side(side, SideFeature::WeightedPoints) {
                let (sum, count) = totals.entry(row.team(side)).or_default();
                *sum += points;
                *count += 1;
            }
        }
    }
    totals
        .into_iter()
        .map(|(team, (sum, count))| (team.to_string(), sum / count as f64))
        .collect()
}

fn derive_ranking(table: &mut FeatureTable) -> Derived<PowerRanking> {
    if let Err(reason) = check_columns(table, &Feature::both(SideFeature::WeightedPoints)) {
        return Derived::Skipped(reason);
    }
    let ranking = PowerRanking::from_strengths(team_strengths(&table.rows));
    if ranking.is_empty() {
        return Derived::Skipped(SkipReason::EmptyPopulation);
    }

    for row in &mut table.rows {
        let mut ranks = [None; 2];
        for (side_index, side) in [Side::Home, Side::Away].into_iter().enumerate() {
            let team = row.team(side);
            ranks[side_index] = ranking.rank(team);
            let rank_norm = ranking.rank_norm(team);
            row.set_side(side, SideFeature::Rank, ranks[side_index].map(|rank| rank as f64));
            row.set_side(side, SideFeature::RankNorm, rank_norm);
        }
        let rank_diff = match ranks {
            [Some(home), Some(away)] => Some(away as f64 - home as f64),
            _ => None,
        };
        row.set(Feature::RankDiff, rank_diff);
    }
    table.columns.extend(Feature::both(SideFeature::Rank));
    table.columns.extend(Feature::both(SideFeature::RankNorm));
    table.columns.insert(Feature::RankDiff);
    debug!("ranked {} teams", ranking.len());
    Derived::Computed(ranking)
}
