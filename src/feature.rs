//! The fixed feature schema and the per-match feature table built from it.
//!
//! Every column is declared once in [`Feature`], whose declaration order is the column order of
//! the table, the CSV output and the classifier's input matrix. Whether a column describes the
//! home side, the away side or the pairing is fixed by the schema ([`Feature::side`]), never
//! inferred from its name.

use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};
use ordinalizer::Ordinal;
use strum::{EnumCount, IntoEnumIterator};
use strum_macros::{Display, EnumCount, EnumIter};
use tracing::{debug, warn};

use crate::domain::{MatchRecord, MatchResult, Side};
use crate::expand::{expand, prepare};
use crate::form::{annotate, RollingSnapshot};
use crate::linear::Matrix;
use crate::scorer::ScorerTable;
use crate::strength::{derive, DerivationReport};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FeatureSide {
    Home,
    Away,
    Neutral,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FeatureGroup {
    Form,
    Scorer,
    Strength,
    Ability,
    Ranking,
}

/// A column that exists once for each side of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Ordinal, EnumCount, EnumIter, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SideFeature {
    GoalsForAvg,
    GoalsAgainstAvg,
    GoalDiffAvg,
    WinRate,
    PointsAvg,
    Momentum,
    CleanSheetRate,
    ConcededAvg,
    WeightedPoints,
    TopScorerGoals,
    TopScorerNorm,
    AttackStrength,
    DefenseWeakness,
    XgAbility,
    Rank,
    RankNorm,
}
impl SideFeature {
    pub fn group(&self) -> FeatureGroup {
        match self {
            SideFeature::GoalsForAvg
            | SideFeature::GoalsAgainstAvg
            | SideFeature::GoalDiffAvg
            | SideFeature::WinRate
            | SideFeature::PointsAvg
            | SideFeature::Momentum
            | SideFeature::CleanSheetRate
            | SideFeature::ConcededAvg
            | SideFeature::WeightedPoints => FeatureGroup::Form,
            SideFeature::TopScorerGoals | SideFeature::TopScorerNorm => FeatureGroup::Scorer,
            SideFeature::AttackStrength | SideFeature::DefenseWeakness => FeatureGroup::Strength,
            SideFeature::XgAbility => FeatureGroup::Ability,
            SideFeature::Rank | SideFeature::RankNorm => FeatureGroup::Ranking,
        }
    }

    /// Reads this feature from a rolling snapshot, for the features a snapshot carries.
    pub fn snapshot_value(&self, snapshot: &RollingSnapshot) -> Option<f64> {
        match self {
            SideFeature::GoalsForAvg => Some(snapshot.goals_for_avg),
            SideFeature::GoalsAgainstAvg => Some(snapshot.goals_against_avg),
            SideFeature::GoalDiffAvg => Some(snapshot.goal_diff_avg),
            SideFeature::WinRate => Some(snapshot.win_rate),
            SideFeature::PointsAvg => Some(snapshot.points_avg),
            SideFeature::Momentum => Some(snapshot.momentum),
            SideFeature::CleanSheetRate => Some(snapshot.clean_sheet_rate),
            SideFeature::ConcededAvg => Some(snapshot.conceded_avg),
            SideFeature::WeightedPoints => Some(snapshot.weighted_points),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Ordinal, EnumCount, EnumIter, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Feature {
    HomeGoalsForAvg,
    HomeGoalsAgainstAvg,
    HomeGoalDiffAvg,
    HomeWinRate,
    HomePointsAvg,
    HomeMomentum,
    HomeCleanSheetRate,
    HomeConcededAvg,
    HomeWeightedPoints,
    HomeTopScorerGoals,
    HomeTopScorerNorm,
    HomeAttackStrength,
    HomeDefenseWeakness,
    HomeXgAbility,
    HomeRank,
    HomeRankNorm,
    AwayGoalsForAvg,
    AwayGoalsAgainstAvg,
    AwayGoalDiffAvg,
    AwayWinRate,
    AwayPointsAvg,
    AwayMomentum,
    AwayCleanSheetRate,
    AwayConcededAvg,
    AwayWeightedPoints,
    AwayTopScorerGoals,
    AwayTopScorerNorm,
    AwayAttackStrength,
    AwayDefenseWeakness,
    AwayXgAbility,
    AwayRank,
    AwayRankNorm,
    RankDiff,
}

const HOME_FEATURES: [Feature; SideFeature::COUNT] = [
    Feature::HomeGoalsForAvg,
    Feature::HomeGoalsAgainstAvg,
    Feature::HomeGoalDiffAvg,
    Feature::HomeWinRate,
    Feature::HomePointsAvg,
    Feature::HomeMomentum,
    Feature::HomeCleanSheetRate,
    Feature::HomeConcededAvg,
    Feature::HomeWeightedPoints,
    Feature::HomeTopScorerGoals,
    Feature::HomeTopScorerNorm,
    Feature::HomeAttackStrength,
    Feature::HomeDefenseWeakness,
    Feature::HomeXgAbility,
    Feature::HomeRank,
    Feature::HomeRankNorm,
];

const AWAY_FEATURES: [Feature; SideFeature::COUNT] = [
    Feature::AwayGoalsForAvg,
    Feature::AwayGoalsAgainstAvg,
    Feature::AwayGoalDiffAvg,
    Feature::AwayWinRate,
    Feature::AwayPointsAvg,
    Feature::AwayMomentum,
    Feature::AwayCleanSheetRate,
    Feature::AwayConcededAvg,
    Feature::AwayWeightedPoints,
    Feature::AwayTopScorerGoals,
    Feature::AwayTopScorerNorm,
    Feature::AwayAttackStrength,
    Feature::AwayDefenseWeakness,
    Feature::AwayXgAbility,
    Feature::AwayRank,
    Feature::AwayRankNorm,
];

impl Feature {
    pub fn of(side: Side, feature: SideFeature) -> Feature {
        match side {
            Side::Home => HOME_FEATURES[feature.ordinal()],
            Side::Away => AWAY_FEATURES[feature.ordinal()],
        }
    }

    /// The home and away columns of a side feature.
    pub fn both(feature: SideFeature) -> [Feature; 2] {
        [Feature::of(Side::Home, feature), Feature::of(Side::Away, feature)]
    }

    pub fn side(&self) -> FeatureSide {
        match self.ordinal() / SideFeature::COUNT {
            0 => FeatureSide::Home,
            1 => FeatureSide::Away,
            _ => FeatureSide::Neutral,
        }
    }

    pub fn side_feature(&self) -> Option<SideFeature> {
        match self.side() {
            FeatureSide::Neutral => None,
            _ => SideFeature::iter().nth(self.ordinal() % SideFeature::COUNT),
        }
    }

    pub fn group(&self) -> FeatureGroup {
        self.side_feature()
            .map(|feature| feature.group())
            .unwrap_or(FeatureGroup::Ranking)
    }
}

/// A set of feature columns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ColumnSet {
    bits: u64,
}
impl ColumnSet {
    pub fn all() -> Self {
        Feature::iter().collect()
    }

    pub fn insert(&mut self, feature: Feature) {
        self.bits |= 1 << feature.ordinal();
    }

    pub fn contains(&self, feature: Feature) -> bool {
        self.bits & (1 << feature.ordinal()) != 0
    }

    /// The subset of `required` that is not in this set.
    pub fn missing(&self, required: &[Feature]) -> Vec<Feature> {
        required
            .iter()
            .filter(|&&feature| !self.contains(feature))
            .copied()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = Feature> {
        let columns = *self;
        Feature::iter().filter(move |&feature| columns.contains(feature))
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

impl Extend<Feature> for ColumnSet {
    fn extend<T: IntoIterator<Item = Feature>>(&mut self, iter: T) {
        for feature in iter {
            self.insert(feature);
        }
    }
}

impl FromIterator<Feature> for ColumnSet {
    fn from_iter<T: IntoIterator<Item = Feature>>(iter: T) -> Self {
        let mut columns = ColumnSet::default();
        columns.extend(iter);
        columns
    }
}

/// One historical match with its feature values. Undefined values are `None`.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureRow {
    pub match_index: usize,
    pub date: DateTime<Utc>,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u8,
    pub away_goals: u8,
    pub result: MatchResult,
    values: [Option<f64>; Feature::COUNT],
}
impl FeatureRow {
    pub fn new(match_index: usize, record: &MatchRecord) -> Self {
        Self {
            match_index,
            date: record.date,
            home_team: record.home_team.clone(),
            away_team: record.away_team.clone(),
            home_goals: record.home_goals,
            away_goals: record.away_goals,
            result: record.result(),
            values: [None; Feature::COUNT],
        }
    }

    pub fn get(&self, feature: Feature) -> Option<f64> {
        self.values[feature.ordinal()]
    }

    pub fn set(&mut self, feature: Feature, value: Option<f64>) {
        self.values[feature.ordinal()] = value;
    }

    pub fn get_side(&self, side: Side, feature: SideFeature) -> Option<f64> {
        self.get(Feature::of(side, feature))
    }

    pub fn set_side(&mut self, side: Side, feature: SideFeature, value: Option<f64>) {
        self.set(Feature::of(side, feature), value);
    }

    pub fn team(&self, side: Side) -> &str {
        match side {
            Side::Home => &self.home_team,
            Side::Away => &self.away_team,
        }
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }
}

/// Classifier inputs and labels. Row `i` of `x` describes the match at `match_indices[i]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    pub x: Matrix<f64>,
    pub y: Vec<MatchResult>,
    pub features: Vec<Feature>,
    pub match_indices: Vec<usize>,
}
impl Dataset {
    pub fn empty() -> Self {
        Self {
            x: Matrix::allocate(0, 0),
            y: vec![],
            features: vec![],
            match_indices: vec![],
        }
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }
}

#[derive(Clone, Debug, Default)]
pub struct FeatureTable {
    pub rows: Vec<FeatureRow>,
    /// Columns computed for the whole population.
    pub columns: ColumnSet,
    pub report: DerivationReport,
}
impl FeatureTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Assembles classifier inputs from the populated subset of `requested`, skipping rows with
    /// an undefined value in any selected column.
    pub fn dataset(&self, requested: &[Feature]) -> Dataset {
        let missing = self.columns.missing(requested);
        if !missing.is_empty() {
            warn!("ignoring unpopulated feature columns {missing:?}");
        }
        let features: Vec<_> = requested
            .iter()
            .filter(|&&feature| self.columns.contains(feature))
            .copied()
            .collect();
        if features.is_empty() {
            warn!("no populated feature columns among {} requested", requested.len());
            return Dataset::empty();
        }

        let complete: Vec<(&FeatureRow, Vec<f64>)> = self
            .rows
            .iter()
            .filter_map(|row| {
                features
                    .iter()
                    .map(|&feature| row.get(feature))
                    .collect::<Option<Vec<_>>>()
                    .map(|values| (row, values))
            })
            .collect();

        let mut x = Matrix::allocate(complete.len(), features.len());
        let mut y = Vec::with_capacity(complete.len());
        let mut match_indices = Vec::with_capacity(complete.len());
        for (row_index, (row, values)) in complete.into_iter().enumerate() {
            x.row_slice_mut(row_index).copy_from_slice(&values);
            y.push(row.result);
            match_indices.push(row.match_index);
        }
        debug!(
            "dataset of {} rows x {} columns ({} incomplete rows dropped)",
            y.len(),
            features.len(),
            self.rows.len() - y.len()
        );
        Dataset {
            x,
            y,
            features,
            match_indices,
        }
    }

    /// The most recent row in which `home` hosted `away`.
    pub fn latest_pairing(&self, home: &str, away: &str) -> Option<&FeatureRow> {
        self.rows
            .iter()
            .rev()
            .find(|row| row.home_team == home && row.away_team == away)
    }

    /// The most recent row in which `team` played on the given `side`.
    pub fn latest_on_side(&self, team: &str, side: Side) -> Option<&FeatureRow> {
        self.rows.iter().rev().find(|row| row.team(side) == team)
    }
}

/// Runs the feature pipeline over a set of match records: finished matches are ordered, expanded
/// into team observations, annotated with rolling form over `window` prior matches, joined with
/// the scorer table (whose absence leaves the scorer columns at 0) and finally passed through
/// strength, ability and ranking derivation.
pub fn build_feature_table(
    matches: &[MatchRecord],
    scorers: Option<&ScorerTable>,
    window: NonZeroUsize,
) -> FeatureTable {
    let prepared = prepare(matches);
    if prepared.is_empty() {
        warn!("no finished matches among {} records", matches.len());
        return FeatureTable::default();
    }

    let observations = expand(&prepared);
    let snapshots = annotate(&observations, window);

    let mut rows: Vec<_> = prepared
        .iter()
        .enumerate()
        .map(|(match_index, record)| FeatureRow::new(match_index, record))
        .collect();
    for (observation, snapshot) in observations.iter().zip(snapshots) {
        let row = &mut rows[observation.match_index];
        for feature in SideFeature::iter().filter(|feature| feature.group() == FeatureGroup::Form) {
            let value = snapshot.as_ref().and_then(|snapshot| feature.snapshot_value(snapshot));
            row.set_side(observation.side, feature, value);
        }
    }
    let mut columns: ColumnSet = SideFeature::iter()
        .filter(|feature| feature.group() == FeatureGroup::Form)
        .flat_map(Feature::both)
        .collect();

    for row in &mut rows {
        for side in [Side::Home, Side::Away] {
            let goals = scorers.map(|scorers| scorers.top_goals(row.team(side))).unwrap_or(0.0);
            row.set_side(side, SideFeature::TopScorerGoals, Some(goals));
        }
    }
    columns.extend(Feature::both(SideFeature::TopScorerGoals));

    let mut table = FeatureTable {
        rows,
        columns,
        report: DerivationReport::default(),
    };
    table.report = derive(&mut table, scorers.is_some());
    debug!(
        "built feature table of {} rows with {} populated columns",
        table.len(),
        table.columns.len()
    );
    table
}
