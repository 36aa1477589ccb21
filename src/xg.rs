//! League strength context and the analytic expected-goals prediction path.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::Side;
use crate::feature::{Feature, FeatureRow, FeatureTable, SideFeature};
use crate::goal_rate::{GoalRateCalibrator, GoalRates};
use crate::scoregrid::{poisson_outcome_probs, OutcomeProbs};

/// Weight of a team's venue-specific strength when blended with its other-venue strength.
pub const VENUE_WEIGHT: f64 = 0.6;

/// Strengths relative to the league average (1.0). Defence scalars are inverted conceding rates,
/// so higher is better throughout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStrength {
    pub attack_home: f64,
    pub attack_away: f64,
    pub defense_home: f64,
    pub defense_away: f64,
}
impl TeamStrength {
    pub fn attack(&self, side: Side) -> f64 {
        blend(side, self.attack_home, self.attack_away)
    }

    pub fn defense(&self, side: Side) -> f64 {
        blend(side, self.defense_home, self.defense_away)
    }
}

fn blend(side: Side, home: f64, away: f64) -> f64 {
    match side {
        Side::Home => VENUE_WEIGHT * home + (1.0 - VENUE_WEIGHT) * away,
        Side::Away => VENUE_WEIGHT * away + (1.0 - VENUE_WEIGHT) * home,
    }
}

/// Ability scores of both sides of one fixture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixtureAbility {
    pub home: f64,
    pub away: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueStrengthContext {
    pub league_home_for: f64,
    pub league_away_for: f64,
    teams: FxHashMap<String, TeamStrength>,
}

#[derive(Default)]
struct VenueTotals {
    goals_for: (f64, usize),
    goals_against: (f64, usize),
}
impl VenueTotals {
    fn add(&mut self, goals_for: Option<f64>, goals_against: Option<f64>) {
        accumulate(&mut self.goals_for, goals_for);
        accumulate(&mut self.goals_against, goals_against);
    }
}

fn accumulate((sum, count): &mut (f64, usize), value: Option<f64>) {
    if let Some(value) = value {
        *sum += value;
        *count += 1;
    }
}

fn mean((sum, count): (f64, usize)) -> Option<f64> {
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

fn inverse_or_neutral(value: f64) -> f64 {
    if value > 0.0 {
        1.0 / value
    } else {
        1.0
    }
}

impl LeagueStrengthContext {
    /// Builds the context from the rolling goal averages of a feature table. Returns `None` if
    /// the table is empty or its goal averages are unpopulated.
    pub fn build(table: &FeatureTable) -> Option<Self> {
        if table.is_empty() {
            debug!("no strength context for an empty feature table");
            return None;
        }
        let required: Vec<_> = [SideFeature::GoalsForAvg, SideFeature::GoalsAgainstAvg]
            .into_iter()
            .flat_map(Feature::both)
            .collect();
        let missing = table.columns.missing(&required);
        if !missing.is_empty() {
            warn!("no strength context: missing columns {missing:?}");
            return None;
        }

        let league_mean = |feature| {
            let mut totals = (0.0, 0);
            for row in &table.rows {
                accumulate(&mut totals, row.get(feature));
            }
            mean(totals).filter(|&mean| mean > 0.0).unwrap_or(1.0)
        };
        let league_home_for = league_mean(Feature::HomeGoalsForAvg);
        let league_away_for = league_mean(Feature::AwayGoalsForAvg);

        let mut venues: FxHashMap<&str, [VenueTotals; 2]> = FxHashMap::default();
        for row in &table.rows {
            for (venue, side) in [Side::Home, Side::Away].into_iter().enumerate() {
                venues.entry(row.team(side)).or_default()[venue].add(
                    row.get_side(side, SideFeature::GoalsForAvg),
                    row.get_side(side, SideFeature::GoalsAgainstAvg),
                );
            }
        }

        let teams = venues
            .into_iter()
            .map(|(team, [home, away])| {
                let home_for = mean(home.goals_for).unwrap_or(league_home_for);
                let home_against = mean(home.goals_against).unwrap_or(league_away_for);
                let away_for = mean(away.goals_for).unwrap_or(league_away_for);
                let away_against = mean(away.goals_against).unwrap_or(league_home_for);
                let strength = TeamStrength {
                    attack_home: home_for / league_home_for,
                    attack_away: away_for / league_away_for,
                    defense_home: inverse_or_neutral(home_against / league_away_for),
                    defense_away: inverse_or_neutral(away_against / league_home_for),
                };
                (team.to_string(), strength)
            })
            .collect::<FxHashMap<_, _>>();
        debug!(
            "strength context for {} teams (league home {league_home_for:.3}, away {league_away_for:.3})",
            teams.len()
        );
        Some(Self {
            league_home_for,
            league_away_for,
            teams,
        })
    }

    pub fn team(&self, team: &str) -> Option<&TeamStrength> {
        self.teams.get(team)
    }

    /// Teams in name order.
    pub fn teams(&self) -> Vec<(&str, &TeamStrength)> {
        let mut teams: Vec<_> = self
            .teams
            .iter()
            .map(|(team, strength)| (team.as_str(), strength))
            .collect();
        teams.sort_by(|a, b| a.0.cmp(b.0));
        teams
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    /// Each side's blended attack multiplied by the opponent's blended defence. `None` if either
    /// team is unknown.
    pub fn fixture_ability(&self, home_team: &str, away_team: &str) -> Option<FixtureAbility> {
        let home = self.team(home_team)?;
        let away = self.team(away_team)?;
        Some(FixtureAbility {
            home: home.attack(Side::Home) * away.defense(Side::Away),
            away: away.attack(Side::Away) * home.defense(Side::Home),
        })
    }
}

/// Goal rates of a fixture, or `None` if either team is absent from the context.
pub fn match_lambdas(
    context: &LeagueStrengthContext,
    home_team: &str,
    away_team: &str,
    calibrator: &GoalRateCalibrator,
) -> Option<GoalRates> {
    context
        .fixture_ability(home_team, away_team)
        .map(|ability| calibrator.calibrate(ability.home, ability.away))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XgPrediction {
    pub lambda_home: f64,
    pub lambda_away: f64,
    pub probs: OutcomeProbs,
}
impl XgPrediction {
    pub fn from_rates(rates: GoalRates, max_goals: u8) -> Self {
        Self {
            lambda_home: rates.home,
            lambda_away: rates.away,
            probs: poisson_outcome_probs(rates.home, rates.away, max_goals),
        }
    }
}

pub fn predict_fixture(
    context: &LeagueStrengthContext,
    home_team: &str,
    away_team: &str,
    calibrator: &GoalRateCalibrator,
    max_goals: u8,
) -> Option<XgPrediction> {
    match_lambdas(context, home_team, away_team, calibrator)
        .map(|rates| XgPrediction::from_rates(rates, max_goals))
}

/// Prediction from the composite ability scores already on a feature row; `None` when either
/// ability is undefined.
pub fn row_prediction(row: &FeatureRow, calibrator: &GoalRateCalibrator, max_goals: u8) -> Option<XgPrediction> {
    let home = row.get(Feature::HomeXgAbility)?;
    let away = row.get(Feature::AwayXgAbility)?;
    Some(XgPrediction::from_rates(calibrator.calibrate(home, away), max_goals))
}

#[cfg(test)]
mod tests {
    use assert_float_eq::*;

    use super::*;
    use crate::domain::MatchRecord;
    use crate::feature::{build_feature_table, ColumnSet};
    use crate::goal_rate::CalibrationConfig;
    use crate::testing::{alpha_season, day, round_robin, window};

    #[test]
    fn empty_table_has_no_context() {
        assert_eq!(None, LeagueStrengthContext::build(&build_feature_table(&[], None, window(5))));
    }

    #[test]
    fn missing_goal_columns_have_no_context() {
        let mut table = build_feature_table(&alpha_season(), None, window(3));
        table.columns = ColumnSet::default();
        table.columns.extend(Feature::both(SideFeature::GoalsForAvg));
        assert_eq!(None, LeagueStrengthContext::build(&table));
    }

    #[test]
    fn strengths_from_venue_averages() {
        let table = build_feature_table(&alpha_season(), None, window(3));
        let context = LeagueStrengthContext::build(&table).unwrap();
        assert_eq!(4, context.len());

        // defined home goals-for averages: Alpha 3/2, Beta 0, Alpha 4/3, Delta 1
        assert_float_absolute_eq!(23.0 / 24.0, context.league_home_for);
        // defined away goals-for averages: Alpha 2, Alpha 4/3, Gamma 3, Alpha 1
        assert_float_absolute_eq!(11.0 / 6.0, context.league_away_for);

        // Gamma hosted only as a debutant, so its home figures are league averages
        let gamma = context.team("Gamma").unwrap();
        assert_float_absolute_eq!(1.0, gamma.attack_home);
        assert_float_absolute_eq!(1.0, gamma.defense_home);
        // away: scored 3, conceded 1 on average before visiting Alpha
        assert_float_absolute_eq!(18.0 / 11.0, gamma.attack_away);
        assert_float_absolute_eq!(23.0 / 24.0, gamma.defense_away);
    }

    #[test]
    fn non_positive_league_means_are_floored() {
        let matches = vec![
            MatchRecord::finished(day(0), "Alpha", "Beta", 0, 0),
            MatchRecord::finished(day(1), "Beta", "Alpha", 0, 0),
        ];
        let table = build_feature_table(&matches, None, window(3));
        let context = LeagueStrengthContext::build(&table).unwrap();
        assert_eq!(1.0, context.league_home_for);
        assert_eq!(1.0, context.league_away_for);
        let alpha = context.team("Alpha").unwrap();
        assert_eq!(0.0, alpha.attack_away);
        // conceded nothing: the raw defence ratio is 0, which is treated as neutral
        assert_eq!(1.0, alpha.defense_away);
    }

    #[test]
    fn fixture_ability_blends_venues() {
        let context = LeagueStrengthContext {
            league_home_for: 1.5,
            league_away_for: 1.2,
            teams: [
                (
                    "Alpha".to_string(),
                    TeamStrength {
                        attack_home: 1.5,
                        attack_away: 1.0,
                        defense_home: 1.2,
                        defense_away: 0.8,
                    },
                ),
                (
                    "Beta".to_string(),
                    TeamStrength {
                        attack_home: 0.9,
                        attack_away: 0.7,
                        defense_home: 1.1,
                        defense_away: 0.5,
                    },
                ),
            ]
            .into_iter()
            .collect(),
        };
        let ability = context.fixture_ability("Alpha", "Beta").unwrap();
        // (0.6 * 1.5 + 0.4 * 1.0) * (0.6 * 0.5 + 0.4 * 1.1)
        assert_float_absolute_eq!(1.3 * 0.74, ability.home);
        // (0.6 * 0.7 + 0.4 * 0.9) * (0.6 * 1.2 + 0.4 * 0.8)
        assert_float_absolute_eq!(0.78 * 1.04, ability.away);
        assert_eq!(None, context.fixture_ability("Alpha", "Gamma"));
        assert_eq!(vec!["Alpha", "Beta"], context.teams().into_iter().map(|(team, _)| team).collect::<Vec<_>>());

        let calibrator = GoalRateCalibrator::default();
        let rates = match_lambdas(&context, "Alpha", "Beta", &calibrator).unwrap();
        assert_float_absolute_eq!(2.6, rates.total());
        let prediction = predict_fixture(&context, "Alpha", "Beta", &calibrator, 8).unwrap();
        assert_eq!(rates.home, prediction.lambda_home);
        assert_float_absolute_eq!(1.0, prediction.probs.sum(), 1e-9);
        assert_eq!(None, predict_fixture(&context, "Gamma", "Beta", &calibrator, 8));
    }

    #[test]
    fn every_known_pairing_predicts() {
        let table = build_feature_table(&round_robin(), None, window(5));
        let context = LeagueStrengthContext::build(&table).unwrap();
        let calibrator = GoalRateCalibrator::default();
        for (home, _) in context.teams() {
            for (away, _) in context.teams() {
                if home != away {
                    let prediction = predict_fixture(&context, home, away, &calibrator, 8).unwrap();
                    assert!(prediction.lambda_home >= 0.05);
                    assert!(prediction.lambda_away >= 0.05);
                    assert_float_absolute_eq!(1.0, prediction.probs.sum(), 1e-9);
                }
            }
        }
    }

    #[test]
    fn row_predictions_use_row_abilities() {
        let table = build_feature_table(&alpha_season(), None, window(3));
        let calibrator = GoalRateCalibrator::default();
        let row = &table.rows[5];
        let prediction = row_prediction(row, &calibrator, 8).unwrap();
        let expected = calibrator.calibrate(
            row.get(Feature::HomeXgAbility).unwrap(),
            row.get(Feature::AwayXgAbility).unwrap(),
        );
        assert_eq!(expected.home, prediction.lambda_home);
        assert_eq!(expected.away, prediction.lambda_away);

        let mut row = row.clone();
        row.set(Feature::AwayXgAbility, None);
        assert_eq!(None, row_prediction(&row, &calibrator, 8));
    }

    #[test]
    fn oversized_goal_totals_still_sum_to_one() {
        let calibrator = GoalRateCalibrator::try_from(CalibrationConfig {
            base_total_goals: 1600.0,
            ..CalibrationConfig::default()
        })
        .unwrap();
        let rates = calibrator.calibrate(1.0, 1.15);
        assert!(rates.home > 745.0 && rates.away > 745.0);
        let prediction = XgPrediction::from_rates(rates, 8);
        assert_float_absolute_eq!(1.0, prediction.probs.sum(), 1e-9);
    }
}
