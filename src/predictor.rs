//! A trained prediction bundle: the classifier, the feature history it was trained on and the
//! league strength context derived from that history.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use thiserror::Error;
use tracing::{debug, info};

use crate::classifier::{class_probs, Classifier, ClassifierError};
use crate::config::{Config, ValidationError};
use crate::domain::{Fixture, MatchRecord, Side};
use crate::feature::{build_feature_table, Feature, FeatureSide, FeatureTable};
use crate::goal_rate::GoalRateCalibrator;
use crate::linear::Matrix;
use crate::scoregrid::OutcomeProbs;
use crate::scorer::ScorerTable;
use crate::xg::{predict_fixture, LeagueStrengthContext, XgPrediction};

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("no complete feature rows among {0} matches")]
    NoTrainingData(usize),

    #[error("{0}")]
    Classifier(#[from] ClassifierError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixturePrediction {
    pub home_team: String,
    pub away_team: String,
    pub classifier: OutcomeProbs,
    /// Absent when either team is unknown to the strength context.
    pub xg: Option<XgPrediction>,
}

pub struct Predictor<C> {
    config: Config,
    calibrator: GoalRateCalibrator,
    history: FeatureTable,
    features: Vec<Feature>,
    context: Option<LeagueStrengthContext>,
    classifier: C,
}
impl<C: Classifier> Predictor<C> {
    /// Builds the feature table, fits the classifier to every complete row and derives the
    /// strength context from those same rows.
    pub fn train(
        matches: &[MatchRecord],
        scorers: Option<&ScorerTable>,
        config: Config,
        mut classifier: C,
    ) -> Result<Self, TrainError> {
        config.validate()?;
        let calibrator = GoalRateCalibrator::try_from(config.calibration.clone())?;

        let table = build_feature_table(matches, scorers, config.window);
        let requested: Vec<_> = Feature::iter().collect();
        let dataset = table.dataset(&requested);
        if dataset.is_empty() {
            return Err(TrainError::NoTrainingData(matches.len()));
        }
        classifier.fit(&dataset.x, &dataset.y)?;

        let history = FeatureTable {
            rows: dataset
                .match_indices
                .iter()
                .map(|&match_index| table.rows[match_index].clone())
                .collect(),
            columns: table.columns,
            report: table.report,
        };
        let context = LeagueStrengthContext::build(&history);
        info!(
            "trained on {} of {} matches with {} features; strength context for {} teams",
            history.len(),
            table.rows.len(),
            dataset.features.len(),
            context.as_ref().map(LeagueStrengthContext::len).unwrap_or(0)
        );
        Ok(Self {
            config,
            calibrator,
            history,
            features: dataset.features,
            context,
            classifier,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The complete feature rows the classifier was trained on, in chronological order.
    pub fn history(&self) -> &FeatureTable {
        &self.history
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn context(&self) -> Option<&LeagueStrengthContext> {
        self.context.as_ref()
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Classifier inputs for an upcoming fixture.
    ///
    /// If the two teams have met with the same home side, the latest such row is used verbatim.
    /// Otherwise the row is synthesised: home-side columns come from the home team's latest
    /// appearance as hosts, away-side columns from the away team's latest appearance as visitors.
    /// A team that never played in the required role borrows the corresponding columns from its
    /// latest appearance in the other role. Pairing columns, and the columns of a team with no
    /// history at all, are 0.
    pub fn fixture_vector(&self, home_team: &str, away_team: &str) -> Vec<f64> {
        if let Some(row) = self.history.latest_pairing(home_team, away_team) {
            debug!("using the {home_team} v {away_team} row of {}", row.date);
            return self
                .features
                .iter()
                .map(|&feature| row.get(feature).unwrap_or(0.0))
                .collect();
        }

        let side_value = |team: &str, side: Side, feature: Feature| -> f64 {
            let Some(side_feature) = feature.side_feature() else {
                return 0.0;
            };
            let own_role = self
                .history
                .latest_on_side(team, side)
                .and_then(|row| row.get_side(side, side_feature));
            let other_role = || {
                let other = side.opposite();
                self.history
                    .latest_on_side(team, other)
                    .and_then(|row| row.get_side(other, side_feature))
            };
            own_role.or_else(other_role).unwrap_or(0.0)
        };
        self.features
            .iter()
            .map(|&feature| match feature.side() {
                FeatureSide::Home => side_value(home_team, Side::Home, feature),
                FeatureSide::Away => side_value(away_team, Side::Away, feature),
                FeatureSide::Neutral => 0.0,
            })
            .collect()
    }

    pub fn predict(&self, fixture: &Fixture) -> Result<FixturePrediction, ClassifierError> {
        let vector = self.fixture_vector(&fixture.home_team, &fixture.away_team);
        let mut x = Matrix::allocate(1, vector.len());
        x.row_slice_mut(0).copy_from_slice(&vector);
        let probs = self.classifier.predict_proba(&x)?;
        let classifier = class_probs(self.classifier.classes(), probs.row_slice(0));

        let xg = self.context.as_ref().and_then(|context| {
            predict_fixture(
                context,
                &fixture.home_team,
                &fixture.away_team,
                &self.calibrator,
                self.config.max_goals,
            )
        });
        Ok(FixturePrediction {
            home_team: fixture.home_team.clone(),
            away_team: fixture.away_team.clone(),
            classifier,
            xg,
        })
    }
}
