//! The supervised outcome classifier, consumed as a capability.

use ordinalizer::Ordinal;
use strum::{EnumCount, IntoEnumIterator};
use thiserror::Error;
use tracing::debug;

use crate::domain::MatchResult;
use crate::linear::Matrix;
use crate::scoregrid::OutcomeProbs;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("classifier has not been fitted")]
    NotFitted,

    #[error("no training rows")]
    EmptyTrainingSet,

    #[error("{rows} input rows but {labels} labels")]
    LabelMismatch { rows: usize, labels: usize },

    #[error("expected {expected} feature columns, got {actual}")]
    FeatureMismatch { expected: usize, actual: usize },
}

/// A learner mapping feature rows to per-class probabilities.
pub trait Classifier {
    fn fit(&mut self, x: &Matrix<f64>, y: &[MatchResult]) -> Result<(), ClassifierError>;

    /// One row of probabilities per input row; column `j` corresponds to `classes()[j]`.
    fn predict_proba(&self, x: &Matrix<f64>) -> Result<Matrix<f64>, ClassifierError>;

    /// The class labels, in the column order of [`Classifier::predict_proba`].
    fn classes(&self) -> &[MatchResult];
}

/// Maps a probability row onto H/D/A by class label, renormalising over the three outcomes.
/// Outcomes the classifier does not know receive no probability.
pub fn class_probs(classes: &[MatchResult], row: &[f64]) -> OutcomeProbs {
    let mut masses = [0.0; MatchResult::COUNT];
    for (class, &prob) in classes.iter().zip(row) {
        masses[class.ordinal()] += prob;
    }
    OutcomeProbs::normalized(masses[0], masses[1], masses[2])
}

/// Predicts the class frequencies observed during fitting, regardless of the input.
#[derive(Debug, Clone, Default)]
pub struct FrequencyClassifier {
    classes: Vec<MatchResult>,
    priors: Vec<f64>,
    features: Option<usize>,
}
impl FrequencyClassifier {
    pub fn priors(&self) -> &[f64] {
        &self.priors
    }
}

impl Classifier for FrequencyClassifier {
    fn fit(&mut self, x: &Matrix<f64>, y: &[MatchResult]) -> Result<(), ClassifierError> {
        if x.rows() != y.len() {
            return Err(ClassifierError::LabelMismatch {
                rows: x.rows(),
                labels: y.len(),
            });
        }
        if y.is_empty() {
            return Err(ClassifierError::EmptyTrainingSet);
        }
        let mut counts = [0usize; MatchResult::COUNT];
        for &label in y {
            counts[label.ordinal()] += 1;
        }
        let (classes, priors): (Vec<_>, Vec<_>) = MatchResult::iter()
            .zip(counts)
            .filter(|&(_, count)| count > 0)
            .map(|(class, count)| (class, count as f64 / y.len() as f64))
            .unzip();
        self.classes = classes;
        self.priors = priors;
        self.features = Some(x.cols());
        debug!("fitted class priors {:?} over {:?}", self.priors, self.classes);
        Ok(())
    }

    fn predict_proba(&self, x: &Matrix<f64>) -> Result<Matrix<f64>, ClassifierError> {
        let features = self.features.ok_or(ClassifierError::NotFitted)?;
        if x.cols() != features {
            return Err(ClassifierError::FeatureMismatch {
                expected: features,
                actual: x.cols(),
            });
        }
        let mut probs = Matrix::allocate(x.rows(), self.classes.len());
        for row in 0..x.rows() {
            probs.row_slice_mut(row).copy_from_slice(&self.priors);
        }
        Ok(probs)
    }

    fn classes(&self) -> &[MatchResult] {
        &self.classes
    }
}

#[cfg(test)]
mod tests {
    use assert_float_eq::*;

    use super::*;

    fn inputs(rows: usize) -> Matrix<f64> {
        Matrix::allocate(rows, 2)
    }

    #[test]
    fn frequencies() {
        let mut classifier = FrequencyClassifier::default();
        let y = [MatchResult::Home, MatchResult::Away, MatchResult::Home, MatchResult::Home];
        classifier.fit(&inputs(4), &y).unwrap();
        assert_eq!(&[MatchResult::Home, MatchResult::Away], classifier.classes());
        assert_eq!(&[0.75, 0.25], classifier.priors());

        let probs = classifier.predict_proba(&inputs(2)).unwrap();
        assert_eq!(2, probs.rows());
        assert_eq!(&[0.75, 0.25], probs.row_slice(1));

        let outcome = class_probs(classifier.classes(), probs.row_slice(0));
        assert_eq!(OutcomeProbs { home: 0.75, draw: 0.0, away: 0.25 }, outcome);
    }

    #[test]
    fn class_probs_by_label() {
        let classes = [MatchResult::Away, MatchResult::Draw, MatchResult::Home];
        let probs = class_probs(&classes, &[0.2, 0.3, 0.5]);
        assert_float_absolute_eq!(0.5, probs.home);
        assert_float_absolute_eq!(0.3, probs.draw);
        assert_float_absolute_eq!(0.2, probs.away);

        let probs = class_probs(&classes, &[1.0, 1.0, 2.0]);
        assert_eq!(OutcomeProbs { home: 0.5, draw: 0.25, away: 0.25 }, probs);
        assert_eq!(OutcomeProbs::default(), class_probs(&classes, &[0.0, 0.0, 0.0]));
    }

    #[test]
    fn misuse() {
        let mut classifier = FrequencyClassifier::default();
        assert_eq!(Err(ClassifierError::NotFitted), classifier.predict_proba(&inputs(1)));
        assert_eq!(Err(ClassifierError::EmptyTrainingSet), classifier.fit(&inputs(0), &[]));
        assert_eq!(
            Err(ClassifierError::LabelMismatch { rows: 2, labels: 1 }),
            classifier.fit(&inputs(2), &[MatchResult::Draw])
        );
        classifier.fit(&inputs(1), &[MatchResult::Draw]).unwrap();
        assert_eq!(
            Err(ClassifierError::FeatureMismatch { expected: 2, actual: 3 }),
            classifier.predict_proba(&Matrix::allocate(1, 3))
        );
    }
}
