//! Joint distribution of full-time scores and the H/D/A probabilities gathered from it.
//!
//! A score grid is a matrix whose cell `(h, a)` holds the probability of the match ending
//! `h`-`a`. Grids are truncated at a maximum number of goals per side, so gathered
//! probabilities are renormalised over the retained mass.

use std::fmt::{Display, Formatter};
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::domain::{MatchResult, Side};
use crate::factorial::{Lookup, MAX_N};
use crate::linear::Matrix;
use crate::poisson;

/// Probabilities of a home win, a draw and an away win.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeProbs {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}
impl OutcomeProbs {
    /// Scales the three masses to unit sum. Zero (or non-finite) total mass yields all zeros.
    pub fn normalized(home: f64, draw: f64, away: f64) -> Self {
        let total = home + draw + away;
        if total > 0.0 && total.is_finite() {
            Self {
                home: home / total,
                draw: draw / total,
                away: away / total,
            }
        } else {
            Self::default()
        }
    }

    pub fn sum(&self) -> f64 {
        self.home + self.draw + self.away
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.home, self.draw, self.away]
    }

    /// The likeliest result; ties favour the home side, then the draw.
    pub fn most_likely(&self) -> MatchResult {
        if self.home >= self.draw && self.home >= self.away {
            MatchResult::Home
        } else if self.draw >= self.away {
            MatchResult::Draw
        } else {
            MatchResult::Away
        }
    }
}

impl Index<MatchResult> for OutcomeProbs {
    type Output = f64;

    fn index(&self, result: MatchResult) -> &Self::Output {
        match result {
            MatchResult::Home => &self.home,
            MatchResult::Draw => &self.draw,
            MatchResult::Away => &self.away,
        }
    }
}

impl Display for OutcomeProbs {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "H {:.3} D {:.3} A {:.3}", self.home, self.draw, self.away)
    }
}

/// Allocates a grid spanning `0..=max_goals` goals for each side. Grids are capped at
/// [`MAX_N`] goals, the largest count whose factorial is finite.
pub fn allocate(max_goals: u8) -> Matrix<f64> {
    let size = u8::min(max_goals, MAX_N) as usize + 1;
    Matrix::allocate(size, size)
}

/// Fills the grid with the outer product of two independent Poisson distributions.
pub fn from_univariate_poisson(home_rate: f64, away_rate: f64, scoregrid: &mut Matrix<f64>) {
    let factorial = Lookup::default();
    let home_probs = poisson::pmf(home_rate, (scoregrid.rows() - 1) as u8, &factorial);
    let away_probs = poisson::pmf(away_rate, (scoregrid.cols() - 1) as u8, &factorial);
    for (home_goals, home_prob) in home_probs.iter().enumerate() {
        for (away_goals, away_prob) in away_probs.iter().enumerate() {
            scoregrid[(home_goals, away_goals)] = home_prob * away_prob;
        }
    }
}

/// Fills the grid with weights proportional to the outer product of two independent Poisson
/// distributions. The cells do not sum to 1, but stay representable for rates so large that
/// every retained score is individually improbable.
pub fn from_scaled_poisson(home_rate: f64, away_rate: f64, scoregrid: &mut Matrix<f64>) {
    let factorial = Lookup::default();
    let home_weights = poisson::scaled_pmf(home_rate, (scoregrid.rows() - 1) as u8, &factorial);
    let away_weights = poisson::scaled_pmf(away_rate, (scoregrid.cols() - 1) as u8, &factorial);
    for (home_goals, home_weight) in home_weights.iter().enumerate() {
        for (away_goals, away_weight) in away_weights.iter().enumerate() {
            scoregrid[(home_goals, away_goals)] = home_weight * away_weight;
        }
    }
}

pub fn gather_win(side: Side, scoregrid: &Matrix<f64>) -> f64 {
    let mut prob = 0.0;
    match side {
        Side::Home => {
            for row in 1..scoregrid.rows() {
                for col in 0..usize::min(row, scoregrid.cols()) {
                    prob += scoregrid[(row, col)];
                }
            }
        }
        Side::Away => {
            for col in 1..scoregrid.cols() {
                for row in 0..usize::min(col, scoregrid.rows()) {
                    prob += scoregrid[(row, col)];
                }
            }
        }
    }
    prob
}

pub fn gather_draw(scoregrid: &Matrix<f64>) -> f64 {
    let mut prob = 0.0;
    for index in 0..usize::min(scoregrid.rows(), scoregrid.cols()) {
        prob += scoregrid[(index, index)];
    }
    prob
}

/// H/D/A probabilities of the grid, renormalised over its total mass.
pub fn outcome_probs(scoregrid: &Matrix<f64>) -> OutcomeProbs {
    OutcomeProbs::normalized(
        gather_win(Side::Home, scoregrid),
        gather_draw(scoregrid),
        gather_win(Side::Away, scoregrid),
    )
}

/// H/D/A probabilities of independent Poisson goal counts, each truncated at `max_goals` (itself
/// capped at [`MAX_N`]).
pub fn poisson_outcome_probs(home_rate: f64, away_rate: f64, max_goals: u8) -> OutcomeProbs {
    let mut scoregrid = allocate(max_goals);
    from_scaled_poisson(home_rate, away_rate, &mut scoregrid);
    outcome_probs(&scoregrid)
}

#[cfg(test)]
mod tests {
    use assert_float_eq::*;

    use super::*;

    #[test]
    fn mass_is_conserved() {
        let rates = [0.05, 0.3, 0.9, 1.35, 2.0, 3.7, 6.5];
        for max_goals in [1, 4, 8, 10, 30] {
            for &home_rate in &rates {
                for &away_rate in &rates {
                    let probs = poisson_outcome_probs(home_rate, away_rate, max_goals);
                    assert_float_absolute_eq!(1.0, probs.sum(), 1e-9);
                    assert!(probs.to_array().iter().all(|&prob| prob >= 0.0));
                }
            }
        }
    }

    #[test]
    fn equal_rates_are_symmetric() {
        for rate in [0.4, 1.0, 1.3, 2.2] {
            let mut scoregrid = allocate(8);
            from_univariate_poisson(rate, rate, &mut scoregrid);
            let probs = outcome_probs(&scoregrid);
            assert_float_absolute_eq!(probs.home, probs.away, 1e-12);

            // the diagonal holds the largest cell of every row and column
            for home_goals in 0..scoregrid.rows() {
                for away_goals in 0..scoregrid.cols() {
                    let diagonal = f64::max(
                        scoregrid[(home_goals, home_goals)],
                        scoregrid[(away_goals, away_goals)],
                    );
                    assert!(scoregrid[(home_goals, away_goals)] <= diagonal);
                }
            }
        }
    }

    #[test]
    fn hand_computed() {
        // with at most 1 goal each: P(0)=e^-1, P(1)=e^-1 for rate 1
        let probs = poisson_outcome_probs(1.0, 1.0, 1);
        assert_float_absolute_eq!(0.25, probs.home);
        assert_float_absolute_eq!(0.5, probs.draw);
        assert_float_absolute_eq!(0.25, probs.away);
    }

    #[test]
    fn stronger_home_side_is_favoured() {
        let probs = poisson_outcome_probs(2.1, 0.8, 8);
        assert!(probs.home > probs.away);
        assert_eq!(MatchResult::Home, probs.most_likely());
        assert_eq!(probs.home, probs[MatchResult::Home]);
    }

    #[test]
    fn non_positive_rates_yield_no_mass() {
        assert_eq!(OutcomeProbs::default(), poisson_outcome_probs(0.0, 1.2, 8));
        assert_eq!(OutcomeProbs::default(), poisson_outcome_probs(-1.0, -1.0, 8));
    }

    #[test]
    fn grid_is_capped_at_the_largest_factorial() {
        let scoregrid = allocate(u8::MAX);
        assert_eq!(MAX_N as usize + 1, scoregrid.rows());
        assert_eq!(MAX_N as usize + 1, scoregrid.cols());

        let probs = poisson_outcome_probs(1.0, 1.0, 200);
        assert_float_absolute_eq!(1.0, probs.sum(), 1e-9);
        assert_eq!(poisson_outcome_probs(1.0, 1.0, MAX_N), probs);
        assert_float_absolute_eq!(probs.home, probs.away, 1e-12);
    }

    #[test]
    fn very_large_rates_keep_their_mass() {
        let probs = poisson_outcome_probs(800.0, 1.0, 8);
        assert_float_absolute_eq!(1.0, probs.sum(), 1e-9);
        assert_eq!(MatchResult::Home, probs.most_likely());

        let probs = poisson_outcome_probs(838.1, 761.9, 8);
        assert_float_absolute_eq!(1.0, probs.sum(), 1e-9);
        assert!(probs.to_array().iter().all(|prob| prob.is_finite() && *prob >= 0.0));
    }

    #[test]
    fn scaled_grid_is_proportional_to_the_probability_grid() {
        let mut probabilities = allocate(6);
        from_univariate_poisson(1.7, 0.9, &mut probabilities);
        let mut weights = allocate(6);
        from_scaled_poisson(1.7, 0.9, &mut weights);
        let ratio = probabilities[(0, 0)] / weights[(0, 0)];
        for (probability, weight) in probabilities.flatten().iter().zip(weights.flatten()) {
            assert_float_relative_eq!(*probability, weight * ratio, 1e-9);
        }
        let (direct, scaled) = (outcome_probs(&probabilities), outcome_probs(&weights));
        assert_float_absolute_eq!(direct.home, scaled.home, 1e-12);
        assert_float_absolute_eq!(direct.draw, scaled.draw, 1e-12);
        assert_float_absolute_eq!(direct.away, scaled.away, 1e-12);
    }

    #[test]
    fn gather_from_known_grid() {
        let mut scoregrid = allocate(2);
        scoregrid[0].copy_from_slice(&[0.1, 0.05, 0.05]);
        scoregrid[1].copy_from_slice(&[0.2, 0.1, 0.05]);
        scoregrid[2].copy_from_slice(&[0.15, 0.1, 0.2]);
        assert_float_absolute_eq!(0.45, gather_win(Side::Home, &scoregrid));
        assert_float_absolute_eq!(0.4, gather_draw(&scoregrid));
        assert_float_absolute_eq!(0.15, gather_win(Side::Away, &scoregrid));
    }

    #[test]
    fn normalized() {
        let probs = OutcomeProbs::normalized(2.0, 1.0, 1.0);
        assert_eq!(OutcomeProbs { home: 0.5, draw: 0.25, away: 0.25 }, probs);
        assert_eq!(OutcomeProbs::default(), OutcomeProbs::normalized(0.0, 0.0, 0.0));
        assert_eq!("H 0.500 D 0.250 A 0.250", probs.to_string());
        assert_eq!(MatchResult::Draw, OutcomeProbs::normalized(0.2, 0.5, 0.3).most_likely());
    }
}
