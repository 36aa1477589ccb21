//! Conversion of a pair of ability scores into Poisson goal rates.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::config::ValidationError;

/// Home share of the league's base total when neither side has a positive ability.
pub const FALLBACK_HOME_SHARE: f64 = 0.55;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Expected combined goals of an average fixture.
    pub base_total_goals: f64,
    /// Multiplier applied to the home side's ability.
    pub home_advantage: f64,
    /// Floor applied to each goal rate.
    pub min_lambda: f64,
}
impl CalibrationConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.base_total_goals.is_finite() || self.base_total_goals <= 0.0 {
            return Err(anyhow!("base total goals must be positive, got {}", self.base_total_goals).into());
        }
        if !self.home_advantage.is_finite() || self.home_advantage <= 0.0 {
            return Err(anyhow!("home advantage must be positive, got {}", self.home_advantage).into());
        }
        if !self.min_lambda.is_finite() || self.min_lambda <= 0.0 {
            return Err(anyhow!("minimum lambda must be positive, got {}", self.min_lambda).into());
        }
        if self.min_lambda * 2.0 > self.base_total_goals {
            return Err(anyhow!(
                "minimum lambda ({}) cannot exceed half the base total goals ({})",
                self.min_lambda,
                self.base_total_goals
            )
            .into());
        }
        Ok(())
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            base_total_goals: 2.6,
            home_advantage: 1.10,
            min_lambda: 0.05,
        }
    }
}

/// Poisson means of the home and away goal counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalRates {
    pub home: f64,
    pub away: f64,
}
impl GoalRates {
    pub fn total(&self) -> f64 {
        self.home + self.away
    }
}

#[derive(Debug, Clone, Default)]
pub struct GoalRateCalibrator {
    config: CalibrationConfig,
}
impl GoalRateCalibrator {
    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    /// Splits the base total goals in proportion to the two abilities, after boosting the home
    /// ability by the home advantage. Negative (and NaN) abilities count as zero; if neither side
    /// has a positive ability, the total is split 55/45 in favour of the home side. Each rate is
    /// floored at the configured minimum.
    pub fn calibrate(&self, home_ability: f64, away_ability: f64) -> GoalRates {
        let config = &self.config;
        let home = home_ability.max(0.0) * config.home_advantage;
        let away = away_ability.max(0.0);
        let total = home + away;
        let (home_share, away_share) = if total > 0.0 && total.is_finite() {
            (home / total, away / total)
        } else {
            (FALLBACK_HOME_SHARE, 1.0 - FALLBACK_HOME_SHARE)
        };
        GoalRates {
            home: f64::max(config.base_total_goals * home_share, config.min_lambda),
            away: f64::max(config.base_total_goals * away_share, config.min_lambda),
        }
    }
}

impl TryFrom<CalibrationConfig> for GoalRateCalibrator {
    type Error = ValidationError;

    fn try_from(config: CalibrationConfig) -> Result<Self, Self::Error> {
        config.validate()?;
        Ok(Self { config })
    }
}
