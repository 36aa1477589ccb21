//! Pipeline configuration.

use std::error::Error;
use std::fs::File;
use std::io;
use std::num::NonZeroUsize;
use std::path::Path;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use serde_json::from_reader;
use thiserror::Error;

use crate::goal_rate::CalibrationConfig;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ValidationError(#[from] pub Box<dyn Error + Send + Sync>);

impl From<anyhow::Error> for ValidationError {
    fn from(value: anyhow::Error) -> Self {
        ValidationError(value.into())
    }
}

/// Largest supported number of goals per side in a score grid.
pub const MAX_GOALS_LIMIT: u8 = 30;

pub const DEFAULT_WINDOW: NonZeroUsize = match NonZeroUsize::new(5) {
    Some(window) => window,
    None => panic!("default window must be positive"),
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of preceding matches in each rolling window.
    pub window: NonZeroUsize,
    /// Goals per side retained in the Poisson score grid.
    pub max_goals: u8,
    pub calibration: CalibrationConfig,
}
impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_goals == 0 || self.max_goals > MAX_GOALS_LIMIT {
            return Err(anyhow!(
                "max goals ({}) must be between 1 and {MAX_GOALS_LIMIT}",
                self.max_goals
            )
            .into());
        }
        self.calibration.validate()
    }

    /// Reads a JSON-encoded config from a given file `path`. Absent fields take their defaults.
    pub fn read_json(path: impl AsRef<Path>) -> Result<Self, io::Error> {
        let file = File::open(path)?;
        Ok(from_reader(file)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            max_goals: 8,
            calibration: CalibrationConfig::default(),
        }
    }
}
