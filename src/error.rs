//! Error types for the rollout simulator.

use crate::{Doses, WeekIndex};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimulationError>;

#[derive(Error, Debug)]
pub enum SimulationError {
    /// Malformed inputs detected before a run starts.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The population correction could not absorb the whole overshoot by
    /// peeling back single doses and first doses.
    #[error("week {week}: population correction is short by {shortfall} doses")]
    UnrecoverableOverflow { week: WeekIndex, shortfall: Doses },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl SimulationError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
