use thiserror::Error;

use crate::core::types::{FormationId, UnitId};

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Formation not found: {0:?}")]
    FormationNotFound(FormationId),

    #[error("Unit {unit:?} not found in formation {formation:?}")]
    UnitNotFound { formation: FormationId, unit: UnitId },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimulationError>;
