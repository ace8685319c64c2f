//! Error types for the simulation.

use thiserror::Error;

use crate::api::types::BodyId;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("config parse error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("body {0:?} is missing from the physics world")]
    MissingBody(BodyId),

    #[error("invalid physics timestep: {0}")]
    InvalidTimestep(f32),

    #[error("body {0:?} has a non-finite position or velocity")]
    NonFinite(BodyId),

    #[error("dependency not ready after {attempts} attempts")]
    DependencyTimeout { attempts: u32 },
}

pub type Result<T> = std::result::Result<T, SimError>;
