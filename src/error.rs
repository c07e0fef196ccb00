//! Engine error types

use thiserror::Error;

/// Engine result alias
pub type Result<T> = std::result::Result<T, GameError>;

/// Errors raised by the engine
///
/// Unknown-type variants mean spawn code asked for something the catalog
/// does not contain. They are returned, never replaced by a fallback kind.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GameError {
    /// Ingredient name not in the catalog
    #[error("unknown ingredient type: {0}")]
    UnknownIngredient(String),

    /// Power-up name not in the catalog
    #[error("unknown power-up type: {0}")]
    UnknownPowerUp(String),

    /// Particle variant name not recognised
    #[error("unknown particle variant: {0}")]
    UnknownParticle(String),

    /// Entity collection name not recognised
    #[error("unknown entity collection: {0}")]
    UnknownCollection(String),

    /// An entity id that is no longer live
    #[error("stale {collection} entity: {id}")]
    StaleEntity { collection: &'static str, id: u32 },

    /// Rejected configuration value
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Config JSON failed to parse
    #[error("config parse error: {0}")]
    ConfigParse(String),
}

impl From<serde_json::Error> for GameError {
    fn from(err: serde_json::Error) -> Self {
        GameError::ConfigParse(err.to_string())
    }
}

/// Best-score storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend missing (no window, storage disabled, private mode)
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Stored value could not be decoded
    #[error("corrupt save data: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// Saved envelope has a version this build does not read
    #[error("unsupported save version {0}")]
    UnsupportedVersion(u32),
}
