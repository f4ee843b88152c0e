//! Engine errors and their caller-facing status classes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::GeometryError;
use crate::splitter::SplitError;
use crate::store::StoreError;
use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Layout not found: {0}")]
    NotFound(String),

    #[error("Split pattern not found: {0}")]
    PatternNotFound(String),

    #[error("Layout id {0} collides with a different stored layout")]
    IdentityCollision(String),

    #[error("Layout store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Stored layout is corrupt: {0}")]
    StoreCorrupt(String),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => EngineError::NotFound(id),
            StoreError::Collision(id) => EngineError::IdentityCollision(id),
            StoreError::Unavailable(reason) => EngineError::StoreUnavailable(reason),
            corrupt @ StoreError::Corrupt { .. } => EngineError::StoreCorrupt(corrupt.to_string()),
        }
    }
}

impl From<SplitError> for EngineError {
    fn from(err: SplitError) -> Self {
        match err {
            SplitError::Validation(e) => EngineError::Validation(e),
            SplitError::Geometry(e) => EngineError::Geometry(e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorStatus {
    Validation,
    NotFound,
    Internal,
    Unavailable,
}

/// Structured error message handed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub status: ErrorStatus,
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl EngineError {
    pub fn status(&self) -> ErrorStatus {
        match self {
            EngineError::Validation(_) => ErrorStatus::Validation,
            EngineError::NotFound(_) | EngineError::PatternNotFound(_) => ErrorStatus::NotFound,
            EngineError::StoreUnavailable(_) => ErrorStatus::Unavailable,
            EngineError::IdentityCollision(_)
            | EngineError::StoreCorrupt(_)
            | EngineError::Geometry(_)
            | EngineError::Serialization(_)
            | EngineError::Config(_) => ErrorStatus::Internal,
        }
    }

    /// Only store outages are worth retrying; the engine never retries itself.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::StoreUnavailable(_))
    }

    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Validation(e) => e.code(),
            EngineError::NotFound(_) => "layout_not_found",
            EngineError::PatternNotFound(_) => "pattern_not_found",
            EngineError::IdentityCollision(_) => "identity_collision",
            EngineError::StoreUnavailable(_) => "store_unavailable",
            EngineError::StoreCorrupt(_) => "store_corrupt",
            EngineError::Geometry(_) => "geometry",
            EngineError::Serialization(_) => "serialization",
            EngineError::Config(_) => "config",
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            status: self.status(),
            code: self.code().to_string(),
            message: self.to_string(),
            retryable: self.is_retryable(),
        }
    }
}
