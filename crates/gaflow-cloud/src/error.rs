//! Provisioning error types

use thiserror::Error;

/// Provisioning errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Cyclic dependency involving spec '{0}'")]
    CyclicDependency(String),

    #[error("Unresolved dependency in spec '{spec}': {reference}")]
    UnresolvedDependency { spec: String, reference: String },

    #[error("Duplicate spec name: {0}")]
    DuplicateSpec(String),

    #[error("Invalid spec '{spec}': {message}")]
    InvalidSpec { spec: String, message: String },

    #[error("Creation failed for '{spec}': {message}")]
    CreationFailed { spec: String, message: String },

    #[error("Interaction failed: {0}")]
    Interaction(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CloudError>;
