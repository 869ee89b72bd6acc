//! GCP provider error types

use thiserror::Error;

/// GCP provider errors
#[derive(Error, Debug)]
pub enum GcpError {
    #[error("gcloud CLI not found in PATH")]
    GcloudNotFound,

    #[error("bq CLI not found in PATH")]
    BqNotFound,

    #[error("Not authenticated: run 'gcloud auth login' first")]
    NotAuthenticated,

    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Unexpected CLI output: {0}")]
    UnexpectedOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GcpError {
    /// Whether the failure means the resource is already present
    ///
    /// Both CLIs exit non-zero for this case, so classification has to
    /// look at the message: `bq` prints `Already exists: ...`, gcloud
    /// prints `already exists` / `ALREADY_EXISTS` / HTTP 409 depending
    /// on the service.
    pub fn is_already_exists(&self) -> bool {
        match self {
            GcpError::CommandFailed(message) => {
                let lower = message.to_lowercase();
                lower.contains("already exists")
                    || lower.contains("already_exists")
                    || lower.contains("alreadyexists")
                    || lower.contains("code=409")
                    || lower.contains("duplicate")
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, GcpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_exists_classification() {
        let bq = GcpError::CommandFailed(
            "BigQuery error in mk operation: Dataset 'proj:analytics_settings_database' \
             already exists."
                .to_string(),
        );
        assert!(bq.is_already_exists());

        let gcloud = GcpError::CommandFailed(
            "ERROR: (gcloud.iam.service-accounts.create) Resource in projects [proj] \
             ALREADY_EXISTS: Service account ga-backup already exists within project."
                .to_string(),
        );
        assert!(gcloud.is_already_exists());

        let other = GcpError::CommandFailed("PERMISSION_DENIED: missing role".to_string());
        assert!(!other.is_already_exists());
        assert!(!GcpError::NotAuthenticated.is_already_exists());
    }
}
