//! Provisioning results and run reports

use crate::provider::Outputs;
use crate::spec::ResourceKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terminal status of one spec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionStatus {
    /// The resource was created by this run
    Created,
    /// The resource was already present
    AlreadyExists,
    /// The last attempt failed and the operator declined to retry
    Failed,
}

impl std::fmt::Display for ProvisionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProvisionStatus::Created => write!(f, "created"),
            ProvisionStatus::AlreadyExists => write!(f, "already_exists"),
            ProvisionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Per-spec state machine
///
/// `Pending → Attempting → {Created, AlreadyExists, Failed}`;
/// `Failed → Attempting` on an operator-confirmed retry,
/// `Failed → Aborted` when the operator declines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecState {
    Pending,
    Attempting,
    Created,
    AlreadyExists,
    Failed,
    Aborted,
}

impl std::fmt::Display for SpecState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpecState::Pending => write!(f, "pending"),
            SpecState::Attempting => write!(f, "attempting"),
            SpecState::Created => write!(f, "created"),
            SpecState::AlreadyExists => write!(f, "already_exists"),
            SpecState::Failed => write!(f, "failed"),
            SpecState::Aborted => write!(f, "aborted"),
        }
    }
}

/// Outcome and outputs of provisioning one spec
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionResult {
    /// Back-reference to the spec
    pub spec_name: String,

    /// Kind of the provisioned resource
    pub kind: ResourceKind,

    /// Terminal status
    pub status: ProvisionStatus,

    /// Outputs made available to dependent specs
    pub outputs: Outputs,

    /// Number of failed attempts before the terminal status
    pub retries: u32,
}

impl ProvisionResult {
    pub fn is_success(&self) -> bool {
        matches!(
            self.status,
            ProvisionStatus::Created | ProvisionStatus::AlreadyExists
        )
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every spec reached a successful terminal status
    Completed,
    /// The operator declined a retry; later specs were never attempted
    Aborted { spec_name: String },
}

/// Ordered results of one provisioning run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<ProvisionResult>,
    pub outcome: RunOutcome,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            created: self.count(ProvisionStatus::Created),
            already_existed: self.count(ProvisionStatus::AlreadyExists),
            failed: self.count(ProvisionStatus::Failed),
        }
    }

    /// Outputs of a spec, if it reached a successful status
    pub fn outputs_of(&self, spec_name: &str) -> Option<&Outputs> {
        self.results
            .iter()
            .find(|r| r.spec_name == spec_name && r.is_success())
            .map(|r| &r.outputs)
    }

    fn count(&self, status: ProvisionStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}

/// Summary counts for the final banner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub created: usize,
    pub already_existed: usize,
    pub failed: usize,
}
