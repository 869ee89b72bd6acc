//! Declarative resource specifications
//!
//! A [`ResourceSpec`] describes one cloud resource that should exist:
//! its kind, its creation parameters, and the other specs whose outputs
//! it needs. Specs are plain data; the provisioner consults them but
//! never mutates them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The kinds of resources the provisioner knows how to ensure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Cloud Storage bucket
    Bucket,
    /// IAM service account
    ServiceAccount,
    /// HTTP-triggered serverless function
    Function,
    /// BigQuery dataset
    Dataset,
    /// BigQuery table
    Table,
    /// Cloud Scheduler job
    SchedulerJob,
    /// BigQuery scheduled query (transfer config)
    ScheduledQuery,
    /// Workflow definition
    Workflow,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Bucket => write!(f, "bucket"),
            ResourceKind::ServiceAccount => write!(f, "service_account"),
            ResourceKind::Function => write!(f, "function"),
            ResourceKind::Dataset => write!(f, "dataset"),
            ResourceKind::Table => write!(f, "table"),
            ResourceKind::SchedulerJob => write!(f, "scheduler_job"),
            ResourceKind::ScheduledQuery => write!(f, "scheduled_query"),
            ResourceKind::Workflow => write!(f, "workflow"),
        }
    }
}

/// Declarative description of one cloud resource to ensure exists
///
/// String parameters may reference outputs of other specs with the
/// `${spec_name.output_key}` syntax; the referenced spec must be listed
/// in `depends_on`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Identifier, unique within one catalog
    pub name: String,

    /// Resource kind
    pub kind: ResourceKind,

    /// Kind-specific creation parameters
    #[serde(default)]
    pub parameters: HashMap<String, serde_json::Value>,

    /// Names of specs whose outputs must be resolved first
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl ResourceSpec {
    pub fn new(name: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parameters: HashMap::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn with_param(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_dependency(mut self, spec_name: impl Into<String>) -> Self {
        self.depends_on.push(spec_name.into());
        self
    }

    /// Get a string parameter, if present and a string
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(|v| v.as_str())
    }
}

/// A spec whose parameter references have been substituted
///
/// Produced by the provisioner immediately before a creation attempt;
/// this is what a provider actually sees.
#[derive(Debug, Clone)]
pub struct ResolvedSpec {
    pub name: String,
    pub kind: ResourceKind,
    pub parameters: HashMap<String, serde_json::Value>,
}

impl ResolvedSpec {
    /// Get a string parameter, if present and a string
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(|v| v.as_str())
    }

    /// Get a required string parameter
    pub fn require_str(&self, key: &str) -> crate::error::Result<&str> {
        self.param_str(key)
            .ok_or_else(|| crate::error::CloudError::InvalidSpec {
                spec: self.name.clone(),
                message: format!("missing parameter '{}'", key),
            })
    }

    /// Get an integer parameter, if present
    pub fn param_i64(&self, key: &str) -> Option<i64> {
        self.parameters.get(key).and_then(|v| v.as_i64())
    }
}
