//! Resource provider abstraction
//!
//! A provider knows how to turn one [`ResolvedSpec`] into a real cloud
//! resource. The provisioner never talks to a cloud API directly; it
//! only sees [`CreateOutcome`] values.

use crate::error::Result;
use crate::spec::ResolvedSpec;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outputs a resource exposes to dependent specs (emails, URLs, ids)
pub type Outputs = HashMap<String, String>;

/// Result of one creation attempt against the cloud
#[derive(Debug, Clone)]
pub enum CreateOutcome {
    /// The resource did not exist and was created
    Created(Outputs),

    /// The resource already existed; outputs describe the existing one
    AlreadyExists(Outputs),
}

impl CreateOutcome {
    pub fn outputs(&self) -> &Outputs {
        match self {
            CreateOutcome::Created(outputs) => outputs,
            CreateOutcome::AlreadyExists(outputs) => outputs,
        }
    }
}

/// Provider abstraction trait
///
/// Implementations map each resource kind to the cloud-specific creation
/// call. Reporting `AlreadyExists` instead of an error for resources that
/// are already present is what makes whole-catalog reruns idempotent.
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Provider name (e.g. "gcp")
    fn name(&self) -> &str;

    /// Check that the provider's CLI/API is usable and authenticated
    async fn check_auth(&self) -> Result<AuthStatus>;

    /// Attempt to create the resource described by `spec`
    ///
    /// Must return `Ok(CreateOutcome::AlreadyExists(..))` when the cloud
    /// reports the resource as already present, and `Err` for any other
    /// failure. Blocks until the underlying call completes.
    async fn create(&self, spec: &ResolvedSpec) -> Result<CreateOutcome>;
}

/// Authentication status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    /// Whether authentication is valid
    pub authenticated: bool,

    /// Active account, if known
    pub account: Option<String>,

    /// Error message if not authenticated
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn ok(account: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            account: Some(account.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            account: None,
            error: Some(error.into()),
        }
    }
}
