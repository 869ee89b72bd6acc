//! Run progress hooks
//!
//! The provisioner reports step lifecycle events through this trait so
//! the CLI can print banners without the core depending on a terminal.

use crate::result::ProvisionResult;
use crate::spec::ResourceSpec;

/// Observer for per-step progress
pub trait Progress: Send + Sync {
    /// A spec is about to be attempted for the first time
    fn step_started(&self, _spec: &ResourceSpec) {}

    /// One attempt failed; the operator will be asked about a retry
    fn attempt_failed(&self, _spec: &ResourceSpec, _error: &str) {}

    /// The spec reached a terminal status
    fn step_finished(&self, _result: &ProvisionResult) {}
}

/// Progress sink that reports nothing
pub struct NoProgress;

impl Progress for NoProgress {}
