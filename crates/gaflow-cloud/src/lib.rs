//! gaflow Cloud Provisioning
//!
//! This crate provides the provider-agnostic provisioning core for
//! gaflow: declarative resource specs, a dependency-ordered idempotent
//! provisioner, and the operator interaction surface.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                   gaflow CLI                     │
//! │          (gaflow setup/tables/overview)          │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                gaflow-cloud                      │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │        Provisioner state machine          │   │
//! │  │  Pending → Attempting → Created /         │   │
//! │  │  AlreadyExists / Failed (retry or abort)  │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐             │
//! │  │ ResourceSpec │  │ Interaction  │             │
//! │  └──────────────┘  └──────────────┘             │
//! └───────────────────────┬─────────────────────────┘
//!                         │ trait ResourceProvider
//!                 ┌───────▼───────┐
//!                 │  gcp provider │
//!                 │ (gcloud / bq) │
//!                 └───────────────┘
//! ```

pub mod error;
pub mod interact;
pub mod progress;
pub mod provider;
pub mod provision;
pub mod result;
pub mod spec;

// Re-exports
pub use error::{CloudError, Result};
pub use interact::Interaction;
pub use progress::{NoProgress, Progress};
pub use provider::{AuthStatus, CreateOutcome, Outputs, ResourceProvider};
pub use provision::{topological_order, Provisioner};
pub use result::{ProvisionResult, ProvisionStatus, RunOutcome, RunReport, RunSummary, SpecState};
pub use spec::{ResolvedSpec, ResourceKind, ResourceSpec};
