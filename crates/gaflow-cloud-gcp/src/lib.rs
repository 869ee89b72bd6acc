//! Google Cloud provider for gaflow
//!
//! Ensures buckets, service accounts, functions, BigQuery datasets and
//! tables, scheduler jobs, scheduled queries and workflows exist, by
//! wrapping the gcloud and bq CLIs.

pub mod bq;
pub mod error;
pub mod gcloud;
pub mod provider;

pub use bq::{Bq, ScheduledQueryConfig, TableConfig};
pub use error::{GcpError, Result};
pub use gcloud::{FunctionConfig, Gcloud, SchedulerJobConfig};
pub use provider::GcpProvider;
