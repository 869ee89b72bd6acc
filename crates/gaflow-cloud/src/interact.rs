//! Operator interaction abstraction
//!
//! The provisioner itself never reads stdin; it asks an [`Interaction`]
//! implementation. The CLI provides a console implementation, tests a
//! scripted one.

use crate::error::Result;

/// Operator interaction surface
pub trait Interaction: Send + Sync {
    /// Ask the operator for a value; must not return an empty string.
    fn prompt(&self, field: &str, help: &str) -> Result<String>;

    /// Ask whether a failed step should be retried.
    ///
    /// `true` retries the same step, `false` aborts the remaining run.
    fn confirm_retry(&self, step: &str) -> Result<bool>;
}
