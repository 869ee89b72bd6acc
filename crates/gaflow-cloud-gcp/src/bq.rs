//! bq CLI wrapper
//!
//! Wraps the bq CLI for dataset, table and scheduled-query operations.

use crate::error::{GcpError, Result};
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use tokio::process::Command;

/// bq CLI wrapper
pub struct Bq {
    project: String,
}

impl Bq {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
        }
    }

    /// Check that bq is installed
    pub async fn check_installed(&self) -> Result<()> {
        let which = Command::new("which").arg("bq").output().await?;
        if !which.status.success() {
            return Err(GcpError::BqNotFound);
        }
        Ok(())
    }

    /// Run a bq command scoped to the project and return stdout
    ///
    /// bq prints some errors on stdout rather than stderr, so both
    /// streams feed the failure message.
    async fn run(&self, args: &[&str]) -> Result<String> {
        let project_flag = format!("--project_id={}", self.project);
        let mut cmd = Command::new("bq");
        cmd.arg(&project_flag);
        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: bq {} {}", project_flag, args.join(" "));

        let output = cmd.output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let message = if stderr.trim().is_empty() {
                stdout.to_string()
            } else {
                stderr.to_string()
            };
            return Err(GcpError::CommandFailed(message));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Create a dataset
    pub async fn mk_dataset(&self, dataset_id: &str, description: Option<&str>) -> Result<()> {
        let qualified = format!("{}:{}", self.project, dataset_id);
        let mut args = vec!["mk", "-d"];
        if let Some(description) = description {
            args.push("--description");
            args.push(description);
        }
        args.push(&qualified);
        self.run(&args).await?;
        Ok(())
    }

    /// Create a table, optionally with a JSON schema file and day-level
    /// time partitioning
    pub async fn mk_table(&self, config: &TableConfig) -> Result<()> {
        let qualified = format!("{}:{}.{}", self.project, config.dataset_id, config.table_id);
        let mut args = vec!["mk", "-t"];
        if config.partition_by_day {
            args.push("--time_partitioning_type");
            args.push("DAY");
        }
        if let Some(ref schema) = config.schema_path {
            args.push("--schema");
            args.push(schema.as_str());
        }
        if let Some(ref description) = config.description {
            args.push("--description");
            args.push(description.as_str());
        }
        args.push(&qualified);
        self.run(&args).await?;
        Ok(())
    }

    /// Create a recurring scheduled query (transfer config)
    pub async fn mk_scheduled_query(&self, config: &ScheduledQueryConfig) -> Result<()> {
        let display_name = format!("--display_name={}", config.display_name);
        let target_dataset = format!("--target_dataset={}", config.target_dataset);
        let schedule = format!("--schedule={}", config.schedule);
        let mut params = serde_json::json!({ "query": config.query });
        if let Some(ref destination) = config.destination_table {
            params["destination_table_name_template"] =
                serde_json::Value::String(destination.clone());
            params["write_disposition"] = serde_json::Value::String("WRITE_APPEND".to_string());
        }
        let params_flag = format!("--params={}", params);

        self.run(&[
            "mk",
            "--transfer_config",
            "--data_source=scheduled_query",
            &display_name,
            &target_dataset,
            &schedule,
            &params_flag,
        ])
        .await?;
        Ok(())
    }

    /// Find a scheduled query by display name
    ///
    /// `bq mk --transfer_config` happily creates duplicates, so reruns
    /// must look the config up first.
    pub async fn find_scheduled_query(
        &self,
        display_name: &str,
        location: &str,
    ) -> Result<Option<TransferConfigInfo>> {
        let location_flag = format!("--transfer_location={}", location);
        let output = self
            .run(&["ls", "--transfer_config", &location_flag, "--format=json"])
            .await?;

        if output.trim().is_empty() {
            return Ok(None);
        }

        let configs: Vec<TransferConfigInfo> = serde_json::from_str(&output)?;
        Ok(configs
            .into_iter()
            .find(|c| c.display_name == display_name))
    }
}

/// Parameters for `bq mk -t`
#[derive(Debug, Clone)]
pub struct TableConfig {
    pub dataset_id: String,
    pub table_id: String,
    pub schema_path: Option<String>,
    pub partition_by_day: bool,
    pub description: Option<String>,
}

/// Parameters for `bq mk --transfer_config --data_source=scheduled_query`
#[derive(Debug, Clone)]
pub struct ScheduledQueryConfig {
    pub display_name: String,
    pub target_dataset: String,
    pub schedule: String,
    pub query: String,
    /// Table the query results are appended to, if any
    pub destination_table: Option<String>,
}

/// Transfer config row from `bq ls --transfer_config`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfigInfo {
    pub name: String,
    #[serde(rename = "displayName", alias = "display_name")]
    pub display_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_config_row_parses_both_casings() {
        let camel = r#"[{"name": "projects/1/transferConfigs/2", "displayName": "health"}]"#;
        let rows: Vec<TransferConfigInfo> = serde_json::from_str(camel).unwrap();
        assert_eq!(rows[0].display_name, "health");

        let snake = r#"[{"name": "projects/1/transferConfigs/2", "display_name": "health"}]"#;
        let rows: Vec<TransferConfigInfo> = serde_json::from_str(snake).unwrap();
        assert_eq!(rows[0].display_name, "health");
    }
}
