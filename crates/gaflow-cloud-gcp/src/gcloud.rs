//! gcloud CLI wrapper
//!
//! Wraps the gcloud CLI commands for IAM, Cloud Storage, Cloud Functions,
//! Cloud Scheduler and Workflows operations.

use crate::error::{GcpError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::process::Stdio;
use tokio::process::Command;

/// gcloud CLI wrapper
pub struct Gcloud {
    project: String,
    region: String,
}

impl Gcloud {
    pub fn new(project: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            region: region.into(),
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Check that gcloud is installed and an account is active
    pub async fn check_auth(&self) -> Result<AuthAccount> {
        let which = Command::new("which").arg("gcloud").output().await?;
        if !which.status.success() {
            return Err(GcpError::GcloudNotFound);
        }

        let output = self
            .run(&[
                "auth",
                "list",
                "--filter=status:ACTIVE",
                "--format",
                "json",
            ])
            .await?;

        let accounts: Vec<AuthAccount> = serde_json::from_str(&output)?;
        accounts.into_iter().next().ok_or(GcpError::NotAuthenticated)
    }

    /// Run a gcloud command scoped to the project and return stdout
    async fn run(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new("gcloud");
        cmd.args(args);
        cmd.arg("--project").arg(&self.project);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!(
            "Running: gcloud {} --project {}",
            args.join(" "),
            self.project
        );

        let output = cmd.output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GcpError::CommandFailed(stderr.to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Create a service account
    ///
    /// Returns the account's email, which is deterministic for a given
    /// project (`{id}@{project}.iam.gserviceaccount.com`).
    pub async fn create_service_account(
        &self,
        account_id: &str,
        display_name: &str,
    ) -> Result<ServiceAccountInfo> {
        let output = self
            .run(&[
                "iam",
                "service-accounts",
                "create",
                account_id,
                "--display-name",
                display_name,
                "--format",
                "json",
            ])
            .await?;

        let info: ServiceAccountInfo = serde_json::from_str(&output)?;
        Ok(info)
    }

    /// Email a service account with this id would have in this project
    pub fn service_account_email(&self, account_id: &str) -> String {
        format!("{}@{}.iam.gserviceaccount.com", account_id, self.project)
    }

    /// Grant a project-level role to a member
    ///
    /// `add-iam-policy-binding` is a no-op when the binding is already
    /// present, so this is safe to repeat on reruns.
    pub async fn add_iam_policy_binding(&self, member: &str, role: &str) -> Result<()> {
        self.run(&[
            "projects",
            "add-iam-policy-binding",
            &self.project,
            "--member",
            member,
            "--role",
            role,
            "--format",
            "json",
        ])
        .await?;
        Ok(())
    }

    /// Create a Cloud Storage bucket
    pub async fn create_bucket(&self, name: &str, location: &str) -> Result<()> {
        let uri = format!("gs://{}", name);
        self.run(&[
            "storage",
            "buckets",
            "create",
            &uri,
            "--location",
            location,
            "--format",
            "json",
        ])
        .await?;
        Ok(())
    }

    /// Deploy an HTTP-triggered function
    pub async fn deploy_function(&self, config: &FunctionConfig) -> Result<FunctionInfo> {
        let memory = config.memory.as_str();
        let timeout = format!("{}s", config.timeout_seconds);
        let env_vars = config
            .env_vars
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(",");

        let mut args = vec![
            "functions",
            "deploy",
            config.name.as_str(),
            "--runtime",
            config.runtime.as_str(),
            "--trigger-http",
            "--entry-point",
            config.entry_point.as_str(),
            "--memory",
            memory,
            "--timeout",
            &timeout,
            "--region",
            &self.region,
            "--no-allow-unauthenticated",
            "--format",
            "json",
        ];

        if let Some(ref source) = config.source {
            args.push("--source");
            args.push(source.as_str());
        }
        if let Some(ref service_account) = config.service_account {
            args.push("--service-account");
            args.push(service_account.as_str());
        }
        if !env_vars.is_empty() {
            args.push("--set-env-vars");
            args.push(&env_vars);
        }

        let output = self.run(&args).await?;
        parse_function_info(&output)
    }

    /// Describe a function; `Ok(None)` when it does not exist
    pub async fn describe_function(&self, name: &str) -> Result<Option<FunctionInfo>> {
        match self
            .run(&[
                "functions",
                "describe",
                name,
                "--region",
                &self.region,
                "--format",
                "json",
            ])
            .await
        {
            Ok(output) => Ok(Some(parse_function_info(&output)?)),
            Err(GcpError::CommandFailed(message)) if is_not_found(&message) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Create an HTTP-target scheduler job with OIDC identity
    pub async fn create_scheduler_job(&self, config: &SchedulerJobConfig) -> Result<()> {
        self.run(&[
            "scheduler",
            "jobs",
            "create",
            "http",
            config.name.as_str(),
            "--schedule",
            config.schedule.as_str(),
            "--uri",
            config.uri.as_str(),
            "--http-method",
            config.http_method.as_str(),
            "--oidc-service-account-email",
            config.oidc_service_account_email.as_str(),
            "--location",
            &self.region,
            "--format",
            "json",
        ])
        .await?;
        Ok(())
    }

    /// Deploy a workflow from a definition file
    pub async fn deploy_workflow(
        &self,
        name: &str,
        source_path: &str,
        service_account: Option<&str>,
    ) -> Result<()> {
        let mut args = vec![
            "workflows",
            "deploy",
            name,
            "--source",
            source_path,
            "--location",
            &self.region,
            "--format",
            "json",
        ];
        if let Some(sa) = service_account {
            args.push("--service-account");
            args.push(sa);
        }
        self.run(&args).await?;
        Ok(())
    }

    /// Describe a workflow; `Ok(None)` when it does not exist
    pub async fn describe_workflow(&self, name: &str) -> Result<Option<serde_json::Value>> {
        match self
            .run(&[
                "workflows",
                "describe",
                name,
                "--location",
                &self.region,
                "--format",
                "json",
            ])
            .await
        {
            Ok(output) => Ok(Some(serde_json::from_str(&output)?)),
            Err(GcpError::CommandFailed(message)) if is_not_found(&message) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

fn is_not_found(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("not found") || lower.contains("not_found") || lower.contains("code=404")
}

/// Function URL lives in a different place per functions generation, so
/// the JSON is walked instead of deserialized into one fixed shape.
fn parse_function_info(output: &str) -> Result<FunctionInfo> {
    let value: serde_json::Value = serde_json::from_str(output)?;

    let name = value
        .get("name")
        .and_then(|n| n.as_str())
        .ok_or_else(|| GcpError::UnexpectedOutput("function JSON without a name".to_string()))?
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();

    let url = value
        .pointer("/httpsTrigger/url")
        .or_else(|| value.pointer("/serviceConfig/uri"))
        .or_else(|| value.get("url"))
        .and_then(|u| u.as_str())
        .map(|u| u.to_string());

    Ok(FunctionInfo { name, url })
}

/// Active gcloud account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthAccount {
    pub account: String,
    #[serde(default)]
    pub status: String,
}

/// Service account as printed by `gcloud iam service-accounts create`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccountInfo {
    pub email: String,
    #[serde(rename = "displayName", default)]
    pub display_name: String,
}

/// Deployed function
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    pub url: Option<String>,
}

/// Parameters for `functions deploy`
#[derive(Debug, Clone)]
pub struct FunctionConfig {
    pub name: String,
    pub runtime: String,
    pub entry_point: String,
    pub memory: String,
    pub timeout_seconds: i64,
    pub source: Option<String>,
    pub service_account: Option<String>,
    pub env_vars: HashMap<String, String>,
}

/// Parameters for `scheduler jobs create http`
#[derive(Debug, Clone)]
pub struct SchedulerJobConfig {
    pub name: String,
    pub schedule: String,
    pub uri: String,
    pub http_method: String,
    pub oidc_service_account_email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_account_email_is_deterministic() {
        let gcloud = Gcloud::new("my-proj", "us-central1");
        assert_eq!(
            gcloud.service_account_email("ga-backup"),
            "ga-backup@my-proj.iam.gserviceaccount.com"
        );
    }

    #[test]
    fn test_parse_function_info_gen1() {
        let json = r#"{
            "name": "projects/p/locations/us-central1/functions/ga-downloader",
            "httpsTrigger": {"url": "https://us-central1-p.cloudfunctions.net/ga-downloader"}
        }"#;
        let info = parse_function_info(json).unwrap();
        assert_eq!(info.name, "ga-downloader");
        assert_eq!(
            info.url.as_deref(),
            Some("https://us-central1-p.cloudfunctions.net/ga-downloader")
        );
    }

    #[test]
    fn test_parse_function_info_gen2() {
        let json = r#"{
            "name": "projects/p/locations/us-central1/functions/ga-downloader",
            "serviceConfig": {"uri": "https://ga-downloader-abc-uc.a.run.app"}
        }"#;
        let info = parse_function_info(json).unwrap();
        assert_eq!(info.url.as_deref(), Some("https://ga-downloader-abc-uc.a.run.app"));
    }

    #[test]
    fn test_not_found_classification() {
        assert!(is_not_found(
            "ERROR: (gcloud.functions.describe) ResourceNotFound: not found"
        ));
        assert!(!is_not_found("ERROR: permission denied"));
    }
}
