//! Google Cloud provider implementation

use crate::bq::{Bq, ScheduledQueryConfig, TableConfig};
use crate::error::GcpError;
use crate::gcloud::{FunctionConfig, Gcloud, SchedulerJobConfig};
use async_trait::async_trait;
use gaflow_cloud::{
    AuthStatus, CloudError, CreateOutcome, Outputs, ResolvedSpec, ResourceKind, ResourceProvider,
};
use std::collections::HashMap;

/// Provider backed by the gcloud and bq CLIs
///
/// Creation is attempted directly for resource kinds whose CLI reports a
/// conflict ("already exists") on its own; for upsert-style commands
/// (`functions deploy`, `workflows deploy`) and for scheduled queries,
/// which `bq` duplicates silently, existence is checked first.
pub struct GcpProvider {
    gcloud: Gcloud,
    bq: Bq,
}

impl GcpProvider {
    pub fn new(project: impl Into<String>, region: impl Into<String>) -> Self {
        let project = project.into();
        Self {
            gcloud: Gcloud::new(project.as_str(), region),
            bq: Bq::new(project),
        }
    }

    async fn create_bucket(&self, spec: &ResolvedSpec) -> gaflow_cloud::Result<CreateOutcome> {
        let name = spec.require_str("name")?;
        let location = spec.param_str("location").unwrap_or("US");

        let mut outputs = Outputs::new();
        outputs.insert("name".to_string(), name.to_string());
        outputs.insert("uri".to_string(), format!("gs://{}", name));

        match self.gcloud.create_bucket(name, location).await {
            Ok(()) => Ok(CreateOutcome::Created(outputs)),
            Err(err) if err.is_already_exists() => Ok(CreateOutcome::AlreadyExists(outputs)),
            Err(err) => Err(creation_failed(spec, err)),
        }
    }

    async fn create_service_account(
        &self,
        spec: &ResolvedSpec,
    ) -> gaflow_cloud::Result<CreateOutcome> {
        let account_id = spec.require_str("account_id")?;
        let display_name = spec.param_str("display_name").unwrap_or(account_id);
        let email = self.gcloud.service_account_email(account_id);

        let mut outputs = Outputs::new();
        outputs.insert("account_id".to_string(), account_id.to_string());
        outputs.insert("email".to_string(), email.clone());

        let outcome = match self
            .gcloud
            .create_service_account(account_id, display_name)
            .await
        {
            Ok(_) => CreateOutcome::Created(outputs),
            Err(err) if err.is_already_exists() => CreateOutcome::AlreadyExists(outputs),
            Err(err) => return Err(creation_failed(spec, err)),
        };

        // Role bindings are additive no-ops when present, so they are
        // (re)applied on both paths.
        if let Some(roles) = spec.parameters.get("roles").and_then(|r| r.as_array()) {
            let member = format!("serviceAccount:{}", email);
            for role in roles.iter().filter_map(|r| r.as_str()) {
                self.gcloud
                    .add_iam_policy_binding(&member, role)
                    .await
                    .map_err(|err| creation_failed(spec, err))?;
            }
        }

        Ok(outcome)
    }

    async fn create_function(&self, spec: &ResolvedSpec) -> gaflow_cloud::Result<CreateOutcome> {
        let name = spec.require_str("name")?;

        // `functions deploy` is an upsert; describe first so a rerun is
        // reported as already_exists instead of silently redeploying.
        if let Some(existing) = self
            .gcloud
            .describe_function(name)
            .await
            .map_err(|err| creation_failed(spec, err))?
        {
            return Ok(CreateOutcome::AlreadyExists(function_outputs(&existing)));
        }

        let env_vars: HashMap<String, String> = spec
            .parameters
            .get("env_vars")
            .and_then(|v| v.as_object())
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        let config = FunctionConfig {
            name: name.to_string(),
            runtime: spec.require_str("runtime")?.to_string(),
            entry_point: spec.require_str("entry_point")?.to_string(),
            memory: spec.param_str("memory").unwrap_or("256MB").to_string(),
            timeout_seconds: spec.param_i64("timeout_seconds").unwrap_or(60),
            source: spec.param_str("source").map(|s| s.to_string()),
            service_account: spec.param_str("service_account").map(|s| s.to_string()),
            env_vars,
        };

        let info = self
            .gcloud
            .deploy_function(&config)
            .await
            .map_err(|err| creation_failed(spec, err))?;
        Ok(CreateOutcome::Created(function_outputs(&info)))
    }

    async fn create_dataset(&self, spec: &ResolvedSpec) -> gaflow_cloud::Result<CreateOutcome> {
        let dataset_id = spec.require_str("dataset_id")?;

        let mut outputs = Outputs::new();
        outputs.insert("dataset_id".to_string(), dataset_id.to_string());

        match self
            .bq
            .mk_dataset(dataset_id, spec.param_str("description"))
            .await
        {
            Ok(()) => Ok(CreateOutcome::Created(outputs)),
            Err(err) if err.is_already_exists() => Ok(CreateOutcome::AlreadyExists(outputs)),
            Err(err) => Err(creation_failed(spec, err)),
        }
    }

    async fn create_table(&self, spec: &ResolvedSpec) -> gaflow_cloud::Result<CreateOutcome> {
        let dataset_id = spec.require_str("dataset_id")?;
        let table_id = spec.require_str("table_id")?;

        let config = TableConfig {
            dataset_id: dataset_id.to_string(),
            table_id: table_id.to_string(),
            schema_path: spec.param_str("schema_path").map(|s| s.to_string()),
            partition_by_day: spec
                .parameters
                .get("partition_by_day")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            description: spec.param_str("description").map(|s| s.to_string()),
        };

        let mut outputs = Outputs::new();
        outputs.insert(
            "table_id".to_string(),
            format!("{}.{}", dataset_id, table_id),
        );

        match self.bq.mk_table(&config).await {
            Ok(()) => Ok(CreateOutcome::Created(outputs)),
            Err(err) if err.is_already_exists() => Ok(CreateOutcome::AlreadyExists(outputs)),
            Err(err) => Err(creation_failed(spec, err)),
        }
    }

    async fn create_scheduler_job(
        &self,
        spec: &ResolvedSpec,
    ) -> gaflow_cloud::Result<CreateOutcome> {
        let name = spec.require_str("name")?;

        let config = SchedulerJobConfig {
            name: name.to_string(),
            schedule: spec.require_str("schedule")?.to_string(),
            uri: spec.require_str("uri")?.to_string(),
            http_method: spec.param_str("http_method").unwrap_or("POST").to_string(),
            oidc_service_account_email: spec
                .require_str("oidc_service_account_email")?
                .to_string(),
        };

        let mut outputs = Outputs::new();
        outputs.insert("name".to_string(), name.to_string());

        match self.gcloud.create_scheduler_job(&config).await {
            Ok(()) => Ok(CreateOutcome::Created(outputs)),
            Err(err) if err.is_already_exists() => Ok(CreateOutcome::AlreadyExists(outputs)),
            Err(err) => Err(creation_failed(spec, err)),
        }
    }

    async fn create_scheduled_query(
        &self,
        spec: &ResolvedSpec,
    ) -> gaflow_cloud::Result<CreateOutcome> {
        let display_name = spec.require_str("display_name")?;
        let location = spec.param_str("location").unwrap_or("us");

        let mut outputs = Outputs::new();
        outputs.insert("display_name".to_string(), display_name.to_string());

        if let Some(existing) = self
            .bq
            .find_scheduled_query(display_name, location)
            .await
            .map_err(|err| creation_failed(spec, err))?
        {
            outputs.insert("name".to_string(), existing.name);
            return Ok(CreateOutcome::AlreadyExists(outputs));
        }

        let config = ScheduledQueryConfig {
            display_name: display_name.to_string(),
            target_dataset: spec.require_str("target_dataset")?.to_string(),
            schedule: spec.require_str("schedule")?.to_string(),
            query: spec.require_str("query")?.to_string(),
            destination_table: spec.param_str("destination_table").map(|s| s.to_string()),
        };

        self.bq
            .mk_scheduled_query(&config)
            .await
            .map_err(|err| creation_failed(spec, err))?;
        Ok(CreateOutcome::Created(outputs))
    }

    async fn create_workflow(&self, spec: &ResolvedSpec) -> gaflow_cloud::Result<CreateOutcome> {
        let name = spec.require_str("name")?;

        let mut outputs = Outputs::new();
        outputs.insert("name".to_string(), name.to_string());

        if self
            .gcloud
            .describe_workflow(name)
            .await
            .map_err(|err| creation_failed(spec, err))?
            .is_some()
        {
            return Ok(CreateOutcome::AlreadyExists(outputs));
        }

        self.gcloud
            .deploy_workflow(
                name,
                spec.require_str("source")?,
                spec.param_str("service_account"),
            )
            .await
            .map_err(|err| creation_failed(spec, err))?;
        Ok(CreateOutcome::Created(outputs))
    }
}

#[async_trait]
impl ResourceProvider for GcpProvider {
    fn name(&self) -> &str {
        "gcp"
    }

    async fn check_auth(&self) -> gaflow_cloud::Result<AuthStatus> {
        if let Err(err) = self.bq.check_installed().await {
            return Ok(AuthStatus::failed(err.to_string()));
        }
        match self.gcloud.check_auth().await {
            Ok(account) => Ok(AuthStatus::ok(account.account)),
            Err(err) => Ok(AuthStatus::failed(err.to_string())),
        }
    }

    async fn create(&self, spec: &ResolvedSpec) -> gaflow_cloud::Result<CreateOutcome> {
        match spec.kind {
            ResourceKind::Bucket => self.create_bucket(spec).await,
            ResourceKind::ServiceAccount => self.create_service_account(spec).await,
            ResourceKind::Function => self.create_function(spec).await,
            ResourceKind::Dataset => self.create_dataset(spec).await,
            ResourceKind::Table => self.create_table(spec).await,
            ResourceKind::SchedulerJob => self.create_scheduler_job(spec).await,
            ResourceKind::ScheduledQuery => self.create_scheduled_query(spec).await,
            ResourceKind::Workflow => self.create_workflow(spec).await,
        }
    }
}

fn function_outputs(info: &crate::gcloud::FunctionInfo) -> Outputs {
    let mut outputs = Outputs::new();
    outputs.insert("name".to_string(), info.name.clone());
    if let Some(ref url) = info.url {
        outputs.insert("url".to_string(), url.clone());
    }
    outputs
}

fn creation_failed(spec: &ResolvedSpec, err: GcpError) -> CloudError {
    CloudError::CreationFailed {
        spec: spec.name.clone(),
        message: err.to_string(),
    }
}
