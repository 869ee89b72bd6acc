//! Dependency-ordered idempotent provisioning
//!
//! The [`Provisioner`] walks a catalog of [`ResourceSpec`]s in an order
//! that respects `depends_on`, attempts each one through a
//! [`ResourceProvider`], treats "already exists" as success, and asks the
//! [`Interaction`] layer whether to retry a failed step. A declined retry
//! aborts the rest of the run; resources created so far are left in place.

use crate::error::{CloudError, Result};
use crate::interact::Interaction;
use crate::progress::{NoProgress, Progress};
use crate::provider::{CreateOutcome, Outputs, ResourceProvider};
use crate::result::{ProvisionResult, ProvisionStatus, RunOutcome, RunReport, SpecState};
use crate::spec::{ResolvedSpec, ResourceSpec};
use chrono::Utc;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Pattern for `${spec_name.output_key}` references inside string parameters
const OUTPUT_REF_PATTERN: &str = r"\$\{([A-Za-z0-9_-]+)\.([A-Za-z0-9_-]+)\}";

/// Executes a spec catalog against a provider, one spec at a time
pub struct Provisioner<'a> {
    provider: &'a dyn ResourceProvider,
    interaction: &'a dyn Interaction,
    progress: &'a dyn Progress,
}

impl<'a> Provisioner<'a> {
    pub fn new(provider: &'a dyn ResourceProvider, interaction: &'a dyn Interaction) -> Self {
        Self {
            provider,
            interaction,
            progress: &NoProgress,
        }
    }

    /// Attach a progress observer (step banners in the CLI)
    pub fn with_progress(mut self, progress: &'a dyn Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Run the whole catalog
    ///
    /// Fails fast with [`CloudError::CyclicDependency`] or
    /// [`CloudError::DuplicateSpec`] before any cloud call. Returns a
    /// report for both completed and operator-aborted runs; fatal
    /// configuration errors (including an unresolvable
    /// `${spec.key}` reference) surface as `Err`.
    pub async fn run(&self, specs: &[ResourceSpec]) -> Result<RunReport> {
        let order = topological_order(specs)?;
        let started_at = Utc::now();

        let mut results: Vec<ProvisionResult> = Vec::new();
        let mut resolved_outputs: HashMap<String, Outputs> = HashMap::new();

        for idx in order {
            let spec = &specs[idx];
            let resolved = resolve_parameters(spec, &resolved_outputs)?;

            let mut retries = 0u32;
            let mut state = SpecState::Pending;
            debug!(spec = %spec.name, kind = %spec.kind, state = %state, "queued");
            self.progress.step_started(spec);

            let (status, outputs) = loop {
                state = SpecState::Attempting;
                debug!(spec = %spec.name, kind = %spec.kind, state = %state, "attempting");

                match self.provider.create(&resolved).await {
                    Ok(CreateOutcome::Created(outputs)) => {
                        state = SpecState::Created;
                        debug!(spec = %spec.name, state = %state, "resource created");
                        break (ProvisionStatus::Created, outputs);
                    }
                    Ok(CreateOutcome::AlreadyExists(outputs)) => {
                        state = SpecState::AlreadyExists;
                        debug!(spec = %spec.name, state = %state, "resource already present");
                        break (ProvisionStatus::AlreadyExists, outputs);
                    }
                    Err(err) => {
                        state = SpecState::Failed;
                        warn!(spec = %spec.name, state = %state, error = %err, "attempt failed");
                        self.progress.attempt_failed(spec, &err.to_string());

                        if self.interaction.confirm_retry(&spec.name)? {
                            retries += 1;
                            continue;
                        }

                        state = SpecState::Aborted;
                        debug!(spec = %spec.name, state = %state, "operator declined retry");
                        let result = ProvisionResult {
                            spec_name: spec.name.clone(),
                            kind: spec.kind,
                            status: ProvisionStatus::Failed,
                            outputs: Outputs::new(),
                            retries,
                        };
                        self.progress.step_finished(&result);
                        results.push(result);
                        return Ok(RunReport {
                            started_at,
                            finished_at: Utc::now(),
                            results,
                            outcome: RunOutcome::Aborted {
                                spec_name: spec.name.clone(),
                            },
                        });
                    }
                }
            };

            resolved_outputs.insert(spec.name.clone(), outputs.clone());
            let result = ProvisionResult {
                spec_name: spec.name.clone(),
                kind: spec.kind,
                status,
                outputs,
                retries,
            };
            self.progress.step_finished(&result);
            results.push(result);
        }

        Ok(RunReport {
            started_at,
            finished_at: Utc::now(),
            results,
            outcome: RunOutcome::Completed,
        })
    }
}

/// Order spec indices so every spec comes after all of its dependencies
///
/// Kahn's algorithm, but ready specs are drained in catalog order so the
/// resulting plan is deterministic for a given catalog.
pub fn topological_order(specs: &[ResourceSpec]) -> Result<Vec<usize>> {
    let mut index_by_name: HashMap<&str, usize> = HashMap::new();
    for (idx, spec) in specs.iter().enumerate() {
        if index_by_name.insert(spec.name.as_str(), idx).is_some() {
            return Err(CloudError::DuplicateSpec(spec.name.clone()));
        }
    }

    // depends_on entries must name known specs
    let mut pending_deps: Vec<HashSet<usize>> = Vec::with_capacity(specs.len());
    for spec in specs {
        let mut deps = HashSet::new();
        for dep in &spec.depends_on {
            match index_by_name.get(dep.as_str()) {
                Some(&dep_idx) => {
                    deps.insert(dep_idx);
                }
                None => {
                    return Err(CloudError::UnresolvedDependency {
                        spec: spec.name.clone(),
                        reference: dep.clone(),
                    });
                }
            }
        }
        pending_deps.push(deps);
    }

    let mut order = Vec::with_capacity(specs.len());
    let mut placed = vec![false; specs.len()];

    while order.len() < specs.len() {
        let next = (0..specs.len()).find(|&i| !placed[i] && pending_deps[i].is_empty());
        let Some(idx) = next else {
            // Everything left is waiting on something else: a cycle.
            let stuck = (0..specs.len())
                .find(|&i| !placed[i])
                .map(|i| specs[i].name.clone())
                .unwrap_or_default();
            return Err(CloudError::CyclicDependency(stuck));
        };

        placed[idx] = true;
        order.push(idx);
        for deps in pending_deps.iter_mut() {
            deps.remove(&idx);
        }
    }

    Ok(order)
}

/// Substitute `${spec.key}` references against resolved outputs
///
/// A reference is only legal when the named spec is listed in
/// `depends_on` and has produced that output key; anything else is an
/// [`CloudError::UnresolvedDependency`].
fn resolve_parameters(
    spec: &ResourceSpec,
    resolved_outputs: &HashMap<String, Outputs>,
) -> Result<ResolvedSpec> {
    let re = Regex::new(OUTPUT_REF_PATTERN).unwrap();
    let mut parameters = HashMap::with_capacity(spec.parameters.len());

    for (key, value) in &spec.parameters {
        parameters.insert(key.clone(), resolve_value(spec, value, &re, resolved_outputs)?);
    }

    Ok(ResolvedSpec {
        name: spec.name.clone(),
        kind: spec.kind,
        parameters,
    })
}

/// Walk a parameter value, substituting references inside every string
///
/// Arrays and objects are traversed so references work in nested values
/// such as env-var maps; numbers and booleans pass through untouched.
fn resolve_value(
    spec: &ResourceSpec,
    value: &serde_json::Value,
    re: &Regex,
    resolved_outputs: &HashMap<String, Outputs>,
) -> Result<serde_json::Value> {
    use serde_json::Value;

    Ok(match value {
        Value::String(text) => Value::String(substitute(spec, text, re, resolved_outputs)?),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| resolve_value(spec, item, re, resolved_outputs))
                .collect::<Result<_>>()?,
        ),
        Value::Object(map) => {
            let mut resolved = serde_json::Map::with_capacity(map.len());
            for (key, item) in map {
                resolved.insert(key.clone(), resolve_value(spec, item, re, resolved_outputs)?);
            }
            Value::Object(resolved)
        }
        other => other.clone(),
    })
}

fn substitute(
    spec: &ResourceSpec,
    text: &str,
    re: &Regex,
    resolved_outputs: &HashMap<String, Outputs>,
) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for caps in re.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        let dep_name = &caps[1];
        let output_key = &caps[2];

        if !spec.depends_on.iter().any(|d| d == dep_name) {
            return Err(CloudError::UnresolvedDependency {
                spec: spec.name.clone(),
                reference: format!("${{{}.{}}} (not in depends_on)", dep_name, output_key),
            });
        }

        let value = resolved_outputs
            .get(dep_name)
            .and_then(|outputs| outputs.get(output_key))
            .ok_or_else(|| CloudError::UnresolvedDependency {
                spec: spec.name.clone(),
                reference: format!("${{{}.{}}}", dep_name, output_key),
            })?;

        out.push_str(&text[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }

    out.push_str(&text[last..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::ResourceKind;
    use std::sync::Mutex;

    /// Scripted provider: per-spec behavior plus a call log
    #[derive(Default)]
    struct MockProvider {
        /// Specs the "cloud" already contains
        existing: HashSet<String>,
        /// Number of failures to inject per spec before succeeding
        failures: Mutex<HashMap<String, u32>>,
        /// Extra outputs to expose per spec
        outputs: HashMap<String, Outputs>,
        /// Order in which create() was called
        calls: Mutex<Vec<String>>,
        /// Parameters each create() call actually saw
        seen_params: Mutex<HashMap<String, HashMap<String, serde_json::Value>>>,
    }

    impl MockProvider {
        fn with_existing(mut self, name: &str) -> Self {
            self.existing.insert(name.to_string());
            self
        }

        fn with_failures(self, name: &str, count: u32) -> Self {
            self.failures
                .lock()
                .unwrap()
                .insert(name.to_string(), count);
            self
        }

        fn with_outputs(mut self, name: &str, pairs: &[(&str, &str)]) -> Self {
            let outputs = pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            self.outputs.insert(name.to_string(), outputs);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn position(&self, name: &str) -> Option<usize> {
            self.calls().iter().position(|c| c == name)
        }
    }

    #[async_trait::async_trait]
    impl ResourceProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        async fn check_auth(&self) -> Result<crate::provider::AuthStatus> {
            Ok(crate::provider::AuthStatus::ok("mock@example.test"))
        }

        async fn create(&self, spec: &ResolvedSpec) -> Result<CreateOutcome> {
            self.calls.lock().unwrap().push(spec.name.clone());
            self.seen_params
                .lock()
                .unwrap()
                .insert(spec.name.clone(), spec.parameters.clone());

            let mut failures = self.failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(&spec.name) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(CloudError::CreationFailed {
                        spec: spec.name.clone(),
                        message: "injected failure".to_string(),
                    });
                }
            }

            let outputs = self.outputs.get(&spec.name).cloned().unwrap_or_default();
            if self.existing.contains(&spec.name) {
                Ok(CreateOutcome::AlreadyExists(outputs))
            } else {
                Ok(CreateOutcome::Created(outputs))
            }
        }
    }

    /// Interaction double with a fixed retry answer
    struct ScriptedInteraction {
        retry_answer: bool,
        questions: Mutex<Vec<String>>,
    }

    impl ScriptedInteraction {
        fn always(retry_answer: bool) -> Self {
            Self {
                retry_answer,
                questions: Mutex::new(Vec::new()),
            }
        }
    }

    impl Interaction for ScriptedInteraction {
        fn prompt(&self, _field: &str, _help: &str) -> Result<String> {
            Ok("value".to_string())
        }

        fn confirm_retry(&self, step: &str) -> Result<bool> {
            self.questions.lock().unwrap().push(step.to_string());
            Ok(self.retry_answer)
        }
    }

    fn spec(name: &str, kind: ResourceKind) -> ResourceSpec {
        ResourceSpec::new(name, kind)
    }

    #[tokio::test]
    async fn test_order_respects_dependencies() {
        // Declared deliberately out of dependency order
        let specs = vec![
            spec("job", ResourceKind::SchedulerJob)
                .with_dependency("fun")
                .with_dependency("sa"),
            spec("fun", ResourceKind::Function).with_dependency("sa"),
            spec("sa", ResourceKind::ServiceAccount),
        ];
        let provider = MockProvider::default();
        let interaction = ScriptedInteraction::always(true);

        let report = Provisioner::new(&provider, &interaction)
            .run(&specs)
            .await
            .unwrap();

        assert!(report.is_success());
        assert!(provider.position("sa").unwrap() < provider.position("fun").unwrap());
        assert!(provider.position("fun").unwrap() < provider.position("job").unwrap());
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let specs = vec![
            spec("ds", ResourceKind::Dataset),
            spec("tbl", ResourceKind::Table).with_dependency("ds"),
        ];
        let provider = MockProvider::default()
            .with_existing("ds")
            .with_existing("tbl")
            .with_outputs("ds", &[("dataset_id", "proj:settings")])
            .with_outputs("tbl", &[("table_id", "proj:settings.ua_goals")]);
        let interaction = ScriptedInteraction::always(true);
        let provisioner = Provisioner::new(&provider, &interaction);

        let first = provisioner.run(&specs).await.unwrap();
        let second = provisioner.run(&specs).await.unwrap();

        for report in [&first, &second] {
            assert!(report.is_success());
            assert!(report
                .results
                .iter()
                .all(|r| r.status == ProvisionStatus::AlreadyExists));
        }
        assert_eq!(
            first.outputs_of("ds").unwrap(),
            second.outputs_of("ds").unwrap()
        );
        assert_eq!(
            first.outputs_of("tbl").unwrap(),
            second.outputs_of("tbl").unwrap()
        );
    }

    #[tokio::test]
    async fn test_cycle_rejected_before_any_call() {
        let specs = vec![
            spec("a", ResourceKind::Bucket).with_dependency("b"),
            spec("b", ResourceKind::Bucket).with_dependency("a"),
        ];
        let provider = MockProvider::default();
        let interaction = ScriptedInteraction::always(true);

        let err = Provisioner::new(&provider, &interaction)
            .run(&specs)
            .await
            .unwrap_err();

        assert!(matches!(err, CloudError::CyclicDependency(_)));
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let specs = vec![
            spec("ds", ResourceKind::Dataset),
            spec("ds", ResourceKind::Dataset),
        ];
        let provider = MockProvider::default();
        let interaction = ScriptedInteraction::always(true);

        let err = Provisioner::new(&provider, &interaction)
            .run(&specs)
            .await
            .unwrap_err();

        assert!(matches!(err, CloudError::DuplicateSpec(name) if name == "ds"));
    }

    #[tokio::test]
    async fn test_missing_output_key_is_unresolved_dependency() {
        let specs = vec![
            spec("sa", ResourceKind::ServiceAccount),
            spec("fun", ResourceKind::Function)
                .with_dependency("sa")
                .with_param("runtime_service_account", "${sa.no_such_key}"),
        ];
        // sa succeeds but exposes no outputs at all
        let provider = MockProvider::default();
        let interaction = ScriptedInteraction::always(true);

        let err = Provisioner::new(&provider, &interaction)
            .run(&specs)
            .await
            .unwrap_err();

        match err {
            CloudError::UnresolvedDependency { spec, reference } => {
                assert_eq!(spec, "fun");
                assert!(reference.contains("sa.no_such_key"));
            }
            other => panic!("expected UnresolvedDependency, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reference_outside_depends_on_is_unresolved() {
        let specs = vec![
            spec("sa", ResourceKind::ServiceAccount),
            // References sa's outputs without declaring the dependency
            spec("fun", ResourceKind::Function).with_param("identity", "${sa.email}"),
        ];
        let provider = MockProvider::default().with_outputs("sa", &[("email", "x@y")]);
        let interaction = ScriptedInteraction::always(true);

        let err = Provisioner::new(&provider, &interaction)
            .run(&specs)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CloudError::UnresolvedDependency { spec, .. } if spec == "fun"
        ));
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let specs = vec![spec("fun", ResourceKind::Function)];
        let provider = MockProvider::default().with_failures("fun", 2);
        let interaction = ScriptedInteraction::always(true);

        let report = Provisioner::new(&provider, &interaction)
            .run(&specs)
            .await
            .unwrap();

        assert!(report.is_success());
        let result = &report.results[0];
        assert_eq!(result.status, ProvisionStatus::Created);
        assert_eq!(result.retries, 2);
        assert_eq!(provider.calls().len(), 3);
        assert_eq!(interaction.questions.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_declined_retry_aborts_rest_of_run() {
        let specs = vec![
            spec("bucket", ResourceKind::Bucket),
            spec("ds", ResourceKind::Dataset),
            spec("tbl", ResourceKind::Table).with_dependency("ds"),
        ];
        let provider = MockProvider::default().with_failures("ds", 1);
        let interaction = ScriptedInteraction::always(false);

        let report = Provisioner::new(&provider, &interaction)
            .run(&specs)
            .await
            .unwrap();

        assert_eq!(
            report.outcome,
            RunOutcome::Aborted {
                spec_name: "ds".to_string()
            }
        );
        // bucket was attempted and succeeded, ds failed, tbl never ran
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.results[0].spec_name, "bucket");
        assert_eq!(report.results[0].status, ProvisionStatus::Created);
        assert_eq!(report.results[1].spec_name, "ds");
        assert_eq!(report.results[1].status, ProvisionStatus::Failed);
        assert!(!provider.calls().contains(&"tbl".to_string()));
    }

    #[tokio::test]
    async fn test_outputs_flow_into_dependent_parameters() {
        let specs = vec![
            spec("sa", ResourceKind::ServiceAccount),
            spec("fun", ResourceKind::Function)
                .with_dependency("sa")
                .with_param(
                    "runtime_service_account",
                    "serviceAccount:${sa.email}",
                ),
        ];
        let provider = MockProvider::default()
            .with_outputs("sa", &[("email", "backup@proj.iam.gserviceaccount.com")]);
        let interaction = ScriptedInteraction::always(true);

        let report = Provisioner::new(&provider, &interaction)
            .run(&specs)
            .await
            .unwrap();
        assert!(report.is_success());

        let seen = provider.seen_params.lock().unwrap();
        let fun_params = seen.get("fun").unwrap();
        assert_eq!(
            fun_params.get("runtime_service_account").unwrap(),
            "serviceAccount:backup@proj.iam.gserviceaccount.com"
        );
    }

    #[tokio::test]
    async fn test_partially_existing_catalog() {
        // bucket, sa, function(->sa), dataset, table(->dataset),
        // scheduler(->function, sa); only dataset pre-exists.
        let specs = vec![
            spec("bucket", ResourceKind::Bucket),
            spec("sa", ResourceKind::ServiceAccount),
            spec("fun", ResourceKind::Function).with_dependency("sa"),
            spec("ds", ResourceKind::Dataset),
            spec("tbl", ResourceKind::Table).with_dependency("ds"),
            spec("job", ResourceKind::SchedulerJob)
                .with_dependency("fun")
                .with_dependency("sa"),
        ];
        let provider = MockProvider::default().with_existing("ds");
        let interaction = ScriptedInteraction::always(true);

        let report = Provisioner::new(&provider, &interaction)
            .run(&specs)
            .await
            .unwrap();

        assert!(report.is_success());
        let status_of = |name: &str| {
            report
                .results
                .iter()
                .find(|r| r.spec_name == name)
                .unwrap()
                .status
        };
        assert_eq!(status_of("bucket"), ProvisionStatus::Created);
        assert_eq!(status_of("sa"), ProvisionStatus::Created);
        assert_eq!(status_of("fun"), ProvisionStatus::Created);
        assert_eq!(status_of("ds"), ProvisionStatus::AlreadyExists);
        assert_eq!(status_of("tbl"), ProvisionStatus::Created);
        assert_eq!(status_of("job"), ProvisionStatus::Created);

        assert!(provider.position("sa").unwrap() < provider.position("fun").unwrap());
        assert!(provider.position("ds").unwrap() < provider.position("tbl").unwrap());
        assert!(provider.position("fun").unwrap() < provider.position("job").unwrap());
    }

    #[test]
    fn test_topological_order_is_stable_for_ready_specs() {
        // No edges: order must match the catalog exactly
        let specs = vec![
            spec("c", ResourceKind::Bucket),
            spec("a", ResourceKind::Bucket),
            spec("b", ResourceKind::Bucket),
        ];
        let order = topological_order(&specs).unwrap();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_unknown_dependency_name_rejected() {
        let specs = vec![spec("tbl", ResourceKind::Table).with_dependency("no-such-ds")];
        let err = topological_order(&specs).unwrap_err();
        assert!(matches!(
            err,
            CloudError::UnresolvedDependency { spec, reference }
                if spec == "tbl" && reference == "no-such-ds"
        ));
    }
}
