//! リソースカタログ
//!
//! 各コマンドが適用する [`ResourceSpec`] の一覧を組み立てる。カタログは
//! 純粋な宣言データであり、実行順序は provisioner が `depends_on` から
//! 決める。スペック名はカタログ内で一意。

use crate::inputs::{
    schema_path, HealthInputs, OverviewInputs, SetupInputs, TablesInputs, DEFAULT_DATASET_ID,
    DEFAULT_ENTRY_POINT, DEFAULT_FUNCTION_MEMORY, DEFAULT_FUNCTION_TIMEOUT_SECONDS,
    DEFAULT_RUNTIME, HEALTH_CHECKUP_TABLE, PROPERTY_OVERVIEW_TABLE,
};
use gaflow_cloud::{ResourceKind, ResourceSpec};
use std::path::Path;

/// バックアップ対象の設定テーブル一覧
///
/// ダウンローダー関数が書き込むテーブルと一対一。スキーマは
/// `schemas/<テーブル名>.json` を参照する。
pub const SETTINGS_TABLES: &[&str] = &[
    "ua_account_summaries",
    "ua_goals",
    "ua_views",
    "ua_filters",
    "ua_filter_links",
    "ua_segments",
    "ua_custom_dimensions",
    "ua_custom_metrics",
    "ua_audiences",
    "ua_google_ads_links",
    "ga4_account_summaries",
    "ga4_accounts",
    "ga4_properties",
    "ga4_android_app_data_streams",
    "ga4_measurement_protocol_secrets",
    "ga4_conversion_events",
    "ga4_custom_dimensions",
    "ga4_custom_metrics",
    "ga4_firebase_links",
    "ga4_google_ads_links",
    "ga4_ios_app_data_streams",
    "ga4_web_data_streams",
];

/// バックアップ関数サービスアカウントに付与するロール
const SERVICE_ACCOUNT_ROLES: &[&str] = &[
    "roles/bigquery.admin",
    "roles/storage.objectAdmin",
    "roles/cloudfunctions.invoker",
];

/// メインセットアップ一式のカタログ
///
/// バケット、サービスアカウント、ダウンローダー関数、データセット、
/// 設定テーブル群、スケジューラージョブ。
pub fn settings_backup_catalog(inputs: &SetupInputs) -> Vec<ResourceSpec> {
    let mut specs = vec![
        ResourceSpec::new("bucket", ResourceKind::Bucket)
            .with_param("name", inputs.bucket_name.as_str())
            .with_param("location", "US"),
        ResourceSpec::new("service-account", ResourceKind::ServiceAccount)
            .with_param("account_id", inputs.service_account.as_str())
            .with_param("display_name", "GA settings backup")
            .with_param("roles", serde_json::json!(SERVICE_ACCOUNT_ROLES)),
        downloader_function_spec(inputs),
        dataset_spec(),
    ];

    specs.extend(settings_table_specs(&inputs.schema_dir));

    specs.push(
        ResourceSpec::new("scheduler-job", ResourceKind::SchedulerJob)
            .with_param("name", inputs.scheduler_name.as_str())
            .with_param("schedule", inputs.schedule.as_str())
            .with_param("uri", "${function.url}")
            .with_param("http_method", "POST")
            .with_param("oidc_service_account_email", "${service-account.email}")
            .with_dependency("function")
            .with_dependency("service-account"),
    );

    specs
}

/// データセットとテーブルのみのカタログ
pub fn report_tables_catalog(inputs: &TablesInputs) -> Vec<ResourceSpec> {
    let mut specs = vec![dataset_spec()];
    specs.extend(settings_table_specs(&inputs.schema_dir));
    specs
}

/// ヘルスチェックのカタログ
///
/// 日次パーティションのテーブルと、そこへ追記するスケジュールクエリ。
pub fn health_checkup_catalog(inputs: &HealthInputs) -> Vec<ResourceSpec> {
    vec![
        dataset_spec(),
        ResourceSpec::new(HEALTH_CHECKUP_TABLE, ResourceKind::Table)
            .with_param("dataset_id", "${dataset.dataset_id}")
            .with_param("table_id", HEALTH_CHECKUP_TABLE)
            .with_param("partition_by_day", true)
            .with_param("description", "Daily row counts of the settings tables")
            .with_dependency("dataset"),
        ResourceSpec::new("health-checkup-query", ResourceKind::ScheduledQuery)
            .with_param("display_name", inputs.query_name.as_str())
            .with_param("target_dataset", "${dataset.dataset_id}")
            .with_param("destination_table", HEALTH_CHECKUP_TABLE)
            .with_param("schedule", inputs.schedule.as_str())
            .with_param("location", inputs.location.as_str())
            .with_param("query", health_checkup_query(DEFAULT_DATASET_ID))
            .with_dependency("dataset")
            .with_dependency(HEALTH_CHECKUP_TABLE),
    ]
}

/// プロパティ概要のカタログ
///
/// 概要関数、結果テーブル、二つの関数 URL を参照するワークフロー。
/// ワークフロー定義はコマンド側でレンダリング済みのファイルを渡す。
pub fn property_overview_catalog(
    inputs: &OverviewInputs,
    workflow_source: &Path,
) -> Vec<ResourceSpec> {
    vec![
        dataset_spec(),
        ResourceSpec::new(PROPERTY_OVERVIEW_TABLE, ResourceKind::Table)
            .with_param("dataset_id", "${dataset.dataset_id}")
            .with_param("table_id", PROPERTY_OVERVIEW_TABLE)
            .with_param(
                "schema_path",
                schema_path(&inputs.schema_dir, PROPERTY_OVERVIEW_TABLE),
            )
            .with_dependency("dataset"),
        {
            let mut spec = ResourceSpec::new("function", ResourceKind::Function)
                .with_param("name", inputs.function_name.as_str())
                .with_param("runtime", DEFAULT_RUNTIME)
                .with_param("entry_point", "main")
                .with_param("memory", "1024MB")
                .with_param("timeout_seconds", 540)
                .with_param("service_account", inputs.service_account_email.as_str());
            if let Some(ref source) = inputs.function_source {
                spec = spec.with_param("source", source.as_str());
            }
            spec
        },
        ResourceSpec::new("workflow", ResourceKind::Workflow)
            .with_param("name", inputs.workflow_name.as_str())
            .with_param("source", workflow_source.to_string_lossy().into_owned())
            .with_param("service_account", inputs.service_account_email.as_str())
            .with_dependency("function"),
    ]
}

fn dataset_spec() -> ResourceSpec {
    ResourceSpec::new("dataset", ResourceKind::Dataset)
        .with_param("dataset_id", DEFAULT_DATASET_ID)
        .with_param("description", "Google Analytics settings backup")
}

fn downloader_function_spec(inputs: &SetupInputs) -> ResourceSpec {
    let mut spec = ResourceSpec::new("function", ResourceKind::Function)
        .with_param("name", inputs.function_name.as_str())
        .with_param("runtime", DEFAULT_RUNTIME)
        .with_param("entry_point", DEFAULT_ENTRY_POINT)
        .with_param("memory", DEFAULT_FUNCTION_MEMORY)
        .with_param("timeout_seconds", DEFAULT_FUNCTION_TIMEOUT_SECONDS)
        .with_param("service_account", "${service-account.email}")
        .with_param(
            "env_vars",
            serde_json::json!({ "BUCKET_NAME": "${bucket.name}" }),
        )
        .with_dependency("service-account")
        .with_dependency("bucket");
    if let Some(ref source) = inputs.function_source {
        spec = spec.with_param("source", source.as_str());
    }
    spec
}

fn settings_table_specs(schema_dir: &Path) -> Vec<ResourceSpec> {
    SETTINGS_TABLES
        .iter()
        .map(|table| {
            ResourceSpec::new(*table, ResourceKind::Table)
                .with_param("dataset_id", "${dataset.dataset_id}")
                .with_param("table_id", *table)
                .with_param("schema_path", schema_path(schema_dir, table))
                .with_dependency("dataset")
        })
        .collect()
}

/// 設定テーブルの行数を記録するヘルスチェッククエリ
fn health_checkup_query(dataset_id: &str) -> String {
    let mut lines = Vec::with_capacity(SETTINGS_TABLES.len());
    for table in SETTINGS_TABLES {
        lines.push(format!(
            "SELECT CURRENT_TIMESTAMP() AS checked_at, '{table}' AS source_table, \
             COUNT(*) AS row_count FROM `{dataset_id}.{table}`"
        ));
    }
    lines.join("\nUNION ALL\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use gaflow_cloud::topological_order;
    use std::path::PathBuf;

    fn setup_inputs() -> SetupInputs {
        SetupInputs {
            project_id: "proj".to_string(),
            region: "us-central1".to_string(),
            service_account: "ga-backup".to_string(),
            function_name: "ga-settings-downloader".to_string(),
            scheduler_name: "ga-settings-daily".to_string(),
            bucket_name: "proj-analytics-settings".to_string(),
            schedule: "0 2 * * *".to_string(),
            function_source: None,
            schema_dir: PathBuf::from("schemas"),
        }
    }

    #[test]
    fn test_settings_catalog_is_acyclic_and_complete() {
        let specs = settings_backup_catalog(&setup_inputs());

        // バケット + SA + 関数 + データセット + テーブル群 + スケジューラー
        assert_eq!(specs.len(), 4 + SETTINGS_TABLES.len() + 1);
        topological_order(&specs).unwrap();

        let scheduler = specs.iter().find(|s| s.name == "scheduler-job").unwrap();
        assert_eq!(scheduler.param_str("uri"), Some("${function.url}"));
        assert!(scheduler.depends_on.contains(&"function".to_string()));
    }

    #[test]
    fn test_every_settings_table_references_its_schema() {
        let specs = report_tables_catalog(&TablesInputs {
            project_id: "proj".to_string(),
            schema_dir: PathBuf::from("schemas"),
        });

        for table in SETTINGS_TABLES {
            let spec = specs.iter().find(|s| s.name == *table).unwrap();
            assert_eq!(spec.kind, ResourceKind::Table);
            let schema = spec.param_str("schema_path").unwrap();
            assert!(schema.ends_with(&format!("{}.json", table)));
            assert_eq!(spec.depends_on, vec!["dataset".to_string()]);
        }
    }

    #[test]
    fn test_health_catalog_orders_query_after_table() {
        let specs = health_checkup_catalog(&HealthInputs {
            project_id: "proj".to_string(),
            schedule: "every day 23:30".to_string(),
            query_name: "settings-health-checkup".to_string(),
            location: "us".to_string(),
        });

        let order = topological_order(&specs).unwrap();
        let pos = |name: &str| {
            order
                .iter()
                .position(|&i| specs[i].name == name)
                .unwrap()
        };
        assert!(pos("dataset") < pos(HEALTH_CHECKUP_TABLE));
        assert!(pos(HEALTH_CHECKUP_TABLE) < pos("health-checkup-query"));

        let query = specs
            .iter()
            .find(|s| s.name == "health-checkup-query")
            .unwrap();
        assert!(query.param_str("query").unwrap().contains("UNION ALL"));
    }

    #[test]
    fn test_overview_catalog_renders_workflow_last() {
        let inputs = OverviewInputs {
            project_id: "proj".to_string(),
            region: "us-central1".to_string(),
            function_name: "ga-property-overview".to_string(),
            workflow_name: "property-overview".to_string(),
            properties_function_url: "https://example.test/properties".to_string(),
            overview_function_url: "https://example.test/overview".to_string(),
            service_account_email: "ga-backup@proj.iam.gserviceaccount.com".to_string(),
            function_source: None,
            schema_dir: PathBuf::from("schemas"),
        };
        let specs = property_overview_catalog(&inputs, Path::new("/tmp/workflow.yaml"));

        let order = topological_order(&specs).unwrap();
        assert_eq!(specs[*order.last().unwrap()].name, "workflow");

        let workflow = specs.iter().find(|s| s.name == "workflow").unwrap();
        assert_eq!(workflow.param_str("source"), Some("/tmp/workflow.yaml"));
    }
}
