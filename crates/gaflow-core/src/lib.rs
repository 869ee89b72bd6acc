//! gaflow のドメインコア
//!
//! Google Analytics 設定バックアップ基盤のリソースカタログ、
//! オペレーター入力、ワークフローテンプレートを提供する。
//! 実際のプロビジョニングは gaflow-cloud / gaflow-cloud-gcp が担う。

pub mod catalog;
pub mod error;
pub mod inputs;
pub mod template;

pub use catalog::{
    health_checkup_catalog, property_overview_catalog, report_tables_catalog,
    settings_backup_catalog, SETTINGS_TABLES,
};
pub use error::{CoreError, Result};
pub use inputs::{
    schema_path, HealthInputs, OverviewInputs, SetupInputs, TablesInputs, DEFAULT_BACKUP_SCHEDULE,
    DEFAULT_DATASET_ID, DEFAULT_HEALTH_SCHEDULE, HEALTH_CHECKUP_TABLE, PROPERTY_OVERVIEW_TABLE,
};
pub use template::{render_workflow, render_workflow_file, DEFAULT_WORKFLOW_TEMPLATE};
