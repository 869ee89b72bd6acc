//! setup コマンド: バックアップ基盤一式を構築

use super::apply_catalog;
use crate::prompt::ConsolePrompt;
use crate::utils::resolve_input;
use colored::Colorize;
use gaflow_core::{settings_backup_catalog, SetupInputs, DEFAULT_DATASET_ID};
use std::path::PathBuf;

#[allow(clippy::too_many_arguments)]
pub async fn handle(
    project: Option<String>,
    region: String,
    service_account: Option<String>,
    function: Option<String>,
    scheduler: Option<String>,
    bucket: Option<String>,
    schedule: String,
    source: Option<String>,
    schema_dir: PathBuf,
) -> anyhow::Result<()> {
    println!(
        "{}",
        "GA 設定バックアップ基盤をセットアップします...".blue().bold()
    );
    println!();

    let prompt = ConsolePrompt::new();
    let project_id = resolve_input(project, &prompt, "プロジェクトID", "GCP プロジェクト ID")?;
    let service_account = resolve_input(
        service_account,
        &prompt,
        "サービスアカウント名",
        "例: ga-backup",
    )?;
    let function_name = resolve_input(function, &prompt, "関数名", "例: ga-settings-downloader")?;
    let scheduler_name = resolve_input(
        scheduler,
        &prompt,
        "スケジューラージョブ名",
        "例: ga-settings-daily",
    )?;
    let bucket_name = bucket.unwrap_or_else(|| SetupInputs::default_bucket_name(&project_id));

    let inputs = SetupInputs {
        project_id,
        region,
        service_account,
        function_name,
        scheduler_name,
        bucket_name,
        schedule,
        function_source: source,
        schema_dir,
    };

    println!();
    println!("データセット: {}", DEFAULT_DATASET_ID.cyan());
    println!("バケット: {}", inputs.bucket_name.cyan());
    println!("スケジュール: {}", inputs.schedule.cyan());

    let specs = settings_backup_catalog(&inputs);
    apply_catalog(&inputs.project_id, &inputs.region, &specs).await
}
