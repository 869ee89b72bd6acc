//! overview コマンド: プロパティ概要の関数・テーブル・ワークフローを作成

use super::apply_catalog;
use crate::prompt::ConsolePrompt;
use crate::utils::resolve_input;
use colored::Colorize;
use gaflow_core::{property_overview_catalog, render_workflow_file, OverviewInputs};
use std::path::PathBuf;

#[allow(clippy::too_many_arguments)]
pub async fn handle(
    project: Option<String>,
    region: String,
    function: Option<String>,
    workflow: String,
    properties_url: Option<String>,
    overview_url: Option<String>,
    service_account_email: Option<String>,
    source: Option<String>,
    schema_dir: PathBuf,
    template: Option<PathBuf>,
) -> anyhow::Result<()> {
    println!(
        "{}",
        "プロパティ概要のセットアップを開始します...".blue().bold()
    );
    println!();

    let prompt = ConsolePrompt::new();
    let project_id = resolve_input(project, &prompt, "プロジェクトID", "GCP プロジェクト ID")?;
    let function_name = resolve_input(function, &prompt, "関数名", "例: ga-property-overview")?;
    let properties_function_url = resolve_input(
        properties_url,
        &prompt,
        "プロパティ一覧関数の URL",
        "デプロイ済みの関数",
    )?;
    let overview_function_url = resolve_input(
        overview_url,
        &prompt,
        "概要関数の URL",
        "ワークフローが呼び出す URL",
    )?;
    let service_account_email = resolve_input(
        service_account_email,
        &prompt,
        "サービスアカウントのメール",
        "例: ga-backup@<project>.iam.gserviceaccount.com",
    )?;

    let inputs = OverviewInputs {
        project_id,
        region,
        function_name,
        workflow_name: workflow,
        properties_function_url,
        overview_function_url,
        service_account_email,
        function_source: source,
        schema_dir,
    };

    // ワークフロー定義をレンダリングしてからカタログに渡す
    let out_path = std::env::temp_dir().join("gaflow_property_overview.yaml");
    render_workflow_file(
        template.as_deref(),
        &out_path,
        &inputs.properties_function_url,
        &inputs.overview_function_url,
    )?;
    println!(
        "ワークフロー定義: {}",
        out_path.display().to_string().cyan()
    );

    let specs = property_overview_catalog(&inputs, &out_path);
    apply_catalog(&inputs.project_id, &inputs.region, &specs).await
}
