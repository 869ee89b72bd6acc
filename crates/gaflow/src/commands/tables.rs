//! tables コマンド: データセットとテーブルのみ作成

use super::apply_catalog;
use crate::prompt::ConsolePrompt;
use crate::utils::resolve_input;
use colored::Colorize;
use gaflow_core::{report_tables_catalog, TablesInputs, SETTINGS_TABLES};
use std::path::PathBuf;

pub async fn handle(
    project: Option<String>,
    region: String,
    schema_dir: PathBuf,
) -> anyhow::Result<()> {
    println!(
        "{}",
        "設定データベースのテーブルを作成します...".blue().bold()
    );
    println!(
        "対象テーブル: {} 個 (スキーマ: {})",
        SETTINGS_TABLES.len(),
        schema_dir.display().to_string().cyan()
    );
    println!();

    let prompt = ConsolePrompt::new();
    let project_id = resolve_input(project, &prompt, "プロジェクトID", "GCP プロジェクト ID")?;

    let inputs = TablesInputs {
        project_id,
        schema_dir,
    };

    let specs = report_tables_catalog(&inputs);
    apply_catalog(&inputs.project_id, &region, &specs).await
}
