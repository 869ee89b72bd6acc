//! health コマンド: ヘルスチェックテーブルとスケジュールクエリを作成

use super::apply_catalog;
use crate::prompt::ConsolePrompt;
use crate::utils::resolve_input;
use colored::Colorize;
use gaflow_core::{health_checkup_catalog, HealthInputs, HEALTH_CHECKUP_TABLE};

pub async fn handle(
    project: Option<String>,
    region: String,
    schedule: String,
    query_name: String,
    location: String,
) -> anyhow::Result<()> {
    println!(
        "{}",
        "ヘルスチェックのテーブルとスケジュールクエリを作成します..."
            .blue()
            .bold()
    );
    println!(
        "テーブル: {} (日次パーティション) / スケジュール: {}",
        HEALTH_CHECKUP_TABLE.cyan(),
        schedule.cyan()
    );
    println!();

    let prompt = ConsolePrompt::new();
    let project_id = resolve_input(project, &prompt, "プロジェクトID", "GCP プロジェクト ID")?;

    let inputs = HealthInputs {
        project_id,
        schedule,
        query_name,
        location,
    };

    let specs = health_checkup_catalog(&inputs);
    apply_catalog(&inputs.project_id, &region, &specs).await
}
