//! サブコマンド実装

pub mod health;
pub mod overview;
pub mod plan;
pub mod setup;
pub mod tables;

use crate::prompt::ConsolePrompt;
use crate::utils::{print_report_summary, StepLogger};
use colored::Colorize;
use gaflow_cloud::{Provisioner, ResourceProvider, ResourceSpec};
use gaflow_cloud_gcp::GcpProvider;

/// カタログを GCP に適用する共通処理
///
/// 認証確認 → 逐次適用 → サマリー表示。中断時は非ゼロ終了になるよう
/// エラーを返す。
pub(crate) async fn apply_catalog(
    project_id: &str,
    region: &str,
    specs: &[ResourceSpec],
) -> anyhow::Result<()> {
    let provider = GcpProvider::new(project_id, region);

    println!("{}", "認証を確認中...".blue());
    let auth = provider.check_auth().await?;
    if !auth.authenticated {
        anyhow::bail!(
            "gcloud の認証が確認できません: {}\nヒント: gcloud auth login を実行してください",
            auth.error.unwrap_or_default()
        );
    }
    if let Some(account) = auth.account {
        println!("アカウント: {}", account.cyan());
    }

    println!();
    println!(
        "{}",
        format!("{} ステップを適用します", specs.len()).bold()
    );
    println!();

    let prompt = ConsolePrompt::new();
    let logger = StepLogger::new();
    let report = Provisioner::new(&provider, &prompt)
        .with_progress(&logger)
        .run(specs)
        .await?;

    print_report_summary(&report);

    if !report.is_success() {
        anyhow::bail!("プロビジョニングが中断されました");
    }
    Ok(())
}
