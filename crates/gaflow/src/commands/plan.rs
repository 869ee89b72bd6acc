//! plan コマンド: クラウドに触れずに実行計画を表示

use clap::ValueEnum;
use colored::Colorize;
use gaflow_cloud::topological_order;
use gaflow_core::{
    health_checkup_catalog, property_overview_catalog, report_tables_catalog,
    settings_backup_catalog, HealthInputs, OverviewInputs, SetupInputs, TablesInputs,
    DEFAULT_BACKUP_SCHEDULE, DEFAULT_HEALTH_SCHEDULE,
};
use std::path::{Path, PathBuf};

/// 計画を表示するカタログ
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PlanTarget {
    /// バックアップ基盤一式
    Setup,
    /// データセットとテーブルのみ
    Tables,
    /// ヘルスチェック
    Health,
    /// プロパティ概要
    Overview,
}

impl std::fmt::Display for PlanTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanTarget::Setup => write!(f, "setup"),
            PlanTarget::Tables => write!(f, "tables"),
            PlanTarget::Health => write!(f, "health"),
            PlanTarget::Overview => write!(f, "overview"),
        }
    }
}

pub fn handle(target: PlanTarget, schema_dir: PathBuf) -> anyhow::Result<()> {
    let specs = match target {
        PlanTarget::Setup => settings_backup_catalog(&placeholder_setup(schema_dir)),
        PlanTarget::Tables => report_tables_catalog(&TablesInputs {
            project_id: "<project>".to_string(),
            schema_dir,
        }),
        PlanTarget::Health => health_checkup_catalog(&HealthInputs {
            project_id: "<project>".to_string(),
            schedule: DEFAULT_HEALTH_SCHEDULE.to_string(),
            query_name: "settings-health-checkup".to_string(),
            location: "us".to_string(),
        }),
        PlanTarget::Overview => property_overview_catalog(
            &placeholder_overview(schema_dir),
            Path::new("<rendered workflow>"),
        ),
    };

    let order = topological_order(&specs)?;

    println!(
        "{}",
        format!("実行計画 ({} ステップ):", specs.len()).bold()
    );
    for (position, &idx) in order.iter().enumerate() {
        let spec = &specs[idx];
        if spec.depends_on.is_empty() {
            println!(
                "  {:>2}. [{}] {}",
                position + 1,
                spec.kind,
                spec.name.cyan()
            );
        } else {
            println!(
                "  {:>2}. [{}] {} {}",
                position + 1,
                spec.kind,
                spec.name.cyan(),
                format!("← {}", spec.depends_on.join(", ")).dimmed()
            );
        }
    }

    println!();
    println!(
        "{}",
        "名前はプレースホルダーです。実際の値は各コマンド実行時の入力で決まります。".dimmed()
    );
    Ok(())
}

fn placeholder_setup(schema_dir: PathBuf) -> SetupInputs {
    SetupInputs {
        project_id: "<project>".to_string(),
        region: "us-central1".to_string(),
        service_account: "<service-account>".to_string(),
        function_name: "<function>".to_string(),
        scheduler_name: "<scheduler>".to_string(),
        bucket_name: "<bucket>".to_string(),
        schedule: DEFAULT_BACKUP_SCHEDULE.to_string(),
        function_source: None,
        schema_dir,
    }
}

fn placeholder_overview(schema_dir: PathBuf) -> OverviewInputs {
    OverviewInputs {
        project_id: "<project>".to_string(),
        region: "us-central1".to_string(),
        function_name: "<function>".to_string(),
        workflow_name: "<workflow>".to_string(),
        properties_function_url: "<properties-url>".to_string(),
        overview_function_url: "<overview-url>".to_string(),
        service_account_email: "<service-account-email>".to_string(),
        function_source: None,
        schema_dir,
    }
}
