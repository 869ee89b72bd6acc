mod commands;
mod prompt;
mod utils;

use clap::{Parser, Subcommand};
use commands::plan::PlanTarget;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gaflow")]
#[command(about = "Google Analytics 設定のバックアップ基盤を GCP に構築する", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// バックアップ基盤一式をセットアップ
    Setup {
        /// GCP プロジェクト ID（省略時は対話で入力）
        #[arg(short, long, env = "GAFLOW_PROJECT")]
        project: Option<String>,
        /// リージョン
        #[arg(long, env = "GAFLOW_REGION", default_value = "us-central1")]
        region: String,
        /// サービスアカウント名
        #[arg(long)]
        service_account: Option<String>,
        /// ダウンローダー関数名
        #[arg(long)]
        function: Option<String>,
        /// スケジューラージョブ名
        #[arg(long)]
        scheduler: Option<String>,
        /// バケット名（省略時は <project>-analytics-settings）
        #[arg(long)]
        bucket: Option<String>,
        /// バックアップの cron スケジュール
        #[arg(long, default_value = gaflow_core::DEFAULT_BACKUP_SCHEDULE)]
        schedule: String,
        /// 関数ソースのディレクトリ
        #[arg(long)]
        source: Option<String>,
        /// テーブルスキーマ JSON のディレクトリ
        #[arg(long, default_value = "schemas")]
        schema_dir: PathBuf,
    },
    /// データセットと設定テーブルのみ作成
    Tables {
        /// GCP プロジェクト ID（省略時は対話で入力）
        #[arg(short, long, env = "GAFLOW_PROJECT")]
        project: Option<String>,
        /// リージョン
        #[arg(long, env = "GAFLOW_REGION", default_value = "us-central1")]
        region: String,
        /// テーブルスキーマ JSON のディレクトリ
        #[arg(long, default_value = "schemas")]
        schema_dir: PathBuf,
    },
    /// ヘルスチェックテーブルとスケジュールクエリを作成
    Health {
        /// GCP プロジェクト ID（省略時は対話で入力）
        #[arg(short, long, env = "GAFLOW_PROJECT")]
        project: Option<String>,
        /// リージョン
        #[arg(long, env = "GAFLOW_REGION", default_value = "us-central1")]
        region: String,
        /// クエリの実行スケジュール
        #[arg(long, default_value = gaflow_core::DEFAULT_HEALTH_SCHEDULE)]
        schedule: String,
        /// スケジュールクエリの表示名
        #[arg(long, default_value = "settings-health-checkup")]
        query_name: String,
        /// 転送設定のロケーション
        #[arg(long, default_value = "us")]
        location: String,
    },
    /// プロパティ概要の関数・テーブル・ワークフローを作成
    Overview {
        /// GCP プロジェクト ID（省略時は対話で入力）
        #[arg(short, long, env = "GAFLOW_PROJECT")]
        project: Option<String>,
        /// リージョン
        #[arg(long, env = "GAFLOW_REGION", default_value = "us-central1")]
        region: String,
        /// 概要関数名
        #[arg(long)]
        function: Option<String>,
        /// ワークフロー名
        #[arg(long, default_value = "property-overview")]
        workflow: String,
        /// プロパティ一覧関数の URL
        #[arg(long)]
        properties_url: Option<String>,
        /// 概要関数の URL
        #[arg(long)]
        overview_url: Option<String>,
        /// ワークフロー実行に使うサービスアカウントのメール
        #[arg(long)]
        service_account_email: Option<String>,
        /// 関数ソースのディレクトリ
        #[arg(long)]
        source: Option<String>,
        /// テーブルスキーマ JSON のディレクトリ
        #[arg(long, default_value = "schemas")]
        schema_dir: PathBuf,
        /// ワークフローテンプレート（省略時は同梱テンプレート）
        #[arg(long)]
        template: Option<PathBuf>,
    },
    /// クラウドに触れずに実行計画を表示
    Plan {
        /// 対象カタログ
        #[arg(value_enum, default_value_t = PlanTarget::Setup)]
        target: PlanTarget,
        /// テーブルスキーマ JSON のディレクトリ
        #[arg(long, default_value = "schemas")]
        schema_dir: PathBuf,
    },
    /// バージョン情報を表示
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ログは stderr へ（進捗表示は stdout）
    tracing_subscriber::fmt::init();

    match cli.command {
        Commands::Setup {
            project,
            region,
            service_account,
            function,
            scheduler,
            bucket,
            schedule,
            source,
            schema_dir,
        } => {
            commands::setup::handle(
                project,
                region,
                service_account,
                function,
                scheduler,
                bucket,
                schedule,
                source,
                schema_dir,
            )
            .await
        }
        Commands::Tables {
            project,
            region,
            schema_dir,
        } => commands::tables::handle(project, region, schema_dir).await,
        Commands::Health {
            project,
            region,
            schedule,
            query_name,
            location,
        } => commands::health::handle(project, region, schedule, query_name, location).await,
        Commands::Overview {
            project,
            region,
            function,
            workflow,
            properties_url,
            overview_url,
            service_account_email,
            source,
            schema_dir,
            template,
        } => {
            commands::overview::handle(
                project,
                region,
                function,
                workflow,
                properties_url,
                overview_url,
                service_account_email,
                source,
                schema_dir,
                template,
            )
            .await
        }
        Commands::Plan { target, schema_dir } => commands::plan::handle(target, schema_dir),
        Commands::Version => {
            println!("gaflow {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
