//! オペレーター入力とデフォルト値
//!
//! 各セットアップコマンドが必要とする入力をまとめた構造体。
//! フラグや環境変数で与えられなかった値は CLI 側が対話的に補う。

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 設定バックアップの保存先データセット
pub const DEFAULT_DATASET_ID: &str = "analytics_settings_database";

/// ダウンローダー関数のエントリーポイント
pub const DEFAULT_ENTRY_POINT: &str = "ga_settings_download";

/// ダウンローダー関数のランタイム
pub const DEFAULT_RUNTIME: &str = "python312";

/// ダウンローダー関数のメモリ割り当て
pub const DEFAULT_FUNCTION_MEMORY: &str = "2048MB";

/// ダウンローダー関数のタイムアウト（秒）
pub const DEFAULT_FUNCTION_TIMEOUT_SECONDS: i64 = 3600;

/// スケジューラーのデフォルト cron（毎日 02:00）
pub const DEFAULT_BACKUP_SCHEDULE: &str = "0 2 * * *";

/// ヘルスチェッククエリの実行スケジュール
pub const DEFAULT_HEALTH_SCHEDULE: &str = "every day 23:30";

/// ヘルスチェックテーブル名
pub const HEALTH_CHECKUP_TABLE: &str = "health_checkup";

/// プロパティ概要テーブル名
pub const PROPERTY_OVERVIEW_TABLE: &str = "ga4_property_overview";

/// メインセットアップの入力一式
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupInputs {
    pub project_id: String,
    pub region: String,
    pub service_account: String,
    pub function_name: String,
    pub scheduler_name: String,
    pub bucket_name: String,
    pub schedule: String,
    /// 関数ソースディレクトリ（省略時はカレントの function/）
    pub function_source: Option<String>,
    pub schema_dir: PathBuf,
}

impl SetupInputs {
    /// バケット名のデフォルト（プロジェクトごとに一意になる）
    pub fn default_bucket_name(project_id: &str) -> String {
        format!("{}-analytics-settings", project_id)
    }
}

/// テーブルのみ作成する場合の入力
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablesInputs {
    pub project_id: String,
    pub schema_dir: PathBuf,
}

/// ヘルスチェックセットアップの入力
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthInputs {
    pub project_id: String,
    pub schedule: String,
    /// スケジュールクエリの表示名
    pub query_name: String,
    /// 転送設定のロケーション
    pub location: String,
}

/// プロパティ概要セットアップの入力
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverviewInputs {
    pub project_id: String,
    pub region: String,
    pub function_name: String,
    pub workflow_name: String,
    /// プロパティ一覧を返す既存関数の URL
    pub properties_function_url: String,
    /// 概要関数の URL（既存のものを使う場合）
    pub overview_function_url: String,
    pub service_account_email: String,
    pub function_source: Option<String>,
    pub schema_dir: PathBuf,
}

/// テーブルのスキーマファイルパス（schemas/<table>.json）
pub fn schema_path(schema_dir: &Path, table: &str) -> String {
    schema_dir
        .join(format!("{}.json", table))
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_path_layout() {
        let path = schema_path(Path::new("schemas"), "ua_goals");
        assert!(path.ends_with("ua_goals.json"));
    }

    #[test]
    fn test_default_bucket_name() {
        assert_eq!(
            SetupInputs::default_bucket_name("my-proj"),
            "my-proj-analytics-settings"
        );
    }
}
