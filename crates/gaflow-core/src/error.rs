use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("テンプレート展開エラー: {0}")]
    Template(#[from] tera::Error),

    #[error("ワークフロー定義が妥当な YAML ではありません: {0}")]
    InvalidWorkflowYaml(#[from] serde_yaml::Error),

    #[error("IO エラー: {path}\n理由: {message}")]
    IoError { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
