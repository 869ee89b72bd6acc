//! ワークフロー定義のテンプレート展開
//!
//! Tera を使ってワークフロー YAML の関数 URL プレースホルダーを展開する。
//! 展開結果はデプロイ前に YAML として妥当か検証する。

use crate::error::{CoreError, Result};
use std::path::{Path, PathBuf};
use tera::{Context, Tera};
use tracing::debug;

/// 同梱のプロパティ概要ワークフロー定義
pub const DEFAULT_WORKFLOW_TEMPLATE: &str = include_str!("../templates/property_overview.yaml");

/// ワークフローテンプレートを展開する
///
/// プレースホルダーは二つ: `properties_function_url` と
/// `overview_function_url`。
pub fn render_workflow(
    template: &str,
    properties_function_url: &str,
    overview_function_url: &str,
) -> Result<String> {
    let mut tera = Tera::default();
    tera.add_raw_template("workflow", template)?;

    let mut context = Context::new();
    context.insert("properties_function_url", properties_function_url);
    context.insert("overview_function_url", overview_function_url);

    let rendered = tera.render("workflow", &context)?;

    // デプロイ前に YAML として読めることを確認
    serde_yaml::from_str::<serde_yaml::Value>(&rendered)?;

    Ok(rendered)
}

/// テンプレートファイルを展開して出力ファイルに書き込む
///
/// `template_path` が None の場合は同梱テンプレートを使う。
pub fn render_workflow_file(
    template_path: Option<&Path>,
    out_path: &Path,
    properties_function_url: &str,
    overview_function_url: &str,
) -> Result<PathBuf> {
    let template = match template_path {
        Some(path) => std::fs::read_to_string(path).map_err(|e| CoreError::IoError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?,
        None => DEFAULT_WORKFLOW_TEMPLATE.to_string(),
    };

    let rendered = render_workflow(&template, properties_function_url, overview_function_url)?;

    std::fs::write(out_path, &rendered).map_err(|e| CoreError::IoError {
        path: out_path.to_path_buf(),
        message: e.to_string(),
    })?;

    debug!(path = %out_path.display(), "ワークフロー定義を書き出した");
    Ok(out_path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_both_urls() {
        let rendered = render_workflow(
            DEFAULT_WORKFLOW_TEMPLATE,
            "https://example.test/properties",
            "https://example.test/overview",
        )
        .unwrap();

        assert!(rendered.contains("url: https://example.test/properties"));
        assert!(rendered.contains("url: https://example.test/overview"));
        assert!(!rendered.contains("{{"));
    }

    #[test]
    fn test_render_keeps_workflow_expressions() {
        // Workflows の ${...} 式は Tera の展開対象ではない
        let rendered = render_workflow(DEFAULT_WORKFLOW_TEMPLATE, "https://a", "https://b").unwrap();
        assert!(rendered.contains("${properties_response.body.properties}"));
    }

    #[test]
    fn test_render_workflow_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("property_overview.yaml");

        let written =
            render_workflow_file(None, &out, "https://a.test/p", "https://b.test/o").unwrap();

        let content = std::fs::read_to_string(written).unwrap();
        assert!(content.contains("https://a.test/p"));
        serde_yaml::from_str::<serde_yaml::Value>(&content).unwrap();
    }

    #[test]
    fn test_invalid_template_is_rejected() {
        let err = render_workflow("main: {{ missing_var }", "https://a", "https://b").unwrap_err();
        assert!(matches!(err, CoreError::Template(_)));
    }
}
