//! CLI 共通のヘルパー

use chrono::Local;
use colored::Colorize;
use gaflow_cloud::{
    Interaction, Progress, ProvisionResult, ProvisionStatus, ResourceSpec, RunOutcome, RunReport,
};
use std::sync::Mutex;
use std::time::Instant;

/// フラグで与えられなかった値を対話で補う
pub fn resolve_input(
    flag: Option<String>,
    prompt: &dyn Interaction,
    field: &str,
    help: &str,
) -> anyhow::Result<String> {
    match flag {
        Some(value) => Ok(value),
        None => Ok(prompt.prompt(field, help)?),
    }
}

/// ステップごとの進捗を出力する Progress 実装
///
/// 出力フォーマットは `[HH:MM:SS] ▶ ステップ名` の形式。
pub struct StepLogger {
    current_started: Mutex<Option<Instant>>,
}

impl StepLogger {
    pub fn new() -> Self {
        Self {
            current_started: Mutex::new(None),
        }
    }

    fn timestamp() -> String {
        Local::now().format("%H:%M:%S").to_string()
    }

    fn elapsed(&self) -> String {
        let started = self.current_started.lock().unwrap().take();
        match started {
            Some(instant) => format_duration(instant.elapsed()),
            None => String::new(),
        }
    }
}

impl Default for StepLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress for StepLogger {
    fn step_started(&self, spec: &ResourceSpec) {
        *self.current_started.lock().unwrap() = Some(Instant::now());
        println!(
            "[{}] {} {} ({})",
            Self::timestamp().dimmed(),
            "▶".cyan(),
            spec.name,
            spec.kind.to_string().dimmed()
        );
    }

    fn attempt_failed(&self, spec: &ResourceSpec, error: &str) {
        println!(
            "[{}] {} {}: {}",
            Self::timestamp().dimmed(),
            "✗".red().bold(),
            spec.name,
            error.red()
        );
    }

    fn step_finished(&self, result: &ProvisionResult) {
        let duration = self.elapsed();
        match result.status {
            ProvisionStatus::Created => {
                if result.retries > 0 {
                    println!(
                        "[{}] {} {} 作成完了 ({}, {} retries)",
                        Self::timestamp().dimmed(),
                        "✓".green().bold(),
                        result.spec_name,
                        duration.dimmed(),
                        result.retries
                    );
                } else {
                    println!(
                        "[{}] {} {} 作成完了 ({})",
                        Self::timestamp().dimmed(),
                        "✓".green().bold(),
                        result.spec_name,
                        duration.dimmed()
                    );
                }
            }
            ProvisionStatus::AlreadyExists => {
                println!(
                    "[{}] {} {} (作成済みのためスキップ)",
                    Self::timestamp().dimmed(),
                    "⏭".yellow(),
                    result.spec_name
                );
            }
            ProvisionStatus::Failed => {
                println!(
                    "[{}] {} {} 中断",
                    Self::timestamp().dimmed(),
                    "✗".red().bold(),
                    result.spec_name
                );
            }
        }
    }
}

/// 実行結果のサマリーを表示
pub fn print_report_summary(report: &RunReport) {
    let summary = report.summary();
    println!();
    match report.outcome {
        RunOutcome::Completed => {
            println!("{}", "セットアップが完了しました ✓".green().bold());
        }
        RunOutcome::Aborted { ref spec_name } => {
            println!(
                "{}",
                format!("ステップ '{}' で中断されました", spec_name)
                    .red()
                    .bold()
            );
            println!(
                "{}",
                "作成済みのリソースはそのまま残っています。再実行すると続きから冪等に適用されます。"
                    .dimmed()
            );
        }
    }
    println!(
        "  作成: {} / 既存: {} / 失敗: {}",
        summary.created.to_string().green(),
        summary.already_existed.to_string().yellow(),
        summary.failed.to_string().red()
    );
}

fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", duration.as_millis())
    }
}
