//! コンソール対話
//!
//! provisioner からの問い合わせを標準入出力で受ける実装。

use colored::Colorize;
use gaflow_cloud::{Interaction, Result};
use std::io::Write;

/// 標準入出力の対話実装
pub struct ConsolePrompt;

impl ConsolePrompt {
    pub fn new() -> Self {
        Self
    }

    fn read_line(&self) -> Result<String> {
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        Ok(input.trim().to_string())
    }
}

impl Default for ConsolePrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl Interaction for ConsolePrompt {
    /// 空でない値が入るまで聞き直す
    fn prompt(&self, field: &str, help: &str) -> Result<String> {
        loop {
            print!("{} ({}): ", field.bold(), help.dimmed());
            std::io::stdout().flush()?;

            let value = self.read_line()?;
            if !value.is_empty() {
                return Ok(value);
            }
            println!("{}", "値を入力してください".yellow());
        }
    }

    fn confirm_retry(&self, step: &str) -> Result<bool> {
        print!(
            "{} リトライしますか？ [y/N]: ",
            format!("ステップ '{}' が失敗しました。", step).red()
        );
        std::io::stdout().flush()?;

        let input = self.read_line()?;
        Ok(input.eq_ignore_ascii_case("y"))
    }
}
