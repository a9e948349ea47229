// snapshotコマンドハンドラー
//
// スキーマモデルのスナップショットをコンパイルし、ハッシュと鮮度を表示します。
// --export 指定時は成果物とハッシュをエクスポートディレクトリに書き出します。

use crate::cli::command_context::CommandContext;
use anyhow::Result;
use colored::Colorize;
use std::fmt::Write as _;
use std::path::PathBuf;

/// snapshotコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct SnapshotCommand {
    pub project_path: PathBuf,
    pub config_path: Option<PathBuf>,
    /// 成果物を書き出すかどうか
    pub export: bool,
}

/// snapshotコマンドハンドラー
#[derive(Debug, Clone, Default)]
pub struct SnapshotCommandHandler;

impl SnapshotCommandHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn execute(&self, command: &SnapshotCommand) -> Result<String> {
        let context = CommandContext::load(command.project_path.clone(), command.config_path.clone())?;
        let schema = context.load_schema()?;
        let accessor = context.accessor();
        let export_dir = context.export_dir();
        let compiler = context.snapshot_compiler();

        // 書き出し前の鮮度を判定する
        let stale = compiler.is_stale(&accessor, &schema, &export_dir)?;
        let artifact = compiler.compile_in_memory(&accessor, &schema)?;

        let mut output = String::new();
        writeln!(output, "{}", "=== Model Snapshot ===".bold())?;
        writeln!(output, "Accessor:   {}", accessor)?;
        writeln!(output, "Tables:     {}", schema.table_count())?;
        writeln!(output, "Hash:       {}", artifact.source_hash)?;
        writeln!(
            output,
            "References: {}",
            artifact
                .reference_set
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )?;
        let state = if stale {
            "stale".yellow()
        } else {
            "up to date".green()
        };
        write!(output, "Export:     {}", state)?;

        if command.export {
            let path = compiler.compile_to_file(&accessor, &schema, &export_dir)?;
            write!(output, "\nWritten:    {}", path.display())?;
        }

        Ok(output)
    }
}
