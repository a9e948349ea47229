// statusコマンドハンドラー
//
// ストアの作成・初期化状態、台帳の記録数、スナップショットの鮮度を表示します。
// データベースには接続しません。

use crate::adapters::connection_string::connection_fingerprint;
use crate::cli::command_context::CommandContext;
use anyhow::Result;
use colored::{ColoredString, Colorize};
use std::fmt::Write as _;
use std::path::PathBuf;

/// statusコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct StatusCommand {
    pub project_path: PathBuf,
    pub config_path: Option<PathBuf>,
    /// 対象環境
    pub env: String,
}

/// statusコマンドハンドラー
#[derive(Debug, Clone, Default)]
pub struct StatusCommandHandler;

impl StatusCommandHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn execute(&self, command: &StatusCommand) -> Result<String> {
        let context = CommandContext::load(command.project_path.clone(), command.config_path.clone())?;
        let accessor = context.accessor();
        let state = context.state_validator();
        let db_config = context.config.get_database_config(&command.env)?;
        let fingerprint = connection_fingerprint(context.config.dialect, &db_config);

        let entries = context.ledger().entries(accessor.qualified_name())?;
        let for_env = entries
            .iter()
            .filter(|record| record.connection_fingerprint == fingerprint)
            .count();

        let mut output = String::new();
        writeln!(output, "{}", "=== Store Status ===".bold())?;
        writeln!(output, "Accessor:    {}", accessor)?;
        writeln!(output, "Environment: {}", command.env)?;
        writeln!(output, "Created:     {}", flag(state.is_created(&accessor)))?;
        writeln!(output, "Initialized: {}", flag(state.is_initialized(&accessor)))?;
        writeln!(
            output,
            "Ledger:      {} entr{} ({} for this environment)",
            entries.len(),
            if entries.len() == 1 { "y" } else { "ies" },
            for_env
        )?;

        // スキーマディレクトリが無い場合はスナップショットの行を省く
        if context.schema_dir().exists() {
            let schema = context.load_schema()?;
            let export_dir = context.export_dir();
            let compiler = context.snapshot_compiler();
            let snapshot = match compiler.recorded_hash(&accessor, &export_dir)? {
                None => "not exported".yellow(),
                Some(_) if compiler.is_stale(&accessor, &schema, &export_dir)? => "stale".yellow(),
                Some(_) => "up to date".green(),
            };
            write!(output, "Snapshot:    {}", snapshot)?;
        }

        Ok(output.trim_end().to_string())
    }
}

fn flag(value: bool) -> ColoredString {
    if value {
        "yes".green()
    } else {
        "no".red()
    }
}
