// applyコマンドハンドラー
//
// 提案されたコマンドを台帳で絞り込み、未適用のものだけを実行します。
// - データベース接続の確立
// - ストア作成・スナップショット・コマンド実行・シード投入（MigrationPipeline）
// - 実行結果の表示

use crate::adapters::command_executor::SqlxCommandExecutor;
use crate::adapters::connection_string::connection_fingerprint;
use crate::cli::command_context::CommandContext;
use crate::services::command_source::load_commands;
use crate::services::migration_pipeline::{MigrationPipeline, PipelineReport};
use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// applyコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct ApplyCommand {
    pub project_path: PathBuf,
    pub config_path: Option<PathBuf>,
    /// 提案コマンドのSQLファイル
    pub commands: PathBuf,
    /// シードコマンドのSQLファイル
    pub seed: Option<PathBuf>,
    /// 対象環境
    pub env: String,
    /// Dry run - 実行せずに未適用コマンドを表示
    pub dry_run: bool,
}

/// applyコマンドハンドラー
#[derive(Debug, Clone, Default)]
pub struct ApplyCommandHandler;

impl ApplyCommandHandler {
    pub fn new() -> Self {
        Self
    }

    /// applyコマンドを実行
    pub async fn execute(&self, command: &ApplyCommand) -> Result<String> {
        let context = CommandContext::load(command.project_path.clone(), command.config_path.clone())?;
        let config = &context.config;
        let db_config = config.get_database_config(&command.env)?;

        let proposed = load_commands(&resolve(&context, &command.commands))?;
        let seed = match &command.seed {
            Some(path) => load_commands(&resolve(&context, path))?,
            None => Vec::new(),
        };
        let schema = context.load_schema()?;
        let accessor = context.accessor();

        debug!(
            env = %command.env,
            proposed = proposed.len(),
            seed = seed.len(),
            "Loaded commands"
        );

        if command.dry_run {
            // 台帳はコミットしないため、ディスクの状態は変わらない
            let ledger = context.ledger();
            let fingerprint = connection_fingerprint(config.dialect, &db_config);
            let pending =
                ledger.filter_pending(accessor.qualified_name(), &fingerprint, &proposed)?;
            return Ok(self.format_dry_run(&pending, proposed.len()));
        }

        let executor = SqlxCommandExecutor::connect(config.dialect, &db_config)
            .await
            .with_context(|| format!("Failed to connect to environment '{}'", command.env))?;

        let pipeline = MigrationPipeline::new(
            accessor.clone(),
            Arc::new(context.ledger()),
            Arc::new(context.snapshot_compiler()),
            context.state_validator(),
        )
        .with_seed_commands(seed);

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(format!("Applying commands to {}", command.env));
        spinner.enable_steady_tick(Duration::from_millis(100));

        let result = pipeline.run(&executor, &schema, &proposed).await;
        spinner.finish_and_clear();
        executor.close().await;

        let report = result?;
        info!(accessor = %accessor, executed = report.executed.len(), "Apply completed");
        Ok(self.format_report(&report))
    }

    fn format_dry_run(&self, pending: &[String], proposed: usize) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "{}", "=== Dry Run: Pending Commands ===".bold());
        for command in pending {
            let _ = writeln!(output, "{};", command);
        }
        let _ = write!(
            output,
            "{} pending, {} already applied",
            pending.len(),
            proposed.saturating_sub(pending.len())
        );
        output
    }

    fn format_report(&self, report: &PipelineReport) -> String {
        let mut output = String::new();
        if report.created {
            let _ = writeln!(output, "{}", "Store created".green());
        }
        for command in &report.executed {
            let _ = writeln!(output, "{} {}", "✓".green(), command);
        }
        if report.initialized {
            let _ = writeln!(output, "{}", "Store initialized".green());
        }
        let _ = write!(
            output,
            "Applied {} command(s), skipped {}, ledger has {} entr{}. Snapshot {}",
            report.executed.len(),
            report.skipped,
            report.ledger_entries,
            if report.ledger_entries == 1 { "y" } else { "ies" },
            &report.snapshot_hash[..report.snapshot_hash.len().min(12)]
        );
        output
    }
}

fn resolve(context: &CommandContext, path: &std::path::Path) -> PathBuf {
    crate::core::config::Config::resolve_dir(&context.project_path, path)
}
