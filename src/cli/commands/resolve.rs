// resolveコマンドハンドラー
//
// スキーマモデル内のエンティティを物理テーブルに解決して表示します。

use crate::cli::command_context::CommandContext;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use std::path::PathBuf;

/// resolveコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct ResolveCommand {
    pub project_path: PathBuf,
    pub config_path: Option<PathBuf>,
    /// エンティティ名
    pub entity: String,
    /// 基準時刻（RFC3339）
    pub at: Option<String>,
}

/// resolveコマンドハンドラー
#[derive(Debug, Clone, Default)]
pub struct ResolveCommandHandler;

impl ResolveCommandHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn execute(&self, command: &ResolveCommand) -> Result<String> {
        let context = CommandContext::load(command.project_path.clone(), command.config_path.clone())?;
        let schema = context.load_schema()?;

        let table = schema.get_table(&command.entity).ok_or_else(|| {
            anyhow!(
                "Entity '{}' not found in schema. Known entities: {}",
                command.entity,
                schema.tables.keys().cloned().collect::<Vec<_>>().join(", ")
            )
        })?;

        let at = command
            .at
            .as_deref()
            .map(parse_time)
            .transpose()?;

        let physical = context
            .sharding_resolver(at)
            .resolve_table(table)
            .with_context(|| format!("Failed to resolve sharding for '{}'", command.entity))?;

        Ok(format!(
            "{} {} {}",
            command.entity.bold(),
            "→".bold(),
            physical.qualified_name().green()
        ))
    }
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .with_context(|| format!("Invalid --at value (expected RFC3339): {}", raw))
}
