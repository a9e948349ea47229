// initコマンドハンドラー
//
// プロジェクトの初期化処理を実装します。
// - ディレクトリ構造の作成（schema/ と状態ディレクトリ）
// - デフォルト設定ファイルの生成（.shardwright.yaml）
// - 初期化済みプロジェクトの検出と警告

use crate::core::config::{CompilerKind, Config, DatabaseConfig, Dialect};
use crate::core::ledger::LedgerEncoding;
use crate::services::config_loader::ConfigLoader;
use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// initコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct InitCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// データベース方言
    pub dialect: Dialect,
    /// アクセサーの完全修飾名
    pub accessor: String,
    /// 強制的に初期化（既存の設定を上書き）
    pub force: bool,
}

/// initコマンドハンドラー
#[derive(Debug, Clone, Default)]
pub struct InitCommandHandler;

impl InitCommandHandler {
    pub fn new() -> Self {
        Self
    }

    /// initコマンドを実行
    pub fn execute(&self, command: &InitCommand) -> Result<String> {
        if self.is_already_initialized(&command.project_path) && !command.force {
            return Err(anyhow!(
                "Project is already initialized. Use --force option to force re-initialization."
            ));
        }

        let config = self.default_config(command);
        config.validate()?;

        self.create_directory_structure(&command.project_path, &config)?;

        let yaml = ConfigLoader::to_yaml(&config)?;
        let config_path = command.project_path.join(Config::DEFAULT_CONFIG_PATH);
        fs::write(&config_path, yaml)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(format!(
            "Project initialized for {} ({}).",
            config.accessor, config.dialect
        ))
    }

    /// プロジェクトが既に初期化されているかチェック
    pub fn is_already_initialized(&self, project_path: &Path) -> bool {
        project_path.join(Config::DEFAULT_CONFIG_PATH).exists()
    }

    /// ディレクトリ構造を作成
    pub fn create_directory_structure(&self, project_path: &Path, config: &Config) -> Result<()> {
        for dir in [
            &config.schema_dir,
            &config.config_dir,
            &config.report_dir,
            &config.export_dir,
        ] {
            let path = Config::resolve_dir(project_path, dir);
            fs::create_dir_all(&path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// デフォルト設定を作成
    pub fn default_config(&self, command: &InitCommand) -> Config {
        let (port, database) = match command.dialect {
            Dialect::PostgreSQL => (5432, "app".to_string()),
            Dialect::MySQL => (3306, "app".to_string()),
            Dialect::SQLite => (0, "app.db".to_string()),
        };

        let mut environments = HashMap::new();
        environments.insert(
            "development".to_string(),
            DatabaseConfig {
                host: "localhost".to_string(),
                port,
                database,
                user: None,
                password: None,
                timeout: Some(30),
            },
        );

        Config {
            version: "1.0".to_string(),
            dialect: command.dialect,
            accessor: command.accessor.clone(),
            schema_dir: PathBuf::from("schema"),
            config_dir: PathBuf::from(".shardwright/ledgers"),
            report_dir: PathBuf::from(".shardwright/reports"),
            export_dir: PathBuf::from(".shardwright/snapshots"),
            ledger_encoding: LedgerEncoding::Utf8,
            compiler: CompilerKind::Metadata,
            references: Vec::new(),
            environments,
        }
    }
}
