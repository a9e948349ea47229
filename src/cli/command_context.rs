// コマンド共通コンテキスト
//
// 設定ファイル読み込みやパス解決、サービスの組み立てをCLI層で集約する。

use crate::adapters::snapshot_compiler::{
    MetadataSnapshotCompiler, RustcSnapshotCompiler, SnapshotCompiler,
};
use crate::core::accessor::AccessorIdentity;
use crate::core::config::{CompilerKind, Config};
use crate::core::schema::Schema;
use crate::services::config_loader::ConfigLoader;
use crate::services::formatting_engine::FormattingSubstitutionEngine;
use crate::services::migration_ledger::{LedgerFileStore, MigrationCommandLedger};
use crate::services::schema_parser::SchemaParserService;
use crate::services::schema_snapshot::{SchemaSnapshotCompiler, StaticReferenceResolver};
use crate::services::sharding_resolver::ShardingRuleResolver;
use crate::services::sharding_rules::ShardingRuleRegistry;
use crate::services::snapshot_codegen::RustSnapshotCodeGenerator;
use crate::services::state_validator::DatabaseStateValidator;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;

/// CLIコマンド共通の実行コンテキスト
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub project_path: PathBuf,
    pub config_path: PathBuf,
    pub config: Config,
}

impl CommandContext {
    /// プロジェクトルートから設定を読み込んでコンテキストを作成
    ///
    /// `config_path` が指定された場合はそのファイルを使用します。
    pub fn load(project_path: PathBuf, config_path: Option<PathBuf>) -> Result<Self> {
        let config_path =
            config_path.unwrap_or_else(|| project_path.join(Config::DEFAULT_CONFIG_PATH));
        if !config_path.exists() {
            return Err(anyhow!(
                "Config file not found: {:?}. Please initialize the project first with the `init` command.",
                config_path
            ));
        }

        let config =
            ConfigLoader::from_file(&config_path).with_context(|| "Failed to read config file")?;

        Ok(Self {
            project_path,
            config_path,
            config,
        })
    }

    pub fn accessor(&self) -> AccessorIdentity {
        self.config.accessor_identity()
    }

    /// スキーマディレクトリの絶対パス
    pub fn schema_dir(&self) -> PathBuf {
        Config::resolve_dir(&self.project_path, &self.config.schema_dir)
    }

    /// 台帳ディレクトリの絶対パス
    pub fn config_dir(&self) -> PathBuf {
        Config::resolve_dir(&self.project_path, &self.config.config_dir)
    }

    /// センチネルディレクトリの絶対パス
    pub fn report_dir(&self) -> PathBuf {
        Config::resolve_dir(&self.project_path, &self.config.report_dir)
    }

    /// スナップショット出力ディレクトリの絶対パス
    pub fn export_dir(&self) -> PathBuf {
        Config::resolve_dir(&self.project_path, &self.config.export_dir)
    }

    /// スキーマモデルを読み込む
    pub fn load_schema(&self) -> Result<Schema> {
        let schema_dir = self.schema_dir();
        if !schema_dir.exists() {
            return Err(anyhow!("Schema directory not found: {:?}", schema_dir));
        }
        SchemaParserService::new().parse_schema_directory(&schema_dir)
    }

    /// シャーディングリゾルバーを作成（基準時刻の省略時は現在時刻）
    pub fn sharding_resolver(&self, at: Option<DateTime<Utc>>) -> ShardingRuleResolver {
        let engine = match at {
            Some(at) => FormattingSubstitutionEngine::at(at),
            None => FormattingSubstitutionEngine::new(),
        };
        ShardingRuleResolver::new(engine, Arc::new(ShardingRuleRegistry::with_defaults()))
    }

    /// 設定に応じたスナップショットコンパイラを作成
    pub fn snapshot_compiler(&self) -> SchemaSnapshotCompiler {
        let compiler: Arc<dyn SnapshotCompiler> = match self.config.compiler {
            CompilerKind::Metadata => Arc::new(MetadataSnapshotCompiler::new()),
            CompilerKind::Rustc => Arc::new(
                RustcSnapshotCompiler::new().with_crate_name(self.accessor().display_name()),
            ),
        };
        SchemaSnapshotCompiler::new(
            Arc::new(RustSnapshotCodeGenerator::new(self.sharding_resolver(None))),
            compiler,
            Arc::new(StaticReferenceResolver::from_specs(&self.config.references)),
        )
    }

    /// マイグレーション台帳を作成
    pub fn ledger(&self) -> MigrationCommandLedger {
        MigrationCommandLedger::new(LedgerFileStore::new(
            self.config_dir(),
            self.config.ledger_encoding,
        ))
    }

    /// 状態バリデーターを作成
    pub fn state_validator(&self) -> DatabaseStateValidator {
        DatabaseStateValidator::new(self.report_dir())
    }
}
