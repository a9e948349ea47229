// 設定ファイル管理
//
// プロジェクトの設定ファイル（YAML形式）の読み込み、検証、
// 保存ディレクトリと環境別のデータベース接続設定の管理を行います。

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::core::accessor::AccessorIdentity;
use crate::core::ledger::LedgerEncoding;

/// データベース方言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[serde(rename = "postgresql")]
    PostgreSQL,
    #[serde(rename = "mysql")]
    MySQL,
    #[serde(rename = "sqlite")]
    SQLite,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::PostgreSQL => write!(f, "postgresql"),
            Dialect::MySQL => write!(f, "mysql"),
            Dialect::SQLite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for Dialect {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "postgresql" | "postgres" => Ok(Dialect::PostgreSQL),
            "mysql" => Ok(Dialect::MySQL),
            "sqlite" => Ok(Dialect::SQLite),
            other => Err(anyhow!(
                "Unsupported database dialect: {}. Please specify one of: postgresql, mysql, sqlite.",
                other
            )),
        }
    }
}

/// スナップショットコンパイラの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilerKind {
    /// 生成ソースと参照をメタデータとして直列化する（外部ツール不要）
    #[default]
    Metadata,
    /// rustc を起動して rlib を生成する
    Rustc,
}

/// プロジェクト設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 設定ファイルのバージョン
    pub version: String,

    /// データベース方言
    pub dialect: Dialect,

    /// アクセサーの完全修飾名
    pub accessor: String,

    /// スキーマ定義ディレクトリ
    #[serde(default = "default_schema_dir")]
    pub schema_dir: PathBuf,

    /// 台帳ファイルの保存ディレクトリ
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// センチネルファイルの保存ディレクトリ
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,

    /// スナップショットのエクスポートディレクトリ
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,

    /// 台帳ファイルの文字エンコーディング
    #[serde(default)]
    pub ledger_encoding: LedgerEncoding,

    /// スナップショットコンパイラ
    #[serde(default)]
    pub compiler: CompilerKind,

    /// 追加のコンパイラ参照
    #[serde(default)]
    pub references: Vec<String>,

    /// 環境別のデータベース設定
    pub environments: HashMap<String, DatabaseConfig>,
}

fn default_schema_dir() -> PathBuf {
    PathBuf::from("schema")
}

fn default_config_dir() -> PathBuf {
    PathBuf::from(crate::core::naming::STATE_DIR).join("ledgers")
}

fn default_report_dir() -> PathBuf {
    PathBuf::from(crate::core::naming::STATE_DIR).join("reports")
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(crate::core::naming::STATE_DIR).join("snapshots")
}

impl Config {
    /// デフォルトの設定ファイルパス
    pub const DEFAULT_CONFIG_PATH: &'static str = crate::core::naming::CONFIG_FILE;

    /// アクセサー識別子を取得
    pub fn accessor_identity(&self) -> AccessorIdentity {
        AccessorIdentity::from_qualified_name(self.accessor.clone())
    }

    /// プロジェクトルートを基準に相対パスを解決
    pub fn resolve_dir(project_path: &Path, dir: &Path) -> PathBuf {
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            project_path.join(dir)
        }
    }

    /// 指定された環境のデータベース設定を取得
    pub fn get_database_config(&self, environment: &str) -> Result<DatabaseConfig> {
        self.environments.get(environment).cloned().ok_or_else(|| {
            anyhow!(
                "Environment '{}' not found. Available environments: {:?}",
                environment,
                self.environments.keys().collect::<Vec<_>>()
            )
        })
    }

    /// 設定の妥当性を検証
    pub fn validate(&self) -> Result<()> {
        // バージョンチェック
        if self.version.is_empty() {
            return Err(anyhow!("Config file version is not specified"));
        }

        // アクセサーチェック
        if self.accessor.trim().is_empty() {
            return Err(anyhow!("Accessor name is not specified"));
        }
        if self.accessor.contains(['/', '\\']) {
            return Err(anyhow!(
                "Accessor name must not contain path separators: {}",
                self.accessor
            ));
        }

        // 環境設定チェック
        if self.environments.is_empty() {
            return Err(anyhow!(
                "At least one environment configuration is required"
            ));
        }

        // 各環境のデータベース設定を検証
        for (env_name, db_config) in &self.environments {
            db_config
                .validate()
                .with_context(|| format!("Invalid config for environment '{}'", env_name))?;
        }

        Ok(())
    }
}

/// std::str::FromStrトレイトの実装
impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(yaml: &str) -> Result<Self, Self::Err> {
        serde_saphyr::from_str(yaml).with_context(|| "Failed to parse config file")
    }
}

/// データベース接続設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// ホスト名（SQLiteの場合は不要）
    #[serde(default = "default_host")]
    pub host: String,

    /// ポート番号
    #[serde(default = "default_port")]
    pub port: u16,

    /// データベース名
    pub database: String,

    /// ユーザー名
    pub user: Option<String>,

    /// パスワード
    pub password: Option<String>,

    /// 接続タイムアウト（秒）
    pub timeout: Option<u64>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432 // PostgreSQLのデフォルトポート
}

impl DatabaseConfig {
    /// Validate database configuration
    pub fn validate(&self) -> Result<()> {
        if self.database.is_empty() {
            return Err(anyhow!("Database name is not specified"));
        }

        Ok(())
    }

    /// パスワードを除いたコピーを取得（フィンガープリント計算用）
    pub fn without_password(&self) -> Self {
        Self {
            password: None,
            ..self.clone()
        }
    }
}
