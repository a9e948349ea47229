// データベース接続アダプター
//
// SQLxを使用したデータベース接続プールの管理を行います。
// PostgreSQL、MySQL、SQLiteに対応した統一されたインターフェースを提供します。

use crate::adapters::connection_string::build_connection_string;
use crate::core::config::{DatabaseConfig, Dialect};
use crate::core::error::DatabaseError;
use sqlx::pool::PoolOptions;
use sqlx::{Any, AnyPool};
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// データベース接続サービス
#[derive(Debug, Clone, Default)]
pub struct DatabaseConnectionService;

impl DatabaseConnectionService {
    /// 新しいDatabaseConnectionServiceを作成
    pub fn new() -> Self {
        Self
    }

    /// データベース接続プールを作成
    ///
    /// # Arguments
    ///
    /// * `dialect` - データベース方言
    /// * `config` - データベース設定
    pub async fn create_pool(
        &self,
        dialect: Dialect,
        config: &DatabaseConfig,
    ) -> Result<AnyPool, DatabaseError> {
        // sqlx::any はドライバー登録が必要（複数回呼んでも安全）
        sqlx::any::install_default_drivers();

        let connection_string = build_connection_string(dialect, config);
        debug!(dialect = %dialect, database = %config.database, "Connecting to database");

        self.pool_options(config.timeout, dialect)
            .connect(&connection_string)
            .await
            .map_err(|e| DatabaseError::Connection {
                message: format!("Failed to create connection pool: {}", dialect),
                cause: e.to_string(),
            })
    }

    /// 接続テストを実行
    pub async fn test_connection(&self, pool: &AnyPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1")
            .execute(pool)
            .await
            .map(|_| ())
            .map_err(|e| DatabaseError::Connection {
                message: "Connection test failed".to_string(),
                cause: e.to_string(),
            })
    }

    /// プールオプションを作成
    ///
    /// SQLiteのインメモリDBは接続ごとに別のDBになるため、接続数を1に制限する。
    pub fn pool_options(&self, timeout_secs: Option<u64>, dialect: Dialect) -> PoolOptions<Any> {
        let options = PoolOptions::new()
            .acquire_timeout(Duration::from_secs(timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)));
        match dialect {
            Dialect::SQLite => options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None),
            _ => options.max_connections(5),
        }
    }
}
