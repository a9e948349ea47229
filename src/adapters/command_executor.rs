// コマンド実行アダプター
//
// 台帳で未適用と判定された構造変更コマンドをデータベースに対して実行します。

use async_trait::async_trait;
use sqlx::AnyPool;
use tracing::debug;

use crate::adapters::connection_string::connection_fingerprint;
use crate::adapters::database::DatabaseConnectionService;
use crate::core::config::{DatabaseConfig, Dialect};
use crate::core::error::DatabaseError;

/// コマンド実行インターフェース
///
/// パイプラインからデータベース操作を切り離し、テスト時に差し替え可能にします。
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// 接続先の識別子（台帳の記録に使用）
    fn fingerprint(&self) -> &str;

    /// ストアが利用可能な状態であることを確認
    async fn ensure_store(&self) -> Result<(), DatabaseError>;

    /// コマンドを1件実行
    async fn execute(&self, command: &str) -> Result<(), DatabaseError>;
}

/// SQLx によるコマンド実行
#[derive(Debug, Clone)]
pub struct SqlxCommandExecutor {
    pool: AnyPool,
    fingerprint: String,
}

impl SqlxCommandExecutor {
    /// 既存のプールから作成
    pub fn new(pool: AnyPool, fingerprint: impl Into<String>) -> Self {
        Self {
            pool,
            fingerprint: fingerprint.into(),
        }
    }

    /// 設定から接続して作成
    pub async fn connect(dialect: Dialect, config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let pool = DatabaseConnectionService::new()
            .create_pool(dialect, config)
            .await?;
        Ok(Self::new(pool, connection_fingerprint(dialect, config)))
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// プールを閉じる
    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl CommandExecutor for SqlxCommandExecutor {
    fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    async fn ensure_store(&self) -> Result<(), DatabaseError> {
        // SQLiteは接続時（mode=rwc）に作成済み。他の方言ではデータベースが存在する前提で到達性のみ確認する
        DatabaseConnectionService::new()
            .test_connection(&self.pool)
            .await
    }

    async fn execute(&self, command: &str) -> Result<(), DatabaseError> {
        debug!(sql = %command, "Executing command");
        sqlx::query(command)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| DatabaseError::Query {
                message: format!("Failed to execute command: {}", e),
                sql: Some(command.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;

    fn memory_config() -> DatabaseConfig {
        DatabaseConfig {
            host: String::new(),
            port: 0,
            database: "sqlite::memory:".to_string(),
            user: None,
            password: None,
            timeout: Some(5),
        }
    }

    #[tokio::test]
    async fn test_execute_against_sqlite_memory() {
        let executor = SqlxCommandExecutor::connect(Dialect::SQLite, &memory_config())
            .await
            .unwrap();

        executor.ensure_store().await.unwrap();
        executor
            .execute("CREATE TABLE Articles_2024 (id INTEGER PRIMARY KEY)")
            .await
            .unwrap();
        executor
            .execute("INSERT INTO Articles_2024 (id) VALUES (1)")
            .await
            .unwrap();

        let row = sqlx::query("SELECT COUNT(*) FROM Articles_2024")
            .fetch_one(executor.pool())
            .await
            .unwrap();
        assert_eq!(row.get::<i64, _>(0), 1);
        assert_eq!(executor.fingerprint().len(), 64);

        executor.close().await;
    }

    #[tokio::test]
    async fn test_invalid_command_is_query_error() {
        let executor = SqlxCommandExecutor::connect(Dialect::SQLite, &memory_config())
            .await
            .unwrap();

        let error = executor.execute("CREATE TABLEX broken").await.unwrap_err();
        assert!(error.is_query());
        assert!(matches!(error, DatabaseError::Query { sql: Some(ref sql), .. } if sql == "CREATE TABLEX broken"));
    }
}
