// マイグレーションパイプライン
//
// 起動時のセットアップ手順を一つにまとめます。
// 1. ストア未作成なら作成してマーカーを記録
// 2. スキーマスナップショットをコンパイル
// 3. 台帳で未適用コマンドを抽出し、順に実行してからコミット
// 4. 未初期化ならシードコマンドを実行してマーカーを記録
//
// コマンド実行後、コミット前にプロセスが停止した場合、次回の起動で同じコマンドが
// 再実行されます（少なくとも一度の実行保証）。コマンドは再実行に耐える形で書く必要があります。

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::adapters::command_executor::CommandExecutor;
use crate::core::accessor::AccessorIdentity;
use crate::core::schema::Schema;
use crate::services::migration_ledger::MigrationCommandLedger;
use crate::services::schema_snapshot::SchemaSnapshotCompiler;
use crate::services::state_validator::DatabaseStateValidator;

/// パイプラインの実行結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// この実行でストアを作成したか
    pub created: bool,
    /// この実行でシードを投入したか
    pub initialized: bool,
    /// スナップショットのソースハッシュ
    pub snapshot_hash: String,
    /// 実行したコマンド
    pub executed: Vec<String>,
    /// 適用済みとしてスキップしたコマンド数
    pub skipped: usize,
    /// コミット後の台帳の記録数
    pub ledger_entries: usize,
}

/// マイグレーションパイプライン
#[derive(Debug)]
pub struct MigrationPipeline {
    accessor: AccessorIdentity,
    ledger: Arc<MigrationCommandLedger>,
    snapshots: Arc<SchemaSnapshotCompiler>,
    state: DatabaseStateValidator,
    seed_commands: Vec<String>,
}

impl MigrationPipeline {
    pub fn new(
        accessor: AccessorIdentity,
        ledger: Arc<MigrationCommandLedger>,
        snapshots: Arc<SchemaSnapshotCompiler>,
        state: DatabaseStateValidator,
    ) -> Self {
        Self {
            accessor,
            ledger,
            snapshots,
            state,
            seed_commands: Vec::new(),
        }
    }

    /// 初期化時に一度だけ実行するコマンドを設定
    pub fn with_seed_commands(mut self, seed_commands: Vec<String>) -> Self {
        self.seed_commands = seed_commands;
        self
    }

    /// 台帳のストアキー
    pub fn store_key(&self) -> &str {
        self.accessor.qualified_name()
    }

    /// パイプラインを実行
    ///
    /// コマンドの実行に失敗した場合はコミットせずにエラーを返します。
    /// その際、メモリ上の未コミット記録も破棄されます。
    pub async fn run(
        &self,
        executor: &dyn CommandExecutor,
        model: &Schema,
        proposed: &[String],
    ) -> Result<PipelineReport> {
        let mut report = PipelineReport::default();

        if !self.state.is_created(&self.accessor) {
            info!(accessor = %self.accessor, "Store not yet created");
            executor
                .ensure_store()
                .await
                .with_context(|| format!("Failed to create store for {}", self.accessor))?;
            self.state.set_created(&self.accessor)?;
            report.created = true;
        }

        let artifact = self
            .snapshots
            .compile_in_memory(&self.accessor, model)
            .with_context(|| format!("Failed to compile model snapshot for {}", self.accessor))?;
        report.snapshot_hash = artifact.source_hash;

        let pending = self
            .ledger
            .filter_pending(self.store_key(), executor.fingerprint(), proposed)?;
        report.skipped = proposed.len().saturating_sub(pending.len());

        for (index, command) in pending.iter().enumerate() {
            info!(step = index + 1, total = pending.len(), "Executing migration command");
            if let Err(e) = executor.execute(command).await {
                warn!(error = %e, "Migration command failed, ledger not committed");
                // 次回の実行で同じコマンドが再び未適用として返される
                if let Err(discard) = self.ledger.discard_uncommitted(self.store_key()) {
                    warn!(error = %discard, "Failed to discard uncommitted ledger records");
                }
                return Err(anyhow::Error::new(e));
            }
            report.executed.push(command.clone());
        }

        let committed = self.ledger.commit(self.store_key())?;
        report.ledger_entries = committed.len();

        if !self.state.is_initialized(&self.accessor) {
            for command in &self.seed_commands {
                executor
                    .execute(command)
                    .await
                    .with_context(|| "Failed to run seed command")?;
            }
            self.state.set_initialized(&self.accessor)?;
            report.initialized = true;
        }

        info!(
            accessor = %self.accessor,
            executed = report.executed.len(),
            skipped = report.skipped,
            "Migration pipeline completed"
        );

        Ok(report)
    }
}
