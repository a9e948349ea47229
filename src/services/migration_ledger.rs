// マイグレーションコマンド台帳サービス
//
// 適用済みの構造変更コマンドをストアごとのファイルに記録し、
// 提案されたコマンド列から未適用のものだけを抽出します。
//
// 利用手順: filter_pending → 返されたコマンドを実行 → commit
// 実行が成功したことを確認してから記録を永続化するための二段階手順です。

use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::error::{IoError, LedgerError};
use crate::core::ledger::{LedgerEncoding, MigrationCommandRecord, MigrationLedger};
use crate::core::naming;

/// 台帳ファイルストア
///
/// 台帳ファイルの読み書きのみを担当します。
#[derive(Debug, Clone)]
pub struct LedgerFileStore {
    config_dir: PathBuf,
    encoding: LedgerEncoding,
}

impl LedgerFileStore {
    /// 新しいファイルストアを作成
    pub fn new(config_dir: impl Into<PathBuf>, encoding: LedgerEncoding) -> Self {
        Self {
            config_dir: config_dir.into(),
            encoding,
        }
    }

    /// 台帳ファイルのパス
    pub fn path_for(&self, store_key: &str) -> PathBuf {
        naming::ledger_path(&self.config_dir, store_key)
    }

    /// 台帳を読み込む
    ///
    /// ファイルが存在しない場合のみ空の台帳を返します。
    /// それ以外の読み込み失敗はI/Oエラー、解析できないファイルは破損として扱います。
    pub fn load(&self, store_key: &str) -> Result<MigrationLedger, LedgerError> {
        let path = self.path_for(store_key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(store = %store_key, path = %path.display(), "Ledger file not found, starting empty");
                return Ok(MigrationLedger::empty(store_key));
            }
            Err(e) => {
                return Err(LedgerError::Io {
                    store_key: store_key.to_string(),
                    source: IoError::read(&path, e),
                })
            }
        };

        let text = self
            .encoding
            .decode(&bytes)
            .map_err(|cause| corrupted(store_key, &path, cause))?;

        let entries: Vec<MigrationCommandRecord> = serde_json::from_str(&text)
            .map_err(|e| corrupted(store_key, &path, e.to_string()))?;

        debug!(store = %store_key, entries = entries.len(), "Loaded ledger");
        Ok(MigrationLedger::from_committed(store_key, entries))
    }

    /// 台帳を書き出す
    ///
    /// 一時ファイルに書いてから置き換えるため、書き込み途中の台帳は残りません。
    pub fn save(&self, ledger: &MigrationLedger) -> Result<(), LedgerError> {
        let store_key = ledger.store_key();
        let io_error = |source: IoError| LedgerError::Io {
            store_key: store_key.to_string(),
            source,
        };

        fs::create_dir_all(&self.config_dir)
            .map_err(|e| io_error(IoError::create_dir(&self.config_dir, e)))?;

        let json = serde_json::to_string_pretty(ledger.entries()).map_err(|e| {
            LedgerError::Serialize {
                store_key: store_key.to_string(),
                cause: e.to_string(),
            }
        })?;

        let path = self.path_for(store_key);
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, self.encoding.encode(&json))
            .map_err(|e| io_error(IoError::write(&tmp_path, e)))?;
        fs::rename(&tmp_path, &path).map_err(|e| io_error(IoError::write(&path, e)))?;

        Ok(())
    }
}

fn corrupted(store_key: &str, path: &Path, cause: String) -> LedgerError {
    LedgerError::Corrupted {
        store_key: store_key.to_string(),
        path: path.display().to_string(),
        cause,
    }
}

/// マイグレーションコマンド台帳
///
/// ストアキーごとの台帳をプロセス内でキャッシュします。
/// 初回アクセス時に一度だけファイルから読み込まれ、以降はメモリ上の状態を使用します。
///
/// 複数プロセス間のロックは行いません。同じ台帳ファイルを別プロセスが同時に更新すると、
/// 後から書き出した側が先の記録を上書きする可能性があります。
#[derive(Debug)]
pub struct MigrationCommandLedger {
    store: LedgerFileStore,
    ledgers: DashMap<String, Arc<Mutex<MigrationLedger>>>,
}

impl MigrationCommandLedger {
    /// 新しい台帳サービスを作成
    pub fn new(store: LedgerFileStore) -> Self {
        Self {
            store,
            ledgers: DashMap::new(),
        }
    }

    /// 台帳ファイルストア
    pub fn store(&self) -> &LedgerFileStore {
        &self.store
    }

    /// キャッシュ済みまたは読み込んだ台帳を取得
    ///
    /// 同じキーへの同時初回アクセスでも読み込みは一度だけ行われます。
    fn ledger(&self, store_key: &str) -> Result<Arc<Mutex<MigrationLedger>>, LedgerError> {
        let entry = self
            .ledgers
            .entry(store_key.to_string())
            .or_try_insert_with(|| {
                self.store
                    .load(store_key)
                    .map(|ledger| Arc::new(Mutex::new(ledger)))
            })?;
        Ok(Arc::clone(entry.value()))
    }

    /// 未適用のコマンドを抽出
    ///
    /// 永続化済みの記録に含まれないコマンドを、入力順・重複なしで返します。
    /// 新しい記録はメモリ上の台帳に追加されますが、ディスクには書き込みません。
    /// コミット前に同じ入力で再度呼び出すと、同じコマンドが再び返されます。
    ///
    /// # Arguments
    ///
    /// * `store_key` - ストアキー
    /// * `connection_fingerprint` - 接続フィンガープリント
    /// * `proposed` - 提案されたコマンド列
    ///
    /// # Returns
    ///
    /// 未適用のコマンド（元の文字列）
    pub fn filter_pending<S: AsRef<str>>(
        &self,
        store_key: &str,
        connection_fingerprint: &str,
        proposed: &[S],
    ) -> Result<Vec<String>, LedgerError> {
        let ledger = self.ledger(store_key)?;
        let mut ledger = ledger.lock();

        let mut seen = HashSet::new();
        let mut pending = Vec::new();

        for command in proposed {
            let command = command.as_ref();
            let record = MigrationCommandRecord::new(command, connection_fingerprint);
            if record.normalized_command_text.is_empty() || ledger.is_committed(&record) {
                continue;
            }
            if !seen.insert(record.clone()) {
                continue;
            }
            ledger.record(record);
            pending.push(command.to_string());
        }

        debug!(
            store = %store_key,
            proposed = proposed.len(),
            pending = pending.len(),
            "Filtered migration commands"
        );

        Ok(pending)
    }

    /// メモリ上の台帳をファイルに書き出す
    ///
    /// # Returns
    ///
    /// 書き出した全記録
    pub fn commit(&self, store_key: &str) -> Result<Vec<MigrationCommandRecord>, LedgerError> {
        let ledger = self.ledger(store_key)?;
        let mut ledger = ledger.lock();

        let newly_committed = ledger.uncommitted().len();
        self.store.save(&ledger)?;
        ledger.mark_committed();

        info!(
            store = %store_key,
            entries = ledger.entries().len(),
            new = newly_committed,
            "Committed migration ledger"
        );

        Ok(ledger.entries().to_vec())
    }

    /// メモリ上の未コミット記録を破棄
    ///
    /// 実行に失敗した後、同じインスタンスで後から `commit` しても
    /// 実行されなかったコマンドが永続化されないようにします。
    pub fn discard_uncommitted(&self, store_key: &str) -> Result<usize, LedgerError> {
        let ledger = self.ledger(store_key)?;
        let discarded = ledger.lock().discard_uncommitted();
        if discarded > 0 {
            debug!(store = %store_key, discarded, "Discarded uncommitted ledger records");
        }
        Ok(discarded)
    }

    /// 台帳の全記録を取得（永続化済み＋未コミット）
    pub fn entries(&self, store_key: &str) -> Result<Vec<MigrationCommandRecord>, LedgerError> {
        let ledger = self.ledger(store_key)?;
        let entries = ledger.lock().entries().to_vec();
        Ok(entries)
    }

    /// 未コミットの記録数
    pub fn uncommitted_count(&self, store_key: &str) -> Result<usize, LedgerError> {
        let ledger = self.ledger(store_key)?;
        let count = ledger.lock().uncommitted().len();
        Ok(count)
    }
}
