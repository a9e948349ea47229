// マイグレーション台帳ドメインモデル
//
// ストアごとに適用済みの構造変更コマンドを記録する台帳を表現します。

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 台帳ファイルの文字エンコーディング
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LedgerEncoding {
    #[default]
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "utf-16le")]
    Utf16Le,
}

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
const UTF16LE_BOM: [u8; 2] = [0xFF, 0xFE];

impl LedgerEncoding {
    /// 文字列をバイト列にエンコード
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            LedgerEncoding::Utf8 => text.as_bytes().to_vec(),
            LedgerEncoding::Utf16Le => {
                let mut bytes = UTF16LE_BOM.to_vec();
                bytes.extend(text.encode_utf16().flat_map(|unit| unit.to_le_bytes()));
                bytes
            }
        }
    }

    /// バイト列を文字列にデコード
    pub fn decode(&self, bytes: &[u8]) -> Result<String, String> {
        match self {
            LedgerEncoding::Utf8 => {
                let bytes = bytes.strip_prefix(&UTF8_BOM[..]).unwrap_or(bytes);
                String::from_utf8(bytes.to_vec()).map_err(|e| e.to_string())
            }
            LedgerEncoding::Utf16Le => {
                let bytes = bytes.strip_prefix(&UTF16LE_BOM[..]).unwrap_or(bytes);
                if bytes.len() % 2 != 0 {
                    return Err("odd number of bytes in UTF-16 content".to_string());
                }
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16(&units).map_err(|e| e.to_string())
            }
        }
    }
}

/// コマンド文字列を正規化
///
/// 前後の空白を除去し、連続する空白を単一のスペースにまとめます。
pub fn normalize_command(command: &str) -> String {
    command.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// マイグレーションコマンド記録
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationCommandRecord {
    /// 正規化済みコマンド文字列
    pub normalized_command_text: String,

    /// 接続フィンガープリント
    pub connection_fingerprint: String,
}

impl MigrationCommandRecord {
    /// コマンド文字列から記録を作成（正規化を行う）
    pub fn new(command: &str, connection_fingerprint: impl Into<String>) -> Self {
        Self {
            normalized_command_text: normalize_command(command),
            connection_fingerprint: connection_fingerprint.into(),
        }
    }
}

/// マイグレーション台帳
///
/// `entries` はメモリ上の全記録（永続化済み＋未コミット）、
/// `committed` は最後に読み込み・書き出しした時点の記録集合です。
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationLedger {
    store_key: String,
    entries: Vec<MigrationCommandRecord>,
    committed: HashSet<MigrationCommandRecord>,
}

impl MigrationLedger {
    /// 空の台帳を作成
    pub fn empty(store_key: impl Into<String>) -> Self {
        Self {
            store_key: store_key.into(),
            entries: Vec::new(),
            committed: HashSet::new(),
        }
    }

    /// 永続化済みの記録から台帳を復元
    pub fn from_committed(
        store_key: impl Into<String>,
        entries: Vec<MigrationCommandRecord>,
    ) -> Self {
        let committed = entries.iter().cloned().collect();
        Self {
            store_key: store_key.into(),
            entries,
            committed,
        }
    }

    /// ストアキー
    pub fn store_key(&self) -> &str {
        &self.store_key
    }

    /// 全記録（挿入順）
    pub fn entries(&self) -> &[MigrationCommandRecord] {
        &self.entries
    }

    /// 永続化済みの記録数
    pub fn committed_count(&self) -> usize {
        self.committed.len()
    }

    /// 未コミットの記録
    pub fn uncommitted(&self) -> Vec<&MigrationCommandRecord> {
        self.entries
            .iter()
            .filter(|record| !self.committed.contains(*record))
            .collect()
    }

    /// 記録が永続化済みかどうか
    pub fn is_committed(&self, record: &MigrationCommandRecord) -> bool {
        self.committed.contains(record)
    }

    /// 記録をメモリ上に追加（既に存在する場合は何もしない）
    ///
    /// 追加された場合は true を返します。
    pub fn record(&mut self, record: MigrationCommandRecord) -> bool {
        if self.entries.contains(&record) {
            return false;
        }
        self.entries.push(record);
        true
    }

    /// 全記録を永続化済みとしてマークする
    pub fn mark_committed(&mut self) {
        self.committed = self.entries.iter().cloned().collect();
    }

    /// 未コミットの記録を破棄し、破棄した件数を返す
    pub fn discard_uncommitted(&mut self) -> usize {
        let before = self.entries.len();
        let committed = &self.committed;
        self.entries.retain(|record| committed.contains(record));
        before - self.entries.len()
    }
}
