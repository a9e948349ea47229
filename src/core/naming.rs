// 保存パス規則
//
// 設定ファイル・台帳・センチネル・スナップショットのファイル名をまとめます。

use std::path::{Path, PathBuf};

use crate::core::accessor::AccessorIdentity;

/// 既定の設定ファイル名
pub const CONFIG_FILE: &str = ".shardwright.yaml";

/// 既定の状態ディレクトリ
pub const STATE_DIR: &str = ".shardwright";

/// 台帳ファイルの拡張子
pub const LEDGER_EXTENSION: &str = ".ledger.json";

/// センチネルファイルの拡張子
pub const MARKER_EXTENSION: &str = ".txt";

/// スナップショット成果物の固定サフィックス
pub const SNAPSHOT_SUFFIX: &str = ".ModelSnapshot";

/// スナップショットのソースハッシュ記録ファイルの拡張子
pub const SNAPSHOT_HASH_EXTENSION: &str = ".sha256";

/// 作成済みマーカーのサブディレクトリ
pub const CREATED_MARKER_DIR: &str = "created";

/// 初期化済みマーカーのサブディレクトリ
pub const INITIALIZED_MARKER_DIR: &str = "initialized";

/// 台帳ファイルのパス
pub fn ledger_path(config_dir: &Path, store_key: &str) -> PathBuf {
    config_dir.join(format!("{}{}", store_key, LEDGER_EXTENSION))
}

/// センチネルファイルのパス
pub fn marker_path(report_dir: &Path, kind_dir: &str, accessor: &AccessorIdentity) -> PathBuf {
    report_dir
        .join(kind_dir)
        .join(format!("{}{}", accessor.qualified_name(), MARKER_EXTENSION))
}

/// スナップショット成果物のエクスポートパス
pub fn snapshot_export_path(
    export_dir: &Path,
    accessor: &AccessorIdentity,
    extension: &str,
) -> PathBuf {
    export_dir.join(format!(
        "{}{}{}",
        accessor.display_name(),
        SNAPSHOT_SUFFIX,
        extension
    ))
}

/// スナップショットのソースハッシュ記録パス
pub fn snapshot_hash_path(export_dir: &Path, accessor: &AccessorIdentity) -> PathBuf {
    export_dir.join(format!(
        "{}{}{}",
        accessor.display_name(),
        SNAPSHOT_SUFFIX,
        SNAPSHOT_HASH_EXTENSION
    ))
}
