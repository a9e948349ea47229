// データベース状態バリデーター
//
// センチネルファイルの有無で「ストア作成済み」「初期化済み」を判定・記録します。

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

use crate::core::accessor::AccessorIdentity;
use crate::core::error::{IoError, StateError};
use crate::core::naming;
use crate::core::state::{StateKind, StateMarker};

/// データベース状態バリデーター
#[derive(Debug, Clone)]
pub struct DatabaseStateValidator {
    report_dir: PathBuf,
}

impl DatabaseStateValidator {
    /// 新しいバリデーターを作成
    ///
    /// # Arguments
    ///
    /// * `report_dir` - センチネルファイルを置くディレクトリ
    pub fn new(report_dir: impl Into<PathBuf>) -> Self {
        Self {
            report_dir: report_dir.into(),
        }
    }

    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }

    /// センチネルファイルのパス
    pub fn marker_path(&self, accessor: &AccessorIdentity, kind: StateKind) -> PathBuf {
        naming::marker_path(&self.report_dir, kind.directory(), accessor)
    }

    /// ストア作成済みかどうか
    pub fn is_created(&self, accessor: &AccessorIdentity) -> bool {
        self.marker_path(accessor, StateKind::Created).exists()
    }

    /// 初期化済みかどうか
    pub fn is_initialized(&self, accessor: &AccessorIdentity) -> bool {
        self.marker_path(accessor, StateKind::Initialized).exists()
    }

    /// ストア作成済みとして記録
    pub fn set_created(&self, accessor: &AccessorIdentity) -> Result<PathBuf, StateError> {
        self.write_marker(&StateMarker::now(accessor.clone(), StateKind::Created))
    }

    /// 初期化済みとして記録
    pub fn set_initialized(&self, accessor: &AccessorIdentity) -> Result<PathBuf, StateError> {
        self.write_marker(&StateMarker::now(accessor.clone(), StateKind::Initialized))
    }

    /// マーカーを書き込む（既存のファイルは上書き）
    pub fn write_marker(&self, marker: &StateMarker) -> Result<PathBuf, StateError> {
        let path = self.marker_path(&marker.accessor, marker.kind);
        let io_error = |source: IoError| StateError::Io {
            accessor: marker.accessor.qualified_name().to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(IoError::create_dir(parent, e)))?;
        }
        fs::write(&path, &marker.message).map_err(|e| io_error(IoError::write(&path, e)))?;

        info!(accessor = %marker.accessor, state = %marker.kind, path = %path.display(), "Recorded database state");
        Ok(path)
    }

    /// `is_created` の非同期版
    ///
    /// キャンセルは開始前にのみ確認されます。
    pub async fn is_created_async(
        &self,
        accessor: &AccessorIdentity,
        cancel: Option<&AtomicBool>,
    ) -> Result<bool, StateError> {
        check_cancelled(cancel, "is_created")?;
        Ok(self.is_created(accessor))
    }

    /// `is_initialized` の非同期版
    pub async fn is_initialized_async(
        &self,
        accessor: &AccessorIdentity,
        cancel: Option<&AtomicBool>,
    ) -> Result<bool, StateError> {
        check_cancelled(cancel, "is_initialized")?;
        Ok(self.is_initialized(accessor))
    }

    /// `set_created` の非同期版
    pub async fn set_created_async(
        &self,
        accessor: &AccessorIdentity,
        cancel: Option<&AtomicBool>,
    ) -> Result<PathBuf, StateError> {
        check_cancelled(cancel, "set_created")?;
        self.set_created(accessor)
    }

    /// `set_initialized` の非同期版
    pub async fn set_initialized_async(
        &self,
        accessor: &AccessorIdentity,
        cancel: Option<&AtomicBool>,
    ) -> Result<PathBuf, StateError> {
        check_cancelled(cancel, "set_initialized")?;
        self.set_initialized(accessor)
    }
}

fn check_cancelled(cancel: Option<&AtomicBool>, operation: &str) -> Result<(), StateError> {
    match cancel {
        Some(flag) if flag.load(Ordering::SeqCst) => Err(StateError::Cancelled {
            operation: operation.to_string(),
        }),
        _ => Ok(()),
    }
}
