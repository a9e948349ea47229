// データベース状態マーカー
//
// 一度きりのセットアップ（ストア作成・初期化）の完了を記録するマーカー。
// ファイルの存在のみが判定に使用され、内容は情報用です。

use chrono::{DateTime, Utc};

use crate::core::accessor::AccessorIdentity;

/// マーカーの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    /// ストア作成済み
    Created,
    /// 初期化（シード投入）済み
    Initialized,
}

impl StateKind {
    /// マーカーの保存サブディレクトリ
    pub fn directory(&self) -> &'static str {
        match self {
            StateKind::Created => crate::core::naming::CREATED_MARKER_DIR,
            StateKind::Initialized => crate::core::naming::INITIALIZED_MARKER_DIR,
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            StateKind::Created => "created",
            StateKind::Initialized => "initialized",
        }
    }
}

impl std::fmt::Display for StateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.verb())
    }
}

/// 状態マーカー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMarker {
    pub accessor: AccessorIdentity,
    pub kind: StateKind,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl StateMarker {
    /// 現在時刻のマーカーを作成
    pub fn now(accessor: AccessorIdentity, kind: StateKind) -> Self {
        Self::at(accessor, kind, Utc::now())
    }

    /// 指定時刻のマーカーを作成
    pub fn at(accessor: AccessorIdentity, kind: StateKind, timestamp: DateTime<Utc>) -> Self {
        let message = format!(
            "Database for {} was {} at {}.",
            accessor.qualified_name(),
            kind.verb(),
            timestamp.to_rfc3339()
        );
        Self {
            accessor,
            kind,
            timestamp,
            message,
        }
    }
}
