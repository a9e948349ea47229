// スナップショットドメインモデル
//
// 論理スキーマモデルをコンパイルした成果物と、コンパイル時の参照を表現します。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::core::accessor::AccessorIdentity;

/// コンパイラ参照
///
/// 名前とパスの組で順序付けされます（名前優先）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Reference {
    /// 参照名（クレート名・アセンブリ名）
    pub name: String,

    /// 成果物のパス（未解決の場合は None）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Reference {
    /// 名前のみの参照を作成
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
        }
    }

    /// パス付きの参照を作成
    pub fn with_path(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: Some(path.into()),
        }
    }

    /// アクセサー自身の成果物への参照
    pub fn for_accessor(accessor: &AccessorIdentity) -> Self {
        Self::named(accessor.display_name())
    }

    /// `name` または `name=path` 形式の文字列を解析
    pub fn parse(spec: &str) -> Self {
        match spec.split_once('=') {
            Some((name, path)) if !path.is_empty() => Self::with_path(name.trim(), path.trim()),
            Some((name, _)) => Self::named(name.trim()),
            None => Self::named(spec.trim()),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}={}", self.name, path.display()),
            None => write!(f, "{}", self.name),
        }
    }
}

/// スナップショット成果物
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotArtifact {
    /// アクセサー識別子
    pub accessor: AccessorIdentity,

    /// 生成ソーステキストのSHA-256（16進数64文字）
    pub source_hash: String,

    /// gzip圧縮済みのコンパイル成果物
    pub binary: Vec<u8>,

    /// コンパイルに使用した参照（ソート・重複除去済み）
    pub reference_set: Vec<Reference>,
}

impl SnapshotArtifact {
    /// ソースハッシュが一致するかどうか（再コンパイル不要の判定）
    pub fn matches_hash(&self, source_hash: &str) -> bool {
        self.source_hash == source_hash
    }
}
