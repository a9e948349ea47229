// アクセサー識別子
//
// データストアごとの台帳・センチネル・スナップショットを区別するための識別子。

use serde::{Deserialize, Serialize};
use std::fmt;

/// アクセサー識別子
///
/// `qualified_name` は台帳とセンチネルファイル名に、
/// `display_name` はスナップショット成果物のファイル名に使用されます。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccessorIdentity {
    /// 完全修飾名（例: `Blog.Data.BlogAccessor`）
    qualified_name: String,

    /// 表示名（例: `Blog.Data`）
    display_name: String,
}

impl AccessorIdentity {
    /// 新しいアクセサー識別子を作成
    pub fn new(qualified_name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            display_name: display_name.into(),
        }
    }

    /// 完全修飾名から識別子を作成
    ///
    /// 表示名は最後の `.` より前の部分になります。`.` を含まない場合は完全修飾名と同じです。
    pub fn from_qualified_name(qualified_name: impl Into<String>) -> Self {
        let qualified_name = qualified_name.into();
        let display_name = match qualified_name.rsplit_once('.') {
            Some((prefix, _)) if !prefix.is_empty() => prefix.to_string(),
            _ => qualified_name.clone(),
        };
        Self {
            qualified_name,
            display_name,
        }
    }

    /// 完全修飾名を取得
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// 表示名を取得
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// 単純名（最後のセグメント）を取得
    pub fn simple_name(&self) -> &str {
        self.qualified_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.qualified_name)
    }
}

impl fmt::Display for AccessorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified_name)
    }
}
