// フォーマット記述子ドメインモデル
//
// テーブル名テンプレート内のプレースホルダーと、その置換値を表現します。

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use crate::core::error::ShardingError;

/// プレースホルダーの開始区切り文字
pub const PLACEHOLDER_OPEN: char = '{';

/// プレースホルダーの終了区切り文字
pub const PLACEHOLDER_CLOSE: char = '}';

/// フォーマット記述子
///
/// `value` と `format` のうち、ちょうど一方だけが空でない値を持ちます。
/// 同一性（等価性とハッシュ）は `key` のみで判定されます。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawFormattingDescriptor")]
pub struct FormattingDescriptor {
    key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
}

#[derive(Deserialize)]
struct RawFormattingDescriptor {
    key: String,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    format: Option<String>,
}

impl TryFrom<RawFormattingDescriptor> for FormattingDescriptor {
    type Error = ShardingError;

    fn try_from(raw: RawFormattingDescriptor) -> Result<Self, Self::Error> {
        Self::new(raw.key, raw.value, raw.format)
    }
}

impl FormattingDescriptor {
    /// 新しいフォーマット記述子を作成
    ///
    /// # Errors
    ///
    /// - キーが空、または区切り文字を含む場合
    /// - `value` と `format` の両方が空、または両方が指定された場合
    /// - `format` が不正な日時書式の場合
    pub fn new(
        key: impl Into<String>,
        value: Option<String>,
        format: Option<String>,
    ) -> Result<Self, ShardingError> {
        let key = key.into();
        validate_key(&key)?;

        let value = value.filter(|v| !v.is_empty());
        let format = format.filter(|f| !f.is_empty());

        match (&value, &format) {
            (Some(_), Some(_)) => Err(ShardingError::InvalidFormatting {
                key,
                reason: "only one of value or format may be set".to_string(),
            }),
            (None, None) => Err(ShardingError::InvalidFormatting {
                key,
                reason: "either value or format must be set".to_string(),
            }),
            (None, Some(f)) => {
                validate_format(&key, f)?;
                Ok(Self { key, value, format })
            }
            (Some(_), None) => Ok(Self { key, value, format }),
        }
    }

    /// 固定値の記述子を作成
    pub fn with_value(
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, ShardingError> {
        Self::new(key, Some(value.into()), None)
    }

    /// 日時書式の記述子を作成
    pub fn with_format(
        key: impl Into<String>,
        format: impl Into<String>,
    ) -> Result<Self, ShardingError> {
        Self::new(key, None, Some(format.into()))
    }

    /// キーを取得
    pub fn key(&self) -> &str {
        &self.key
    }

    /// 固定値を取得
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// 日時書式を取得
    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    /// 固定値を差し替える（書式は破棄される）
    pub fn set_value(&mut self, value: impl Into<String>) -> Result<(), ShardingError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ShardingError::InvalidFormatting {
                key: self.key.clone(),
                reason: "value must not be empty".to_string(),
            });
        }
        self.value = Some(value);
        self.format = None;
        Ok(())
    }

    /// テンプレート内のプレースホルダー表記（例: `{Entity}`）
    pub fn placeholder(&self) -> String {
        format!("{}{}{}", PLACEHOLDER_OPEN, self.key, PLACEHOLDER_CLOSE)
    }

    /// 置換値を解決
    ///
    /// 固定値があればそれを、なければ書式を `at` に適用した結果を返します。
    pub fn resolve(&self, at: &DateTime<Utc>) -> String {
        match (&self.value, &self.format) {
            (Some(value), _) => value.clone(),
            (None, Some(format)) => at
                .format_with_items(StrftimeItems::new(format))
                .to_string(),
            (None, None) => String::new(),
        }
    }
}

impl PartialEq for FormattingDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for FormattingDescriptor {}

impl Hash for FormattingDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

fn validate_key(key: &str) -> Result<(), ShardingError> {
    if key.trim().is_empty() {
        return Err(ShardingError::InvalidFormatting {
            key: key.to_string(),
            reason: "key must not be empty".to_string(),
        });
    }
    if key.contains([PLACEHOLDER_OPEN, PLACEHOLDER_CLOSE]) {
        return Err(ShardingError::InvalidFormatting {
            key: key.to_string(),
            reason: "key must not contain placeholder delimiters".to_string(),
        });
    }
    Ok(())
}

// 不正な書式は表示時に panic するため、構築時に弾く
fn validate_format(key: &str, format: &str) -> Result<(), ShardingError> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(ShardingError::InvalidFormatting {
            key: key.to_string(),
            reason: format!("invalid date format '{}'", format),
        });
    }
    Ok(())
}
