// シャーディングドメインモデル
//
// 論理エンティティを物理テーブルへ対応付けるための設定と、
// 解決結果の物理テーブル記述子を表現します。

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::error::ShardingError;
use crate::core::formatting::FormattingDescriptor;

/// 既定のテーブル名テンプレート
pub const DEFAULT_FORMATTER: &str = "{Entities}";

/// 既定のシャーディングルール名
pub const DEFAULT_RULE: &str = "default";

/// シャーディングルール種別
///
/// 登録済みのルールからのみ生成できるため、保持している時点で
/// シャーディングルールの能力を満たしていることが保証されます。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RuleType(String);

impl RuleType {
    /// ルール名から作成（レジストリ経由でのみ使用）
    pub(crate) fn registered(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// ルール名を取得
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// シャーディング設定（宣言的な設定面）
///
/// YAMLのテーブル定義や設定ファイルから読み込まれる未検証の形です。
/// ルール種別の検証はレジストリで `ShardingDescriptor` に変換する時点で行われます。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardingSpec {
    /// テーブル名テンプレート
    #[serde(default = "default_formatter")]
    pub formatter: String,

    /// フォーマット記述子のリスト
    #[serde(default)]
    pub formattings: Vec<FormattingDescriptor>,

    /// ルール名
    #[serde(default = "default_rule")]
    pub rule: String,

    /// スキーマ名
    #[serde(default)]
    pub schema: Option<String>,

    /// ルール固有の任意データ
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

fn default_formatter() -> String {
    DEFAULT_FORMATTER.to_string()
}

fn default_rule() -> String {
    DEFAULT_RULE.to_string()
}

impl Default for ShardingSpec {
    fn default() -> Self {
        Self {
            formatter: default_formatter(),
            formattings: Vec::new(),
            rule: default_rule(),
            schema: None,
            data: None,
        }
    }
}

/// シャーディング記述子
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShardingDescriptor {
    formatter: String,
    formattings: Vec<FormattingDescriptor>,
    rule_type: RuleType,
    schema: Option<String>,
    data: Option<serde_json::Value>,
}

impl ShardingDescriptor {
    /// 新しいシャーディング記述子を作成
    pub fn new(formatter: impl Into<String>, rule_type: RuleType) -> Self {
        Self {
            formatter: formatter.into(),
            formattings: Vec::new(),
            rule_type,
            schema: None,
            data: None,
        }
    }

    /// フォーマット記述子を末尾に追加
    pub fn with_formatting(mut self, formatting: FormattingDescriptor) -> Self {
        self.formattings.push(formatting);
        self
    }

    /// スキーマ名を設定
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        let schema = schema.into();
        self.schema = if schema.trim().is_empty() {
            None
        } else {
            Some(schema)
        };
        self
    }

    /// 任意データを設定
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// ルール種別を差し替える
    pub fn set_rule_type(&mut self, rule_type: RuleType) {
        self.rule_type = rule_type;
    }

    /// フォーマット記述子を末尾に追加
    pub fn push_formatting(&mut self, formatting: FormattingDescriptor) {
        self.formattings.push(formatting);
    }

    /// テーブル名テンプレート
    pub fn formatter(&self) -> &str {
        &self.formatter
    }

    /// フォーマット記述子のリスト
    pub fn formattings(&self) -> &[FormattingDescriptor] {
        &self.formattings
    }

    /// ルール種別
    pub fn rule_type(&self) -> &RuleType {
        &self.rule_type
    }

    /// スキーマ名
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// 任意データ
    pub fn data(&self) -> Option<&serde_json::Value> {
        self.data.as_ref()
    }
}

/// 物理テーブル記述子
///
/// 解決後は不変です。スキーマの変更は新しい値を返します。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhysicalTableDescriptor {
    name: String,
    schema: Option<String>,
}

impl PhysicalTableDescriptor {
    /// 新しい物理テーブル記述子を作成
    pub fn new(name: impl Into<String>, schema: Option<String>) -> Self {
        Self {
            name: name.into(),
            schema: schema.filter(|s| !s.trim().is_empty()),
        }
    }

    /// テーブル名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// スキーマ名
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// スキーマを明示的に設定した新しい記述子を返す
    ///
    /// # Errors
    ///
    /// `schema` が空または空白のみの場合は引数エラー
    pub fn apply_schema(&self, schema: &str) -> Result<Self, ShardingError> {
        if schema.trim().is_empty() {
            return Err(ShardingError::InvalidArgument {
                argument: "schema".to_string(),
                reason: "schema must not be empty".to_string(),
            });
        }
        Ok(Self {
            name: self.name.clone(),
            schema: Some(schema.to_string()),
        })
    }

    /// `schema.name` 形式の修飾名
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for PhysicalTableDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified_name())
    }
}
