// シャーディングルール
//
// 「シャーディング設定とエンティティ名から物理テーブル記述子を作る」能力を
// トレイトとして定義し、組み込みルールとルールレジストリを提供します。

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::core::error::ShardingError;
use crate::core::formatting::FormattingDescriptor;
use crate::core::schema::Table;
use crate::core::sharding::{
    PhysicalTableDescriptor, RuleType, ShardingDescriptor, ShardingSpec, DEFAULT_RULE,
};
use crate::services::sharding_resolver::ShardingRuleResolver;

/// シャーディングルールのトレイト
///
/// 実装は必要に応じて動的なフォーマット記述子を追加し、
/// `ShardingRuleResolver::resolve` に委譲します。
pub trait ShardingRule: fmt::Debug + Send + Sync {
    /// ルール名（設定ファイルの `rule:` に対応）
    fn name(&self) -> &str;

    /// 物理テーブル記述子を解決
    fn resolve(
        &self,
        resolver: &ShardingRuleResolver,
        descriptor: &ShardingDescriptor,
        entity: &str,
    ) -> Result<PhysicalTableDescriptor, ShardingError>;
}

/// 既定ルール
///
/// 動的な記述子を追加せず、そのまま解決します。
#[derive(Debug, Clone, Default)]
pub struct DefaultShardingRule;

impl ShardingRule for DefaultShardingRule {
    fn name(&self) -> &str {
        DEFAULT_RULE
    }

    fn resolve(
        &self,
        resolver: &ShardingRuleResolver,
        descriptor: &ShardingDescriptor,
        entity: &str,
    ) -> Result<PhysicalTableDescriptor, ShardingError> {
        Ok(resolver.resolve(descriptor, entity))
    }
}

/// 日時バケットの粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeGranularity {
    Year,
    Month,
    Week,
    Day,
}

impl DateTimeGranularity {
    /// ルール名
    pub fn rule_name(&self) -> &'static str {
        match self {
            DateTimeGranularity::Year => "year",
            DateTimeGranularity::Month => "month",
            DateTimeGranularity::Week => "week",
            DateTimeGranularity::Day => "day",
        }
    }

    /// 注入するプレースホルダーキー
    pub fn key(&self) -> &'static str {
        match self {
            DateTimeGranularity::Year => "Year",
            DateTimeGranularity::Month => "Month",
            DateTimeGranularity::Week => "Week",
            DateTimeGranularity::Day => "Day",
        }
    }

    /// バケットラベルを計算
    ///
    /// 週は ISO 8601 の週番号（例: `2024W10`）。
    pub fn label(&self, at: &DateTime<Utc>) -> String {
        match self {
            DateTimeGranularity::Year => at.format("%Y").to_string(),
            DateTimeGranularity::Month => at.format("%Y%m").to_string(),
            DateTimeGranularity::Week => at.format("%GW%V").to_string(),
            DateTimeGranularity::Day => at.format("%Y%m%d").to_string(),
        }
    }
}

/// 日時バケットルール
///
/// 基準時刻（または `data.timestamp` で指定された RFC3339 時刻）から
/// バケットラベルを計算し、粒度に対応するキーで注入します。
#[derive(Debug, Clone)]
pub struct DateTimeShardingRule {
    granularity: DateTimeGranularity,
}

impl DateTimeShardingRule {
    pub fn new(granularity: DateTimeGranularity) -> Self {
        Self { granularity }
    }

    pub fn granularity(&self) -> DateTimeGranularity {
        self.granularity
    }

    fn bucket_time(
        &self,
        resolver: &ShardingRuleResolver,
        descriptor: &ShardingDescriptor,
    ) -> Result<DateTime<Utc>, ShardingError> {
        let timestamp = descriptor
            .data()
            .and_then(|data| data.get("timestamp"))
            .and_then(|value| value.as_str());

        match timestamp {
            Some(raw) => DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| ShardingError::InvalidArgument {
                    argument: "data.timestamp".to_string(),
                    reason: e.to_string(),
                }),
            None => Ok(*resolver.reference_time()),
        }
    }
}

impl ShardingRule for DateTimeShardingRule {
    fn name(&self) -> &str {
        self.granularity.rule_name()
    }

    fn resolve(
        &self,
        resolver: &ShardingRuleResolver,
        descriptor: &ShardingDescriptor,
        entity: &str,
    ) -> Result<PhysicalTableDescriptor, ShardingError> {
        let at = self.bucket_time(resolver, descriptor)?;
        let label = FormattingDescriptor::with_value(self.granularity.key(), self.granularity.label(&at))?;

        // 利用者指定の同名キーが優先されるよう末尾に追加
        let mut descriptor = descriptor.clone();
        descriptor.push_formatting(label);

        Ok(resolver.resolve(&descriptor, entity))
    }
}

/// シャーディングルールレジストリ
///
/// ルール名からルール実装への対応を保持します。
/// ルール種別の割り当ては登録済みの名前に対してのみ成功します。
#[derive(Debug, Clone)]
pub struct ShardingRuleRegistry {
    rules: BTreeMap<String, Arc<dyn ShardingRule>>,
}

impl ShardingRuleRegistry {
    /// 空のレジストリを作成
    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    /// 組み込みルール（default, year, month, week, day）を登録したレジストリを作成
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(DefaultShardingRule));
        for granularity in [
            DateTimeGranularity::Year,
            DateTimeGranularity::Month,
            DateTimeGranularity::Week,
            DateTimeGranularity::Day,
        ] {
            registry.register(Arc::new(DateTimeShardingRule::new(granularity)));
        }
        registry
    }

    /// ルールを登録し、そのルール種別を返す
    ///
    /// 同名のルールは置き換えられます。
    pub fn register(&mut self, rule: Arc<dyn ShardingRule>) -> RuleType {
        let name = rule.name().to_string();
        self.rules.insert(name.clone(), rule);
        RuleType::registered(name)
    }

    /// 登録済みのルール名
    pub fn names(&self) -> Vec<&str> {
        self.rules.keys().map(String::as_str).collect()
    }

    /// ルール名をルール種別に変換（割り当て時の能力チェック）
    pub fn rule_type(&self, name: &str) -> Result<RuleType, ShardingError> {
        if self.rules.contains_key(name) {
            Ok(RuleType::registered(name))
        } else {
            Err(ShardingError::UnknownRule {
                name: name.to_string(),
                available: self.names().join(", "),
            })
        }
    }

    /// ルール種別に対応するルール実装を取得
    pub fn rule(&self, rule_type: &RuleType) -> Result<Arc<dyn ShardingRule>, ShardingError> {
        self.rules
            .get(rule_type.name())
            .cloned()
            .ok_or_else(|| ShardingError::UnknownRule {
                name: rule_type.name().to_string(),
                available: self.names().join(", "),
            })
    }

    /// 宣言的な設定をシャーディング記述子に変換
    pub fn descriptor_from_spec(
        &self,
        spec: &ShardingSpec,
    ) -> Result<ShardingDescriptor, ShardingError> {
        let rule_type = self.rule_type(&spec.rule)?;

        let mut descriptor = ShardingDescriptor::new(spec.formatter.clone(), rule_type);
        for formatting in &spec.formattings {
            descriptor.push_formatting(formatting.clone());
        }
        if let Some(schema) = &spec.schema {
            descriptor = descriptor.with_schema(schema.clone());
        }
        if let Some(data) = &spec.data {
            descriptor = descriptor.with_data(data.clone());
        }

        Ok(descriptor)
    }

    /// テーブル定義に宣言されたシャーディング記述子
    ///
    /// `sharding:` ブロックがなければ `None`。
    pub fn sharding_for(&self, table: &Table) -> Result<Option<ShardingDescriptor>, ShardingError> {
        table
            .sharding
            .as_ref()
            .map(|spec| self.descriptor_from_spec(spec))
            .transpose()
    }

    /// テーブル定義のシャーディング記述子
    ///
    /// `sharding:` ブロックがないテーブルは既定の設定（`{Entities}`, default）になります。
    pub fn descriptor_for_table(&self, table: &Table) -> Result<ShardingDescriptor, ShardingError> {
        match &table.sharding {
            Some(spec) => self.descriptor_from_spec(spec),
            None => self.descriptor_from_spec(&ShardingSpec::default()),
        }
    }
}

impl Default for ShardingRuleRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
