// シャーディングルールリゾルバー
//
// シャーディング記述子とエンティティ名から物理テーブル記述子を解決します。
// 時間やハッシュによるバケット計算は持たず、ルール実装に委ねます。

use std::sync::Arc;
use tracing::{debug, warn};

use chrono::{DateTime, Utc};

use crate::core::error::ShardingError;
use crate::core::formatting::FormattingDescriptor;
use crate::core::schema::{Schema, Table};
use crate::core::sharding::{PhysicalTableDescriptor, ShardingDescriptor};
use crate::services::formatting_engine::FormattingSubstitutionEngine;
use crate::services::inflector::pluralize;
use crate::services::sharding_rules::ShardingRuleRegistry;

/// エンティティ単数名のキー
pub const ENTITY_KEY: &str = "Entity";

/// エンティティ複数名のキー
pub const ENTITIES_KEY: &str = "Entities";

/// シャーディングルールリゾルバー
#[derive(Debug, Clone)]
pub struct ShardingRuleResolver {
    engine: FormattingSubstitutionEngine,
    registry: Arc<ShardingRuleRegistry>,
}

impl ShardingRuleResolver {
    /// 新しいリゾルバーを作成
    pub fn new(engine: FormattingSubstitutionEngine, registry: Arc<ShardingRuleRegistry>) -> Self {
        Self { engine, registry }
    }

    /// 組み込みルールと現在時刻で作成
    pub fn with_defaults() -> Self {
        Self::new(
            FormattingSubstitutionEngine::new(),
            Arc::new(ShardingRuleRegistry::with_defaults()),
        )
    }

    /// 基準時刻
    pub fn reference_time(&self) -> &DateTime<Utc> {
        self.engine.reference_time()
    }

    /// ルールレジストリ
    pub fn registry(&self) -> &ShardingRuleRegistry {
        &self.registry
    }

    /// 記述子を物理テーブル記述子に解決
    ///
    /// 利用者指定の記述子の後ろに `Entity` と `Entities` の既定値を追加してから置換するため、
    /// 利用者が同名キーを指定した場合はそちらが優先されます。
    ///
    /// # Arguments
    ///
    /// * `descriptor` - シャーディング記述子
    /// * `entity` - エンティティの単純名
    pub fn resolve(&self, descriptor: &ShardingDescriptor, entity: &str) -> PhysicalTableDescriptor {
        let mut formattings = descriptor.formattings().to_vec();
        formattings.extend(default_formattings(entity));

        let name = self.engine.apply(descriptor.formatter(), &formattings);

        let unresolved = FormattingSubstitutionEngine::unresolved_placeholders(&name);
        if !unresolved.is_empty() {
            warn!(
                entity = %entity,
                table = %name,
                placeholders = ?unresolved,
                "Table name still contains unresolved placeholders"
            );
        }

        debug!(entity = %entity, table = %name, "Resolved physical table");

        PhysicalTableDescriptor::new(name, descriptor.schema().map(str::to_string))
    }

    /// テーブルにスキーマを明示的に設定
    pub fn apply_schema(
        &self,
        table: &PhysicalTableDescriptor,
        schema: &str,
    ) -> Result<PhysicalTableDescriptor, ShardingError> {
        table.apply_schema(schema)
    }

    /// 記述子のルールで解決
    pub fn resolve_with_rule(
        &self,
        descriptor: &ShardingDescriptor,
        entity: &str,
    ) -> Result<PhysicalTableDescriptor, ShardingError> {
        let rule = self.registry.rule(descriptor.rule_type())?;
        rule.resolve(self, descriptor, entity)
    }

    /// テーブル定義を物理テーブル記述子に解決
    pub fn resolve_table(&self, table: &Table) -> Result<PhysicalTableDescriptor, ShardingError> {
        let descriptor = self.registry.descriptor_for_table(table)?;
        self.resolve_with_rule(&descriptor, &table.name)
    }

    /// スキーマ内の全テーブルを解決（エンティティ名順）
    pub fn resolve_schema(
        &self,
        schema: &Schema,
    ) -> Result<Vec<(String, PhysicalTableDescriptor)>, ShardingError> {
        schema
            .tables
            .values()
            .map(|table| Ok((table.name.clone(), self.resolve_table(table)?)))
            .collect()
    }
}

fn default_formattings(entity: &str) -> Vec<FormattingDescriptor> {
    // 空のエンティティ名は値なしとなるため既定値を追加しない
    if entity.is_empty() {
        return Vec::new();
    }
    [
        FormattingDescriptor::with_value(ENTITY_KEY, entity),
        FormattingDescriptor::with_value(ENTITIES_KEY, pluralize(entity)),
    ]
    .into_iter()
    .filter_map(Result::ok)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sharding::ShardingSpec;
    use chrono::TimeZone;

    fn resolver() -> ShardingRuleResolver {
        ShardingRuleResolver::new(
            FormattingSubstitutionEngine::at(Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap()),
            Arc::new(ShardingRuleRegistry::with_defaults()),
        )
    }

    fn descriptor(formatter: &str) -> ShardingDescriptor {
        let registry = ShardingRuleRegistry::with_defaults();
        ShardingDescriptor::new(formatter, registry.rule_type("default").unwrap())
    }

    #[test]
    fn test_resolve_with_user_formatting() {
        let descriptor = descriptor("{Entities}_{Year}")
            .with_formatting(FormattingDescriptor::with_value("Year", "2024").unwrap());

        let table = resolver().resolve(&descriptor, "Article");

        assert_eq!(table.name(), "Articles_2024");
        assert_eq!(table.schema(), None);
    }

    #[test]
    fn test_user_override_of_entity_wins() {
        let descriptor = descriptor("{Entity}")
            .with_formatting(FormattingDescriptor::with_value("Entity", "Post").unwrap());

        assert_eq!(resolver().resolve(&descriptor, "Article").name(), "Post");
    }

    #[test]
    fn test_schema_carried_over() {
        let descriptor = descriptor("{Entities}").with_schema("blog");
        let table = resolver().resolve(&descriptor, "Category");

        assert_eq!(table.name(), "Categories");
        assert_eq!(table.schema(), Some("blog"));
    }

    #[test]
    fn test_apply_schema() {
        let table = resolver().resolve(&descriptor("{Entity}"), "Article");

        assert_eq!(resolver().apply_schema(&table, "dbo").unwrap().schema(), Some("dbo"));
        assert!(resolver().apply_schema(&table, "").is_err());
    }

    #[test]
    fn test_resolve_table_with_year_rule() {
        let table = Table::new("Article".to_string()).with_sharding(ShardingSpec {
            formatter: "{Entities}_{Year}".to_string(),
            rule: "year".to_string(),
            ..ShardingSpec::default()
        });

        assert_eq!(resolver().resolve_table(&table).unwrap().name(), "Articles_2024");
    }

    #[test]
    fn test_user_year_overrides_rule_label() {
        let table = Table::new("Article".to_string()).with_sharding(ShardingSpec {
            formatter: "{Entities}_{Year}".to_string(),
            formattings: vec![FormattingDescriptor::with_value("Year", "archive").unwrap()],
            rule: "year".to_string(),
            ..ShardingSpec::default()
        });

        assert_eq!(resolver().resolve_table(&table).unwrap().name(), "Articles_archive");
    }

    #[test]
    fn test_rule_reads_timestamp_from_data() {
        let table = Table::new("Event".to_string()).with_sharding(ShardingSpec {
            formatter: "{Entities}_{Month}".to_string(),
            rule: "month".to_string(),
            data: Some(serde_json::json!({ "timestamp": "2019-11-30T23:00:00Z" })),
            ..ShardingSpec::default()
        });

        assert_eq!(resolver().resolve_table(&table).unwrap().name(), "Events_201911");
    }

    #[test]
    fn test_rule_rejects_bad_timestamp() {
        let table = Table::new("Event".to_string()).with_sharding(ShardingSpec {
            rule: "day".to_string(),
            data: Some(serde_json::json!({ "timestamp": "yesterday" })),
            ..ShardingSpec::default()
        });

        assert!(resolver()
            .resolve_table(&table)
            .unwrap_err()
            .is_invalid_argument());
    }

    #[test]
    fn test_resolve_schema_in_entity_order() {
        let mut schema = Schema::new("1.0".to_string());
        schema.add_table(Table::new("Tag".to_string()));
        schema.add_table(Table::new("Article".to_string()));

        let resolved = resolver().resolve_schema(&schema).unwrap();
        let names: Vec<_> = resolved.iter().map(|(_, t)| t.name().to_string()).collect();

        assert_eq!(names, vec!["Articles", "Tags"]);
    }
}
