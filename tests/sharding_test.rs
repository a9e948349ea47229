/// シャーディング解決のテスト
///
/// スキーマファイルから読み込んだテーブル定義が、組み込みルールと
/// フォーマット記述子によって期待通りの物理テーブルに解決されることを確認します。
use chrono::{TimeZone, Utc};
use shardwright::core::formatting::FormattingDescriptor;
use shardwright::core::sharding::{RuleType, ShardingDescriptor};
use shardwright::services::formatting_engine::FormattingSubstitutionEngine;
use shardwright::services::schema_parser::SchemaParserService;
use shardwright::services::sharding_resolver::ShardingRuleResolver;
use shardwright::services::sharding_rules::ShardingRuleRegistry;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

#[cfg(test)]
mod sharding_tests {
    use super::*;

    fn resolver_at(year: i32, month: u32, day: u32) -> ShardingRuleResolver {
        let at = Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap();
        ShardingRuleResolver::new(
            FormattingSubstitutionEngine::at(at),
            Arc::new(ShardingRuleRegistry::with_defaults()),
        )
    }

    fn default_rule() -> RuleType {
        ShardingRuleRegistry::with_defaults()
            .rule_type("default")
            .unwrap()
    }

    /// 書式付き記述子とエンティティ複数形で年別テーブル名になることを確認
    #[test]
    fn test_year_format_descriptor() {
        let resolver = resolver_at(2024, 3, 9);
        let descriptor = ShardingDescriptor::new("{Entities}_{Year}", default_rule())
            .with_formatting(FormattingDescriptor::with_format("Year", "%Y").unwrap());

        let table = resolver.resolve(&descriptor, "Article");

        assert_eq!(table.name(), "Articles_2024");
        assert_eq!(table.schema(), None);
    }

    /// 同じキーの記述子が複数ある場合は最初の記述子が勝つことを確認
    #[test]
    fn test_first_descriptor_wins() {
        let resolver = resolver_at(2024, 3, 9);
        let descriptor = ShardingDescriptor::new("{Entity}_{Region}", default_rule())
            .with_formatting(FormattingDescriptor::with_value("Region", "eu").unwrap())
            .with_formatting(FormattingDescriptor::with_value("Region", "us").unwrap())
            .with_formatting(FormattingDescriptor::with_value("Entity", "Post").unwrap());

        let table = resolver.resolve(&descriptor, "Article");

        // 利用者指定の Entity が既定値より優先される
        assert_eq!(table.name(), "Post_eu");
    }

    /// 空のスキーマは即座に拒否され、有効なスキーマは修飾名に反映されることを確認
    #[test]
    fn test_apply_schema() {
        let resolver = resolver_at(2024, 3, 9);
        let table = resolver.resolve(
            &ShardingDescriptor::new("{Entities}", default_rule()),
            "Category",
        );

        let error = resolver.apply_schema(&table, "  ").unwrap_err();
        assert!(error.is_invalid_argument());

        let qualified = resolver.apply_schema(&table, "archive").unwrap();
        assert_eq!(qualified.qualified_name(), "archive.Categories");
    }

    /// YAMLスキーマの sharding ブロックから週・日ルールで解決されることを確認
    #[test]
    fn test_resolve_schema_from_yaml() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("model.yaml"),
            r#"
version: "1.0"
tables:
  Article:
    columns:
      - name: id
        type: bigint
  Event:
    columns:
      - name: id
        type: bigint
    sharding:
      formatter: "{Entities}_{Week}"
      rule: week
      schema: audit
  Metric:
    columns:
      - name: id
        type: bigint
    sharding:
      formatter: "{Entity}_{Day}"
      rule: day
      data:
        timestamp: "2023-12-31T23:00:00Z"
"#,
        )
        .unwrap();
        let schema = SchemaParserService::new()
            .parse_schema_directory(dir.path())
            .unwrap();

        let resolved = resolver_at(2021, 1, 1).resolve_schema(&schema).unwrap();
        let names: Vec<String> = resolved.iter().map(|(_, t)| t.qualified_name()).collect();

        assert_eq!(
            names,
            vec!["Articles", "audit.Events_2020W53", "Metric_20231231"]
        );
    }

    /// 未登録のルール名は記述子の作成時に失敗することを確認
    #[test]
    fn test_unknown_rule_in_yaml_fails_on_resolve() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("model.yaml"),
            r#"
version: "1.0"
tables:
  Event:
    columns: []
    sharding:
      rule: hourly
"#,
        )
        .unwrap();
        let schema = SchemaParserService::new()
            .parse_schema_directory(dir.path())
            .unwrap();

        let error = resolver_at(2024, 1, 1).resolve_schema(&schema).unwrap_err();
        assert!(error.is_unknown_rule());
    }
}
