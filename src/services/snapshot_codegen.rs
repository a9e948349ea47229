// スナップショットコード生成
//
// 論理スキーマモデルから、物理テーブル名を解決済みのスキーマ記述ソース（Rust）を生成します。
// 生成結果は決定的で、同じモデルからは常に同じテキストが得られます。

use std::fmt::Write as _;

use crate::core::accessor::AccessorIdentity;
use crate::core::error::CompileError;
use crate::core::schema::{Constraint, Schema};
use crate::core::sharding::PhysicalTableDescriptor;
use crate::services::sharding_resolver::ShardingRuleResolver;

/// スナップショットのソース生成を担うトレイト
pub trait SnapshotCodeGenerator: std::fmt::Debug + Send + Sync {
    /// 生成ソースのファイル拡張子
    fn source_extension(&self) -> &str;

    /// ソーステキストを生成
    fn generate(&self, accessor: &AccessorIdentity, model: &Schema) -> Result<String, CompileError>;
}

/// Rustソースを生成するコードジェネレーター
#[derive(Debug, Clone)]
pub struct RustSnapshotCodeGenerator {
    resolver: ShardingRuleResolver,
}

const PRELUDE: &str = r#"#![allow(dead_code)]

pub struct ColumnSnapshot {
    pub name: &'static str,
    pub column_type: &'static str,
    pub nullable: bool,
    pub default_value: Option<&'static str>,
    pub max_length: Option<u32>,
}

pub struct IndexSnapshot {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub unique: bool,
}

pub struct ConstraintSnapshot {
    pub kind: &'static str,
    pub columns: &'static [&'static str],
    pub referenced_table: Option<&'static str>,
    pub referenced_columns: &'static [&'static str],
}

pub struct TableSnapshot {
    pub entity: &'static str,
    pub table: &'static str,
    pub schema: Option<&'static str>,
    pub columns: &'static [ColumnSnapshot],
    pub indexes: &'static [IndexSnapshot],
    pub constraints: &'static [ConstraintSnapshot],
}
"#;

impl RustSnapshotCodeGenerator {
    pub fn new(resolver: ShardingRuleResolver) -> Self {
        Self { resolver }
    }
}

impl SnapshotCodeGenerator for RustSnapshotCodeGenerator {
    fn source_extension(&self) -> &str {
        ".rs"
    }

    fn generate(&self, accessor: &AccessorIdentity, model: &Schema) -> Result<String, CompileError> {
        let generation_error = |cause: String| CompileError::Generation {
            accessor: accessor.qualified_name().to_string(),
            cause,
        };

        let resolved = self
            .resolver
            .resolve_schema(model)
            .map_err(|e| generation_error(e.to_string()))?;

        let mut out = String::new();
        render(&mut out, accessor, model, &resolved)
            .map_err(|e| generation_error(e.to_string()))?;
        Ok(out)
    }
}

fn render(
    out: &mut String,
    accessor: &AccessorIdentity,
    model: &Schema,
    resolved: &[(String, PhysicalTableDescriptor)],
) -> Result<(), std::fmt::Error> {
    writeln!(out, "// <auto-generated />")?;
    writeln!(out, "// Model snapshot for {}", accessor.qualified_name())?;
    writeln!(out, "{}", PRELUDE)?;
    writeln!(out, "pub const ACCESSOR: &str = {:?};", accessor.qualified_name())?;
    writeln!(out, "pub const MODEL_VERSION: &str = {:?};", model.version)?;
    writeln!(out)?;
    writeln!(out, "pub static TABLES: &[TableSnapshot] = &[")?;

    for (entity, physical) in resolved {
        let Some(table) = model.get_table(entity) else {
            continue;
        };
        writeln!(out, "    TableSnapshot {{")?;
        writeln!(out, "        entity: {:?},", table.name)?;
        writeln!(out, "        table: {:?},", physical.name())?;
        writeln!(out, "        schema: {},", option_literal(physical.schema()))?;

        writeln!(out, "        columns: &[")?;
        for column in &table.columns {
            writeln!(
                out,
                "            ColumnSnapshot {{ name: {:?}, column_type: {:?}, nullable: {}, default_value: {}, max_length: {} }},",
                column.name,
                column.column_type.type_name(),
                column.nullable,
                option_literal(column.default_value.as_deref()),
                match column.max_length {
                    Some(length) => format!("Some({})", length),
                    None => "None".to_string(),
                }
            )?;
        }
        writeln!(out, "        ],")?;

        writeln!(out, "        indexes: &[")?;
        for index in &table.indexes {
            writeln!(
                out,
                "            IndexSnapshot {{ name: {:?}, columns: {}, unique: {} }},",
                index.name,
                slice_literal(&index.columns),
                index.unique
            )?;
        }
        writeln!(out, "        ],")?;

        writeln!(out, "        constraints: &[")?;
        for constraint in &table.constraints {
            let (referenced_table, referenced_columns) = match constraint {
                Constraint::FOREIGN_KEY {
                    referenced_table,
                    referenced_columns,
                    ..
                } => {
                    // 参照先もシャーディング解決後の物理名で記録する
                    let physical = resolved
                        .iter()
                        .find(|(name, _)| name == referenced_table)
                        .map(|(_, t)| t.name().to_string())
                        .unwrap_or_else(|| referenced_table.clone());
                    (Some(physical), referenced_columns.as_slice())
                }
                _ => (None, &[][..]),
            };
            writeln!(
                out,
                "            ConstraintSnapshot {{ kind: {:?}, columns: {}, referenced_table: {}, referenced_columns: {} }},",
                constraint.kind(),
                slice_literal(constraint.columns()),
                option_literal(referenced_table.as_deref()),
                slice_literal(referenced_columns)
            )?;
        }
        writeln!(out, "        ],")?;
        writeln!(out, "    }},")?;
    }

    writeln!(out, "];")?;
    Ok(())
}

fn option_literal(value: Option<&str>) -> String {
    match value {
        Some(v) => format!("Some({:?})", v),
        None => "None".to_string(),
    }
}

fn slice_literal(values: &[String]) -> String {
    let items: Vec<String> = values.iter().map(|v| format!("{:?}", v)).collect();
    format!("&[{}]", items.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{Column, ColumnType, Index, Table};
    use crate::core::sharding::ShardingSpec;
    use crate::services::formatting_engine::FormattingSubstitutionEngine;
    use crate::services::sharding_rules::ShardingRuleRegistry;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn generator() -> RustSnapshotCodeGenerator {
        RustSnapshotCodeGenerator::new(ShardingRuleResolver::new(
            FormattingSubstitutionEngine::at(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
            Arc::new(ShardingRuleRegistry::with_defaults()),
        ))
    }

    fn model() -> Schema {
        let mut schema = Schema::new("1.0".to_string());

        let mut article = Table::new("Article".to_string()).with_sharding(ShardingSpec {
            formatter: "{Entities}_{Year}".to_string(),
            rule: "year".to_string(),
            schema: Some("blog".to_string()),
            ..ShardingSpec::default()
        });
        article.add_column(Column::new("id".to_string(), ColumnType::BigInt, false));
        article.add_column(Column::new("title".to_string(), ColumnType::String, false));
        article.add_index(Index::new(
            "ix_title".to_string(),
            vec!["title".to_string()],
            false,
        ));
        article.add_constraint(Constraint::PRIMARY_KEY {
            columns: vec!["id".to_string()],
        });
        schema.add_table(article);

        let mut comment = Table::new("Comment".to_string());
        comment.add_column(Column::new("article_id".to_string(), ColumnType::BigInt, false));
        comment.add_constraint(Constraint::FOREIGN_KEY {
            columns: vec!["article_id".to_string()],
            referenced_table: "Article".to_string(),
            referenced_columns: vec!["id".to_string()],
        });
        schema.add_table(comment);

        schema
    }

    #[test]
    fn test_generate_contains_resolved_names() {
        let accessor = AccessorIdentity::from_qualified_name("Blog.Data.BlogAccessor");
        let source = generator().generate(&accessor, &model()).unwrap();

        assert!(source.contains(r#"pub const ACCESSOR: &str = "Blog.Data.BlogAccessor";"#));
        assert!(source.contains(r#"table: "Articles_2024","#));
        assert!(source.contains(r#"schema: Some("blog"),"#));
        assert!(source.contains(r#"table: "Comments","#));
        // 外部キーの参照先は物理名
        assert!(source.contains(r#"referenced_table: Some("Articles_2024")"#));
    }

    #[test]
    fn test_generate_is_deterministic() {
        let accessor = AccessorIdentity::from_qualified_name("Blog.Data.BlogAccessor");
        let first = generator().generate(&accessor, &model()).unwrap();
        let second = generator().generate(&accessor, &model()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_generate_escapes_strings() {
        let accessor = AccessorIdentity::from_qualified_name("Blog.Data.BlogAccessor");
        let mut schema = Schema::new("1.0".to_string());
        let mut table = Table::new("Note".to_string());
        let mut column = Column::new("body".to_string(), ColumnType::Text, true);
        column.default_value = Some("say \"hi\"".to_string());
        table.add_column(column);
        schema.add_table(table);

        let source = generator().generate(&accessor, &schema).unwrap();
        assert!(source.contains(r#"default_value: Some("say \"hi\"")"#));
    }

    #[test]
    fn test_unknown_rule_is_generation_error() {
        let accessor = AccessorIdentity::from_qualified_name("Blog.Data.BlogAccessor");
        let mut schema = Schema::new("1.0".to_string());
        schema.add_table(Table::new("Article".to_string()).with_sharding(ShardingSpec {
            rule: "hourly".to_string(),
            ..ShardingSpec::default()
        }));

        let error = generator().generate(&accessor, &schema).unwrap_err();
        assert!(matches!(error, CompileError::Generation { .. }));
    }
}
