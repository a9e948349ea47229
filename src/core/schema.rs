// スキーマドメインモデル
//
// 論理スキーマモデルを表現する型システム。
// Schema, Table, Column, Index, Constraint とテーブル単位のシャーディング設定を提供します。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::sharding::ShardingSpec;

/// スキーマ定義
///
/// データストア全体の論理スキーマを表現します。
/// テーブルは名前順に保持され、生成されるスナップショットのソースが安定します。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// スキーマのバージョン
    pub version: String,

    /// テーブル定義のマップ（エンティティ名 -> Table）
    #[serde(default)]
    pub tables: BTreeMap<String, Table>,
}

impl Schema {
    /// 新しいスキーマを作成
    pub fn new(version: String) -> Self {
        Self {
            version,
            tables: BTreeMap::new(),
        }
    }

    /// テーブルを追加
    pub fn add_table(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    /// 指定されたテーブルが存在するか確認
    pub fn has_table(&self, table_name: &str) -> bool {
        self.tables.contains_key(table_name)
    }

    /// 指定されたテーブルを取得
    pub fn get_table(&self, table_name: &str) -> Option<&Table> {
        self.tables.get(table_name)
    }

    /// マップのキーからテーブル名を補完し、テーブル名で再キー付けする
    pub fn normalize_names(&mut self) {
        let tables = std::mem::take(&mut self.tables);
        for (key, mut table) in tables {
            if table.name.is_empty() {
                table.name = key;
            }
            self.tables.insert(table.name.clone(), table);
        }
    }

    /// テーブル数を取得
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}

/// テーブル定義
///
/// 単一エンティティの構造を表現します。`name` はエンティティの単純名で、
/// 物理テーブル名はシャーディング設定から解決されます。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// エンティティ名（省略時はマップのキー）
    #[serde(default)]
    pub name: String,

    /// カラム定義のリスト
    #[serde(default)]
    pub columns: Vec<Column>,

    /// インデックス定義のリスト
    #[serde(default)]
    pub indexes: Vec<Index>,

    /// 制約定義のリスト
    #[serde(default)]
    pub constraints: Vec<Constraint>,

    /// シャーディング設定
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sharding: Option<ShardingSpec>,
}

impl Table {
    /// 新しいテーブルを作成
    pub fn new(name: String) -> Self {
        Self {
            name,
            columns: Vec::new(),
            indexes: Vec::new(),
            constraints: Vec::new(),
            sharding: None,
        }
    }

    /// カラムを追加
    pub fn add_column(&mut self, column: Column) {
        self.columns.push(column);
    }

    /// インデックスを追加
    pub fn add_index(&mut self, index: Index) {
        self.indexes.push(index);
    }

    /// 制約を追加
    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// シャーディング設定を付与
    pub fn with_sharding(mut self, sharding: ShardingSpec) -> Self {
        self.sharding = Some(sharding);
        self
    }

    /// プライマリキーのカラム名を取得
    pub fn get_primary_key_columns(&self) -> Option<Vec<String>> {
        for constraint in &self.constraints {
            if let Constraint::PRIMARY_KEY { columns } = constraint {
                return Some(columns.clone());
            }
        }
        None
    }

    /// 指定されたカラムを取得
    pub fn get_column(&self, column_name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == column_name)
    }
}

/// カラム定義
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// カラム名
    pub name: String,

    /// カラム型
    #[serde(rename = "type")]
    pub column_type: ColumnType,

    /// NULL許可フラグ
    #[serde(default)]
    pub nullable: bool,

    /// デフォルト値
    #[serde(default)]
    pub default_value: Option<String>,

    /// 最大長（文字列型）
    #[serde(default)]
    pub max_length: Option<u32>,
}

impl Column {
    /// 新しいカラムを作成
    pub fn new(name: String, column_type: ColumnType, nullable: bool) -> Self {
        Self {
            name,
            column_type,
            nullable,
            default_value: None,
            max_length: None,
        }
    }
}

/// カラム型
///
/// 方言に依存しない論理型です。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    BigInt,
    Decimal,
    Boolean,
    String,
    Text,
    Date,
    Timestamp,
    Uuid,
    Json,
    Binary,
}

impl ColumnType {
    /// 安定した型名
    ///
    /// Debug フォーマットに依存せず、生成ソースの安定性を保証する。
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::BigInt => "bigint",
            ColumnType::Decimal => "decimal",
            ColumnType::Boolean => "boolean",
            ColumnType::String => "string",
            ColumnType::Text => "text",
            ColumnType::Date => "date",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Uuid => "uuid",
            ColumnType::Json => "json",
            ColumnType::Binary => "binary",
        }
    }
}

/// インデックス定義
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    /// インデックス名
    pub name: String,

    /// インデックス対象のカラム名リスト
    pub columns: Vec<String>,

    /// ユニークインデックスかどうか
    #[serde(default)]
    pub unique: bool,
}

impl Index {
    /// 新しいインデックスを作成
    pub fn new(name: String, columns: Vec<String>, unique: bool) -> Self {
        Self {
            name,
            columns,
            unique,
        }
    }
}

/// 制約定義
///
/// テーブルの制約（PRIMARY KEY, FOREIGN KEY, UNIQUE）を表現します。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
#[allow(non_camel_case_types)]
pub enum Constraint {
    /// プライマリキー制約
    PRIMARY_KEY {
        /// 対象カラム
        columns: Vec<String>,
    },

    /// 外部キー制約
    FOREIGN_KEY {
        /// 対象カラム
        columns: Vec<String>,

        /// 参照先エンティティ
        referenced_table: String,

        /// 参照先カラム
        referenced_columns: Vec<String>,
    },

    /// ユニーク制約
    UNIQUE {
        /// 対象カラム
        columns: Vec<String>,
    },
}

impl Constraint {
    /// 制約の種類を文字列で取得
    pub fn kind(&self) -> &'static str {
        match self {
            Constraint::PRIMARY_KEY { .. } => "PRIMARY_KEY",
            Constraint::FOREIGN_KEY { .. } => "FOREIGN_KEY",
            Constraint::UNIQUE { .. } => "UNIQUE",
        }
    }

    /// 対象カラム
    pub fn columns(&self) -> &[String] {
        match self {
            Constraint::PRIMARY_KEY { columns }
            | Constraint::FOREIGN_KEY { columns, .. }
            | Constraint::UNIQUE { columns } => columns,
        }
    }
}
