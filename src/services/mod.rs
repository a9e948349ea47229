// Services Layer
// ドメインロジックを実行するサービス層

pub mod command_source;
pub mod config_loader;
pub mod formatting_engine;
pub mod inflector;
pub mod migration_ledger;
pub mod migration_pipeline;
pub mod schema_parser;
pub mod schema_snapshot;
pub mod sharding_resolver;
pub mod sharding_rules;
pub mod snapshot_codegen;
pub mod state_validator;
