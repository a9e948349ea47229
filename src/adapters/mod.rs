// Adapters
// データベース接続と外部コンパイラへのアクセスを抽象化

pub mod command_executor;
pub mod connection_string;
pub mod database;
pub mod snapshot_compiler;
