// コマンドハンドラー層
// 各CLIコマンドの実装

pub mod apply;
pub mod init;
pub mod resolve;
pub mod snapshot;
pub mod status;
