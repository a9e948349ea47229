// Shardwrightライブラリのエントリーポイント
//
// モジュール構造:
// - cli: CLIレイヤー（ユーザー入力の受付とコマンドルーティング）
// - core: コアドメインモデル（シャーディング記述子、台帳、スナップショット、状態マーカー）
// - adapters: データベースと外部コンパイラへのアクセスを抽象化
// - services: 解決・台帳・スナップショット・状態検証のサービス層

pub mod cli;
pub mod core;
pub mod adapters;
pub mod services;
