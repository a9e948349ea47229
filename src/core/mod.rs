// Core Domain
// シャーディング、マイグレーション台帳、スナップショット、状態マーカーの純粋なドメインモデル

pub mod accessor;
pub mod config;
pub mod error;
pub mod formatting;
pub mod ledger;
pub mod naming;
pub mod schema;
pub mod sharding;
pub mod snapshot;
pub mod state;
