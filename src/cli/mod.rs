// CLI Layer
// ユーザー入力の受付とコマンドルーティング

pub mod command_context;
pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Shardwright - sharded table resolution and run-once migrations
#[derive(Parser, Debug)]
#[command(name = "shardwright")]
#[command(author = "Shardwright Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Sharded table resolution, run-once migration ledger and schema snapshots")]
#[command(long_about = "Shardwright

Maps logical entities to physical (sharded) tables, applies structural
commands at most once per store, and keeps a content-hashed snapshot of
the schema model.

Supported databases: PostgreSQL, MySQL, SQLite")]
#[command(propagate_version = true)]
#[command(after_help = "GETTING STARTED:
  1. Initialize a new project:   shardwright init --accessor Blog.Data.BlogAccessor
  2. Define your schema:         Edit files in schema/ directory
  3. Check table names:          shardwright resolve --entity Article
  4. Apply commands:             shardwright apply --commands migrations.sql
  5. Check status:               shardwright status")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new project
    ///
    /// Creates the schema/ directory, the state directories and a default
    /// configuration file.
    ///
    /// EXAMPLES:
    ///   shardwright init --accessor Blog.Data.BlogAccessor
    ///   shardwright init --dialect postgresql --force
    Init {
        /// Database dialect (postgresql, mysql, sqlite)
        #[arg(short, long, value_name = "DIALECT", default_value = "sqlite")]
        dialect: String,

        /// Qualified accessor name used for ledgers and markers
        #[arg(short, long, value_name = "NAME", default_value = "App.Data.AppAccessor")]
        accessor: String,

        /// Force initialization even if config exists
        #[arg(short, long)]
        force: bool,
    },

    /// Resolve the physical table of an entity
    ///
    /// EXAMPLES:
    ///   shardwright resolve --entity Article
    ///   shardwright resolve --entity Event --at 2024-03-09T00:00:00Z
    Resolve {
        /// Entity name as defined in the schema model
        #[arg(short, long, value_name = "NAME")]
        entity: String,

        /// Reference time (RFC3339) for date-based rules
        #[arg(long, value_name = "TIME")]
        at: Option<String>,
    },

    /// Compile the schema model snapshot
    ///
    /// Prints the source hash and whether the exported snapshot is stale.
    ///
    /// EXAMPLES:
    ///   shardwright snapshot
    ///   shardwright snapshot --export
    Snapshot {
        /// Write the artifact and its hash to the export directory
        #[arg(long)]
        export: bool,
    },

    /// Apply pending structural commands
    ///
    /// Commands already recorded in the ledger for this store are skipped.
    ///
    /// EXAMPLES:
    ///   shardwright apply --commands migrations.sql
    ///   shardwright apply --commands migrations.sql --env production --dry-run
    Apply {
        /// SQL file with the proposed commands
        #[arg(long, value_name = "FILE")]
        commands: PathBuf,

        /// SQL file with seed commands run once on initialization
        #[arg(long, value_name = "FILE")]
        seed: Option<PathBuf>,

        /// Target environment
        #[arg(short, long, default_value = "development")]
        env: String,

        /// Show pending commands without executing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Show markers, ledger and snapshot state
    Status {
        /// Target environment
        #[arg(short, long, default_value = "development")]
        env: String,
    },
}
