use anyhow::{Context, Result};
use clap::Parser;
use colored::control as color_control;
use std::env;
use std::process;
use shardwright::cli::commands::apply::{ApplyCommand, ApplyCommandHandler};
use shardwright::cli::commands::init::{InitCommand, InitCommandHandler};
use shardwright::cli::commands::resolve::{ResolveCommand, ResolveCommandHandler};
use shardwright::cli::commands::snapshot::{SnapshotCommand, SnapshotCommandHandler};
use shardwright::cli::commands::status::{StatusCommand, StatusCommandHandler};
use shardwright::cli::{Cli, Commands};
use shardwright::core::config::Dialect;
use tracing_subscriber::EnvFilter;

fn main() {
    sqlx::any::install_default_drivers();

    // CLIをパースして実行
    let cli = Cli::parse();

    if cli.no_color || env::var_os("NO_COLOR").is_some() {
        color_control::set_override(false);
    }
    init_tracing(cli.verbose, !cli.no_color);

    // 非同期ランタイムを作成して実行
    let runtime = tokio::runtime::Runtime::new()
        .context("Failed to create Tokio runtime")
        .unwrap_or_else(|e| {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        });

    let result = runtime.block_on(run_command(cli));

    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// ログ出力を初期化する（RUST_LOG が優先される）
fn init_tracing(verbose: bool, ansi: bool) {
    let default = if verbose {
        "shardwright=debug,sqlx=warn"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .init();
}

/// コマンドを実行する
async fn run_command(cli: Cli) -> Result<String> {
    // プロジェクトのルートパスを取得
    let project_path = env::current_dir()?;
    let config_path = cli.config;

    match cli.command {
        Commands::Init {
            dialect,
            accessor,
            force,
        } => {
            let dialect: Dialect = dialect.parse()?;
            let handler = InitCommandHandler::new();
            let command = InitCommand {
                project_path,
                dialect,
                accessor,
                force,
            };
            handler.execute(&command)
        }

        Commands::Resolve { entity, at } => {
            let handler = ResolveCommandHandler::new();
            let command = ResolveCommand {
                project_path,
                config_path,
                entity,
                at,
            };
            handler.execute(&command)
        }

        Commands::Snapshot { export } => {
            let handler = SnapshotCommandHandler::new();
            let command = SnapshotCommand {
                project_path,
                config_path,
                export,
            };
            handler.execute(&command)
        }

        Commands::Apply {
            commands,
            seed,
            env,
            dry_run,
        } => {
            let handler = ApplyCommandHandler::new();
            let command = ApplyCommand {
                project_path,
                config_path,
                commands,
                seed,
                env,
                dry_run,
            };
            handler.execute(&command).await
        }

        Commands::Status { env } => {
            let handler = StatusCommandHandler::new();
            let command = StatusCommand {
                project_path,
                config_path,
                env,
            };
            handler.execute(&command)
        }
    }
}
