/// CLI エントリーポイントとコマンドハンドラーのテスト
///
/// CLI構造の定義と、init から status までの一連のコマンドが
/// 同じプロジェクトディレクトリ上で連携して動作することを確認します。
use clap::Parser;
use shardwright::cli::commands::apply::{ApplyCommand, ApplyCommandHandler};
use shardwright::cli::commands::init::{InitCommand, InitCommandHandler};
use shardwright::cli::commands::resolve::{ResolveCommand, ResolveCommandHandler};
use shardwright::cli::commands::snapshot::{SnapshotCommand, SnapshotCommandHandler};
use shardwright::cli::commands::status::{StatusCommand, StatusCommandHandler};
use shardwright::cli::{Cli, Commands};
use shardwright::core::config::Dialect;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[cfg(test)]
mod cli_tests {
    use super::*;

    /// ヘルプとバージョンのフラグが処理されることを確認
    #[test]
    fn test_cli_help_and_version() {
        assert!(Cli::try_parse_from(["shardwright", "--help"]).is_err());
        assert!(Cli::try_parse_from(["shardwright", "--version"]).is_err());
    }

    /// initサブコマンドのデフォルト値を確認
    #[test]
    fn test_init_defaults() {
        let cli = Cli::try_parse_from(["shardwright", "init"]).unwrap();
        match cli.command {
            Commands::Init {
                dialect,
                accessor,
                force,
            } => {
                assert_eq!(dialect, "sqlite");
                assert_eq!(accessor, "App.Data.AppAccessor");
                assert!(!force);
            }
            other => panic!("Expected Init command, got {:?}", other),
        }
    }

    /// グローバルオプションがサブコマンドの後でも受け付けられることを確認
    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "shardwright",
            "status",
            "--env",
            "production",
            "--config",
            "custom.yaml",
            "--no-color",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("custom.yaml")));
        assert!(cli.no_color);
        assert!(matches!(cli.command, Commands::Status { ref env } if env == "production"));
    }

    /// applyサブコマンドは --commands が必須であることを確認
    #[test]
    fn test_apply_requires_commands() {
        assert!(Cli::try_parse_from(["shardwright", "apply"]).is_err());
    }

    /// init → resolve → snapshot → apply → status の流れを確認
    #[tokio::test]
    async fn test_project_workflow() {
        colored::control::set_override(false);
        let dir = TempDir::new().unwrap();
        let project_path = dir.path().to_path_buf();

        InitCommandHandler::new()
            .execute(&InitCommand {
                project_path: project_path.clone(),
                dialect: Dialect::SQLite,
                accessor: "Blog.Data.BlogAccessor".to_string(),
                force: false,
            })
            .unwrap();

        // データベースファイルをプロジェクト内に置く
        let config_path = project_path.join(".shardwright.yaml");
        let yaml = fs::read_to_string(&config_path)
            .unwrap()
            .replace("app.db", &project_path.join("blog.db").display().to_string());
        fs::write(&config_path, yaml).unwrap();

        fs::write(
            project_path.join("schema/blog.yaml"),
            r#"
version: "1.0"
tables:
  Article:
    columns:
      - name: id
        type: bigint
    sharding:
      formatter: "{Entities}_{Year}"
      rule: year
"#,
        )
        .unwrap();
        fs::write(
            project_path.join("migrations.sql"),
            "-- articles for 2024\nCREATE TABLE Articles_2024 (id INTEGER PRIMARY KEY);\n",
        )
        .unwrap();
        fs::write(
            project_path.join("seed.sql"),
            "INSERT INTO Articles_2024 (id) VALUES (1);",
        )
        .unwrap();

        let resolved = ResolveCommandHandler::new()
            .execute(&ResolveCommand {
                project_path: project_path.clone(),
                config_path: None,
                entity: "Article".to_string(),
                at: Some("2024-06-01T00:00:00Z".to_string()),
            })
            .unwrap();
        assert_eq!(resolved, "Article → Articles_2024");

        let snapshot = SnapshotCommandHandler::new()
            .execute(&SnapshotCommand {
                project_path: project_path.clone(),
                config_path: None,
                export: true,
            })
            .unwrap();
        assert!(snapshot.contains("Written:"));

        let apply = ApplyCommand {
            project_path: project_path.clone(),
            config_path: None,
            commands: PathBuf::from("migrations.sql"),
            seed: Some(PathBuf::from("seed.sql")),
            env: "development".to_string(),
            dry_run: false,
        };
        let applied = ApplyCommandHandler::new().execute(&apply).await.unwrap();
        assert!(applied.contains("Store initialized"));
        assert!(applied.contains("Applied 1 command(s)"));

        let dry_run = ApplyCommandHandler::new()
            .execute(&ApplyCommand {
                dry_run: true,
                ..apply
            })
            .await
            .unwrap();
        assert!(dry_run.contains("0 pending, 1 already applied"));

        let status = StatusCommandHandler::new()
            .execute(&StatusCommand {
                project_path,
                config_path: None,
                env: "development".to_string(),
            })
            .unwrap();
        assert!(status.contains("Created:     yes"));
        assert!(status.contains("Initialized: yes"));
        assert!(status.contains("Ledger:      1 entry (1 for this environment)"));
    }

    /// 未初期化のプロジェクトではコマンドが失敗することを確認
    #[test]
    fn test_commands_require_init() {
        let dir = TempDir::new().unwrap();

        let error = StatusCommandHandler::new()
            .execute(&StatusCommand {
                project_path: dir.path().to_path_buf(),
                config_path: None,
                env: "development".to_string(),
            })
            .unwrap_err();

        assert!(error.to_string().contains("init"));
    }
}
