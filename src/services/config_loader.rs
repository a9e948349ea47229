// 設定ファイル読み込みサービス
//
// core::config の純粋性を保つため、ファイルI/OとYAMLへの直列化はこのサービスに集約する。

use crate::core::config::Config;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

/// 設定ファイル読み込みサービス
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// YAMLファイルから設定を読み込み、検証する
    pub fn from_file(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config = content.parse()?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {:?}", path))?;

        debug!(path = %path.display(), accessor = %config.accessor, "Loaded config");
        Ok(config)
    }

    /// プロジェクトルートの設定ファイルを読み込む
    pub fn load_from_project(project_path: &Path) -> Result<Config> {
        let path = project_path.join(Config::DEFAULT_CONFIG_PATH);
        if !path.exists() {
            return Err(anyhow::anyhow!(
                "Config file not found: {:?}. Run `init` first.",
                path
            ));
        }
        Self::from_file(&path)
    }

    /// デフォルトパスから設定を読み込む
    pub fn load_default() -> Result<Config> {
        Self::from_file(Path::new(Config::DEFAULT_CONFIG_PATH))
    }

    /// ConfigをYAML文字列に変換
    pub fn to_yaml(config: &Config) -> Result<String> {
        serde_saphyr::to_string(config).with_context(|| "Failed to serialize config file")
    }
}
