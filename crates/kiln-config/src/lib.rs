pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// ビルドツールのバイナリを上書きする環境変数
pub const ENV_DOCKER: &str = "KILN_DOCKER";
/// 既定の progress モードを上書きする環境変数
pub const ENV_PROGRESS: &str = "KILN_PROGRESS";
/// 設定ファイルを直接指定する環境変数
pub const ENV_CONFIG_PATH: &str = "KILN_CONFIG_PATH";

/// kiln の設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KilnConfig {
    /// 起動するビルドツール（`buildx` サブコマンドを持つこと）
    pub docker: String,
    /// `--progress` の既定値
    pub progress: String,
}

impl Default for KilnConfig {
    fn default() -> Self {
        Self {
            docker: "docker".to_string(),
            progress: "auto".to_string(),
        }
    }
}

impl KilnConfig {
    /// 環境変数 > 設定ファイル > 既定値 の順で設定を読み込む
    pub fn load() -> Result<Self> {
        let mut config = match find_config_file() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        tracing::debug!("Loading config: {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn from_yaml(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        // 空ファイルは既定値
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    fn apply_env(&mut self) {
        if let Some(docker) = non_empty_env(ENV_DOCKER) {
            self.docker = docker;
        }
        if let Some(progress) = non_empty_env(ENV_PROGRESS) {
            self.progress = progress;
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// 設定ファイルを探す
///
/// 以下の優先順位で検索:
/// 1. 環境変数 KILN_CONFIG_PATH (直接パス指定)
/// 2. カレントディレクトリの kiln.yaml
/// 3. ~/.config/kiln/config.yaml (グローバル設定)
pub fn find_config_file() -> Option<PathBuf> {
    if let Ok(config_path) = std::env::var(ENV_CONFIG_PATH) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Some(path);
        }
        tracing::warn!("{} does not exist: {}", ENV_CONFIG_PATH, path.display());
    }

    if let Ok(current_dir) = std::env::current_dir() {
        let path = current_dir.join("kiln.yaml");
        if path.exists() {
            return Some(path);
        }
    }

    dirs::config_dir()
        .map(|dir| dir.join("kiln").join("config.yaml"))
        .filter(|path| path.exists())
}
