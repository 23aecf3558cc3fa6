pub mod entity;
pub mod error;
pub mod sweep;

pub use entity::{EntityList, EntityRef};
pub use error::*;
pub use sweep::{DEFAULT_ALWAYS_SHOW, DEFAULT_IS_TEST, SweepConfig, SweepConfigBuilder};

use std::path::PathBuf;

/// 設定ファイルのパスを直接指定する環境変数
pub const CONFIG_PATH_ENV: &str = "LEFTOVERS_CONFIG_PATH";

const CANDIDATES: [&str; 4] = [
    "leftovers.local.yaml",
    ".leftovers.local.yaml",
    "leftovers.yaml",
    ".leftovers.yaml",
];

/// leftovers の設定ファイルを探す
///
/// 以下の優先順位で設定ファイルを検索:
/// 1. 環境変数 LEFTOVERS_CONFIG_PATH (直接パス指定)
/// 2. カレントディレクトリ: leftovers.local.yaml, .leftovers.local.yaml, leftovers.yaml, .leftovers.yaml
/// 3. ~/.config/leftovers/leftovers.yaml (グローバル設定)
pub fn find_config_file() -> Result<PathBuf> {
    // 1. 環境変数で直接指定
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
    }

    // 2. カレントディレクトリで検索
    let current_dir = std::env::current_dir()?;
    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    // 3. グローバル設定ファイル
    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("leftovers").join("leftovers.yaml");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}

/// 設定ファイルを読み込む。見つからない場合は組み込みのデフォルトを使う
///
/// 読み込んだファイルのパスも返す（デフォルト使用時は None）
pub fn load_or_default() -> Result<(SweepConfig, Option<PathBuf>)> {
    match find_config_file() {
        Ok(path) => {
            let config = SweepConfig::load(&path)?;
            Ok((config, Some(path)))
        }
        Err(ConfigError::ConfigFileNotFound) => {
            tracing::debug!("No leftovers config file found, using defaults");
            Ok((SweepConfig::default(), None))
        }
        Err(e) => Err(e),
    }
}
