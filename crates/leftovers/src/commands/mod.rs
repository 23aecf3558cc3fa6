pub mod check;
pub mod config;
pub mod simulate;

use anyhow::Context;
use leftovers_config::SweepConfig;
use std::path::{Path, PathBuf};

/// 設定を読み込む
///
/// パス指定があればそのファイルを、なければ設定ファイルを検索し、
/// 見つからない場合は組み込みのデフォルトを使う。
pub fn load_config(path: Option<&Path>) -> anyhow::Result<(SweepConfig, Option<PathBuf>)> {
    match path {
        Some(path) => {
            let config = SweepConfig::load(path).with_context(|| {
                format!("設定ファイルを読み込めません: {}", path.display())
            })?;
            Ok((config, Some(path.to_path_buf())))
        }
        None => {
            let (config, found) = leftovers_config::load_or_default()?;
            if let Some(found) = &found {
                tracing::info!("Using config file {}", found.display());
            }
            Ok((config, found))
        }
    }
}
