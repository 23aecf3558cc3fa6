use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "設定ファイルが見つかりません。以下の場所を確認してください:\n\
        - カレントディレクトリ: leftovers.local.yaml, .leftovers.local.yaml, leftovers.yaml, .leftovers.yaml\n\
        - ~/.config/leftovers/leftovers.yaml\n\
        または LEFTOVERS_CONFIG_PATH 環境変数で直接指定できます"
    )]
    ConfigFileNotFound,

    #[error("テスト名パターンが不正です: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("設定ファイルの解析に失敗しました: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
