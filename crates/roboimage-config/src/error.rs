use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "マニフェストが見つかりません。以下の場所を確認してください:\n\
        - カレントディレクトリとその親: templates.yml, templates.yaml, .roboimage/templates.yml\n\
        - ~/.config/roboimage/templates.yml\n\
        または --manifest オプション / ROBOIMAGE_MANIFEST 環境変数で直接指定できます"
    )]
    ManifestNotFound,

    #[error("指定されたマニフェストが存在しません: {0}")]
    ManifestNotFoundAt(PathBuf),

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
