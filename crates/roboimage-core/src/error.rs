use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("YAMLパースエラー: {path}\n理由: {source}")]
    YamlParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("ファイル読み込みエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO エラー: {path}\n理由: {message}")]
    IoError { path: PathBuf, message: String },

    #[error("無効な設定: {0}")]
    InvalidConfig(String),

    #[error("無効なプラットフォーム指定 '{value}': {reason}")]
    InvalidPlatform { value: String, reason: String },

    #[error("テンプレートエラー: {file}\n理由: {message}")]
    TemplateError { file: String, message: String },

    #[error("テンプレートディレクトリが見つかりません: {0}")]
    TemplateDirNotFound(PathBuf),

    #[error("イメージが見つかりません: {0}")]
    ImageNotFound(String),

    #[error("イメージ '{image}' にステージ '{stage}' はありません (利用可能: {available})")]
    StageNotFound {
        image: String,
        stage: String,
        available: String,
    },

    #[error("イメージ '{image}' はプラットフォーム '{platform}' をサポートしていません")]
    PlatformNotSupported { image: String, platform: String },

    #[error("JSON シリアライズエラー: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
