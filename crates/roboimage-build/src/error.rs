use roboimage_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Dockerfile not found: {0}")]
    DockerfileNotFound(PathBuf),

    #[error("Build context directory not found: {0}")]
    ContextNotFound(PathBuf),

    #[error("Docker connection error: {0}")]
    DockerConnection(#[from] bollard::errors::Error),

    #[error("Build failed: {0}")]
    BuildFailed(String),

    #[error("Push failed: {message}")]
    PushFailed { message: String },

    #[error("Invalid tag: {tag}")]
    InvalidTag { tag: String },

    #[error("Authentication failed for {registry}: {message}")]
    AuthFailed { registry: String, message: String },

    #[error("Command failed: {command} (exit code: {code:?})")]
    CommandFailed { command: String, code: Option<i32> },

    #[error("Failed to run {program}: {source}")]
    CommandSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No builds found for '{0}'")]
    NoBuilds(String),

    #[error("Invalid metadata file {path}: {message}")]
    InvalidMetadata { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BuildError {
    /// ユーザー向けの分かりやすいエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            BuildError::DockerfileNotFound(path) => {
                format!(
                    "Dockerfileが見つかりません: {}\n\
                     \n\
                     解決方法:\n\
                     1. `roboimage generate` で Dockerfile を生成してください\n\
                     2. --no-generate を外して再実行してください",
                    path.display()
                )
            }
            BuildError::BuildFailed(msg) => {
                format!(
                    "ビルドに失敗しました: {}\n\
                     \n\
                     テンプレートから生成された Dockerfile を確認してください。",
                    msg
                )
            }
            BuildError::CommandSpawn { program, .. } => {
                format!(
                    "{} を実行できませんでした\n\
                     \n\
                     docker と buildx プラグインがインストールされているか確認してください。",
                    program
                )
            }
            BuildError::NoBuilds(name) => {
                format!(
                    "'{}' に対応するビルドがありません\n\
                     \n\
                     `roboimage images --all` で利用可能なイメージを確認してください。",
                    name
                )
            }
            BuildError::AuthFailed { registry, message } => {
                format!(
                    "レジストリ {} の認証に失敗しました: {}\n\
                     \n\
                     DOCKER_USERNAME / DOCKER_PASSWORD を設定するか、docker login を実行してください。",
                    registry, message
                )
            }
            _ => format!("{}", self),
        }
    }
}

pub type BuildResult<T> = std::result::Result<T, BuildError>;
