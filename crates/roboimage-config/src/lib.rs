pub mod error;

pub use error::*;

use std::path::{Path, PathBuf};

/// マニフェストパスを直接指定する環境変数
pub const MANIFEST_ENV: &str = "ROBOIMAGE_MANIFEST";

/// レジストリ指定がどこにもない場合の名前空間
pub const DEFAULT_REGISTRY: &str = "althack";

pub const REGISTRY_ENV: &str = "DOCKER_REGISTRY";
pub const PUSH_ENV: &str = "DOCKER_PUSH";
pub const CLEAN_ENV: &str = "DOCKER_CLEAN";
pub const DOCKER_CONFIG_ENV: &str = "DOCKER_CONFIG";
pub const USERNAME_ENV: &str = "DOCKER_USERNAME";
pub const PASSWORD_ENV: &str = "DOCKER_PASSWORD";

const CANDIDATES: [&str; 3] = ["templates.yml", "templates.yaml", ".roboimage/templates.yml"];

/// templates.yml を探す
///
/// 以下の優先順位で検索:
/// 1. 明示的な指定（--manifest）
/// 2. 環境変数 ROBOIMAGE_MANIFEST
/// 3. カレントディレクトリから上に向かって: templates.yml, templates.yaml, .roboimage/templates.yml
/// 4. ~/.config/roboimage/templates.yml
pub fn find_manifest(explicit: Option<&Path>) -> Result<PathBuf> {
    // 1. 明示的な指定
    if let Some(path) = explicit {
        return existing(path.to_path_buf());
    }

    // 2. 環境変数で直接指定
    if let Ok(path) = std::env::var(MANIFEST_ENV)
        && !path.is_empty()
    {
        tracing::debug!(path = %path, "Using manifest from {}", MANIFEST_ENV);
        return existing(PathBuf::from(path));
    }

    // 3. カレントディレクトリから上に向かって探す
    let current_dir = std::env::current_dir()?;
    if let Some(path) = find_manifest_from(&current_dir) {
        return Ok(path);
    }

    // 4. グローバル設定
    if let Some(config_dir) = dirs::config_dir() {
        let global = config_dir.join("roboimage").join("templates.yml");
        if global.exists() {
            return Ok(global);
        }
    }

    Err(ConfigError::ManifestNotFound)
}

/// `start` から親ディレクトリへ向かってマニフェストを探す
pub fn find_manifest_from(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        for candidate in CANDIDATES {
            let path = current.join(candidate);
            if path.is_file() {
                tracing::debug!(path = %path.display(), "Found manifest");
                return Some(path);
            }
        }
        if !current.pop() {
            return None;
        }
    }
}

fn existing(path: PathBuf) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(ConfigError::ManifestNotFoundAt(path))
    }
}

/// 環境変数の値を真偽値として解釈
///
/// `0`, `false`, `no`, `off`, 空文字（大文字小文字を区別しない）以外は true。
pub fn parse_bool(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off" | ""
    )
}

/// 空でない環境変数の値
fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// 環境変数を真偽値として読む（未設定なら None）
pub fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name).ok().map(|v| parse_bool(&v))
}

/// 環境変数から読み込むビルド設定
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// DOCKER_REGISTRY
    pub registry: Option<String>,
    /// DOCKER_PUSH
    pub push: bool,
    /// DOCKER_CLEAN（未設定なら None）
    pub clean: Option<bool>,
    /// DOCKER_CONFIG（config.json のあるディレクトリ）
    pub docker_config: Option<PathBuf>,
    /// DOCKER_USERNAME
    pub username: Option<String>,
    /// DOCKER_PASSWORD
    pub password: Option<String>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            registry: env_value(REGISTRY_ENV),
            push: env_flag(PUSH_ENV).unwrap_or(false),
            clean: env_flag(CLEAN_ENV),
            docker_config: env_value(DOCKER_CONFIG_ENV).map(PathBuf::from),
            username: env_value(USERNAME_ENV),
            password: env_value(PASSWORD_ENV),
        }
    }

    /// ユーザー名とパスワードが両方そろっていれば返す
    pub fn credentials(&self) -> Option<(String, String)> {
        Some((self.username.clone()?, self.password.clone()?))
    }

    /// レジストリを解決: CLI > DOCKER_REGISTRY > マニフェスト > althack
    pub fn resolve_registry(&self, cli: Option<&str>, manifest: Option<&str>) -> String {
        cli.or(self.registry.as_deref())
            .or(manifest)
            .unwrap_or(DEFAULT_REGISTRY)
            .to_string()
    }

    pub fn should_push(&self, cli_push: bool) -> bool {
        cli_push || self.push
    }

    /// `--no-clean` が指定されず、DOCKER_CLEAN が偽でなければ prune する
    pub fn should_clean(&self, no_clean: bool) -> bool {
        !no_clean && self.clean.unwrap_or(true)
    }
}
