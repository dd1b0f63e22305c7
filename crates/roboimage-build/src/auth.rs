//! プッシュ時のレジストリ認証
//!
//! 明示的な認証情報（DOCKER_USERNAME / DOCKER_PASSWORD）があればそれを使い、
//! なければ Docker の config.json（`credHelpers` → `auths` → `credsStore` の順）を参照します。

use crate::error::{BuildError, BuildResult};
use crate::reference::{DOCKER_HUB, ImageRef};
use base64::Engine;
use bollard::auth::DockerCredentials;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// docker login が Docker Hub に対して使うキー
const DOCKER_HUB_KEY: &str = "https://index.docker.io/v1/";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DockerConfig {
    #[serde(default)]
    auths: HashMap<String, AuthEntry>,
    /// レジストリごとの credential helper
    #[serde(default)]
    cred_helpers: HashMap<String, String>,
    /// 既定の credential helper（例: desktop, osxkeychain）
    #[serde(default)]
    creds_store: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthEntry {
    /// base64("username:password")
    auth: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HelperResponse {
    username: String,
    secret: String,
}

pub struct RegistryAuth {
    config_path: PathBuf,
    explicit: Option<(String, String)>,
}

impl RegistryAuth {
    /// `config_dir`（DOCKER_CONFIG）配下の config.json を使う
    ///
    /// 指定がなければ `~/.docker/config.json`。
    pub fn from_config_dir(config_dir: Option<&Path>) -> Self {
        let dir = config_dir.map(Path::to_path_buf).unwrap_or_else(|| {
            dirs::home_dir()
                .map(|home| home.join(".docker"))
                .unwrap_or_else(|| PathBuf::from(".docker"))
        });
        Self {
            config_path: dir.join("config.json"),
            explicit: None,
        }
    }

    /// config.json より優先する認証情報
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.explicit = Some((username.to_string(), password.to_string()));
        self
    }

    pub fn credentials_for(&self, image: &ImageRef) -> BuildResult<Option<DockerCredentials>> {
        let registry = image.registry();

        if let Some((username, password)) = &self.explicit {
            tracing::debug!(registry, "Using explicit credentials");
            return Ok(Some(credentials(username, password, registry)));
        }

        if !self.config_path.is_file() {
            tracing::debug!(path = %self.config_path.display(), "No docker config, pushing anonymously");
            return Ok(None);
        }
        let config = self.load_config()?;
        let key = server_key(registry);

        if let Some(helper) = config.cred_helpers.get(registry) {
            return from_helper(helper, key, registry);
        }

        let entry = config
            .auths
            .get(registry)
            .or_else(|| config.auths.get(key))
            .and_then(|entry| entry.auth.as_deref());
        if let Some(encoded) = entry {
            return decode_auth(encoded, registry).map(Some);
        }

        if let Some(helper) = &config.creds_store {
            return from_helper(helper, key, registry);
        }

        tracing::debug!(registry, "No credentials found");
        Ok(None)
    }

    fn load_config(&self) -> BuildResult<DockerConfig> {
        let failed = |message: String| BuildError::AuthFailed {
            registry: self.config_path.display().to_string(),
            message,
        };
        let content = std::fs::read_to_string(&self.config_path)
            .map_err(|e| failed(format!("config.json を読めません: {}", e)))?;
        serde_json::from_str(&content).map_err(|e| failed(format!("config.json が不正です: {}", e)))
    }
}

/// credential helper と auths で使われるサーバーキー
fn server_key(registry: &str) -> &str {
    if registry == DOCKER_HUB {
        DOCKER_HUB_KEY
    } else {
        registry
    }
}

fn credentials(username: &str, password: &str, registry: &str) -> DockerCredentials {
    DockerCredentials {
        username: Some(username.to_string()),
        password: Some(password.to_string()),
        serveraddress: Some(registry.to_string()),
        ..Default::default()
    }
}

fn decode_auth(encoded: &str, registry: &str) -> BuildResult<DockerCredentials> {
    let failed = |message: String| BuildError::AuthFailed {
        registry: registry.to_string(),
        message,
    };
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| failed(format!("auth をデコードできません: {}", e)))?;
    let decoded = String::from_utf8(decoded).map_err(|e| failed(e.to_string()))?;
    let (username, password) = decoded
        .split_once(':')
        .ok_or_else(|| failed("auth が username:password 形式ではありません".to_string()))?;
    Ok(credentials(username, password, registry))
}

/// `docker-credential-<helper> get` に問い合わせる
///
/// helper が認証情報を持っていなければ None。
fn from_helper(helper: &str, key: &str, registry: &str) -> BuildResult<Option<DockerCredentials>> {
    let program = format!("docker-credential-{}", helper);
    let failed = |message: String| BuildError::AuthFailed {
        registry: registry.to_string(),
        message,
    };

    tracing::debug!(helper = %program, key, "Querying credential helper");
    let mut child = Command::new(&program)
        .arg("get")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| failed(format!("{} を実行できません: {}", program, e)))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(key.as_bytes())
            .map_err(|e| failed(e.to_string()))?;
    }
    let output = child
        .wait_with_output()
        .map_err(|e| failed(format!("{} が失敗しました: {}", program, e)))?;

    if !output.status.success() {
        tracing::warn!(
            helper = %program,
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "Credential helper has no credentials"
        );
        return Ok(None);
    }

    let response: HelperResponse = serde_json::from_slice(&output.stdout)
        .map_err(|e| failed(format!("{} の応答が不正です: {}", program, e)))?;
    Ok(Some(credentials(&response.username, &response.secret, registry)))
}
