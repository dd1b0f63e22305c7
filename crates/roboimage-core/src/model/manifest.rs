//! templates.yml 全体の定義

use super::entry::{Repository, Stage};
use crate::platform::{Platform, PlatformSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// どこにもプラットフォーム指定がない場合のビルド対象
pub const FALLBACK_PLATFORM: &str = "linux/amd64";

/// ランナー指定がない場合の GitHub Actions ランナー
pub const FALLBACK_RUNNER: &str = "ubuntu-latest";

/// テンプレートマニフェスト（templates.yml）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// デフォルトのレジストリ／名前空間（例: althack）
    #[serde(default)]
    pub registry: Option<String>,
    /// 全エントリ共通のデフォルトプラットフォーム
    #[serde(default)]
    pub platforms: Vec<PlatformSpec>,
    /// 全リポジトリ共通のデフォルトステージ
    #[serde(default)]
    pub targets: Vec<Stage>,
    #[serde(default)]
    pub default_runner: Option<String>,
    /// プラットフォーム → ランナーの対応（先頭から評価）
    #[serde(default)]
    pub runners: Vec<RunnerRule>,
    #[serde(default)]
    pub repositories: BTreeMap<String, Repository>,
}

/// CI ランナーの割り当てルール
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerRule {
    pub platform: PlatformSpec,
    pub runner: String,
}

impl Manifest {
    /// プラットフォームに対応するランナーを解決
    pub fn runner_for(&self, platform: &Platform) -> &str {
        self.runners
            .iter()
            .find(|rule| rule.platform.matches(platform))
            .map(|rule| rule.runner.as_str())
            .or(self.default_runner.as_deref())
            .unwrap_or(FALLBACK_RUNNER)
    }
}
