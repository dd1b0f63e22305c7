//! 解決済みのイメージ定義

use super::entry::Vars;
use crate::platform::{Platform, PlatformSpec};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// エントリのステージ・プラットフォームをリポジトリ／マニフェストの
/// デフォルトで補完したビュー
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageDef {
    pub repository: String,
    pub name: String,
    pub targets: Vec<String>,
    pub platforms: Vec<PlatformSpec>,
    /// ステージ固有のプラットフォーム宣言
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub stage_platforms: BTreeMap<String, Vec<PlatformSpec>>,
    pub eol: Option<NaiveDate>,
    pub is_eol: bool,
    #[serde(skip_serializing_if = "Vars::is_empty")]
    pub vars: Vars,
}

impl ImageDef {
    /// bake ターゲット名: `<repo>-<name>-<stage>`
    pub fn bake_target(&self, stage: &str) -> String {
        format!("{}-{}-{}", self.repository, self.name, stage)
    }

    /// イメージ単位の bake グループ名: `<repo>-<name>`
    pub fn bake_group(&self) -> String {
        format!("{}-{}", self.repository, self.name)
    }

    pub fn bake_targets(&self) -> Vec<String> {
        self.targets.iter().map(|t| self.bake_target(t)).collect()
    }

    /// タグ部分: `<name>-<stage>`
    pub fn tag(&self, stage: &str) -> String {
        format!("{}-{}", self.name, stage)
    }

    /// レジストリ込みのイメージ名: `<registry>/<repo>`
    pub fn image_name(&self, registry: &str) -> String {
        let registry = registry.trim_end_matches('/');
        if registry.is_empty() {
            self.repository.clone()
        } else {
            format!("{}/{}", registry, self.repository)
        }
    }

    /// `<registry>/<repo>:<name>-<stage>`
    pub fn tagged(&self, registry: &str, stage: &str) -> String {
        format!("{}:{}", self.image_name(registry), self.tag(stage))
    }

    /// `<registry>/<repo>:<name>-<stage>-<YYYY-MM-DD>`
    pub fn dated(&self, registry: &str, stage: &str, date: NaiveDate) -> String {
        format!("{}-{}", self.tagged(registry, stage), date.format("%Y-%m-%d"))
    }

    /// 生成される Dockerfile の相対パス
    pub fn dockerfile(&self) -> String {
        format!("{}.Dockerfile", self.name)
    }

    pub fn has_stage(&self, stage: &str) -> bool {
        self.targets.iter().any(|t| t == stage)
    }

    /// ステージのプラットフォーム宣言（固有の宣言がなければイメージの宣言）
    pub fn platforms_for_stage(&self, stage: &str) -> &[PlatformSpec] {
        self.stage_platforms
            .get(stage)
            .map(Vec::as_slice)
            .unwrap_or(&self.platforms)
    }

    pub fn stage_supports(&self, stage: &str, platform: &Platform) -> bool {
        self.platforms_for_stage(stage)
            .iter()
            .any(|spec| spec.matches(platform))
    }

    /// `platform` でビルドできるステージ（定義順）
    pub fn stages_for(&self, platform: &Platform) -> Vec<&String> {
        self.targets
            .iter()
            .filter(|stage| self.stage_supports(stage, platform))
            .collect()
    }

    /// いずれかのステージがサポートしていれば true
    ///
    /// ステージがない場合はイメージの宣言で判定します。
    pub fn supports(&self, platform: &Platform) -> bool {
        if self.targets.is_empty() {
            self.platforms.iter().any(|spec| spec.matches(platform))
        } else {
            !self.stages_for(platform).is_empty()
        }
    }

    /// ステージをビルドする具体的なプラットフォーム（ワイルドカード宣言は除く）
    pub fn stage_build_platforms(&self, stage: &str) -> Vec<Platform> {
        concrete(self.platforms_for_stage(stage))
    }

    /// 実際にビルドするプラットフォーム
    ///
    /// `requested` が空ならワイルドカードを含まない宣言をそのまま使い
    /// （ステージ固有の宣言も含む）、指定があればサポート宣言にマッチする
    /// ものだけを残します。
    pub fn build_platforms(&self, requested: &[Platform]) -> Vec<Platform> {
        if requested.is_empty() {
            if self.targets.is_empty() {
                return concrete(&self.platforms);
            }
            let mut platforms: Vec<Platform> = Vec::new();
            for stage in &self.targets {
                for platform in self.stage_build_platforms(stage) {
                    if !platforms.contains(&platform) {
                        platforms.push(platform);
                    }
                }
            }
            platforms
        } else {
            requested
                .iter()
                .filter(|p| self.supports(p))
                .cloned()
                .collect()
        }
    }
}

fn concrete(specs: &[PlatformSpec]) -> Vec<Platform> {
    let mut platforms: Vec<Platform> = Vec::new();
    for platform in specs.iter().filter_map(PlatformSpec::as_platform) {
        if !platforms.contains(&platform) {
            platforms.push(platform);
        }
    }
    platforms
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> ImageDef {
        ImageDef {
            repository: "ros2".to_string(),
            name: "humble".to_string(),
            targets: vec!["base".to_string(), "dev".to_string()],
            platforms: vec![
                "linux/amd64".parse().unwrap(),
                "linux/arm64".parse().unwrap(),
                "linux/arm/*".parse().unwrap(),
            ],
            stage_platforms: BTreeMap::new(),
            eol: None,
            is_eol: false,
            vars: Vars::new(),
        }
    }

    #[test]
    fn test_names_and_tags() {
        let image = image();
        assert_eq!(image.bake_target("base"), "ros2-humble-base");
        assert_eq!(image.bake_group(), "ros2-humble");
        assert_eq!(image.tagged("althack", "dev"), "althack/ros2:humble-dev");
        assert_eq!(image.tagged("ghcr.io/org/", "dev"), "ghcr.io/org/ros2:humble-dev");
        assert_eq!(image.tagged("", "dev"), "ros2:humble-dev");
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            image.dated("althack", "base", date),
            "althack/ros2:humble-base-2024-03-01"
        );
        assert_eq!(image.dockerfile(), "humble.Dockerfile");
    }

    #[test]
    fn test_build_platforms_without_request_skips_wildcards() {
        let platforms = image().build_platforms(&[]);
        let names: Vec<String> = platforms.iter().map(|p| p.to_string()).collect();
        assert_eq!(names, vec!["linux/amd64", "linux/arm64"]);
    }

    #[test]
    fn test_build_platforms_filters_requested() {
        let requested: Vec<Platform> = ["linux/arm64/v8", "linux/arm/v6", "linux/s390x"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        let platforms = image().build_platforms(&requested);
        let names: Vec<String> = platforms.iter().map(|p| p.to_string()).collect();
        assert_eq!(names, vec!["linux/arm64", "linux/arm/v6"]);
    }

    fn platform(s: &str) -> Platform {
        s.parse().unwrap()
    }

    #[test]
    fn test_stage_platform_overrides() {
        let mut image = image();
        image.targets.push("gazebo".to_string());
        image
            .stage_platforms
            .insert("gazebo".to_string(), vec!["linux/amd64".parse().unwrap()]);

        assert!(image.stage_supports("dev", &platform("linux/arm64")));
        assert!(!image.stage_supports("gazebo", &platform("linux/arm64")));
        assert_eq!(image.stages_for(&platform("linux/arm64")), vec!["base", "dev"]);
        assert_eq!(
            image.stages_for(&platform("linux/amd64")),
            vec!["base", "dev", "gazebo"]
        );
        assert_eq!(
            image.stage_build_platforms("gazebo"),
            vec![platform("linux/amd64")]
        );
        assert!(image.supports(&platform("linux/arm/v7")));
    }

    #[test]
    fn test_stage_platforms_extend_build_platforms() {
        let mut image = image();
        image.platforms = vec!["linux/amd64".parse().unwrap()];
        image
            .stage_platforms
            .insert("dev".to_string(), vec!["linux/amd64".parse().unwrap(), "linux/arm64".parse().unwrap()]);

        assert_eq!(
            image.build_platforms(&[]),
            vec![platform("linux/amd64"), platform("linux/arm64")]
        );
        // base は arm64 をサポートしないが dev はする
        assert!(image.supports(&platform("linux/arm64")));
        assert_eq!(image.stages_for(&platform("linux/arm64")), vec!["dev"]);
    }
}
