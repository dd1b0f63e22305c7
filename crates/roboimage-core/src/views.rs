//! マニフェストから導出されるビュー
//!
//! イメージ一覧・bake ターゲット名・ターゲットの逆引きを提供します。

use crate::error::{CoreError, Result};
use crate::model::{Entry, FALLBACK_PLATFORM, ImageDef, Manifest, Repository};
use crate::platform::PlatformSpec;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// EOL エントリの扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EolFilter {
    /// サポート中のイメージのみ
    #[default]
    Active,
    /// EOL を含むすべてのイメージ
    All,
}

impl EolFilter {
    pub fn include_eol(include: bool) -> Self {
        if include { EolFilter::All } else { EolFilter::Active }
    }
}

impl Manifest {
    /// リポジトリ名とエントリを定義順に列挙
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Repository, &Entry)> {
        self.repositories.iter().flat_map(|(name, repo)| {
            repo.entries
                .iter()
                .map(move |entry| (name.as_str(), repo, entry))
        })
    }

    /// エントリをデフォルト値で補完して ImageDef を作成
    pub fn resolve(
        &self,
        repository: &str,
        repo: &Repository,
        entry: &Entry,
        today: NaiveDate,
    ) -> ImageDef {
        let stages = entry
            .targets
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| (!repo.targets.is_empty()).then_some(repo.targets.as_slice()))
            .unwrap_or(&self.targets);
        let targets = stages.iter().map(|s| s.target.clone()).collect();
        let stage_platforms = stages
            .iter()
            .filter_map(|s| Some((s.target.clone(), s.platforms.clone()?)))
            .collect();

        let platforms = entry
            .platforms
            .clone()
            .filter(|p| !p.is_empty())
            .or_else(|| (!repo.platforms.is_empty()).then(|| repo.platforms.clone()))
            .or_else(|| (!self.platforms.is_empty()).then(|| self.platforms.clone()))
            .unwrap_or_else(default_platforms);

        ImageDef {
            repository: repository.to_string(),
            name: entry.name.clone(),
            targets,
            platforms,
            stage_platforms,
            eol: entry.eol,
            is_eol: entry.is_eol(today),
            vars: entry.vars.clone(),
        }
    }

    /// イメージ一覧（名前 → 定義）
    pub fn images(&self, filter: EolFilter, today: NaiveDate) -> BTreeMap<String, ImageDef> {
        self.image_list(filter, today)
            .into_iter()
            .map(|image| (image.name.clone(), image))
            .collect()
    }

    /// イメージ一覧（定義順）
    pub fn image_list(&self, filter: EolFilter, today: NaiveDate) -> Vec<ImageDef> {
        self.entries()
            .map(|(name, repo, entry)| self.resolve(name, repo, entry, today))
            .filter(|image| filter == EolFilter::All || !image.is_eol)
            .collect()
    }

    /// 名前でイメージを取得（EOL かどうかは問わない）
    pub fn image(&self, name: &str, today: NaiveDate) -> Result<ImageDef> {
        self.entries()
            .find(|(_, _, entry)| entry.name == name)
            .map(|(repository, repo, entry)| self.resolve(repository, repo, entry, today))
            .ok_or_else(|| CoreError::ImageNotFound(name.to_string()))
    }

    /// bake ターゲット名の一覧
    ///
    /// `image` を指定した場合はそのイメージのみ、省略時はサポート中の全イメージ。
    pub fn task_names(&self, image: Option<&str>, today: NaiveDate) -> Result<Vec<String>> {
        match image {
            Some(name) => Ok(self.image(name, today)?.bake_targets()),
            None => Ok(self
                .image_list(EolFilter::Active, today)
                .iter()
                .flat_map(ImageDef::bake_targets)
                .collect()),
        }
    }

    /// bake ターゲット名からイメージとステージを逆引き
    pub fn find_target(&self, target: &str, today: NaiveDate) -> Option<(ImageDef, String)> {
        self.image_list(EolFilter::All, today)
            .into_iter()
            .find_map(|image| {
                let stage = image
                    .targets
                    .iter()
                    .find(|stage| image.bake_target(stage) == target)
                    .cloned()?;
                Some((image, stage))
            })
    }
}

fn default_platforms() -> Vec<PlatformSpec> {
    FALLBACK_PLATFORM
        .parse::<PlatformSpec>()
        .map(|spec| vec![spec])
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_manifest;

    const MANIFEST: &str = r#"
registry: althack
platforms: [linux/amd64, linux/arm64]
targets: [base, dev]
repositories:
  ros2:
    targets: [base, dev, full]
    entries:
      - name: humble
        eol: 2027-05-31
        ros_distro: humble
      - name: foxy
        eol: 2023-06-20
        ros_distro: foxy
  gazebo:
    platforms: [linux/amd64]
    entries:
      - name: gazebo11
        targets: [base]
"#;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn test_images_excludes_eol_by_default() {
        let manifest = parse_manifest(MANIFEST).unwrap();
        let images = manifest.images(EolFilter::Active, today());
        assert!(images.contains_key("humble"));
        assert!(images.contains_key("gazebo11"));
        assert!(!images.contains_key("foxy"));

        let all = manifest.images(EolFilter::All, today());
        assert_eq!(all.len(), 3);
        assert!(all["foxy"].is_eol);
    }

    #[test]
    fn test_resolve_falls_back_through_levels() {
        let manifest = parse_manifest(MANIFEST).unwrap();
        let humble = manifest.image("humble", today()).unwrap();
        assert_eq!(humble.targets, vec!["base", "dev", "full"]);
        assert_eq!(humble.platforms.len(), 2);

        let gazebo = manifest.image("gazebo11", today()).unwrap();
        assert_eq!(gazebo.targets, vec!["base"]);
        assert_eq!(gazebo.platforms.len(), 1);
    }

    #[test]
    fn test_resolve_uses_fallback_platform() {
        let manifest = parse_manifest("repositories:\n  x:\n    entries:\n      - name: a\n").unwrap();
        let image = manifest.image("a", today()).unwrap();
        assert_eq!(image.platforms[0].to_string(), "linux/amd64");
        assert!(image.targets.is_empty());
    }

    #[test]
    fn test_resolve_stage_platforms() {
        let manifest = parse_manifest(
            r#"
platforms: [linux/amd64, linux/arm64]
repositories:
  ros2:
    targets:
      - base
      - target: gazebo
        platforms: linux/amd64
    entries:
      - name: jazzy
"#,
        )
        .unwrap();
        let jazzy = manifest.image("jazzy", today()).unwrap();
        assert_eq!(jazzy.targets, vec!["base", "gazebo"]);
        assert_eq!(jazzy.platforms_for_stage("base").len(), 2);
        assert_eq!(jazzy.platforms_for_stage("gazebo").len(), 1);
        assert!(!jazzy.stage_platforms.contains_key("base"));
    }

    #[test]
    fn test_image_not_found() {
        let manifest = parse_manifest(MANIFEST).unwrap();
        assert!(matches!(
            manifest.image("kinetic", today()),
            Err(CoreError::ImageNotFound(_))
        ));
    }

    #[test]
    fn test_task_names_order() {
        let manifest = parse_manifest(MANIFEST).unwrap();
        // リポジトリは名前順、エントリは定義順
        let names = manifest.task_names(None, today()).unwrap();
        assert_eq!(
            names,
            vec![
                "gazebo-gazebo11-base",
                "ros2-humble-base",
                "ros2-humble-dev",
                "ros2-humble-full",
            ]
        );

        // 名前指定なら EOL でも取得できる
        let foxy = manifest.task_names(Some("foxy"), today()).unwrap();
        assert_eq!(foxy.len(), 3);
    }

    #[test]
    fn test_find_target() {
        let manifest = parse_manifest(MANIFEST).unwrap();
        let (image, stage) = manifest.find_target("ros2-humble-dev", today()).unwrap();
        assert_eq!(image.name, "humble");
        assert_eq!(stage, "dev");

        assert!(manifest.find_target("ros2-humble-gazebo", today()).is_none());
    }
}
