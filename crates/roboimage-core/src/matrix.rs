//! CI ビルドマトリクスの生成
//!
//! GitHub Actions の `strategy.matrix` にそのまま渡せる
//! `{"include": [...]}` 形式を、イメージ × プラットフォーム（× ステージ）で展開します。

use crate::model::Manifest;
use crate::platform::Platform;
use crate::views::EolFilter;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// マトリクスの絞り込み条件
#[derive(Debug, Clone, Default)]
pub struct MatrixFilter {
    /// 対象リポジトリ（空なら全て）
    pub repositories: Vec<String>,
    /// 対象イメージ名（空なら全て）
    pub images: Vec<String>,
    /// 要求プラットフォーム（空ならエントリの宣言どおり）
    pub platforms: Vec<Platform>,
    /// ステージごとにジョブを分ける
    pub per_stage: bool,
    pub include_eol: bool,
    /// 変更された `(リポジトリ, イメージ名)`（空なら絞り込まない）
    pub changed: BTreeSet<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixEntry {
    pub repository: String,
    pub name: String,
    pub platform: String,
    pub platform_slug: String,
    pub runner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matrix {
    pub include: Vec<MatrixEntry>,
}

impl Matrix {
    pub fn is_empty(&self) -> bool {
        self.include.is_empty()
    }

    pub fn len(&self) -> usize {
        self.include.len()
    }

    /// マトリクスに含まれるリポジトリ（名前順）
    pub fn repositories(&self) -> Vec<String> {
        self.include
            .iter()
            .map(|entry| entry.repository.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// 変更されたファイル一覧から `(リポジトリ, イメージ名)` を取り出す
///
/// カンマまたは改行区切りのパスのうち `<repo>/<name>.Dockerfile` の形のものだけを
/// 対象にします。
pub fn parse_changed(raw: &str) -> BTreeSet<(String, String)> {
    raw.lines()
        .flat_map(|line| line.split(','))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| {
            let path = Path::new(token);
            if path.extension()? != "Dockerfile" {
                return None;
            }
            let name = path.file_stem()?.to_str()?;
            let repository = path.parent()?.file_name()?.to_str()?;
            Some((repository.to_string(), name.to_string()))
        })
        .collect()
}

impl Manifest {
    #[tracing::instrument(skip(self))]
    pub fn workflow_matrix(&self, filter: &MatrixFilter, today: NaiveDate) -> Matrix {
        let mut include = Vec::new();

        // 名前で明示された場合は EOL でも対象にする
        let eol = EolFilter::include_eol(filter.include_eol || !filter.images.is_empty());
        let images = self
            .image_list(eol, today)
            .into_iter()
            .filter(|image| {
                filter.repositories.is_empty() || filter.repositories.contains(&image.repository)
            })
            .filter(|image| filter.images.is_empty() || filter.images.contains(&image.name))
            .filter(|image| {
                filter.changed.is_empty()
                    || filter
                        .changed
                        .contains(&(image.repository.clone(), image.name.clone()))
            });

        for image in images {
            let platforms = image.build_platforms(&filter.platforms);
            if platforms.is_empty() {
                tracing::debug!(image = %image.name, "No matching platform, skipping");
            }

            for platform in &platforms {
                let base = MatrixEntry {
                    repository: image.repository.clone(),
                    name: image.name.clone(),
                    platform: platform.to_string(),
                    platform_slug: platform.slug(),
                    runner: self.runner_for(platform).to_string(),
                    target: None,
                };

                if filter.per_stage {
                    for stage in image.stages_for(platform) {
                        include.push(MatrixEntry {
                            target: Some(stage.clone()),
                            ..base.clone()
                        });
                    }
                } else {
                    include.push(base);
                }
            }
        }

        tracing::debug!(jobs = include.len(), "Matrix computed");
        Matrix { include }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_manifest;

    const MANIFEST: &str = r#"
platforms: [linux/amd64, linux/arm64]
targets: [base, dev]
default_runner: ubuntu-22.04
runners:
  - platform: linux/arm64
    runner: ubuntu-24.04-arm
  - platform: linux/arm/*
    runner: arm32-runner
repositories:
  ros:
    entries:
      - name: noetic
        eol: 2025-05-31
        platforms: [linux/amd64, linux/arm64, linux/arm/*]
  ros2:
    entries:
      - name: humble
      - name: jazzy
        targets: [base]
"#;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn test_matrix_per_image_and_platform() {
        let manifest = parse_manifest(MANIFEST).unwrap();
        let matrix = manifest.workflow_matrix(&MatrixFilter::default(), today());

        // noetic はワイルドカード宣言を除いた 2 プラットフォーム
        assert_eq!(matrix.len(), 6);
        let first = &matrix.include[0];
        assert_eq!(first.repository, "ros");
        assert_eq!(first.name, "noetic");
        assert_eq!(first.platform, "linux/amd64");
        assert_eq!(first.platform_slug, "linux-amd64");
        assert_eq!(first.runner, "ubuntu-22.04");
        assert_eq!(first.target, None);

        let arm = &matrix.include[1];
        assert_eq!(arm.platform, "linux/arm64");
        assert_eq!(arm.runner, "ubuntu-24.04-arm");
    }

    #[test]
    fn test_matrix_per_stage() {
        let manifest = parse_manifest(MANIFEST).unwrap();
        let filter = MatrixFilter {
            repositories: vec!["ros2".to_string()],
            per_stage: true,
            ..Default::default()
        };
        let matrix = manifest.workflow_matrix(&filter, today());
        // humble: 2 platforms x 2 stages, jazzy: 2 platforms x 1 stage
        assert_eq!(matrix.len(), 6);
        assert!(
            matrix
                .include
                .iter()
                .all(|entry| entry.target.is_some() && entry.repository == "ros2")
        );
    }

    #[test]
    fn test_matrix_requested_platform_matches_wildcard() {
        let manifest = parse_manifest(MANIFEST).unwrap();
        let filter = MatrixFilter {
            images: vec!["noetic".to_string(), "humble".to_string()],
            platforms: vec!["linux/arm/v7".parse().unwrap()],
            ..Default::default()
        };
        let matrix = manifest.workflow_matrix(&filter, today());
        assert_eq!(matrix.len(), 1);
        assert_eq!(matrix.include[0].name, "noetic");
        assert_eq!(matrix.include[0].runner, "arm32-runner");
    }

    #[test]
    fn test_matrix_excludes_eol_unless_requested() {
        let manifest = parse_manifest(MANIFEST).unwrap();
        let later = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();

        let matrix = manifest.workflow_matrix(&MatrixFilter::default(), later);
        assert!(matrix.include.iter().all(|e| e.name != "noetic"));

        let filter = MatrixFilter {
            include_eol: true,
            ..Default::default()
        };
        let matrix = manifest.workflow_matrix(&filter, later);
        assert!(matrix.include.iter().any(|e| e.name == "noetic"));
    }

    #[test]
    fn test_matrix_per_stage_respects_stage_platforms() {
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
        let filter = MatrixFilter {
            per_stage: true,
            ..Default::default()
        };
        let matrix = manifest.workflow_matrix(&filter, today());
        let jobs: Vec<(String, String)> = matrix
            .include
            .iter()
            .map(|e| (e.platform.clone(), e.target.clone().unwrap()))
            .collect();
        assert_eq!(
            jobs,
            vec![
                ("linux/amd64".to_string(), "base".to_string()),
                ("linux/amd64".to_string(), "gazebo".to_string()),
                ("linux/arm64".to_string(), "base".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_changed() {
        let changed = parse_changed(
            "ros2/humble.Dockerfile, ros/noetic.Dockerfile\nREADME.md\nros2/template/x.jinja\nhumble.Dockerfile\n",
        );
        let expected: BTreeSet<(String, String)> = [
            ("ros".to_string(), "noetic".to_string()),
            ("ros2".to_string(), "humble".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(changed, expected);
    }

    #[test]
    fn test_matrix_changed_filter() {
        let manifest = parse_manifest(MANIFEST).unwrap();
        let filter = MatrixFilter {
            changed: parse_changed("ros2/jazzy.Dockerfile"),
            ..Default::default()
        };
        let matrix = manifest.workflow_matrix(&filter, today());
        assert_eq!(matrix.len(), 2);
        assert!(matrix.include.iter().all(|e| e.name == "jazzy"));
        assert_eq!(matrix.repositories(), vec!["ros2"]);

        let all = manifest.workflow_matrix(&MatrixFilter::default(), today());
        assert_eq!(all.repositories(), vec!["ros", "ros2"]);
    }

    #[test]
    fn test_matrix_serializes_without_target() {
        let manifest = parse_manifest(MANIFEST).unwrap();
        let filter = MatrixFilter {
            images: vec!["jazzy".to_string()],
            platforms: vec!["linux/amd64".parse().unwrap()],
            ..Default::default()
        };
        let json = serde_json::to_value(manifest.workflow_matrix(&filter, today())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"include": [{
                "repository": "ros2",
                "name": "jazzy",
                "platform": "linux/amd64",
                "platform_slug": "linux-amd64",
                "runner": "ubuntu-22.04"
            }]})
        );
    }
}
