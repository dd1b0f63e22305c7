//! docker buildx bake 定義ファイル（JSON 形式）

use crate::model::{ImageDef, Manifest};
use crate::views::EolFilter;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 生成される bake ファイル名
pub const BAKE_FILE_NAME: &str = "docker-bake.json";

/// 全アクティブイメージを含むグループ
pub const DEFAULT_GROUP: &str = "default";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BakeFile {
    pub group: BTreeMap<String, BakeGroup>,
    pub target: BTreeMap<String, BakeTarget>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BakeGroup {
    pub targets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BakeTarget {
    /// ビルドコンテキスト（リポジトリディレクトリ）
    pub context: String,
    /// コンテキストからの相対パス
    pub dockerfile: String,
    pub target: String,
    pub platforms: Vec<String>,
    pub tags: Vec<String>,
}

impl BakeFile {
    /// マニフェストから bake 定義を組み立てる
    ///
    /// EOL イメージもターゲットとしては定義し（名前指定でビルド可能）、
    /// `default` グループにはサポート中のイメージのみを含めます。
    pub fn from_manifest(manifest: &Manifest, registry: &str, today: NaiveDate) -> Self {
        let mut bake = BakeFile::default();
        let mut default_targets = Vec::new();

        for image in manifest.image_list(EolFilter::All, today) {
            let targets = image.bake_targets();

            for stage in &image.targets {
                bake.target
                    .insert(image.bake_target(stage), bake_target(&image, registry, stage));
            }

            bake.group
                .entry(image.repository.clone())
                .or_default()
                .targets
                .extend(targets.iter().cloned());
            if !image.is_eol {
                default_targets.extend(targets.iter().cloned());
            }
            bake.group
                .insert(image.bake_group(), BakeGroup { targets });
        }

        bake.group.insert(
            DEFAULT_GROUP.to_string(),
            BakeGroup {
                targets: default_targets,
            },
        );
        bake
    }
}

fn bake_target(image: &ImageDef, registry: &str, stage: &str) -> BakeTarget {
    BakeTarget {
        context: image.repository.clone(),
        dockerfile: image.dockerfile(),
        target: stage.to_string(),
        platforms: image
            .stage_build_platforms(stage)
            .iter()
            .map(|p| p.to_string())
            .collect(),
        tags: vec![image.tagged(registry, stage)],
    }
}
