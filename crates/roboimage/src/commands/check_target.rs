use crate::github;
use chrono::NaiveDate;
use roboimage_core::Manifest;

/// ステージの有無とビルドプラットフォーム
#[derive(Debug, PartialEq, Eq)]
pub struct TargetCheck {
    pub exists: bool,
    pub platforms: Vec<String>,
}

/// イメージにステージがあるか調べる
///
/// 見つからなくてもエラーにはせず `exists = false` を返します。
pub fn check(
    manifest: &Manifest,
    repository: Option<&str>,
    image: &str,
    stage: &str,
    today: NaiveDate,
) -> TargetCheck {
    let found = manifest
        .image(image, today)
        .ok()
        .filter(|i| repository.is_none_or(|r| i.repository == r))
        .filter(|i| i.has_stage(stage));

    match found {
        Some(image) => TargetCheck {
            exists: true,
            platforms: image
                .stage_build_platforms(stage)
                .iter()
                .map(|p| p.to_string())
                .collect(),
        },
        None => {
            tracing::debug!(image = %image, stage = %stage, "Target not found");
            TargetCheck {
                exists: false,
                platforms: Vec::new(),
            }
        }
    }
}

pub fn handle(
    manifest: &Manifest,
    repository: Option<&str>,
    image: &str,
    stage: &str,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let result = check(manifest, repository, image, stage, today);
    github::write_outputs(&[
        ("exists", result.exists.to_string()),
        ("platforms", result.platforms.join(",")),
    ])
}
