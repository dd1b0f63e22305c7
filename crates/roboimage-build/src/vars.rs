//! CI ジョブ向けの bake 変数
//!
//! 1 つのプラットフォームでビルドするジョブが `docker buildx bake` に渡す
//! ターゲット名と `--set` 上書き行を計算します。

use crate::error::BuildResult;
use chrono::NaiveDate;
use roboimage_core::{CoreError, Manifest, Platform};

/// ビルド結果の出力方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BakeMode {
    /// ローカルの docker にロード（プラットフォーム別タグ付き）
    #[default]
    Load,
    /// ダイジェストのみでレジストリにプッシュ（後で merge する）
    PushByDigest,
}

/// bake 変数の計算条件
#[derive(Debug, Clone)]
pub struct VarsRequest<'a> {
    pub image: &'a str,
    pub platform: &'a Platform,
    pub stage: Option<&'a str>,
    pub registry: &'a str,
    pub mode: BakeMode,
    /// GitHub Actions キャッシュを使う
    pub gha_cache: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BakeVars {
    pub targets: Vec<String>,
    pub set: Vec<String>,
}

impl BakeVars {
    /// `targets` 出力（空白区切り）
    pub fn targets_value(&self) -> String {
        self.targets.join(" ")
    }

    /// `set` 出力（1 行 1 上書き）
    pub fn set_value(&self) -> String {
        self.set.join("\n")
    }
}

pub fn bake_vars(manifest: &Manifest, request: &VarsRequest<'_>, today: NaiveDate) -> BuildResult<BakeVars> {
    let image = manifest.image(request.image, today)?;

    let unsupported = || CoreError::PlatformNotSupported {
        image: image.name.clone(),
        platform: request.platform.to_string(),
    };

    // ステージ省略時はこのプラットフォームでビルドできるステージだけを対象にする
    let stages: Vec<&String> = match request.stage {
        Some(stage) => {
            let found = image.targets.iter().find(|t| *t == stage).ok_or_else(|| {
                CoreError::StageNotFound {
                    image: image.name.clone(),
                    stage: stage.to_string(),
                    available: image.targets.join(", "),
                }
            })?;
            if !image.stage_supports(found, request.platform) {
                return Err(unsupported().into());
            }
            vec![found]
        }
        None => {
            let stages = image.stages_for(request.platform);
            if stages.is_empty() {
                return Err(unsupported().into());
            }
            stages
        }
    };

    let slug = request.platform.slug();
    let mut vars = BakeVars::default();

    for stage in stages {
        let target = image.bake_target(stage);

        vars.set.push(format!("{}.platform={}", target, request.platform));
        match request.mode {
            BakeMode::Load => {
                vars.set.push(format!(
                    "{}.tags={}-{}",
                    target,
                    image.tagged(request.registry, stage),
                    slug
                ));
                vars.set.push(format!("{}.output=type=docker", target));
            }
            BakeMode::PushByDigest => {
                vars.set.push(format!(
                    "{}.output=type=image,name={},push-by-digest=true,name-canonical=true,push=true",
                    target,
                    image.image_name(request.registry)
                ));
            }
        }
        if request.gha_cache {
            vars.set.push(format!(
                "{}.cache-from=type=gha,scope={}-{}",
                target, target, slug
            ));
            vars.set.push(format!(
                "{}.cache-to=type=gha,mode=max,scope={}-{}",
                target, target, slug
            ));
        }

        vars.targets.push(target);
    }

    tracing::debug!(image = %image.name, targets = vars.targets.len(), "Computed bake vars");
    Ok(vars)
}
