//! プラットフォーム別ダイジェストのマルチアーキテクチャマニフェストへの統合
//!
//! `docker buildx bake --metadata-file` が出力した JSON を集め、
//! bake ターゲットごとに `docker buildx imagetools create` を実行します。

use crate::command::DockerCommand;
use crate::error::{BuildError, BuildResult};
use crate::reference::ImageRef;
use chrono::NaiveDate;
use colored::Colorize;
use roboimage_core::Manifest;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

const DIGEST_KEY: &str = "containerimage.digest";
const DESCRIPTOR_KEY: &str = "containerimage.descriptor";
/// イメージ名を探すキー（先頭から）
const NAME_KEYS: [&str; 3] = ["image.name", "containerimage.name", "name"];

/// ターゲット → イメージリポジトリ → ソース参照（`<repo>@<digest>`）の集合
pub type DigestMap = BTreeMap<String, BTreeMap<String, BTreeSet<String>>>;

/// ディレクトリ以下（再帰）のメタデータ JSON をすべて読み込む
#[tracing::instrument(skip(dir), fields(dir = %dir.display()))]
pub fn collect_metadata(dir: &Path) -> BuildResult<DigestMap> {
    if !dir.is_dir() {
        return Err(BuildError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("メタデータディレクトリが見つかりません: {}", dir.display()),
        )));
    }

    let pattern = format!("{}/**/*.json", dir.display());
    let paths = glob::glob(&pattern).map_err(|e| BuildError::InvalidMetadata {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut digests = DigestMap::new();
    let mut files = 0;
    for entry in paths {
        let path = entry.map_err(|e| BuildError::Io(e.into_error()))?;
        let content = std::fs::read_to_string(&path)?;
        add_metadata(&mut digests, &content).map_err(|e| BuildError::InvalidMetadata {
            path: path.clone(),
            message: e.to_string(),
        })?;
        files += 1;
    }

    tracing::info!(files, targets = digests.len(), "Collected bake metadata");
    Ok(digests)
}

/// 1 つのメタデータ JSON を集計に加える
///
/// オブジェクト以外の値（`buildx.build.warnings` など）は無視します。
pub fn add_metadata(digests: &mut DigestMap, content: &str) -> serde_json::Result<()> {
    let metadata: BTreeMap<String, serde_json::Value> = serde_json::from_str(content)?;

    for (target, value) in metadata {
        let Some(object) = value.as_object() else {
            continue;
        };
        let digest = object
            .get(DIGEST_KEY)
            .or_else(|| object.get(DESCRIPTOR_KEY)?.get("digest"))
            .and_then(|v| v.as_str());
        let Some(digest) = digest else {
            tracing::warn!(target_name = %target, "No digest in metadata, skipping");
            continue;
        };
        let names = NAME_KEYS
            .iter()
            .find_map(|key| object.get(*key)?.as_str().filter(|n| !n.trim().is_empty()));
        let Some(names) = names else {
            tracing::warn!(target_name = %target, "No image name in metadata, skipping");
            continue;
        };

        for name in names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            let image = ImageRef::parse(name);
            let source = image.pinned(digest);
            digests
                .entry(target.clone())
                .or_default()
                .entry(image.repository)
                .or_default()
                .insert(source);
        }
    }
    Ok(())
}

/// 1 つのマルチアーキテクチャマニフェストの作成計画
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    pub target: String,
    pub image: String,
    pub tags: Vec<String>,
    /// `<image>@<digest>`（メタデータがダイジェスト参照ならそのまま）
    pub sources: Vec<String>,
}

impl MergePlan {
    pub fn create_command(&self) -> DockerCommand {
        let mut cmd = DockerCommand::docker().args(["buildx", "imagetools", "create"]);
        for tag in &self.tags {
            cmd = cmd.arg("-t").arg(tag.clone());
        }
        cmd.args(self.sources.iter().cloned())
    }

    pub fn inspect_command(&self) -> Option<DockerCommand> {
        self.tags.first().map(|tag| {
            DockerCommand::docker()
                .args(["buildx", "imagetools", "inspect"])
                .arg(tag.clone())
        })
    }
}

/// 集計結果から作成計画を立てる
///
/// マニフェストで解決できないターゲットはスキップし、その名前を返します。
pub fn plan_merges(
    manifest: &Manifest,
    digests: &DigestMap,
    today: NaiveDate,
) -> (Vec<MergePlan>, Vec<String>) {
    let mut plans = Vec::new();
    let mut skipped = Vec::new();

    for (target, images) in digests {
        let Some((image_def, stage)) = manifest.find_target(target, today) else {
            tracing::warn!(target_name = %target, "Unknown bake target, skipping");
            skipped.push(target.clone());
            continue;
        };

        let tag = image_def.tag(&stage);
        for (image, set) in images {
            plans.push(MergePlan {
                target: target.clone(),
                image: image.clone(),
                tags: vec![
                    format!("{}:{}", image, tag),
                    format!("{}:{}-{}", image, tag, today.format("%Y-%m-%d")),
                ],
                sources: set.iter().cloned().collect(),
            });
        }
    }

    (plans, skipped)
}

pub struct Merger {
    pub dry_run: bool,
    pub inspect: bool,
}

impl Merger {
    /// 計画を順番に実行
    ///
    /// dry-run ではコマンドを表示するだけで docker は呼びません。
    pub fn run(&self, plans: &[MergePlan]) -> BuildResult<()> {
        for plan in plans {
            println!("{} {}", "▶".blue(), plan.target.cyan());
            for tag in &plan.tags {
                println!("  → {}", tag);
            }

            self.execute(&plan.create_command())?;
            if self.inspect
                && let Some(cmd) = plan.inspect_command()
            {
                self.execute(&cmd)?;
            }
        }
        Ok(())
    }

    fn execute(&self, cmd: &DockerCommand) -> BuildResult<()> {
        if self.dry_run {
            println!("  {} {}", "$".dimmed(), cmd);
            return Ok(());
        }
        cmd.run()
    }
}
