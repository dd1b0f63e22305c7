use crate::github;
use chrono::NaiveDate;
use colored::Colorize;
use roboimage_build::{Merger, collect_metadata, plan_merges};
use roboimage_core::Manifest;
use std::path::Path;

pub fn handle(
    manifest: &Manifest,
    metadata_dir: &Path,
    dry_run: bool,
    inspect: bool,
    today: NaiveDate,
) -> anyhow::Result<()> {
    println!("{}", "マルチアーキテクチャマニフェストを作成中...".green());

    let digests = collect_metadata(metadata_dir).map_err(|e| anyhow::anyhow!(e.user_message()))?;
    let (plans, skipped) = plan_merges(manifest, &digests, today);

    for target in &skipped {
        println!("  {} 不明なターゲットをスキップ: {}", "⚠".yellow(), target);
    }
    if plans.is_empty() {
        println!("{}", "統合するダイジェストはありません".dimmed());
        return Ok(());
    }

    Merger { dry_run, inspect }
        .run(&plans)
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    println!(
        "{}",
        format!("✓ {}個のマニフェストを作成しました", plans.len())
            .green()
            .bold()
    );

    let tags: Vec<&str> = plans
        .iter()
        .flat_map(|plan| plan.tags.iter().map(String::as_str))
        .collect();
    github::write_outputs(&[("tags", tags.join("\n"))])
}
