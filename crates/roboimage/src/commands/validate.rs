use crate::utils;
use colored::Colorize;
use roboimage_core::{EolFilter, LoadedManifest, Severity, TemplateProcessor, has_errors};

pub fn handle(loaded: &LoadedManifest) -> anyhow::Result<()> {
    println!("{}", "設定を検証中...".blue());
    utils::print_loaded_manifest(loaded);

    let template_dir = loaded.template_dir();
    let templates = if template_dir.is_dir() {
        Some(TemplateProcessor::from_dir(&template_dir)?)
    } else {
        println!(
            "  {} テンプレートディレクトリがありません: {}",
            "⚠".yellow(),
            template_dir.display()
        );
        None
    };

    let issues = loaded.manifest.validate(templates.as_ref());
    for issue in &issues {
        match issue.severity {
            Severity::Error => eprintln!("  {} {}", "✗".red(), issue.message),
            Severity::Warning => eprintln!("  {} {}", "⚠".yellow(), issue.message),
        }
    }

    if has_errors(&issues) {
        eprintln!();
        eprintln!("{}", "✗ 設定エラー".red().bold());
        anyhow::bail!("templates.yml の検証に失敗しました");
    }

    let today = roboimage_core::today();
    let manifest = &loaded.manifest;
    println!("{}", "✓ 設定ファイルは正常です！".green().bold());
    println!();
    println!("サマリー:");
    println!("  リポジトリ: {}個", manifest.repositories.len());
    for (name, repo) in &manifest.repositories {
        println!("    - {} ({}個のエントリ)", name.cyan(), repo.entries.len());
    }
    println!(
        "  イメージ: {}個（サポート中: {}個）",
        manifest.image_list(EolFilter::All, today).len(),
        manifest.image_list(EolFilter::Active, today).len()
    );
    Ok(())
}
