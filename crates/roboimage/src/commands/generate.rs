use crate::utils;
use chrono::NaiveDate;
use colored::Colorize;
use roboimage_core::{GenerateOptions, GenerateReport, Generator, LoadedManifest};
use std::path::PathBuf;

pub struct GenerateArgs {
    pub output: Option<PathBuf>,
    pub template_dir: Option<PathBuf>,
    pub registry: String,
    pub options: GenerateOptions,
}

pub fn handle(
    loaded: &LoadedManifest,
    args: &GenerateArgs,
    today: NaiveDate,
) -> anyhow::Result<GenerateReport> {
    println!("{}", "テンプレートからファイルを生成中...".green());
    utils::print_loaded_manifest(loaded);

    let template_dir = args
        .template_dir
        .clone()
        .unwrap_or_else(|| loaded.template_dir());
    let output = args.output.clone().unwrap_or_else(|| loaded.root.clone());
    println!("レジストリ: {}", args.registry.cyan());

    let generator = Generator::new(
        &loaded.manifest,
        &template_dir,
        &output,
        &args.registry,
        today,
    )?;
    let report = generator.run(args.options)?;

    for path in report.written() {
        println!("  {} {}", "✓".green(), path.display());
    }
    println!(
        "{}",
        format!(
            "✓ {}個のファイルを生成しました（サポート中のイメージ: {}個）",
            report.written().count(),
            generator.active_image_count()
        )
        .green()
        .bold()
    );

    Ok(report)
}
