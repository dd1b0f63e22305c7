use chrono::NaiveDate;
use colored::Colorize;
use roboimage_core::{EolFilter, ImageDef, Manifest};

pub fn handle(
    manifest: &Manifest,
    all: bool,
    repository: Option<&str>,
    json: bool,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let images: Vec<ImageDef> = manifest
        .image_list(EolFilter::include_eol(all), today)
        .into_iter()
        .filter(|image| repository.is_none_or(|r| image.repository == r))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&images)?);
        return Ok(());
    }

    if images.is_empty() {
        println!("{}", "イメージはありません".dimmed());
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "{:<12} {:<16} {:<12} {:<24} {}",
            "REPOSITORY", "NAME", "EOL", "TARGETS", "PLATFORMS"
        )
        .bold()
    );
    println!("{}", "─".repeat(96).dimmed());

    for image in &images {
        let eol = image
            .eol
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        let eol = if image.is_eol { eol.red() } else { eol.normal() };
        let platforms: Vec<String> = image.platforms.iter().map(|p| p.to_string()).collect();

        println!(
            "{:<12} {:<16} {:<12} {:<24} {}",
            image.repository,
            image.name.cyan(),
            eol,
            image.targets.join(","),
            platforms.join(",")
        );
    }
    Ok(())
}
