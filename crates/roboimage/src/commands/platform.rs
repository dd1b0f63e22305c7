use chrono::NaiveDate;
use colored::Colorize;
use roboimage_core::{Manifest, Platform, parse_platform_list};

/// 正規化したプラットフォームとスラッグを表示
pub fn handle(values: &[String]) -> anyhow::Result<()> {
    for platform in parse_platform_list(values)? {
        println!("{}\t{}", platform, platform.slug());
    }
    Ok(())
}

/// イメージがサポートするプラットフォームかどうかを表示
///
/// ひとつでも未サポートなら失敗します。
pub fn handle_supported(
    manifest: &Manifest,
    values: &[String],
    image: &str,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let image = manifest.image(image, today)?;
    let platforms: Vec<Platform> = parse_platform_list(values)?;

    let mut unsupported = 0;
    for platform in &platforms {
        if image.supports(platform) {
            println!("{} {}", "✓".green(), platform);
        } else {
            println!("{} {}", "✗".red(), platform);
            unsupported += 1;
        }
    }

    if unsupported > 0 {
        anyhow::bail!(
            "イメージ '{}' は {}個のプラットフォームをサポートしていません",
            image.name,
            unsupported
        );
    }
    Ok(())
}
