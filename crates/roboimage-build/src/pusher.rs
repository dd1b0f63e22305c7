//! クラシックビルドしたイメージのプッシュ

use crate::auth::RegistryAuth;
use crate::error::{BuildError, BuildResult};
use crate::reference::ImageRef;
use bollard::Docker;
use bollard::models::PushImageInfo;
use colored::Colorize;
use futures_util::StreamExt;

/// 1 回のプッシュで処理したレイヤー数
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct LayerSummary {
    pushed: usize,
    existing: usize,
}

impl LayerSummary {
    fn record(&mut self, info: &PushImageInfo) {
        match info.status.as_deref() {
            Some("Pushed") => self.pushed += 1,
            Some("Layer already exists") => self.existing += 1,
            _ => {}
        }
    }
}

pub struct ImagePusher {
    docker: Docker,
    auth: RegistryAuth,
}

impl ImagePusher {
    pub fn new(docker: Docker, auth: RegistryAuth) -> Self {
        Self { docker, auth }
    }

    /// `<image>:<tag>` をプッシュし、参照を返す
    pub async fn push(&self, reference: &str) -> BuildResult<String> {
        let image = ImageRef::parse(reference);
        if image.digest.is_some() {
            return Err(BuildError::InvalidTag {
                tag: format!("ダイジェスト参照はプッシュできません: {}", reference),
            });
        }
        let tag = image.tag_or_latest();
        validate_tag(tag)?;

        let credentials = self.auth.credentials_for(&image)?;
        #[allow(deprecated)]
        let options = bollard::image::PushImageOptions::<String> {
            tag: tag.to_string(),
        };

        println!("  → {}", reference.cyan());
        #[allow(deprecated)]
        let mut stream = self
            .docker
            .push_image(&image.repository, Some(options), credentials);

        let mut summary = LayerSummary::default();
        while let Some(result) = stream.next().await {
            let info = result.map_err(|e| BuildError::PushFailed {
                message: e.to_string(),
            })?;
            if let Some(message) = info.error {
                return Err(BuildError::PushFailed { message });
            }
            summary.record(&info);
        }

        println!(
            "  {} {} layers pushed, {} already present",
            "✓".green(),
            summary.pushed,
            summary.existing
        );
        tracing::info!(reference, pushed = summary.pushed, "Pushed image");
        Ok(format!("{}:{}", image.repository, tag))
    }

    pub async fn push_all(&self, references: &[String]) -> BuildResult<Vec<String>> {
        let mut pushed = Vec::with_capacity(references.len());
        for reference in references {
            pushed.push(self.push(reference).await?);
        }
        Ok(pushed)
    }
}

/// タグの形式を検証: `[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}`
pub fn validate_tag(tag: &str) -> BuildResult<()> {
    let invalid = |reason: String| Err(BuildError::InvalidTag { tag: reason });

    let Some(first) = tag.chars().next() else {
        return invalid("(empty)".to_string());
    };
    if tag.len() > 128 {
        return invalid(format!("{} 文字を超えています ({})", 128, tag.len()));
    }
    if first == '.' || first == '-' {
        return invalid(tag.to_string());
    }
    if let Some(c) = tag
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '.' | '-' | '_'))
    {
        return invalid(format!("'{}' は使えません: {}", c, tag));
    }
    Ok(())
}

/// イメージ名とタグを分離（タグがなければ `latest`、ダイジェストは捨てる）
///
/// # Examples
/// - `althack/ros2:humble-base` -> `("althack/ros2", "humble-base")`
/// - `althack/ros2:2024` -> `("althack/ros2", "2024")`
/// - `localhost:5000/app` -> `("localhost:5000/app", "latest")`
pub fn split_image_tag(reference: &str) -> (String, String) {
    let image = ImageRef::parse(reference);
    let tag = image.tag_or_latest().to_string();
    (image.repository, tag)
}
