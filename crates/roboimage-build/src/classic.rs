//! `--backend docker`: Docker Engine API を直接使ったビルドとプッシュ

use crate::builder::{BuildSpec, ImageBuilder};
use crate::context::ContextBuilder;
use crate::error::BuildResult;
use crate::plan::BuildJob;
use crate::progress::BuildProgress;
use crate::pusher::ImagePusher;
use chrono::NaiveDate;
use colored::Colorize;
use std::collections::HashMap;
use std::path::PathBuf;

pub struct ClassicBuilder {
    builder: ImageBuilder,
    pusher: ImagePusher,
    /// 生成物のルート（`<output>/<repo>` がコンテキストになる）
    output_dir: PathBuf,
    version: NaiveDate,
    push: bool,
}

impl ClassicBuilder {
    pub fn new(
        builder: ImageBuilder,
        pusher: ImagePusher,
        output_dir: PathBuf,
        version: NaiveDate,
        push: bool,
    ) -> Self {
        Self {
            builder,
            pusher,
            output_dir,
            version,
            push,
        }
    }

    pub async fn run(&self, jobs: &[BuildJob]) -> BuildResult<()> {
        for (index, job) in jobs.iter().enumerate() {
            println!(
                "{} [{}/{}] {}",
                "▶".blue(),
                index + 1,
                jobs.len(),
                job.target.cyan()
            );
            self.build(job).await?;

            if self.push {
                println!("{}", "レジストリにプッシュ中...".green());
                self.pusher.push_all(&job.tags).await?;
            }
        }
        Ok(())
    }

    async fn build(&self, job: &BuildJob) -> BuildResult<()> {
        let context_dir = self.output_dir.join(&job.image.repository);
        let dockerfile = job.image.dockerfile();

        let progress = BuildProgress::new(&job.target);
        let context = match ContextBuilder::create_context(&context_dir, &dockerfile) {
            Ok(context) => {
                progress.finish(&format!("コンテキスト {} bytes", context.len()));
                context
            }
            Err(e) => {
                progress.finish_error(&e.to_string());
                return Err(e);
            }
        };

        let spec = BuildSpec {
            dockerfile: &dockerfile,
            tags: &job.tags,
            target: &job.stage,
            labels: version_labels(self.version),
        };
        self.builder.build_image(context, &spec).await
    }
}

/// イメージに付ける `version=<YYYY-MM-DD>` ラベル
pub fn version_labels(version: NaiveDate) -> HashMap<String, String> {
    HashMap::from([(
        "version".to_string(),
        version.format("%Y-%m-%d").to_string(),
    )])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_labels() {
        let labels = version_labels(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(labels.get("version").map(String::as_str), Some("2024-02-29"));
        assert_eq!(labels.len(), 1);
    }
}
