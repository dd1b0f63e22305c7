use crate::error::{BuildError, BuildResult};
use crate::pusher::split_image_tag;
use bollard::Docker;
use colored::Colorize;
use futures_util::stream::StreamExt;
use std::collections::HashMap;

/// Docker Engine API によるクラシックビルド
pub struct ImageBuilder {
    docker: Docker,
}

/// 1 回のビルドの指定
#[derive(Debug, Clone)]
pub struct BuildSpec<'a> {
    /// コンテキスト内の Dockerfile 名（例: `humble.Dockerfile`）
    pub dockerfile: &'a str,
    /// 付与するタグ。先頭をビルド時に、残りはビルド後に付ける
    pub tags: &'a [String],
    pub target: &'a str,
    pub labels: HashMap<String, String>,
}

impl ImageBuilder {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// イメージをビルド
    pub async fn build_image(&self, context_data: Vec<u8>, spec: &BuildSpec<'_>) -> BuildResult<()> {
        let Some(primary) = spec.tags.first() else {
            return Err(BuildError::InvalidTag {
                tag: "(empty)".to_string(),
            });
        };
        tracing::info!("Building image: {}", primary);

        let labels: HashMap<&str, &str> = spec
            .labels
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        #[allow(deprecated)]
        let options = bollard::image::BuildImageOptions {
            dockerfile: spec.dockerfile,
            t: primary.as_str(),
            target: spec.target,
            labels,
            rm: true,      // 中間コンテナを削除
            forcerm: true, // ビルド失敗時も中間コンテナを削除
            pull: true,    // ベースイメージを常にpull
            ..Default::default()
        };
        tracing::debug!("Build options: {:?}", options);

        use bytes::Bytes;
        use http_body_util::{Either, Full};
        let body = Full::new(Bytes::from(context_data));
        #[allow(deprecated)]
        let mut stream = self
            .docker
            .build_image(options, None, Some(Either::Left(body)));

        while let Some(msg) = stream.next().await {
            self.handle_build_output(msg?)?;
        }

        for extra in &spec.tags[1..] {
            self.tag(primary, extra).await?;
        }

        tracing::info!("Successfully built: {}", primary);
        Ok(())
    }

    /// 既存イメージに別名を付ける
    async fn tag(&self, source: &str, reference: &str) -> BuildResult<()> {
        let (repo, tag) = split_image_tag(reference);
        #[allow(deprecated)]
        let options = bollard::image::TagImageOptions { repo, tag };
        #[allow(deprecated)]
        self.docker.tag_image(source, Some(options)).await?;
        println!("  {} {}", "tag".dimmed(), reference);
        Ok(())
    }

    fn handle_build_output(&self, output: bollard::models::BuildInfo) -> BuildResult<()> {
        if let Some(stream) = output.stream {
            print!("{}", stream);
        }

        if let Some(error) = output.error {
            return Err(BuildError::BuildFailed(error));
        }

        if let Some(error_detail) = output.error_detail {
            let error_msg = error_detail
                .message
                .unwrap_or_else(|| "Unknown build error".to_string());
            return Err(BuildError::BuildFailed(error_msg));
        }

        if let Some(status) = output.status {
            // ベースイメージの pull 状況など
            println!("{}", status.cyan());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextBuilder;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    #[ignore] // Docker接続が必要なため、通常のテストではスキップ
    async fn test_build_stage_with_two_tags() {
        let docker = Docker::connect_with_local_defaults().unwrap();
        let builder = ImageBuilder::new(docker);

        let temp_dir = tempdir().unwrap();
        fs::write(
            temp_dir.path().join("test.Dockerfile"),
            "FROM alpine:latest AS base\nCMD echo base\nFROM base AS dev\nCMD echo dev",
        )
        .unwrap();
        let context = ContextBuilder::create_context(temp_dir.path(), "test.Dockerfile").unwrap();

        let tags = vec![
            "roboimage-test/ros2:test-base".to_string(),
            "roboimage-test/ros2:test-base-2024-01-01".to_string(),
        ];
        let spec = BuildSpec {
            dockerfile: "test.Dockerfile",
            tags: &tags,
            target: "base",
            labels: HashMap::from([("version".to_string(), "2024-01-01".to_string())]),
        };
        builder.build_image(context, &spec).await.unwrap();

        for tag in &tags {
            builder.docker.remove_image(tag, None::<bollard::query_parameters::RemoveImageOptions>, None).await.ok();
        }
    }
}
