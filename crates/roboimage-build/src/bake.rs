//! docker buildx bake によるビルド

use crate::command::{DockerCommand, prune_command};
use crate::error::BuildResult;
use crate::plan::BuildJob;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// `docker buildx bake` の実行設定
#[derive(Debug, Clone)]
pub struct BakeOptions {
    pub bake_file: PathBuf,
    /// bake ファイル内の相対コンテキストの基準（templates.yml のあるディレクトリ）
    pub working_dir: PathBuf,
    /// true なら `--push`、false なら `--load`
    pub push: bool,
    pub dry_run: bool,
}

/// ビルド単位ごとの bake コマンドを組み立てる
///
/// `docker buildx bake --file <bake> --debug (--push|--load) [--set <t>.tags=a,b] <t>`
pub fn bake_command(bake_file: &Path, push: bool, job: &BuildJob) -> DockerCommand {
    let mut cmd = DockerCommand::docker()
        .args(["buildx", "bake", "--file"])
        .arg(bake_file.display().to_string())
        .arg("--debug")
        .arg(if push { "--push" } else { "--load" });

    if !job.tags.is_empty() {
        cmd = cmd
            .arg("--set")
            .arg(format!("{}.tags={}", job.target, job.tags.join(",")));
    }
    cmd.arg(job.target.clone())
}

pub struct BakeDriver {
    options: BakeOptions,
}

impl BakeDriver {
    pub fn new(options: BakeOptions) -> Self {
        Self { options }
    }

    /// 計画されたビルドを順番に実行
    ///
    /// 最初に失敗したビルドで中断します。
    pub fn run(&self, jobs: &[BuildJob]) -> BuildResult<()> {
        for (index, job) in jobs.iter().enumerate() {
            let cmd = bake_command(&self.options.bake_file, self.options.push, job)
                .current_dir(&self.options.working_dir);

            println!(
                "{} [{}/{}] {}",
                "▶".blue(),
                index + 1,
                jobs.len(),
                job.target.cyan()
            );
            for tag in &job.tags {
                println!("  → {}", tag);
            }

            self.execute(&cmd)?;
            tracing::info!(bake_target = %job.target, push = self.options.push, "Bake finished");
        }
        Ok(())
    }

    /// ビルドキャッシュを削除
    pub fn prune(&self) -> BuildResult<()> {
        println!("{}", "Docker のキャッシュを削除中...".dimmed());
        self.execute(&prune_command())
    }

    fn execute(&self, cmd: &DockerCommand) -> BuildResult<()> {
        if self.options.dry_run {
            println!("  {} {}", "$".dimmed(), cmd);
            return Ok(());
        }
        cmd.run()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use roboimage_core::parse_manifest;

    fn job(tags: Vec<&str>) -> BuildJob {
        let manifest = parse_manifest(
            "repositories:\n  ros2:\n    targets: [base]\n    entries:\n      - name: humble\n",
        )
        .unwrap();
        let image = manifest
            .image("humble", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .unwrap();
        BuildJob {
            target: image.bake_target("base"),
            stage: "base".to_string(),
            image,
            tags: tags.into_iter().map(String::from).collect(),
        }
    }

    #[test]
    fn test_bake_command_load() {
        let cmd = bake_command(
            Path::new("docker-bake.json"),
            false,
            &job(vec!["althack/ros2:humble-base"]),
        );
        assert_eq!(
            cmd.to_string(),
            "docker buildx bake --file docker-bake.json --debug --load \
             --set ros2-humble-base.tags=althack/ros2:humble-base ros2-humble-base"
        );
    }

    #[test]
    fn test_bake_command_push_with_dated_tag() {
        let cmd = bake_command(
            Path::new("out/docker-bake.json"),
            true,
            &job(vec![
                "althack/ros2:humble-base",
                "althack/ros2:humble-base-2024-01-01",
            ]),
        );
        assert!(cmd.args.contains(&"--push".to_string()));
        assert!(cmd.args.contains(
            &"ros2-humble-base.tags=althack/ros2:humble-base,althack/ros2:humble-base-2024-01-01"
                .to_string()
        ));
        assert_eq!(cmd.args.last().map(String::as_str), Some("ros2-humble-base"));
    }

    #[test]
    fn test_bake_command_without_tags() {
        let cmd = bake_command(Path::new("docker-bake.json"), false, &job(vec![]));
        assert!(!cmd.args.contains(&"--set".to_string()));
    }

    #[test]
    fn test_dry_run_does_not_execute() {
        let driver = BakeDriver::new(BakeOptions {
            bake_file: PathBuf::from("docker-bake.json"),
            working_dir: PathBuf::from("."),
            push: false,
            dry_run: true,
        });
        assert!(driver.run(&[job(vec!["althack/ros2:humble-base"])]).is_ok());
        assert!(driver.prune().is_ok());
    }
}
