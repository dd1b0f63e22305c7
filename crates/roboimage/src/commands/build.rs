use crate::commands::generate::{self, GenerateArgs};
use crate::docker;
use chrono::NaiveDate;
use colored::Colorize;
use roboimage_build::{
    BakeDriver, BakeOptions, BuildJob, BuildSelection, ClassicBuilder, ImageBuilder, ImagePusher,
    RegistryAuth, plan_builds, prune_command,
};
use std::path::PathBuf;
use roboimage_core::{BAKE_FILE_NAME, GenerateOptions, LoadedManifest};

pub struct BuildArgs {
    /// イメージ名または `all`
    pub image: String,
    pub target: Option<String>,
    pub registry: String,
    pub push: bool,
    pub clean: bool,
    pub generate: bool,
    /// Docker Engine API でビルドする
    pub classic: bool,
    /// DOCKER_USERNAME / DOCKER_PASSWORD で認証する
    pub auth: bool,
    pub credentials: Option<(String, String)>,
    /// DOCKER_CONFIG
    pub docker_config: Option<PathBuf>,
    pub dry_run: bool,
}

pub async fn handle(loaded: &LoadedManifest, args: &BuildArgs, today: NaiveDate) -> anyhow::Result<()> {
    if args.generate && args.dry_run {
        println!("{}", "--dry-run のためファイル生成をスキップします".dimmed());
    } else if args.generate {
        generate::handle(
            loaded,
            &GenerateArgs {
                output: None,
                template_dir: None,
                registry: args.registry.clone(),
                options: GenerateOptions::default(),
            },
            today,
        )?;
        println!();
    }

    println!("{}", "Dockerイメージをビルド中...".green());
    println!("レジストリ: {}", args.registry.cyan());
    if args.push {
        println!("{}", "ビルド後にプッシュします".yellow());
    }

    let jobs = plan_builds(
        &loaded.manifest,
        &BuildSelection {
            image: &args.image,
            stage: args.target.as_deref(),
            registry: &args.registry,
            dated_tags: args.push,
            today,
        },
    )
    .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    if args.classic {
        build_classic(loaded, args, &jobs, today).await?;
    } else {
        build_bake(loaded, args, &jobs)?;
    }

    println!();
    println!(
        "{}",
        format!("✓ {}個のターゲットをビルドしました", jobs.len())
            .green()
            .bold()
    );
    Ok(())
}

fn build_bake(loaded: &LoadedManifest, args: &BuildArgs, jobs: &[BuildJob]) -> anyhow::Result<()> {
    let driver = BakeDriver::new(BakeOptions {
        bake_file: loaded.root.join(BAKE_FILE_NAME),
        working_dir: loaded.root.clone(),
        push: args.push,
        dry_run: args.dry_run,
    });

    driver
        .run(jobs)
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    if args.clean {
        driver
            .prune()
            .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    }
    Ok(())
}

async fn build_classic(
    loaded: &LoadedManifest,
    args: &BuildArgs,
    jobs: &[BuildJob],
    today: NaiveDate,
) -> anyhow::Result<()> {
    if args.dry_run {
        for job in jobs {
            println!("  {} {} ({})", "$".dimmed(), job.target, job.tags.join(", "));
        }
        return Ok(());
    }

    let mut auth = RegistryAuth::from_config_dir(args.docker_config.as_deref());
    if args.auth {
        let Some((username, password)) = &args.credentials else {
            anyhow::bail!(
                "--auth には {} と {} の設定が必要です",
                roboimage_config::USERNAME_ENV,
                roboimage_config::PASSWORD_ENV
            );
        };
        auth = auth.with_credentials(username, password);
    }

    let docker_conn = docker::init_docker_with_error_handling().await?;

    let builder = ClassicBuilder::new(
        ImageBuilder::new(docker_conn.clone()),
        ImagePusher::new(docker_conn, auth),
        loaded.root.clone(),
        today,
        args.push,
    );
    builder
        .run(jobs)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    if args.clean {
        println!("{}", "Docker のキャッシュを削除中...".dimmed());
        prune_command()
            .run()
            .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    }
    Ok(())
}
