mod commands;
mod docker;
mod github;
mod utils;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "roboimage")]
#[command(about = "ROS / Gazebo の Docker イメージをテンプレートから生成・ビルドする", long_about = None)]
struct Cli {
    /// templates.yml のパス（省略時は ROBOIMAGE_MANIFEST、カレントディレクトリから探索）
    #[arg(long, global = true)]
    manifest: Option<PathBuf>,
    /// デバッグログを出力
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// テンプレートから Dockerfile / README / docker-bake.json を生成
    Generate {
        /// 出力先（省略時は templates.yml のあるディレクトリ）
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// テンプレートディレクトリ（省略時は <root>/template）
        #[arg(long)]
        template_dir: Option<PathBuf>,
        /// イメージのレジストリ／名前空間
        #[arg(long)]
        registry: Option<String>,
        /// Dockerfile を生成しない
        #[arg(long)]
        no_dockerfiles: bool,
        /// README を生成しない
        #[arg(long)]
        no_readmes: bool,
        /// docker-bake.json を生成しない
        #[arg(long)]
        no_bake: bool,
    },
    /// イメージをビルド
    Build {
        /// イメージ名（all でサポート中の全イメージ）
        #[arg(default_value = "all")]
        image: String,
        /// ビルドするステージ
        #[arg(short, long)]
        target: Option<String>,
        /// イメージのレジストリ／名前空間
        #[arg(long)]
        registry: Option<String>,
        /// ビルド後にプッシュ（DOCKER_PUSH でも指定可）
        #[arg(long)]
        push: bool,
        /// ビルド後の docker system prune をスキップ
        #[arg(long)]
        no_clean: bool,
        /// ビルド前のファイル生成をスキップ
        #[arg(long)]
        no_generate: bool,
        /// ビルド方法
        #[arg(long, value_enum, default_value_t = Backend::Bake)]
        backend: Backend,
        /// DOCKER_USERNAME / DOCKER_PASSWORD で認証（docker バックエンド）
        #[arg(long)]
        auth: bool,
        /// コマンドを表示するだけで実行しない（ファイル生成も行わない）
        #[arg(long)]
        dry_run: bool,
    },
    /// イメージ一覧を表示
    Images {
        /// EOL のイメージも表示
        #[arg(short, long)]
        all: bool,
        /// リポジトリで絞り込み
        #[arg(short, long)]
        repository: Option<String>,
        /// JSON で出力
        #[arg(long)]
        json: bool,
    },
    /// GitHub Actions のビルドマトリクスを出力
    Matrix {
        /// 対象リポジトリ（複数指定可）
        #[arg(short, long = "repository")]
        repositories: Vec<String>,
        /// 対象イメージ（複数指定可）
        #[arg(short, long = "image")]
        images: Vec<String>,
        /// 要求プラットフォーム（カンマ区切り、複数指定可）
        #[arg(short, long = "platform")]
        platforms: Vec<String>,
        /// ステージごとにジョブを分ける
        #[arg(long)]
        per_stage: bool,
        /// EOL のイメージも含める
        #[arg(long)]
        include_eol: bool,
        /// 変更された Dockerfile のパス（カンマ・改行区切り、複数指定可）
        #[arg(long)]
        changed: Vec<String>,
        /// --changed を無視して全イメージを対象にする
        #[arg(long)]
        all: bool,
        /// GitHub Actions の出力名
        #[arg(long, default_value = "matrix")]
        output_name: String,
    },
    /// 1 プラットフォーム分の bake ターゲットと --set 上書きを出力
    BakeVars {
        /// イメージ名
        image: String,
        /// ビルドするプラットフォーム
        #[arg(short, long)]
        platform: String,
        /// ステージ（省略時は全ステージ）
        #[arg(short, long)]
        target: Option<String>,
        /// イメージのレジストリ／名前空間
        #[arg(long)]
        registry: Option<String>,
        /// 出力方法
        #[arg(long, value_enum, default_value_t = VarsMode::Load)]
        mode: VarsMode,
        /// GitHub Actions キャッシュを使う
        #[arg(long)]
        gha_cache: bool,
    },
    /// イメージにステージがあるか確認し、exists / platforms を出力
    CheckTarget {
        /// イメージ名
        image: String,
        /// ステージ
        target: String,
        /// リポジトリ（指定時は一致も確認）
        #[arg(short, long)]
        repository: Option<String>,
    },
    /// bake ターゲット名を一覧表示
    Tasks {
        /// イメージ名（省略時はサポート中の全イメージ）
        image: Option<String>,
    },
    /// プラットフォーム別ダイジェストをマルチアーキテクチャマニフェストに統合
    Merge {
        /// bake メタデータ JSON のディレクトリ（再帰的に検索）
        metadata_dir: PathBuf,
        /// imagetools のコマンドを表示するだけで実行しない
        #[arg(long)]
        dry_run: bool,
        /// 作成後に imagetools inspect を実行
        #[arg(long)]
        inspect: bool,
    },
    /// templates.yml とテンプレートを検証
    Validate,
    /// プラットフォーム文字列を正規化して表示
    Platform {
        /// プラットフォーム（例: aarch64, linux/arm/v7, armhf）
        #[arg(required = true)]
        values: Vec<String>,
        /// このイメージがサポートするか確認
        #[arg(long)]
        image: Option<String>,
    },
    /// バージョン情報を表示
    Version,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// docker buildx bake
    Bake,
    /// Docker Engine API（クラシックビルド）
    Docker,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum VarsMode {
    Load,
    PushByDigest,
}

impl From<VarsMode> for roboimage_build::BakeMode {
    fn from(mode: VarsMode) -> Self {
        match mode {
            VarsMode::Load => roboimage_build::BakeMode::Load,
            VarsMode::PushByDigest => roboimage_build::BakeMode::PushByDigest,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = roboimage_config::Settings::from_env();
    let today = roboimage_core::today();
    // Version / Platform（--image なし）はマニフェスト不要
    let load = || utils::load_manifest(cli.manifest.as_deref());

    match cli.command {
        Commands::Generate {
            output,
            template_dir,
            registry,
            no_dockerfiles,
            no_readmes,
            no_bake,
        } => {
            let loaded = load()?;
            let registry = utils::registry(&settings, registry.as_deref(), &loaded);
            commands::generate::handle(
                &loaded,
                &commands::generate::GenerateArgs {
                    output,
                    template_dir,
                    registry,
                    options: roboimage_core::GenerateOptions {
                        dockerfiles: !no_dockerfiles,
                        readmes: !no_readmes,
                        bake_file: !no_bake,
                    },
                },
                today,
            )?;
        }
        Commands::Build {
            image,
            target,
            registry,
            push,
            no_clean,
            no_generate,
            backend,
            auth,
            dry_run,
        } => {
            let loaded = load()?;
            let args = commands::build::BuildArgs {
                docker_config: settings.docker_config.clone(),
                credentials: settings.credentials(),
                image,
                target,
                registry: utils::registry(&settings, registry.as_deref(), &loaded),
                push: settings.should_push(push),
                clean: settings.should_clean(no_clean),
                generate: !no_generate,
                classic: backend == Backend::Docker,
                auth,
                dry_run,
            };
            commands::build::handle(&loaded, &args, today).await?;
        }
        Commands::Images {
            all,
            repository,
            json,
        } => {
            let loaded = load()?;
            commands::images::handle(&loaded.manifest, all, repository.as_deref(), json, today)?;
        }
        Commands::Matrix {
            repositories,
            images,
            platforms,
            per_stage,
            include_eol,
            changed,
            all,
            output_name,
        } => {
            let loaded = load()?;
            let changed = if all {
                Default::default()
            } else {
                roboimage_core::parse_changed(&changed.join("\n"))
            };
            let filter = roboimage_core::MatrixFilter {
                repositories,
                images,
                platforms: roboimage_core::parse_platform_list(&platforms)?,
                per_stage,
                include_eol,
                changed,
            };
            commands::matrix::handle(&loaded.manifest, &filter, &output_name, today)?;
        }
        Commands::BakeVars {
            image,
            platform,
            target,
            registry,
            mode,
            gha_cache,
        } => {
            let loaded = load()?;
            let platform: roboimage_core::Platform = platform.parse()?;
            let registry = utils::registry(&settings, registry.as_deref(), &loaded);
            let request = roboimage_build::VarsRequest {
                image: &image,
                platform: &platform,
                stage: target.as_deref(),
                registry: &registry,
                mode: mode.into(),
                gha_cache,
            };
            commands::bake_vars::handle(&loaded.manifest, &request, today)?;
        }
        Commands::CheckTarget {
            image,
            target,
            repository,
        } => {
            let loaded = load()?;
            commands::check_target::handle(
                &loaded.manifest,
                repository.as_deref(),
                &image,
                &target,
                today,
            )?;
        }
        Commands::Tasks { image } => {
            let loaded = load()?;
            commands::tasks::handle(&loaded.manifest, image.as_deref(), today)?;
        }
        Commands::Merge {
            metadata_dir,
            dry_run,
            inspect,
        } => {
            let loaded = load()?;
            commands::merge::handle(&loaded.manifest, &metadata_dir, dry_run, inspect, today)?;
        }
        Commands::Validate => {
            let loaded = load()?;
            commands::validate::handle(&loaded)?;
        }
        Commands::Platform { values, image } => match image {
            Some(image) => {
                let loaded = load()?;
                commands::platform::handle_supported(&loaded.manifest, &values, &image, today)?;
            }
            None => commands::platform::handle(&values)?,
        },
        Commands::Version => {
            println!("roboimage {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
