//! roboimage のビルド機能
//!
//! `docker buildx bake` によるビルド、CI 向けの bake 変数、
//! プラットフォーム別ダイジェストのマニフェスト統合、
//! Docker Engine API を使ったクラシックビルドとプッシュを提供します。

pub mod auth;
pub mod bake;
pub mod builder;
pub mod classic;
pub mod command;
pub mod context;
pub mod error;
pub mod merge;
pub mod plan;
pub mod progress;
pub mod pusher;
pub mod reference;
pub mod vars;

pub use auth::RegistryAuth;
pub use bake::{BakeDriver, BakeOptions, bake_command};
pub use builder::{BuildSpec, ImageBuilder};
pub use classic::ClassicBuilder;
pub use command::{DockerCommand, prune_command};
pub use context::ContextBuilder;
pub use error::{BuildError, BuildResult};
pub use merge::{DigestMap, MergePlan, Merger, add_metadata, collect_metadata, plan_merges};
pub use plan::{ALL_IMAGES, BuildJob, BuildSelection, plan_builds};
pub use progress::BuildProgress;
pub use pusher::{ImagePusher, split_image_tag, validate_tag};
pub use reference::ImageRef;
pub use vars::{BakeMode, BakeVars, VarsRequest, bake_vars};
