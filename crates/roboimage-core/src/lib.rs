//! roboimage core
//!
//! templates.yml マニフェストの読み込み、プラットフォームの正規化・照合、
//! CI マトリクスの計算、Dockerfile / README / bake 定義の生成を提供します。

pub mod bake_file;
pub mod error;
pub mod generate;
pub mod loader;
pub mod matrix;
pub mod model;
pub mod platform;
pub mod template;
pub mod validate;
pub mod views;

pub use bake_file::{BAKE_FILE_NAME, BakeFile, BakeGroup, BakeTarget};
pub use error::{CoreError, Result};
pub use generate::{GenerateOptions, GenerateReport, Generator};
pub use loader::{LoadedManifest, load_manifest, parse_manifest};
pub use matrix::{Matrix, MatrixEntry, MatrixFilter, parse_changed};
pub use model::*;
pub use platform::{Platform, PlatformSpec, VariantPattern, parse_platform_list};
pub use template::TemplateProcessor;
pub use validate::{Issue, Severity, has_errors};
pub use views::EolFilter;

/// ローカルタイムゾーンでの今日の日付
pub fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}
