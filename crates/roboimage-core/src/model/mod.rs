//! モデル定義
//!
//! `templates.yml` の構造と、そこから導出されるイメージ定義を定義します。

mod entry;
mod image;
mod manifest;

// Re-exports
pub use entry::*;
pub use image::*;
pub use manifest::*;
