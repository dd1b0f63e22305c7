//! マニフェストローダー
//!
//! templates.yml を読み込み、Manifest を生成します。

use crate::error::{CoreError, Result};
use crate::model::Manifest;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// 読み込み済みマニフェストとその位置
#[derive(Debug, Clone)]
pub struct LoadedManifest {
    /// templates.yml のパス
    pub path: PathBuf,
    /// templates.yml のあるディレクトリ（生成物の出力先の基準）
    pub root: PathBuf,
    pub manifest: Manifest,
}

impl LoadedManifest {
    /// デフォルトのテンプレートディレクトリ（`<root>/template`）
    pub fn template_dir(&self) -> PathBuf {
        self.root.join("template")
    }
}

/// templates.yml を読み込む
#[instrument(skip(path), fields(path = %path.display()))]
pub fn load_manifest(path: &Path) -> Result<LoadedManifest> {
    debug!("Reading manifest");
    let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let manifest: Manifest =
        serde_yaml::from_str(&content).map_err(|source| CoreError::YamlParse {
            path: path.to_path_buf(),
            source,
        })?;

    info!(
        repositories = manifest.repositories.len(),
        entries = manifest.entries().count(),
        "Manifest loaded"
    );

    let root = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(LoadedManifest {
        path: path.to_path_buf(),
        root,
        manifest,
    })
}

/// 文字列からマニフェストをパース
pub fn parse_manifest(content: &str) -> Result<Manifest> {
    serde_yaml::from_str(content).map_err(|source| CoreError::YamlParse {
        path: PathBuf::from("<string>"),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_manifest() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("templates.yml");
        fs::write(
            &path,
            "registry: althack\nrepositories:\n  ros2:\n    entries:\n      - name: humble\n",
        )
        .unwrap();

        let loaded = load_manifest(&path).unwrap();
        assert_eq!(loaded.root, temp_dir.path());
        assert_eq!(loaded.template_dir(), temp_dir.path().join("template"));
        assert_eq!(loaded.manifest.registry.as_deref(), Some("althack"));
        assert_eq!(loaded.manifest.entries().count(), 1);
    }

    #[test]
    fn test_load_manifest_missing_file() {
        let temp_dir = tempdir().unwrap();
        let result = load_manifest(&temp_dir.path().join("nope.yml"));
        assert!(matches!(result, Err(CoreError::IoError { .. })));
    }

    #[test]
    fn test_parse_error_reports_path() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("templates.yml");
        fs::write(&path, "repositories:\n  ros2:\n    entries: 42\n").unwrap();

        let err = load_manifest(&path).unwrap_err();
        assert!(err.to_string().contains("templates.yml"));
    }

    #[test]
    fn test_invalid_platform_is_parse_error() {
        let result = parse_manifest("platforms: [\"linux/arm/v7/x\"]\n");
        assert!(result.is_err());
    }
}
