use colored::Colorize;
use roboimage_config::Settings;
use roboimage_core::LoadedManifest;
use std::path::Path;

/// マニフェストを探して読み込む
pub fn load_manifest(explicit: Option<&Path>) -> anyhow::Result<LoadedManifest> {
    let path = roboimage_config::find_manifest(explicit)?;
    let loaded = roboimage_core::load_manifest(&path)?;
    tracing::debug!(root = %loaded.root.display(), "Project root");
    Ok(loaded)
}

/// 読み込んだマニフェストを表示
pub fn print_loaded_manifest(loaded: &LoadedManifest) {
    println!("📄 {}", loaded.path.display().to_string().cyan());
}

/// レジストリを解決: CLI > DOCKER_REGISTRY > templates.yml > althack
pub fn registry(settings: &Settings, cli: Option<&str>, loaded: &LoadedManifest) -> String {
    settings.resolve_registry(cli, loaded.manifest.registry.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_registry_prefers_manifest_over_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("templates.yml");
        fs::write(&path, "registry: ghcr.io/athackst\nrepositories: {}\n").unwrap();

        let loaded = load_manifest(Some(&path)).unwrap();
        let settings = Settings::default();
        assert_eq!(registry(&settings, None, &loaded), "ghcr.io/athackst");
        assert_eq!(registry(&settings, Some("me"), &loaded), "me");
    }
}
