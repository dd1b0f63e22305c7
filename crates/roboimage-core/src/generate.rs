//! Dockerfile / README / bake 定義の生成

use crate::bake_file::{BAKE_FILE_NAME, BakeFile};
use crate::error::{CoreError, Result};
use crate::model::{ImageDef, Manifest};
use crate::template::{TemplateProcessor, image_context};
use crate::validate::float_var_message;
use crate::views::EolFilter;
use chrono::NaiveDate;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tera::Context;
use tracing::{debug, info, instrument};

/// 生成対象の選択
#[derive(Debug, Clone, Copy)]
pub struct GenerateOptions {
    pub dockerfiles: bool,
    pub readmes: bool,
    pub bake_file: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            dockerfiles: true,
            readmes: true,
            bake_file: true,
        }
    }
}

/// 生成結果
#[derive(Debug, Default)]
pub struct GenerateReport {
    pub dockerfiles: Vec<PathBuf>,
    pub readmes: Vec<PathBuf>,
    pub bake_file: Option<PathBuf>,
}

impl GenerateReport {
    pub fn written(&self) -> impl Iterator<Item = &PathBuf> {
        self.dockerfiles
            .iter()
            .chain(self.readmes.iter())
            .chain(self.bake_file.iter())
    }
}

/// README テンプレートに渡すイメージ情報
#[derive(Serialize)]
struct ReadmeImage<'a> {
    #[serde(flatten)]
    image: &'a ImageDef,
    tags: Vec<String>,
}

pub struct Generator<'a> {
    manifest: &'a Manifest,
    templates: TemplateProcessor,
    output_dir: PathBuf,
    registry: String,
    today: NaiveDate,
}

impl<'a> Generator<'a> {
    pub fn new(
        manifest: &'a Manifest,
        template_dir: &Path,
        output_dir: &Path,
        registry: &str,
        today: NaiveDate,
    ) -> Result<Self> {
        Ok(Self {
            manifest,
            templates: TemplateProcessor::from_dir(template_dir)?,
            output_dir: output_dir.to_path_buf(),
            registry: registry.to_string(),
            today,
        })
    }

    #[instrument(skip(self), fields(output_dir = %self.output_dir.display()))]
    pub fn run(&self, options: GenerateOptions) -> Result<GenerateReport> {
        let mut report = GenerateReport::default();

        if options.dockerfiles {
            report.dockerfiles = self.generate_dockerfiles()?;
        }
        if options.readmes {
            report.readmes = self.generate_readmes()?;
        }
        if options.bake_file {
            report.bake_file = Some(self.write_bake_file()?);
        }

        info!(
            files = report.written().count(),
            "Generation complete"
        );
        Ok(report)
    }

    /// 全エントリ（EOL 含む）の Dockerfile を生成
    pub fn generate_dockerfiles(&self) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        for (repository, repo, entry) in self.manifest.entries() {
            let template = repo.template_name(repository);
            if !self.templates.has_template(&template) {
                return Err(CoreError::TemplateError {
                    file: template,
                    message: format!("リポジトリ '{}' のテンプレートが見つかりません", repository),
                });
            }

            if let Some((key, value)) = entry.float_vars().into_iter().next() {
                return Err(CoreError::InvalidConfig(float_var_message(
                    &entry.name,
                    key,
                    value,
                )));
            }

            let image = self.manifest.resolve(repository, repo, entry, self.today);
            let context = image_context(&image, &self.registry)?;
            let rendered = self.templates.render(&template, &context)?;

            let path = self
                .output_dir
                .join(repository)
                .join(image.dockerfile());
            write_file(&path, &rendered)?;
            written.push(path);
        }

        Ok(written)
    }

    /// リポジトリごとの README を生成
    ///
    /// README テンプレートが明示されていない場合、デフォルト名のテンプレートが
    /// 存在するリポジトリのみ生成します。
    pub fn generate_readmes(&self) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        for (repository, repo) in &self.manifest.repositories {
            let template = repo.readme_name(repository);
            if !self.templates.has_template(&template) {
                if repo.readme.is_some() {
                    return Err(CoreError::TemplateError {
                        file: template,
                        message: format!("リポジトリ '{}' の README テンプレートが見つかりません", repository),
                    });
                }
                debug!(repository = %repository, "No README template, skipping");
                continue;
            }

            let images: Vec<ImageDef> = repo
                .entries
                .iter()
                .map(|entry| self.manifest.resolve(repository, repo, entry, self.today))
                .collect();
            let readme_images: Vec<ReadmeImage> = images
                .iter()
                .map(|image| ReadmeImage {
                    image,
                    tags: image
                        .targets
                        .iter()
                        .map(|stage| image.tagged(&self.registry, stage))
                        .collect(),
                })
                .collect();

            let mut context = Context::new();
            context.insert("repository", repository);
            context.insert("registry", &self.registry);
            context.insert("images", &readme_images);
            context.insert(
                "active",
                &readme_images.iter().filter(|i| !i.image.is_eol).collect::<Vec<_>>(),
            );

            let rendered = self.templates.render(&template, &context)?;
            let path = self.output_dir.join(repository).join("README.md");
            write_file(&path, &rendered)?;
            written.push(path);
        }

        Ok(written)
    }

    /// docker-bake.json を書き出す
    pub fn write_bake_file(&self) -> Result<PathBuf> {
        let bake = BakeFile::from_manifest(self.manifest, &self.registry, self.today);
        let mut content = serde_json::to_string_pretty(&bake)?;
        content.push('\n');

        let path = self.output_dir.join(BAKE_FILE_NAME);
        write_file(&path, &content)?;
        Ok(path)
    }

    /// サポート中のイメージ数（ログ表示用）
    pub fn active_image_count(&self) -> usize {
        self.manifest.image_list(EolFilter::Active, self.today).len()
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| CoreError::IoError {
            path: parent.to_path_buf(),
            message: e.to_string(),
        })?;
    }
    std::fs::write(path, content).map_err(|e| CoreError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    debug!(path = %path.display(), "Wrote file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_manifest;
    use std::fs;
    use tempfile::tempdir;

    const MANIFEST: &str = r#"
registry: althack
repositories:
  ros2:
    targets: [base, dev]
    entries:
      - name: humble
        ubuntu_distro: jammy
      - name: foxy
        eol: 2023-06-20
        ubuntu_distro: focal
  gazebo:
    targets: [base]
    entries:
      - name: gazebo11
        ubuntu_distro: focal
"#;

    fn setup() -> (tempfile::TempDir, Manifest) {
        let temp_dir = tempdir().unwrap();
        let template_dir = temp_dir.path().join("template");
        fs::create_dir(&template_dir).unwrap();
        fs::write(
            template_dir.join("ros2.dockerfile.jinja"),
            "FROM ubuntu:{{ ubuntu_distro }} AS base\n",
        )
        .unwrap();
        fs::write(
            template_dir.join("gazebo.dockerfile.jinja"),
            "FROM ubuntu:{{ ubuntu_distro }}\n",
        )
        .unwrap();
        fs::write(
            template_dir.join("ros2.md.jinja"),
            "{% for i in images %}{{ i.name }}{% if i.is_eol %} (EOL){% endif %}: {{ i.tags | join(sep=\", \") }}\n{% endfor %}",
        )
        .unwrap();
        (temp_dir, parse_manifest(MANIFEST).unwrap())
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn test_generate_all() {
        let (temp_dir, manifest) = setup();
        let generator = Generator::new(
            &manifest,
            &temp_dir.path().join("template"),
            temp_dir.path(),
            "althack",
            today(),
        )
        .unwrap();

        let report = generator.run(GenerateOptions::default()).unwrap();
        assert_eq!(report.dockerfiles.len(), 3);
        assert_eq!(report.readmes.len(), 1);
        assert_eq!(generator.active_image_count(), 2);

        let humble = fs::read_to_string(temp_dir.path().join("ros2/humble.Dockerfile")).unwrap();
        assert_eq!(humble, "FROM ubuntu:jammy AS base\n");
        // EOL エントリも生成される
        assert!(temp_dir.path().join("ros2/foxy.Dockerfile").exists());
        assert!(temp_dir.path().join("gazebo/gazebo11.Dockerfile").exists());

        let readme = fs::read_to_string(temp_dir.path().join("ros2/README.md")).unwrap();
        assert!(readme.contains("humble: althack/ros2:humble-base, althack/ros2:humble-dev"));
        assert!(readme.contains("foxy (EOL)"));
        assert!(!temp_dir.path().join("gazebo/README.md").exists());

        let bake: BakeFile = serde_json::from_str(
            &fs::read_to_string(temp_dir.path().join(BAKE_FILE_NAME)).unwrap(),
        )
        .unwrap();
        assert!(bake.target.contains_key("gazebo-gazebo11-base"));
    }

    #[test]
    fn test_missing_dockerfile_template() {
        let (temp_dir, manifest) = setup();
        fs::remove_file(temp_dir.path().join("template/gazebo.dockerfile.jinja")).unwrap();

        let generator = Generator::new(
            &manifest,
            &temp_dir.path().join("template"),
            temp_dir.path(),
            "althack",
            today(),
        )
        .unwrap();
        let result = generator.generate_dockerfiles();
        assert!(matches!(result, Err(CoreError::TemplateError { .. })));
    }

    #[test]
    fn test_version_vars_keep_their_text() {
        let (temp_dir, _) = setup();
        fs::write(
            temp_dir.path().join("template/ros2.dockerfile.jinja"),
            "FROM ubuntu:{{ ubuntu_distro }} AS base\nARG PYTHON={{ python_version }}\n",
        )
        .unwrap();
        let template_dir = temp_dir.path().join("template");

        let quoted = parse_manifest(
            "repositories:\n  ros2:\n    targets: [base]\n    entries:\n      - name: humble\n        ubuntu_distro: jammy\n        python_version: \"3.10\"\n",
        )
        .unwrap();
        Generator::new(&quoted, &template_dir, temp_dir.path(), "althack", today())
            .unwrap()
            .generate_dockerfiles()
            .unwrap();
        let humble = fs::read_to_string(temp_dir.path().join("ros2/humble.Dockerfile")).unwrap();
        assert_eq!(humble, "FROM ubuntu:jammy AS base\nARG PYTHON=3.10\n");

        // 引用符なしの 3.10 は 3.1 になるため生成しない
        let unquoted = parse_manifest(
            "repositories:\n  ros2:\n    targets: [base]\n    entries:\n      - name: jazzy\n        ubuntu_distro: noble\n        python_version: 3.10\n",
        )
        .unwrap();
        let result = Generator::new(&unquoted, &template_dir, temp_dir.path(), "althack", today())
            .unwrap()
            .generate_dockerfiles();
        match result {
            Err(CoreError::InvalidConfig(message)) => {
                assert!(message.contains("python_version"), "{}", message)
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!temp_dir.path().join("ros2/jazzy.Dockerfile").exists());
    }

    #[test]
    fn test_options_skip_outputs() {
        let (temp_dir, manifest) = setup();
        let out = temp_dir.path().join("out");
        let generator =
            Generator::new(&manifest, &temp_dir.path().join("template"), &out, "althack", today())
                .unwrap();

        let report = generator
            .run(GenerateOptions {
                dockerfiles: false,
                readmes: false,
                bake_file: true,
            })
            .unwrap();
        assert!(report.dockerfiles.is_empty());
        assert_eq!(report.bake_file, Some(out.join(BAKE_FILE_NAME)));
        assert!(!out.join("ros2").exists());
    }
}
