use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const MANIFEST: &str = r#"
registry: althack
platforms: [linux/amd64, linux/arm64]
runners:
  - platform: linux/arm64
    runner: ubuntu-24.04-arm
repositories:
  ros2:
    targets: [base, dev]
    entries:
      - name: humble
        ros_distro: humble
        ubuntu_distro: jammy
      - name: foxy
        eol: 2023-06-20
        ros_distro: foxy
        ubuntu_distro: focal
  gazebo:
    targets: [base]
    platforms: [linux/amd64]
    entries:
      - name: gazebo11
        ubuntu_distro: focal
"#;

pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    /// templates.yml とテンプレート一式を持つプロジェクト
    pub fn with_templates() -> Self {
        let project = Self::new();
        project.write_manifest(MANIFEST);
        project.write_template(
            "ros2.dockerfile.jinja",
            "FROM ubuntu:{{ ubuntu_distro }} AS base\nENV ROS_DISTRO={{ ros_distro }}\n\nFROM base AS dev\n",
        );
        project.write_template("gazebo.dockerfile.jinja", "FROM ubuntu:{{ ubuntu_distro }} AS base\n");
        project.write_template(
            "ros2.md.jinja",
            "# ros2\n{% for image in active %}- {{ image.name }}: {{ image.tags | join(sep=\", \") }}\n{% endfor %}",
        );
        project
    }

    pub fn write_manifest(&self, content: &str) {
        fs::write(self.root.path().join("templates.yml"), content).unwrap();
    }

    pub fn write_template(&self, name: &str, content: &str) {
        let dir = self.root.path().join("template");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), content).unwrap();
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    pub fn read(&self, relative: impl AsRef<Path>) -> String {
        fs::read_to_string(self.root.path().join(relative)).unwrap()
    }

    /// プロジェクトディレクトリで実行する roboimage コマンド
    #[allow(deprecated)]
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("roboimage").unwrap();
        cmd.current_dir(self.root.path());
        clear_env(&mut cmd);
        cmd
    }
}

/// ホスト環境の設定がテストに影響しないようにする
pub fn clear_env(cmd: &mut Command) {
    for var in [
        "ROBOIMAGE_MANIFEST",
        "DOCKER_REGISTRY",
        "DOCKER_PUSH",
        "DOCKER_CLEAN",
        "DOCKER_CONFIG",
        "DOCKER_USERNAME",
        "DOCKER_PASSWORD",
        "GITHUB_OUTPUT",
    ] {
        cmd.env_remove(var);
    }
}
