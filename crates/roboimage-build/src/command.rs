//! 外部コマンド（docker CLI）の組み立てと実行

use crate::error::{BuildError, BuildResult};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// 実行前に表示・検査できる形で保持したコマンドライン
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerCommand {
    pub program: String,
    pub args: Vec<String>,
    /// 実行時の作業ディレクトリ（None ならカレントディレクトリ）
    pub current_dir: Option<PathBuf>,
}

impl DockerCommand {
    /// `docker` コマンドを作成
    pub fn docker() -> Self {
        Self {
            program: "docker".to_string(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// 標準入出力を引き継いで実行し、終了コードを検査する
    pub fn run(&self) -> BuildResult<()> {
        tracing::debug!(command = %self, "Running command");

        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        let status = command
            .status()
            .map_err(|source| BuildError::CommandSpawn {
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(BuildError::CommandFailed {
                command: self.to_string(),
                code: status.code(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for DockerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(dir) = &self.current_dir {
            write!(f, "cd {} && ", quote(&dir.display().to_string()))?;
        }
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn quote(arg: &str) -> String {
    if arg.is_empty() || arg.contains(char::is_whitespace) {
        format!("'{}'", arg.replace('\'', r"'\''"))
    } else {
        arg.to_string()
    }
}

/// `docker system prune -f`
pub fn prune_command() -> DockerCommand {
    DockerCommand::docker().args(["system", "prune", "-f"])
}
