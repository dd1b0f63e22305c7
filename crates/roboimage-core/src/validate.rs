//! マニフェストの検証

use crate::model::Manifest;
use crate::template::TemplateProcessor;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
}

impl Issue {
    fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Error => write!(f, "error: {}", self.message),
            Severity::Warning => write!(f, "warning: {}", self.message),
        }
    }
}

impl Manifest {
    /// マニフェストの整合性を検証
    ///
    /// `templates` を渡すとテンプレートファイルの存在も確認します。
    pub fn validate(&self, templates: Option<&TemplateProcessor>) -> Vec<Issue> {
        let mut issues = Vec::new();
        let mut seen: BTreeMap<&str, &str> = BTreeMap::new();

        if self.repositories.is_empty() {
            issues.push(Issue::warning("repositories が定義されていません"));
        }

        for (repository, repo, entry) in self.entries() {
            if entry.name.trim().is_empty() {
                issues.push(Issue::error(format!(
                    "リポジトリ '{}' に name のないエントリがあります",
                    repository
                )));
                continue;
            }

            if let Some(previous) = seen.insert(entry.name.as_str(), repository) {
                issues.push(Issue::error(format!(
                    "イメージ名 '{}' が重複しています ({} / {})",
                    entry.name, previous, repository
                )));
            }

            // 日付は関係しないので任意の日付で解決する
            let image = self.resolve(repository, repo, entry, chrono::NaiveDate::MIN);

            if image.targets.is_empty() {
                issues.push(Issue::error(format!(
                    "イメージ '{}' にステージ (targets) がありません",
                    entry.name
                )));
            }

            let mut stages: Vec<&String> = image.targets.iter().collect();
            stages.sort();
            stages.dedup();
            if stages.len() != image.targets.len() {
                issues.push(Issue::warning(format!(
                    "イメージ '{}' のステージが重複しています",
                    entry.name
                )));
            }

            if image.build_platforms(&[]).is_empty() {
                issues.push(Issue::error(format!(
                    "イメージ '{}' に具体的なビルドプラットフォームがありません（ワイルドカードのみ）",
                    entry.name
                )));
            }

            for stage in image.stage_platforms.keys() {
                if image.stage_build_platforms(stage).is_empty() {
                    issues.push(Issue::warning(format!(
                        "イメージ '{}' のステージ '{}' はワイルドカード宣言のみのため既定ではビルドされません",
                        entry.name, stage
                    )));
                }
            }

            for (key, value) in entry.float_vars() {
                issues.push(Issue::error(float_var_message(&entry.name, key, value)));
            }
        }

        if let Some(templates) = templates {
            for (repository, repo) in &self.repositories {
                let template = repo.template_name(repository);
                if !templates.has_template(&template) {
                    issues.push(Issue::error(format!(
                        "リポジトリ '{}' のテンプレート '{}' が見つかりません",
                        repository, template
                    )));
                }
                if let Some(readme) = &repo.readme
                    && !templates.has_template(readme)
                {
                    issues.push(Issue::error(format!(
                        "リポジトリ '{}' の README テンプレート '{}' が見つかりません",
                        repository, readme
                    )));
                }
            }
        }

        issues
    }
}

/// 引用符なしの小数は `3.10` → `3.1` のように桁が落ちるため受け付けない
pub(crate) fn float_var_message(image: &str, key: &str, value: f64) -> String {
    format!(
        "イメージ '{}' の変数 '{}' が数値 {} として読み込まれました。文字列として使うには引用符で囲んでください（例: \"3.10\"）",
        image, key, value
    )
}

pub fn has_errors(issues: &[Issue]) -> bool {
    issues.iter().any(|i| i.severity == Severity::Error)
}
