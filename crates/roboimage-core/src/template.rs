//! テンプレート展開機能
//!
//! Teraを使用して Jinja 形式の Dockerfile / README テンプレートを展開します。

use crate::error::{CoreError, Result};
use crate::model::ImageDef;
use std::path::Path;
use tera::{Context, Tera};
use tracing::{debug, info};

/// テンプレートプロセッサ
pub struct TemplateProcessor {
    tera: Tera,
}

impl TemplateProcessor {
    /// 空のテンプレートプロセッサを作成（文字列テンプレート用）
    pub fn new() -> Self {
        Self {
            tera: Tera::default(),
        }
    }

    /// ディレクトリ配下のテンプレートをすべて読み込む
    #[tracing::instrument(skip(dir), fields(dir = %dir.display()))]
    pub fn from_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(CoreError::TemplateDirNotFound(dir.to_path_buf()));
        }

        let pattern = format!("{}/**/*", dir.display());
        let mut tera = Tera::new(&pattern).map_err(|e| CoreError::TemplateError {
            file: dir.display().to_string(),
            message: extract_tera_error_detail(&e),
        })?;
        // Dockerfile や Markdown はエスケープしない
        tera.autoescape_on(vec![]);

        info!(
            template_count = tera.get_template_names().count(),
            "Templates loaded"
        );
        Ok(Self { tera })
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// 読み込み済みテンプレートを展開
    pub fn render(&self, name: &str, context: &Context) -> Result<String> {
        debug!(template = %name, "Rendering template");
        self.tera
            .render(name, context)
            .map_err(|e| CoreError::TemplateError {
                file: name.to_string(),
                message: extract_tera_error_detail(&e),
            })
    }

    /// 文字列をテンプレートとして展開
    pub fn render_str(&mut self, template: &str, context: &Context) -> Result<String> {
        self.tera.render_str(template, context).map_err(|e| {
            CoreError::TemplateError {
                file: "<string>".to_string(),
                message: extract_tera_error_detail(&e),
            }
        })
    }
}

impl Default for TemplateProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// イメージ定義からテンプレートコンテキストを作成
///
/// エントリ固有の変数に加えて `name`, `repository`, `targets`,
/// `platforms`, `eol`, `is_eol`, `registry` を提供します。
pub fn image_context(image: &ImageDef, registry: &str) -> Result<Context> {
    let mut context = Context::from_serialize(&image.vars).map_err(|e| CoreError::TemplateError {
        file: image.name.clone(),
        message: extract_tera_error_detail(&e),
    })?;

    context.insert("name", &image.name);
    context.insert("repository", &image.repository);
    context.insert("targets", &image.targets);
    let platforms: Vec<String> = image.platforms.iter().map(|p| p.to_string()).collect();
    context.insert("platforms", &platforms);
    context.insert("eol", &image.eol.map(|d| d.to_string()));
    context.insert("is_eol", &image.is_eol);
    context.insert("registry", registry);
    Ok(context)
}

/// Teraエラーから詳細情報を抽出
///
/// Teraのエラーメッセージを解析して、未定義変数などの具体的な情報を取得します。
fn extract_tera_error_detail(e: &tera::Error) -> String {
    use std::error::Error;

    let mut details = vec![e.to_string()];
    let mut source = e.source();
    while let Some(err) = source {
        details.push(err.to_string());
        source = err.source();
    }

    let full_error = details.join(" | ");

    if full_error.contains("not found in context")
        && let Some(start) = full_error.find("Variable `")
        && let Some(end) = full_error[start..].find("` not found")
    {
        let var_name = &full_error[start + 10..start + end];
        return format!(
            "未定義の変数: `{}`\nヒント: templates.yml のエントリにキーを追加してください",
            var_name
        );
    }

    if full_error.contains("Filter") && full_error.contains("not found") {
        return format!("未定義のフィルター\n詳細: {full_error}");
    }

    full_error
}
