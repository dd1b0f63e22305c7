use crate::github;
use chrono::NaiveDate;
use roboimage_core::{Manifest, MatrixFilter};

/// マトリクス（`output_name`）と対象リポジトリ一覧（`families`）を出力
pub fn handle(
    manifest: &Manifest,
    filter: &MatrixFilter,
    output_name: &str,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let matrix = manifest.workflow_matrix(filter, today);
    if matrix.is_empty() {
        tracing::warn!("Matrix is empty");
    }

    github::write_outputs(&[
        (output_name, serde_json::to_string(&matrix)?),
        ("families", serde_json::to_string(&matrix.repositories())?),
    ])
}
