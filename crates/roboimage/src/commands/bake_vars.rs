use crate::github;
use chrono::NaiveDate;
use roboimage_build::{VarsRequest, bake_vars};
use roboimage_core::Manifest;

pub fn handle(manifest: &Manifest, request: &VarsRequest<'_>, today: NaiveDate) -> anyhow::Result<()> {
    let vars = bake_vars(manifest, request, today).map_err(|e| anyhow::anyhow!(e.user_message()))?;

    github::write_outputs(&[
        ("targets", vars.targets_value()),
        ("set", vars.set_value()),
    ])
}
