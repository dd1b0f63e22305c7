use chrono::NaiveDate;
use roboimage_core::Manifest;

pub fn handle(manifest: &Manifest, image: Option<&str>, today: NaiveDate) -> anyhow::Result<()> {
    for name in manifest.task_names(image, today)? {
        println!("{}", name);
    }
    Ok(())
}
