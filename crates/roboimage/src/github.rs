//! GitHub Actions の step output

use std::io::Write;
use std::path::Path;

const OUTPUT_ENV: &str = "GITHUB_OUTPUT";

/// 複数行の値を区切るヒアドキュメントの終端
const DELIMITER: &str = "ROBOIMAGE_EOF";

/// `key=value` 形式（複数行ならヒアドキュメント形式）に整形
pub fn format_output(key: &str, value: &str) -> String {
    if value.contains('\n') {
        format!("{key}<<{DELIMITER}\n{value}\n{DELIMITER}\n")
    } else {
        format!("{key}={value}\n")
    }
}

/// `$GITHUB_OUTPUT` があれば追記し、なければ標準出力に書く
pub fn write_outputs(outputs: &[(&str, String)]) -> anyhow::Result<()> {
    let formatted: String = outputs
        .iter()
        .map(|(key, value)| format_output(key, value))
        .collect();

    match std::env::var_os(OUTPUT_ENV).filter(|p| !p.is_empty()) {
        Some(path) => append(Path::new(&path), &formatted),
        None => {
            print!("{}", formatted);
            Ok(())
        }
    }
}

fn append(path: &Path, content: &str) -> anyhow::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| anyhow::anyhow!("{} に書き込めません: {}", path.display(), e))?;
    file.write_all(content.as_bytes())?;
    tracing::debug!(path = %path.display(), "Wrote GitHub outputs");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_single_line() {
        assert_eq!(format_output("targets", "a b"), "targets=a b\n");
    }

    #[test]
    fn test_format_multi_line() {
        assert_eq!(
            format_output("set", "a.platform=linux/amd64\na.output=type=docker"),
            "set<<ROBOIMAGE_EOF\na.platform=linux/amd64\na.output=type=docker\nROBOIMAGE_EOF\n"
        );
    }

    #[test]
    fn test_append_to_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("output");
        append(&path, "a=1\n").unwrap();
        append(&path, "b=2\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a=1\nb=2\n");
    }
}
