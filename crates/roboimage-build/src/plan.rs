//! ビルド対象（イメージ × ステージ）の決定

use crate::error::{BuildError, BuildResult};
use chrono::NaiveDate;
use roboimage_core::{CoreError, EolFilter, ImageDef, Manifest};

/// 全アクティブイメージを指す名前
pub const ALL_IMAGES: &str = "all";

/// 1 回の bake 実行に対応するビルド単位
#[derive(Debug, Clone, PartialEq)]
pub struct BuildJob {
    pub image: ImageDef,
    pub stage: String,
    /// bake ターゲット名
    pub target: String,
    /// 付与するタグ（先頭が `<name>-<stage>`、push 時は日付付きが続く）
    pub tags: Vec<String>,
}

/// ビルド計画の入力
#[derive(Debug, Clone)]
pub struct BuildSelection<'a> {
    /// イメージ名または `all`
    pub image: &'a str,
    pub stage: Option<&'a str>,
    pub registry: &'a str,
    /// 日付付きタグを追加する
    pub dated_tags: bool,
    pub today: NaiveDate,
}

/// 指定に従ってビルド単位を列挙する
///
/// `all` はサポート中のイメージのみ、名前指定は EOL でも対象にします。
/// ステージ指定があれば、そのステージを持つイメージだけが残ります。
pub fn plan_builds(manifest: &Manifest, selection: &BuildSelection<'_>) -> BuildResult<Vec<BuildJob>> {
    let images = if selection.image == ALL_IMAGES {
        manifest.image_list(EolFilter::Active, selection.today)
    } else {
        let image = manifest.image(selection.image, selection.today)?;
        if let Some(stage) = selection.stage
            && !image.has_stage(stage)
        {
            return Err(CoreError::StageNotFound {
                image: image.name.clone(),
                stage: stage.to_string(),
                available: image.targets.join(", "),
            }
            .into());
        }
        vec![image]
    };

    let mut jobs = Vec::new();
    for image in images {
        for stage in &image.targets {
            if selection.stage.is_some_and(|s| s != stage) {
                continue;
            }
            let mut tags = vec![image.tagged(selection.registry, stage)];
            if selection.dated_tags {
                tags.push(image.dated(selection.registry, stage, selection.today));
            }
            jobs.push(BuildJob {
                target: image.bake_target(stage),
                stage: stage.clone(),
                image: image.clone(),
                tags,
            });
        }
    }

    if jobs.is_empty() {
        return Err(BuildError::NoBuilds(selection.image.to_string()));
    }
    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use roboimage_core::parse_manifest;

    const MANIFEST: &str = r#"
repositories:
  ros2:
    targets: [base, dev]
    entries:
      - name: humble
      - name: foxy
        eol: 2023-06-20
  gazebo:
    targets: [base, gzweb]
    entries:
      - name: gazebo11
"#;

    fn selection(image: &str) -> BuildSelection<'_> {
        BuildSelection {
            image,
            stage: None,
            registry: "althack",
            dated_tags: false,
            today: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        }
    }

    #[test]
    fn test_plan_all_skips_eol() {
        let manifest = parse_manifest(MANIFEST).unwrap();
        let jobs = plan_builds(&manifest, &selection(ALL_IMAGES)).unwrap();
        let targets: Vec<&str> = jobs.iter().map(|j| j.target.as_str()).collect();
        assert_eq!(
            targets,
            vec![
                "gazebo-gazebo11-base",
                "gazebo-gazebo11-gzweb",
                "ros2-humble-base",
                "ros2-humble-dev",
            ]
        );
        assert_eq!(jobs[0].tags, vec!["althack/gazebo:gazebo11-base"]);
    }

    #[test]
    fn test_plan_named_eol_image_with_dated_tags() {
        let manifest = parse_manifest(MANIFEST).unwrap();
        let mut sel = selection("foxy");
        sel.stage = Some("dev");
        sel.dated_tags = true;
        let jobs = plan_builds(&manifest, &sel).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(
            jobs[0].tags,
            vec!["althack/ros2:foxy-dev", "althack/ros2:foxy-dev-2024-01-02"]
        );
    }

    #[test]
    fn test_plan_stage_filter_for_all() {
        let manifest = parse_manifest(MANIFEST).unwrap();
        let mut sel = selection(ALL_IMAGES);
        sel.stage = Some("gzweb");
        let jobs = plan_builds(&manifest, &sel).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].target, "gazebo-gazebo11-gzweb");

        sel.stage = Some("missing");
        assert!(matches!(
            plan_builds(&manifest, &sel),
            Err(BuildError::NoBuilds(_))
        ));
    }

    #[test]
    fn test_plan_unknown_image_or_stage() {
        let manifest = parse_manifest(MANIFEST).unwrap();
        assert!(matches!(
            plan_builds(&manifest, &selection("kinetic")),
            Err(BuildError::Core(CoreError::ImageNotFound(_)))
        ));

        let mut sel = selection("humble");
        sel.stage = Some("gzweb");
        assert!(matches!(
            plan_builds(&manifest, &sel),
            Err(BuildError::Core(CoreError::StageNotFound { .. }))
        ));
    }
}
