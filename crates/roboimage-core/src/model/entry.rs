//! リポジトリとエントリ定義

use crate::platform::PlatformSpec;
use chrono::NaiveDate;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// テンプレート変数
pub type Vars = BTreeMap<String, serde_json::Value>;

/// ビルドステージ
///
/// `base` のような名前だけの形式と、ステージ固有のプラットフォームを持つ
/// `{target: base, platforms: "linux/amd64,linux/arm64"}` 形式を受け付けます。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub target: String,
    /// このステージだけのプラットフォーム（省略時はイメージのプラットフォーム）
    pub platforms: Option<Vec<PlatformSpec>>,
}

impl Stage {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            platforms: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DetailedStage {
    target: String,
    #[serde(default, deserialize_with = "platform_list")]
    platforms: Option<Vec<PlatformSpec>>,
}

impl<'de> Deserialize<'de> for Stage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StageVisitor;

        impl<'de> Visitor<'de> for StageVisitor {
            type Value = Stage;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("stage name or {target, platforms}")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Stage, E> {
                Ok(Stage::new(value))
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Stage, A::Error> {
                let detailed =
                    DetailedStage::deserialize(de::value::MapAccessDeserializer::new(map))?;
                Ok(Stage {
                    target: detailed.target,
                    platforms: detailed.platforms,
                })
            }
        }

        deserializer.deserialize_any(StageVisitor)
    }
}

impl Serialize for Stage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.platforms {
            None => serializer.serialize_str(&self.target),
            Some(platforms) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("target", &self.target)?;
                map.serialize_entry("platforms", platforms)?;
                map.end()
            }
        }
    }
}

/// リストまたはカンマ区切り文字列のプラットフォーム宣言
fn platform_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<PlatformSpec>>, D::Error> {
    struct ListVisitor;

    impl<'de> Visitor<'de> for ListVisitor {
        type Value = Vec<PlatformSpec>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("list of platforms or comma separated platforms")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            value
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(|p| p.parse().map_err(E::custom))
                .collect()
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut platforms = Vec::new();
            while let Some(platform) = seq.next_element()? {
                platforms.push(platform);
            }
            Ok(platforms)
        }
    }

    deserializer.deserialize_any(ListVisitor).map(Some)
}

/// イメージファミリー（Docker Hub のリポジトリ単位。例: `ros2`）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Repository {
    /// Dockerfile テンプレート名（省略時は `<repo>.dockerfile.jinja`）
    #[serde(default)]
    pub template: Option<String>,
    /// README テンプレート名（省略時は `<repo>.md.jinja`）
    #[serde(default)]
    pub readme: Option<String>,
    /// このリポジトリのデフォルトステージ
    #[serde(default)]
    pub targets: Vec<Stage>,
    /// このリポジトリのデフォルトプラットフォーム
    #[serde(default)]
    pub platforms: Vec<PlatformSpec>,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

impl Repository {
    pub fn template_name(&self, repository: &str) -> String {
        self.template
            .clone()
            .unwrap_or_else(|| format!("{}.dockerfile.jinja", repository))
    }

    pub fn readme_name(&self, repository: &str) -> String {
        self.readme
            .clone()
            .unwrap_or_else(|| format!("{}.md.jinja", repository))
    }
}

/// ディストリビューションごとのビルド定義（例: `humble`）
///
/// `name` / `eol` / `targets` / `platforms` 以外のキーはすべて
/// テンプレート変数として `vars` に入ります。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    /// サポート終了日（この日以降は EOL 扱い）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eol: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<Stage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<PlatformSpec>>,
    #[serde(flatten)]
    pub vars: Vars,
}

impl Entry {
    /// `today` 時点で EOL かどうか
    pub fn is_eol(&self, today: NaiveDate) -> bool {
        self.eol.is_some_and(|eol| eol <= today)
    }

    /// 小数として読み込まれたテンプレート変数
    ///
    /// `3.10` のような引用なしの値は `3.1` になってしまうため、
    /// 生成前に検出して引用を促します。
    pub fn float_vars(&self) -> Vec<(&str, f64)> {
        self.vars
            .iter()
            .filter_map(|(key, value)| first_float(value).map(|f| (key.as_str(), f)))
            .collect()
    }
}

fn first_float(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) if !n.is_i64() && !n.is_u64() => n.as_f64(),
        serde_json::Value::Array(items) => items.iter().find_map(first_float),
        serde_json::Value::Object(map) => map.values().find_map(first_float),
        _ => None,
    }
}
