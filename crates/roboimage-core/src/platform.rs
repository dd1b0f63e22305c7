//! プラットフォーム文字列の正規化とマッチング
//!
//! `os/arch/variant` 形式（`linux-arm-v7` のようなハイフン区切りも可）の文字列を
//! containerd と同じ規則で正規化し、ワイルドカードを含むサポート宣言
//! （例: `linux/arm/*`）との照合を行います。

use crate::error::{CoreError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// OSが省略された場合のデフォルト
const DEFAULT_OS: &str = "linux";

const WILDCARD: &str = "*";

/// 正規化済みのプラットフォーム（例: `linux/arm64`, `linux/arm/v7`）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Platform {
    pub os: String,
    pub arch: String,
    pub variant: Option<String>,
}

impl Platform {
    /// 各要素から正規化済みのプラットフォームを作成
    pub fn new(os: &str, arch: &str, variant: Option<&str>) -> Self {
        let (arch, variant) = normalize_arch(arch, variant);
        let variant = variant.or_else(|| default_variant(&arch).map(str::to_string));
        Self {
            os: normalize_os(os),
            arch,
            variant,
        }
    }

    /// タグやアーティファクト名に使える形式（`linux-arm-v7`）
    pub fn slug(&self) -> String {
        match &self.variant {
            Some(variant) => format!("{}-{}-{}", self.os, self.arch, variant),
            None => format!("{}-{}", self.os, self.arch),
        }
    }
}

impl FromStr for Platform {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self> {
        let (os, arch, variant) = split_components(value)?;
        let parts = [os.as_deref(), Some(arch.as_str()), variant.as_deref()];
        if parts.into_iter().flatten().any(|part| part == WILDCARD) {
            return Err(invalid(
                value,
                "ワイルドカードはサポート宣言でのみ使用できます",
            ));
        }
        Ok(Platform::new(
            os.as_deref().unwrap_or(DEFAULT_OS),
            &arch,
            variant.as_deref(),
        ))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)?;
        if let Some(variant) = &self.variant {
            write!(f, "/{}", variant)?;
        }
        Ok(())
    }
}

/// パターンの各要素
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment<T> {
    /// `*` - 何にでもマッチ
    Any,
    Exact(T),
}

impl<T: PartialEq> Segment<T> {
    fn matches(&self, value: &T) -> bool {
        match self {
            Segment::Any => true,
            Segment::Exact(expected) => expected == value,
        }
    }
}

/// variant の照合条件
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VariantPattern {
    /// 省略 - 同じ os/arch のすべての variant にマッチ
    Unspecified,
    /// `*`
    Any,
    /// 正規化済みの variant
    Exact(Option<String>),
}

impl VariantPattern {
    fn matches(&self, variant: &Option<String>) -> bool {
        match self {
            VariantPattern::Unspecified | VariantPattern::Any => true,
            VariantPattern::Exact(expected) => expected == variant,
        }
    }
}

/// サポート宣言用のプラットフォームパターン
///
/// 各要素に `*` を使用できます。variant を省略した宣言は同じ os/arch の
/// すべての variant にマッチします（`linux/arm` は `linux/arm/v6` にも
/// `linux/arm/v7` にもマッチ）。ビルド対象としては [`Platform`] と同じ
/// デフォルト variant を使います。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlatformSpec {
    pub os: Segment<String>,
    pub arch: Segment<String>,
    pub variant: VariantPattern,
}

impl PlatformSpec {
    pub fn matches(&self, platform: &Platform) -> bool {
        self.os.matches(&platform.os)
            && self.arch.matches(&platform.arch)
            && self.variant.matches(&platform.variant)
    }

    /// ワイルドカードを含まない場合は具体的なプラットフォームを返す
    pub fn as_platform(&self) -> Option<Platform> {
        match (&self.os, &self.arch, &self.variant) {
            (Segment::Exact(os), Segment::Exact(arch), VariantPattern::Unspecified) => {
                Some(Platform::new(os, arch, None))
            }
            (Segment::Exact(os), Segment::Exact(arch), VariantPattern::Exact(variant)) => {
                Some(Platform::new(os, arch, variant.as_deref()))
            }
            _ => None,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_platform().is_none()
    }
}

impl From<Platform> for PlatformSpec {
    fn from(platform: Platform) -> Self {
        Self {
            os: Segment::Exact(platform.os),
            arch: Segment::Exact(platform.arch),
            variant: VariantPattern::Exact(platform.variant),
        }
    }
}

impl FromStr for PlatformSpec {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self> {
        let (os, arch, variant) = split_components(value)?;

        let os = match os.as_deref() {
            Some(WILDCARD) => Segment::Any,
            Some(os) => Segment::Exact(normalize_os(os)),
            None => Segment::Exact(DEFAULT_OS.to_string()),
        };

        let (arch, variant) = match (arch.as_str(), variant.as_deref()) {
            (WILDCARD, None) => (Segment::Any, VariantPattern::Unspecified),
            (WILDCARD, Some(WILDCARD)) => (Segment::Any, VariantPattern::Any),
            (WILDCARD, Some(variant)) => (
                Segment::Any,
                VariantPattern::Exact(Some(normalize_variant(variant))),
            ),
            (arch, Some(WILDCARD)) => {
                let (arch, _) = normalize_arch(arch, None);
                (Segment::Exact(arch), VariantPattern::Any)
            }
            (arch, None) => {
                // armhf / armel のように variant を含む別名だけは完全一致
                let (arch, implied) = normalize_arch(arch, None);
                let variant = match implied {
                    Some(v) => VariantPattern::Exact(Some(v)),
                    None => VariantPattern::Unspecified,
                };
                (Segment::Exact(arch), variant)
            }
            (arch, Some(variant)) => {
                let (arch, variant) = normalize_arch(arch, Some(variant));
                (Segment::Exact(arch), VariantPattern::Exact(variant))
            }
        };

        Ok(Self { os, arch, variant })
    }
}

impl fmt::Display for PlatformSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.os {
            Segment::Any => write!(f, "{}", WILDCARD)?,
            Segment::Exact(os) => write!(f, "{}", os)?,
        }
        match &self.arch {
            Segment::Any => write!(f, "/{}", WILDCARD)?,
            Segment::Exact(arch) => write!(f, "/{}", arch)?,
        }
        match &self.variant {
            VariantPattern::Any => write!(f, "/{}", WILDCARD)?,
            VariantPattern::Exact(Some(variant)) => write!(f, "/{}", variant)?,
            VariantPattern::Exact(None) | VariantPattern::Unspecified => {}
        }
        Ok(())
    }
}

macro_rules! string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let value = String::deserialize(deserializer)?;
                value.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_serde!(Platform);
string_serde!(PlatformSpec);

/// カンマ区切りまたは複数指定されたプラットフォームをまとめてパース
pub fn parse_platform_list<S: AsRef<str>>(values: &[S]) -> Result<Vec<Platform>> {
    let mut platforms = Vec::new();
    for value in values {
        for part in value.as_ref().split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let platform: Platform = part.parse()?;
            if !platforms.contains(&platform) {
                platforms.push(platform);
            }
        }
    }
    Ok(platforms)
}

fn invalid(value: &str, reason: &str) -> CoreError {
    CoreError::InvalidPlatform {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

type Components = (Option<String>, String, Option<String>);

/// `/` または `-` 区切りの文字列を os / arch / variant に分割
///
/// `x86-64` は区切りではなく amd64 の別名として扱います。
fn split_components(value: &str) -> Result<Components> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(invalid(value, "空の文字列です"));
    }

    let unified = trimmed
        .to_ascii_lowercase()
        .replace("x86-64", "x86_64")
        .replace('-', "/");
    let parts: Vec<String> = unified.split('/').map(|p| p.trim().to_string()).collect();
    if parts.iter().any(String::is_empty) {
        return Err(invalid(value, "空の要素が含まれています"));
    }

    match parts.as_slice() {
        [arch] => Ok((None, arch.clone(), None)),
        [os, arch] => Ok((Some(os.clone()), arch.clone(), None)),
        [os, arch, variant] => Ok((Some(os.clone()), arch.clone(), Some(variant.clone()))),
        _ => Err(invalid(value, "要素が多すぎます（os/arch/variant まで）")),
    }
}

fn normalize_os(os: &str) -> String {
    let os = os.to_ascii_lowercase();
    match os.as_str() {
        "macos" => "darwin".to_string(),
        _ => os,
    }
}

/// 数字だけの variant には `v` を付与（`7` → `v7`）
fn normalize_variant(variant: &str) -> String {
    let variant = variant.to_ascii_lowercase();
    if variant.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        format!("v{}", variant)
    } else {
        variant
    }
}

fn normalize_arch(arch: &str, variant: Option<&str>) -> (String, Option<String>) {
    let arch = arch.to_ascii_lowercase();
    let variant = variant.map(normalize_variant);

    match arch.as_str() {
        "i386" | "i686" | "x86" | "386" => ("386".to_string(), None),
        "x86_64" | "x86-64" | "amd64" => {
            // v1 は amd64 のデフォルト
            let variant = variant.filter(|v| v != "v1");
            ("amd64".to_string(), variant)
        }
        "aarch64" | "arm64" => {
            let variant = variant.filter(|v| v != "v8" && v != "v8.0");
            ("arm64".to_string(), variant)
        }
        "armhf" => ("arm".to_string(), Some("v7".to_string())),
        "armel" => ("arm".to_string(), Some("v6".to_string())),
        _ => (arch, variant),
    }
}

/// variant 省略時に補う値（arm は v7）
fn default_variant(arch: &str) -> Option<&'static str> {
    match arch {
        "arm" => Some("v7"),
        _ => None,
    }
}
