//! イメージ参照 `[registry/]repository[:tag][@digest]` の分解

/// レジストリ指定のない参照の既定レジストリ
pub const DOCKER_HUB: &str = "docker.io";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// レジストリ込みのリポジトリ（例: `ghcr.io/althack/ros2`）
    pub repository: String,
    pub tag: Option<String>,
    /// `sha256:...`
    pub digest: Option<String>,
}

impl ImageRef {
    /// 参照を分解する
    ///
    /// 最後の `/` より後ろにある `:` だけをタグの区切りとみなすため、
    /// `localhost:5000/app` のポートや `althack/ros2:2024` の数字だけのタグも
    /// 正しく扱えます。
    pub fn parse(reference: &str) -> Self {
        let reference = reference.trim();
        let (name, digest) = match reference.split_once('@') {
            Some((name, digest)) => (name, Some(digest.to_string())),
            None => (reference, None),
        };

        let last_component = name.rfind('/').map_or(0, |i| i + 1);
        let (repository, tag) = match name[last_component..].rfind(':') {
            Some(i) => {
                let split = last_component + i;
                (&name[..split], Some(name[split + 1..].to_string()))
            }
            None => (name, None),
        };

        Self {
            repository: repository.to_string(),
            tag,
            digest,
        }
    }

    /// 先頭要素がホスト名らしければそれを、そうでなければ Docker Hub を返す
    ///
    /// # Examples
    /// - `ghcr.io/org/app:tag` -> `ghcr.io`
    /// - `althack/ros2` -> `docker.io`
    /// - `localhost:5000/app` -> `localhost:5000`
    pub fn registry(&self) -> &str {
        match self.repository.split_once('/') {
            Some((host, _))
                if host.contains('.') || host.contains(':') || host == "localhost" =>
            {
                host
            }
            _ => DOCKER_HUB,
        }
    }

    pub fn tag_or_latest(&self) -> &str {
        self.tag.as_deref().unwrap_or("latest")
    }

    /// imagetools に渡すソース参照
    ///
    /// 参照自体がダイジェストを持つならそれを優先します。
    pub fn pinned(&self, digest: &str) -> String {
        let digest = self.digest.as_deref().unwrap_or(digest);
        format!("{}@{}", self.repository, digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(reference: &str) -> (String, Option<String>, Option<String>) {
        let parsed = ImageRef::parse(reference);
        (parsed.repository, parsed.tag, parsed.digest)
    }

    #[test]
    fn test_parse_tags_and_ports() {
        assert_eq!(
            parts("althack/ros2:humble-dev"),
            ("althack/ros2".into(), Some("humble-dev".into()), None)
        );
        assert_eq!(parts("althack/ros2"), ("althack/ros2".into(), None, None));
        assert_eq!(
            parts("althack/ros2:2024"),
            ("althack/ros2".into(), Some("2024".into()), None)
        );
        assert_eq!(
            parts("localhost:5000/app"),
            ("localhost:5000/app".into(), None, None)
        );
        assert_eq!(
            parts("localhost:5000/app:dev"),
            ("localhost:5000/app".into(), Some("dev".into()), None)
        );
        assert_eq!(parts("ubuntu:24.04"), ("ubuntu".into(), Some("24.04".into()), None));
    }

    #[test]
    fn test_parse_digest() {
        assert_eq!(
            parts("docker.io/acme/ros2@sha256:def"),
            ("docker.io/acme/ros2".into(), None, Some("sha256:def".into()))
        );
        assert_eq!(
            parts("localhost:5000/app:dev@sha256:abc"),
            (
                "localhost:5000/app".into(),
                Some("dev".into()),
                Some("sha256:abc".into())
            )
        );
    }

    #[test]
    fn test_registry() {
        assert_eq!(ImageRef::parse("ghcr.io/org/app:v1.0").registry(), "ghcr.io");
        assert_eq!(ImageRef::parse("althack/ros2:humble").registry(), DOCKER_HUB);
        assert_eq!(ImageRef::parse("ubuntu:jammy").registry(), DOCKER_HUB);
        assert_eq!(ImageRef::parse("localhost:5000/app").registry(), "localhost:5000");
        assert_eq!(ImageRef::parse("localhost/app").registry(), "localhost");
    }

    #[test]
    fn test_pinned_prefers_own_digest() {
        let plain = ImageRef::parse("docker.io/althack/ros2");
        assert_eq!(plain.pinned("sha256:aaa"), "docker.io/althack/ros2@sha256:aaa");

        let pinned = ImageRef::parse("docker.io/althack/ros2@sha256:bbb");
        assert_eq!(pinned.pinned("sha256:aaa"), "docker.io/althack/ros2@sha256:bbb");
    }
}
