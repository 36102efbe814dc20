//! Addresses into the configuration tree.

use std::fmt;

/// An ordered list of segments addressing a node in the config tree.
///
/// Built from a dotted string (`"database.hosts[0].name"`) or from explicit
/// segments (`["config.stub", "port"]`). Explicit segments are taken
/// literally, so a segment may contain dots.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// Parses a dotted path. `a[0].b` is equivalent to `a.0.b`.
    pub fn parse(path: &str) -> Self {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = path.chars();

        while let Some(ch) = chars.next() {
            match ch {
                '.' => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                }
                '[' => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                    let index: String = chars.by_ref().take_while(|c| *c != ']').collect();
                    segments.push(index.trim_matches(|c| c == '"' || c == '\'').to_string());
                }
                _ => current.push(ch),
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }

        Self { segments }
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The leading segment, which names the namespace.
    pub fn namespace(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl From<&str> for KeyPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<String> for KeyPath {
    fn from(path: String) -> Self {
        Self::parse(&path)
    }
}

impl From<&String> for KeyPath {
    fn from(path: &String) -> Self {
        Self::parse(path)
    }
}

impl From<&KeyPath> for KeyPath {
    fn from(path: &KeyPath) -> Self {
        path.clone()
    }
}

impl From<Vec<String>> for KeyPath {
    fn from(segments: Vec<String>) -> Self {
        Self { segments }
    }
}

impl From<&[&str]> for KeyPath {
    fn from(segments: &[&str]) -> Self {
        Self::from_segments(segments.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for KeyPath {
    fn from(segments: [&str; N]) -> Self {
        Self::from_segments(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_path() {
        let path = KeyPath::from("database.primary.host");
        assert_eq!(path.segments(), ["database", "primary", "host"]);
        assert_eq!(path.namespace(), Some("database"));
    }

    #[test]
    fn test_bracket_indices() {
        let path = KeyPath::from("servers[1].port");
        assert_eq!(path.segments(), ["servers", "1", "port"]);

        let quoted = KeyPath::from("app['name']");
        assert_eq!(quoted.segments(), ["app", "name"]);
    }

    #[test]
    fn test_explicit_segments_keep_dots() {
        let path = KeyPath::from(["config.stub", "port"]);
        assert_eq!(path.segments(), ["config.stub", "port"]);
        assert_eq!(path.to_string(), "config.stub.port");
    }

    #[test]
    fn test_empty_path() {
        assert!(KeyPath::from("").is_empty());
        assert!(KeyPath::from("..").is_empty());
    }
}
