//! Dotted key paths into a configuration tree.

use std::fmt;

/// A path of mapping keys from the root of a configuration tree.
///
/// Parsed from dotted form (`env.generator_params.max_processing_time`) for
/// lookups and runtime overrides, or from slash form (`env/generator`) for
/// override-group targets. An empty path addresses the root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a dotted path. Empty segments are discarded, so `""` is the root.
    pub fn parse(path: &str) -> Self {
        Self(path.split('.').filter(|s| !s.is_empty()).map(str::to_string).collect())
    }

    /// Parse a slash-separated group path. A leading `/` is accepted and ignored.
    pub fn from_group_path(path: &str) -> Self {
        Self(path.split('/').filter(|s| !s.is_empty()).map(str::to_string).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Extend this path by one key.
    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        Self(segments)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::KeyPath;

    #[test]
    fn parse_and_display_round_trip() {
        let path = KeyPath::parse("env.generator_params.max_processing_time");
        assert_eq!(path.segments().len(), 3);
        assert_eq!(path.to_string(), "env.generator_params.max_processing_time");
    }

    #[test]
    fn empty_string_is_root() {
        assert!(KeyPath::parse("").is_root());
        assert!(KeyPath::from_group_path("/").is_root());
    }

    #[test]
    fn group_path_strips_leading_slash() {
        assert_eq!(KeyPath::from_group_path("/env/generator"), KeyPath::from_group_path("env/generator"));
        assert_eq!(KeyPath::from_group_path("env/generator").to_string(), "env.generator");
    }

    #[test]
    fn child_extends() {
        let path = KeyPath::parse("trainer").child("max_epochs");
        assert_eq!(path.to_string(), "trainer.max_epochs");
    }
}
