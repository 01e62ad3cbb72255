// ── Hierarchical cache keys ──
//
// An ordered sequence of string segments (namespace, resource kind,
// optional resource identifier). Two queries for the same logical
// resource must construct identical keys; invalidation matches by
// segment-wise prefix.

use std::fmt;
use std::sync::Arc;

/// Hierarchical, prefix-matchable cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Arc<[String]>);

impl QueryKey {
    /// Build a key from ordered segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// A new key with one more segment appended.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments: Vec<String> = self.0.to_vec();
        segments.push(segment.into());
        Self(segments.into())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Segment-wise prefix match: `a/b` is a prefix of `a/b/c` but not of
    /// `a/bc`.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.len() >= prefix.0.len() && self.0.iter().zip(prefix.0.iter()).all(|(a, b)| a == b)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_segments_are_equal() {
        assert_eq!(
            QueryKey::new(["zerotier", "network"]),
            QueryKey::new(["zerotier", "network"]),
        );
    }

    #[test]
    fn prefix_matching_is_segment_wise() {
        let prefix = QueryKey::new(["zerotier"]);
        assert!(QueryKey::new(["zerotier", "network"]).starts_with(&prefix));
        assert!(QueryKey::new(["zerotier"]).starts_with(&prefix));
        assert!(!QueryKey::new(["zerotier-x"]).starts_with(&prefix));
        assert!(!QueryKey::new(["dns", "zerotier"]).starts_with(&prefix));
    }

    #[test]
    fn child_appends_a_segment() {
        let key = QueryKey::new(["zerotier", "network"]).child("1c33c1ced015c144");
        assert_eq!(
            key.segments(),
            ["zerotier", "network", "1c33c1ced015c144"]
        );
        assert!(key.starts_with(&QueryKey::new(["zerotier", "network"])));
    }
}
