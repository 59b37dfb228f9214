//! Way tags as handed over by the import front end
//!
//! A tag value is either a plain string or, under the reserved `node_tags` key, the
//! ordered tag maps of the barrier/point nodes along the way. Parsers must check which
//! one they got; `get_str` only ever returns scalars.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reserved key holding per-node tags
pub const NODE_TAGS_KEY: &str = "node_tags";

/// Tags of one node
pub type TagMap = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Scalar(String),
    NodeTags(Vec<TagMap>),
}

/// Tags of one way
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WayTags {
    pub id: i64,
    #[serde(default)]
    tags: BTreeMap<String, TagValue>,
}

impl WayTags {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            tags: BTreeMap::new(),
        }
    }

    /// Builder-style `set_tag`
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_tag(key, value);
        self
    }

    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), TagValue::Scalar(value.into()));
    }

    pub fn remove_tag(&mut self, key: &str) {
        self.tags.remove(key);
    }

    pub fn set_node_tags(&mut self, nodes: Vec<TagMap>) {
        self.tags.insert(NODE_TAGS_KEY.to_string(), TagValue::NodeTags(nodes));
    }

    /// Scalar value of `key`; `None` if absent or not a scalar
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.tags.get(key)? {
            TagValue::Scalar(s) => Some(s.as_str()),
            TagValue::NodeTags(_) => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&TagValue> {
        self.tags.get(key)
    }

    /// Check if a key exists
    pub fn has(&self, key: &str) -> bool {
        self.tags.contains_key(key)
    }

    pub fn has_tag(&self, key: &str, value: &str) -> bool {
        self.get_str(key) == Some(value)
    }

    pub fn has_any_value(&self, key: &str, values: &[&str]) -> bool {
        self.get_str(key).is_some_and(|v| values.contains(&v))
    }

    /// First scalar value found among `keys`, in the given order
    pub fn first_present<'a>(&'a self, keys: &[&str]) -> Option<&'a str> {
        keys.iter().find_map(|k| self.get_str(k))
    }

    /// Per-node tag maps, if the front end supplied any
    pub fn node_tags(&self) -> Option<&[TagMap]> {
        match self.tags.get(NODE_TAGS_KEY)? {
            TagValue::NodeTags(nodes) => Some(nodes.as_slice()),
            TagValue::Scalar(_) => None,
        }
    }

    /// All scalar tags (node tags are skipped)
    pub fn scalars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().filter_map(|(k, v)| match v {
            TagValue::Scalar(s) => Some((k.as_str(), s.as_str())),
            TagValue::NodeTags(_) => None,
        })
    }
}

/// Build a node tag map from pairs
pub fn tag_map<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> TagMap {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_str_only_returns_scalars() {
        let mut way = WayTags::new(1).with_tag("highway", "track");
        way.set_node_tags(vec![tag_map([("barrier", "gate")])]);

        assert_eq!(way.get_str("highway"), Some("track"));
        assert_eq!(way.get_str(NODE_TAGS_KEY), None);
        assert!(way.has(NODE_TAGS_KEY));
        assert_eq!(way.node_tags().map(|n| n.len()), Some(1));
        assert_eq!(way.scalars().count(), 1);
    }

    #[test]
    fn test_scalar_under_node_tags_key_is_not_a_sequence() {
        let way = WayTags::new(1).with_tag(NODE_TAGS_KEY, "oops");
        assert!(way.node_tags().is_none());
    }

    #[test]
    fn test_first_present_respects_order() {
        let way = WayTags::new(1)
            .with_tag("access", "no")
            .with_tag("motor_vehicle", "yes");
        assert_eq!(
            way.first_present(&["motorcar", "motor_vehicle", "access"]),
            Some("yes")
        );
        assert!(way.has_any_value("access", &["no", "private"]));
        assert!(!way.has_tag("access", "yes"));
    }

    #[test]
    fn test_deserialize_mixed_values() {
        let json = r#"{
            "id": 42,
            "tags": {
                "highway": "residential",
                "node_tags": [{"barrier": "bollard"}, {}]
            }
        }"#;
        let way: WayTags = serde_json::from_str(json).unwrap();
        assert_eq!(way.id, 42);
        assert_eq!(way.get_str("highway"), Some("residential"));
        let nodes = way.node_tags().unwrap();
        assert_eq!(nodes[0].get("barrier").map(String::as_str), Some("bollard"));
        assert!(nodes[1].is_empty());
    }
}
