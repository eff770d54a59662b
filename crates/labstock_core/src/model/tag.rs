//! Item tag normalization.
//!
//! # Invariants
//! - Tag text is trimmed and never empty.
//! - A `TagSet` keeps first-seen order and holds each exact text once.

use serde::{Deserialize, Serialize};

/// One normalized tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag {
    text: String,
}

impl Tag {
    /// Builds a tag from raw text; `None` for blank input.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self {
                text: trimmed.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }
}

/// Ordered, duplicate-free tag collection owned by an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TagSet {
    tags: Vec<Tag>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a tag unless the same text is already present.
    ///
    /// Returns whether the set changed.
    pub fn insert(&mut self, tag: Tag) -> bool {
        if self.contains(tag.as_str()) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    pub fn contains(&self, text: &str) -> bool {
        self.tags.iter().any(|tag| tag.as_str() == text)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.tags.iter().map(|tag| tag.text.clone()).collect()
    }
}

impl From<Vec<String>> for TagSet {
    fn from(value: Vec<String>) -> Self {
        normalize_tags(&value)
    }
}

impl From<TagSet> for Vec<String> {
    fn from(value: TagSet) -> Self {
        value.tags.into_iter().map(|tag| tag.text).collect()
    }
}

/// Trims, drops blanks and deduplicates raw tags, keeping first-seen order.
pub fn normalize_tags<S: AsRef<str>>(raw: &[S]) -> TagSet {
    let mut set = TagSet::new();
    for value in raw {
        if let Some(tag) = Tag::new(value.as_ref()) {
            set.insert(tag);
        }
    }
    set
}

#[cfg(test)]
mod tests {
    use super::{normalize_tags, Tag, TagSet};

    #[test]
    fn normalize_trims_drops_blanks_and_keeps_order() {
        let tags = normalize_tags(&["  buffer ", "", "frozen", "   ", "buffer", "Buffer"]);
        assert_eq!(
            tags.to_strings(),
            vec!["buffer".to_string(), "frozen".to_string(), "Buffer".to_string()]
        );
    }

    #[test]
    fn insert_reports_duplicates() {
        let mut tags = TagSet::new();
        assert!(tags.insert(Tag::new("a").unwrap()));
        assert!(!tags.insert(Tag::new(" a ").unwrap()));
        assert_eq!(tags.len(), 1);
    }

    #[test]
    fn tag_rejects_blank_text() {
        assert!(Tag::new(" \t ").is_none());
    }

    #[test]
    fn deserialize_normalizes_input() {
        let tags: TagSet = serde_json::from_str(r#"["x", " x", "y"]"#).unwrap();
        assert_eq!(tags.to_strings(), vec!["x".to_string(), "y".to_string()]);
    }
}
