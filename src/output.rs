//! Result types produced by a session.

use crate::range::PageRange;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Document-level metadata read from the PDF's info dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

/// Topics named by the model, one per line of its response, in the order
/// the model gave them.
///
/// Lines are not cleaned up: blank lines and duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicList(Vec<String>);

impl TopicList {
    /// Split a raw model response into topics.
    ///
    /// The response is trimmed as a whole, then split on `'\n'`. Interior
    /// blank lines survive as empty topics.
    pub fn from_response(raw: &str) -> Self {
        Self(raw.trim().split('\n').map(str::to_string).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Topic at a 0-based index.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for TopicList {
    fn from(topics: Vec<String>) -> Self {
        Self(topics)
    }
}

/// A generated summary of one topic over one page range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub topic: String,
    pub range: PageRange,
    pub text: String,
}

/// One rendered preview image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagePreview {
    /// 1-indexed page number.
    pub page_num: usize,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topics_keep_blank_lines_and_order() {
        let topics = TopicList::from_response("Topic A\nTopic B\n\nTopic C");
        assert_eq!(
            topics.as_slice(),
            &["Topic A", "Topic B", "", "Topic C"].map(String::from)
        );
    }

    #[test]
    fn topics_trim_outer_whitespace_only() {
        let topics = TopicList::from_response("\n  Alpha\n Beta \n\n");
        assert_eq!(topics.as_slice(), &["Alpha", " Beta"].map(String::from));
    }

    #[test]
    fn topics_keep_duplicates() {
        let topics = TopicList::from_response("X\nX");
        assert_eq!(topics.len(), 2);
        assert_eq!(topics.get(1), Some("X"));
        assert_eq!(topics.get(2), None);
    }

    #[test]
    fn topic_list_serialises_as_array() {
        let topics = TopicList::from(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(serde_json::to_string(&topics).unwrap(), r#"["a","b"]"#);
    }
}
