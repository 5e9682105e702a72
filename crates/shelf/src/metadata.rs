//! Record metadata and its store encoding.
//!
//! The store keeps metadata as one JSON object per record, each value tagged
//! with its type. Untagged string values from older rows are decoded by shape:
//! a JSON array of strings is a list, anything else starting with `[` is kept
//! verbatim as [`MetadataValue::Unstructured`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stored file copies, one per topic.
pub const KEY_PATH: &str = "path";
/// Resolved topic labels.
pub const KEY_TOPICS: &str = "topics";
/// Original path of the ingested file.
pub const KEY_SOURCE: &str = "source";
/// "paper" or "image".
pub const KEY_KIND: &str = "kind";
/// Chunk position within a paper.
pub const KEY_CHUNK: &str = "chunk";
/// RFC 3339 ingestion time.
pub const KEY_INDEXED_AT: &str = "indexed_at";

/// A single metadata value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum MetadataValue {
    Text(String),
    List(Vec<String>),
    /// Raw string that looked structured but did not decode.
    Unstructured(String),
}

impl MetadataValue {
    /// Decode an untagged string value.
    pub fn decode_untagged(raw: &str) -> Self {
        if !raw.trim_start().starts_with('[') {
            return Self::Text(raw.to_string());
        }

        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(items) => Self::List(items),
            Err(e) => {
                tracing::debug!("Keeping unstructured metadata value ({}): {}", e, raw);
                Self::Unstructured(raw.to_string())
            }
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Metadata attached to a store record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata(BTreeMap<String, MetadataValue>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: MetadataValue) {
        self.0.insert(key.into(), value);
    }

    pub fn with_text(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, MetadataValue::Text(value.into()));
        self
    }

    pub fn with_list(mut self, key: impl Into<String>, values: Vec<String>) -> Self {
        self.insert(key, MetadataValue::List(values));
        self
    }

    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.0.get(key)
    }

    /// List value for `key`, if present and decoded as a list.
    pub fn list(&self, key: &str) -> Option<&[String]> {
        self.get(key).and_then(MetadataValue::as_list)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(MetadataValue::as_text)
    }

    /// Topics carried by the record (empty when absent or undecodable).
    pub fn topics(&self) -> &[String] {
        self.list(KEY_TOPICS).unwrap_or(&[])
    }

    /// Stored copies carried by the record.
    pub fn stored_paths(&self) -> &[String] {
        self.list(KEY_PATH).unwrap_or(&[])
    }

    /// Encode to the JSON object stored in the metadata column.
    pub fn to_json(&self) -> String {
        // String keys and string payloads always serialize
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Decode the metadata column.
    ///
    /// Tagged values decode to their own type. Plain strings go through
    /// [`MetadataValue::decode_untagged`]; other JSON is kept as raw text.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(json)?;
        Ok(Self(
            raw.into_iter()
                .map(|(key, value)| {
                    let value = match value {
                        serde_json::Value::String(s) => MetadataValue::decode_untagged(&s),
                        other => serde_json::from_value::<MetadataValue>(other.clone())
                            .unwrap_or_else(|_| MetadataValue::Unstructured(other.to_string())),
                    };
                    (key, value)
                })
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_round_trips_through_store_encoding() {
        let topics = vec!["ml".to_string(), "graph, theory".to_string(), "[x]".to_string()];
        let metadata = Metadata::new()
            .with_list(KEY_TOPICS, topics.clone())
            .with_text(KEY_KIND, "image");

        let restored = Metadata::from_json(&metadata.to_json()).unwrap();

        assert_eq!(restored.topics(), topics.as_slice());
        assert_eq!(restored.text(KEY_KIND), Some("image"));
        assert_eq!(restored, metadata);
    }

    #[test]
    fn test_empty_list_round_trips() {
        let metadata = Metadata::new().with_list(KEY_PATH, vec![]);
        let restored = Metadata::from_json(&metadata.to_json()).unwrap();
        assert_eq!(restored.list(KEY_PATH), Some(&[][..]));
    }

    #[test]
    fn test_bracketed_text_stays_text() {
        let metadata = Metadata::new()
            .with_text(KEY_SOURCE, "[draft] notes.pdf")
            .with_text(KEY_KIND, r#"["a"]"#);

        let restored = Metadata::from_json(&metadata.to_json()).unwrap();

        assert_eq!(restored.text(KEY_SOURCE), Some("[draft] notes.pdf"));
        assert_eq!(restored.text(KEY_KIND), Some(r#"["a"]"#));
        assert_eq!(restored, metadata);
    }

    #[test]
    fn test_untagged_rows_decode_by_shape() {
        let restored = Metadata::from_json(
            r#"{"topics":"[\"ml\",\"nlp\"]","kind":"paper","path":"[broken"}"#,
        )
        .unwrap();

        assert_eq!(restored.topics(), ["ml", "nlp"]);
        assert_eq!(restored.text(KEY_KIND), Some("paper"));
        assert_eq!(
            restored.get(KEY_PATH),
            Some(&MetadataValue::Unstructured("[broken".to_string()))
        );
    }

    #[test]
    fn test_unknown_tagged_value_is_unstructured() {
        let restored = Metadata::from_json(r#"{"chunk":{"type":"number","value":3}}"#).unwrap();
        assert!(matches!(restored.get(KEY_CHUNK), Some(MetadataValue::Unstructured(_))));
    }

    #[test]
    fn test_malformed_list_is_kept_unstructured() {
        let value = MetadataValue::decode_untagged("[ml, nlp");
        assert_eq!(value, MetadataValue::Unstructured("[ml, nlp".to_string()));
        assert!(value.as_list().is_none());
    }

    #[test]
    fn test_non_string_list_is_unstructured() {
        let value = MetadataValue::decode_untagged("[1, 2]");
        assert!(matches!(value, MetadataValue::Unstructured(_)));
    }

    #[test]
    fn test_plain_text_stays_text() {
        assert_eq!(
            MetadataValue::decode_untagged("paper"),
            MetadataValue::Text("paper".to_string())
        );
    }

    #[test]
    fn test_missing_topics_is_empty() {
        let metadata = Metadata::new().with_text(KEY_TOPICS, "not a list");
        assert!(metadata.topics().is_empty());
    }
}
