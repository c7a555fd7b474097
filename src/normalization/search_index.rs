use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{SynonymMapping, SynonymSource};

/// Declarative form of a synonym mapping; `source.collection` is flattened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynonymRecord {
    pub analyzer: String,
    pub name: String,
    pub source_collection: String,
}

pub fn flatten_synonyms(synonyms: &[SynonymMapping]) -> Vec<SynonymRecord> {
    synonyms
        .iter()
        .map(|s| SynonymRecord {
            analyzer: s.analyzer.clone(),
            name: s.name.clone(),
            source_collection: s.source.collection.clone(),
        })
        .collect()
}

pub fn expand_synonyms(records: &[SynonymRecord]) -> Vec<SynonymMapping> {
    records
        .iter()
        .map(|r| SynonymMapping {
            analyzer: r.analyzer.clone(),
            name: r.name.clone(),
            source: SynonymSource {
                collection: r.source_collection.clone(),
            },
        })
        .collect()
}

/// Canonical compact JSON text for an opaque document. `null` and empty
/// objects or arrays flatten to the empty string.
pub fn flatten_json_fields(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Object(map) if map.is_empty() => String::new(),
        Value::Array(items) if items.is_empty() => String::new(),
        // serde_json's default map is ordered, so keys come out sorted
        other => other.to_string(),
    }
}

/// Parse declared JSON text. Blank input means the attribute is unset.
pub fn expand_json_fields(text: &str) -> Result<Option<Value>, serde_json::Error> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(text).map(Some)
}

/// Whether two JSON texts describe the same document. Unparseable text only
/// equals itself.
pub fn json_fields_equivalent(a: &str, b: &str) -> bool {
    match (expand_json_fields(a), expand_json_fields(b)) {
        (Ok(left), Ok(right)) => {
            left.as_ref().map(flatten_json_fields).unwrap_or_default()
                == right.as_ref().map(flatten_json_fields).unwrap_or_default()
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_synonyms_flatten_source_collection() {
        let synonyms = vec![SynonymMapping {
            analyzer: "lucene.simple".to_string(),
            name: "synonym_test".to_string(),
            source: SynonymSource {
                collection: "collection_test".to_string(),
            },
        }];
        let records = flatten_synonyms(&synonyms);
        assert_eq!(records[0].source_collection, "collection_test");
        assert_eq!(expand_synonyms(&records), synonyms);
    }

    #[test]
    fn test_json_fields_are_canonical() {
        let value = json!({"title": {"type": "string", "analyzer": "lucene.english"}});
        assert_eq!(
            flatten_json_fields(&value),
            r#"{"title":{"analyzer":"lucene.english","type":"string"}}"#
        );
        assert_eq!(flatten_json_fields(&Value::Null), "");
        assert_eq!(flatten_json_fields(&json!({})), "");
    }

    #[test]
    fn test_expand_json_fields() {
        assert_eq!(expand_json_fields("  ").unwrap(), None);
        assert_eq!(
            expand_json_fields(r#"{ "a" : 1 }"#).unwrap(),
            Some(json!({"a": 1}))
        );
        assert!(expand_json_fields("{not json").is_err());
    }

    #[test]
    fn test_whitespace_and_key_order_are_equivalent() {
        let declared = "{\n  \"type\": \"string\",\n  \"analyzer\": \"lucene.simple\"\n}";
        let stored = r#"{"analyzer":"lucene.simple","type":"string"}"#;
        assert!(json_fields_equivalent(declared, stored));
        assert!(json_fields_equivalent("", "{}"));
        assert!(!json_fields_equivalent(stored, r#"{"analyzer":"lucene.french"}"#));
    }
}
