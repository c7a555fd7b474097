//! Atlas Search index wire types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Search index as exchanged with `/groups/{groupId}/clusters/{cluster}/fts/indexes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchIndex {
    #[serde(rename = "indexID", default, skip_serializing_if = "String::is_empty")]
    pub index_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub collection_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_analyzer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mappings: Option<IndexMappings>,
    /// Custom analyzer definitions, passed through as opaque JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzers: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<SynonymMapping>,
    /// Build status reported by the API (`IN_PROGRESS`, `STEADY`, ...). Read only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexMappings {
    #[serde(default)]
    pub dynamic: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynonymMapping {
    #[serde(default)]
    pub analyzer: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub source: SynonymSource,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynonymSource {
    #[serde(default)]
    pub collection: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_index_deserializes_api_payload() {
        let payload = json!({
            "indexID": "5d1268a980eef518dac0cf41",
            "name": "default",
            "database": "sample_mflix",
            "collectionName": "movies",
            "analyzer": "lucene.standard",
            "searchAnalyzer": "lucene.standard",
            "mappings": {
                "dynamic": false,
                "fields": {"title": {"type": "string", "analyzer": "lucene.english"}}
            },
            "synonyms": [{"analyzer": "lucene.simple", "name": "synonym_test", "source": {"collection": "synonyms"}}],
            "status": "STEADY"
        });

        let index: SearchIndex = serde_json::from_value(payload).unwrap();
        assert_eq!(index.index_id, "5d1268a980eef518dac0cf41");
        assert_eq!(index.collection_name, "movies");
        let mappings = index.mappings.unwrap();
        assert!(!mappings.dynamic);
        assert!(mappings.fields.unwrap().contains_key("title"));
        assert_eq!(index.synonyms[0].source.collection, "synonyms");
        assert!(index.analyzers.is_none());
    }

    #[test]
    fn test_create_body_omits_server_fields() {
        let index = SearchIndex {
            name: "default".to_string(),
            database: "db".to_string(),
            collection_name: "coll".to_string(),
            mappings: Some(IndexMappings {
                dynamic: true,
                fields: None,
            }),
            ..Default::default()
        };
        let body = serde_json::to_value(&index).unwrap();
        assert_eq!(
            body,
            json!({
                "name": "default",
                "database": "db",
                "collectionName": "coll",
                "mappings": {"dynamic": true}
            })
        );
    }
}
