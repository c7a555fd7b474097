//! # State ID Codec
//!
//! Remote objects are addressed by compound keys (project, cluster, index id,
//! ...) while state holds a single opaque id string. This module encodes the
//! key parts into that string and decodes them back.
//!
//! Every part is written as `name:base64(value)` and the segments are joined
//! with `-`, in the order fixed by the resource's [`StateIdSchema`]. The
//! standard base64 alphabet contains neither `-` nor `:`, so any part value
//! (including ones containing the separators) is representable; only part
//! names are restricted. The format is persisted in user state and must not
//! change without a migration.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// Decoded key parts, addressed by part name.
pub type StateIdParts = BTreeMap<String, String>;

const SEGMENT_SEPARATOR: &str = "-";
const PART_SEPARATOR: &str = ":";

/// Errors produced while encoding or decoding state ids.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateIdError {
    #[error("cannot encode {kind} id: {reason}")]
    Encoding { kind: &'static str, reason: String },
    #[error("cannot decode {kind} id '{id}': {reason}")]
    Decoding {
        kind: &'static str,
        id: String,
        reason: String,
    },
}

/// The fixed, ordered list of key parts for one resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateIdSchema {
    kind: &'static str,
    parts: &'static [&'static str],
}

/// Alert configurations are keyed by project and alert id.
pub const ALERT_CONFIGURATION: StateIdSchema =
    StateIdSchema::new("alert_configuration", &["id", "project_id"]);

/// Search indexes are keyed by project, cluster and index id.
pub const SEARCH_INDEX: StateIdSchema =
    StateIdSchema::new("search_index", &["cluster_name", "index_id", "project_id"]);

/// All schemas known to this crate.
pub const ALL_SCHEMAS: &[StateIdSchema] = &[ALERT_CONFIGURATION, SEARCH_INDEX];

impl StateIdSchema {
    pub const fn new(kind: &'static str, parts: &'static [&'static str]) -> Self {
        Self { kind, parts }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn parts(&self) -> &'static [&'static str] {
        self.parts
    }

    /// Find a schema by resource kind.
    pub fn lookup(kind: &str) -> Option<StateIdSchema> {
        ALL_SCHEMAS.iter().copied().find(|schema| schema.kind == kind)
    }

    /// Encode `parts` into a state id. The map must hold exactly the parts
    /// declared by the schema.
    pub fn encode(&self, parts: &StateIdParts) -> Result<String, StateIdError> {
        if let Some(unexpected) = parts.keys().find(|k| !self.parts.contains(&k.as_str())) {
            return Err(self.encoding_error(format!("unexpected part '{}'", unexpected)));
        }

        let mut segments = Vec::with_capacity(self.parts.len());
        for name in self.parts {
            validate_part_name(name).map_err(|reason| self.encoding_error(reason))?;
            let value = parts
                .get(*name)
                .ok_or_else(|| self.encoding_error(format!("missing part '{}'", name)))?;
            segments.push(format!(
                "{}{}{}",
                name,
                PART_SEPARATOR,
                STANDARD.encode(value.as_bytes())
            ));
        }

        Ok(segments.join(SEGMENT_SEPARATOR))
    }

    /// Convenience wrapper around [`StateIdSchema::encode`] for borrowed pairs.
    pub fn encode_pairs(&self, pairs: &[(&str, &str)]) -> Result<String, StateIdError> {
        let mut parts = StateIdParts::new();
        for (name, value) in pairs {
            if parts.insert(name.to_string(), value.to_string()).is_some() {
                return Err(self.encoding_error(format!("duplicate part '{}'", name)));
            }
        }
        self.encode(&parts)
    }

    /// Decode a state id produced by [`StateIdSchema::encode`].
    pub fn decode(&self, id: &str) -> Result<StateIdParts, StateIdError> {
        if id.is_empty() {
            return Err(self.decoding_error(id, "identifier is empty"));
        }

        let segments: Vec<&str> = id.split(SEGMENT_SEPARATOR).collect();
        if segments.len() != self.parts.len() {
            return Err(self.decoding_error(
                id,
                format!(
                    "expected {} parts, found {}",
                    self.parts.len(),
                    segments.len()
                ),
            ));
        }

        let mut parts = StateIdParts::new();
        for (segment, expected) in segments.iter().zip(self.parts) {
            let (name, encoded) = segment.split_once(PART_SEPARATOR).ok_or_else(|| {
                self.decoding_error(id, format!("segment '{}' has no part name", segment))
            })?;

            if name != *expected {
                return Err(self.decoding_error(
                    id,
                    format!("expected part '{}', found '{}'", expected, name),
                ));
            }

            let bytes = STANDARD.decode(encoded).map_err(|err| {
                self.decoding_error(id, format!("part '{}' is not valid base64: {}", name, err))
            })?;
            let value = String::from_utf8(bytes).map_err(|_| {
                self.decoding_error(id, format!("part '{}' contains invalid UTF-8 data", name))
            })?;

            parts.insert(name.to_string(), value);
        }

        Ok(parts)
    }

    /// Return one part of an encoded id, or `id` itself when it is a plain
    /// remote id rather than an encoded one.
    pub fn part_or_raw(&self, id: &str, part: &str) -> Result<String, StateIdError> {
        if !is_encoded(id) {
            return Ok(id.to_string());
        }

        let mut parts = self.decode(id)?;
        parts
            .remove(part)
            .ok_or_else(|| self.decoding_error(id, format!("no part named '{}'", part)))
    }

    fn encoding_error(&self, reason: impl Into<String>) -> StateIdError {
        StateIdError::Encoding {
            kind: self.kind,
            reason: reason.into(),
        }
    }

    fn decoding_error(&self, id: &str, reason: impl Into<String>) -> StateIdError {
        StateIdError::Decoding {
            kind: self.kind,
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Whether `id` looks like an encoded state id rather than a raw remote id.
pub fn is_encoded(id: &str) -> bool {
    id.contains(SEGMENT_SEPARATOR) && id.contains(PART_SEPARATOR)
}

fn validate_part_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("part name is empty".to_string());
    }
    if name.contains(SEGMENT_SEPARATOR) || name.contains(PART_SEPARATOR) {
        return Err(format!("part name '{}' contains a reserved separator", name));
    }
    Ok(())
}

/// Human-typed import ids, e.g. `project--cluster--index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportIdFormat {
    schema: StateIdSchema,
    separator: &'static str,
    order: &'static [&'static str],
}

/// `<project_id>-<alert_id>`
pub const ALERT_CONFIGURATION_IMPORT: ImportIdFormat = ImportIdFormat {
    schema: ALERT_CONFIGURATION,
    separator: "-",
    order: &["project_id", "id"],
};

/// `<project_id>--<cluster_name>--<index_id>`
pub const SEARCH_INDEX_IMPORT: ImportIdFormat = ImportIdFormat {
    schema: SEARCH_INDEX,
    separator: "--",
    order: &["project_id", "cluster_name", "index_id"],
};

impl ImportIdFormat {
    pub fn schema(&self) -> StateIdSchema {
        self.schema
    }

    /// Import format for a resource kind.
    pub fn lookup(kind: &str) -> Option<ImportIdFormat> {
        [ALERT_CONFIGURATION_IMPORT, SEARCH_INDEX_IMPORT]
            .into_iter()
            .find(|format| format.schema.kind == kind)
    }

    /// Split an import id into key parts. Every part must be non-empty.
    pub fn parse(&self, raw: &str) -> Result<StateIdParts, StateIdError> {
        let pieces: Vec<&str> = raw.split(self.separator).collect();
        if pieces.len() != self.order.len() {
            return Err(self.schema.decoding_error(
                raw,
                format!(
                    "import id must have the form {}",
                    self.order.join(self.separator)
                ),
            ));
        }

        let mut parts = StateIdParts::new();
        for (name, value) in self.order.iter().zip(pieces) {
            if value.is_empty() {
                return Err(self
                    .schema
                    .decoding_error(raw, format!("import id part '{}' is empty", name)));
            }
            parts.insert(name.to_string(), value.to_string());
        }
        Ok(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(pairs: &[(&str, &str)]) -> StateIdParts {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let cases = [
            parts(&[("id", "5f1b2c3d4e5f6a7b8c9d0e1f"), ("project_id", "60ddf55c27a5a20955a707d7")]),
            parts(&[("id", ""), ("project_id", "p")]),
            parts(&[("id", "with-dash:and-colon"), ("project_id", "ünïcødé ✓")]),
            parts(&[("id", "a--b--c"), ("project_id", "====")]),
        ];

        for case in cases {
            let encoded = ALERT_CONFIGURATION.encode(&case).unwrap();
            let decoded = ALERT_CONFIGURATION.decode(&encoded).unwrap();
            assert_eq!(decoded, case);
            assert_eq!(ALERT_CONFIGURATION.encode(&decoded).unwrap(), encoded);
        }
    }

    #[test]
    fn test_encoding_matches_persisted_format() {
        let encoded = SEARCH_INDEX
            .encode_pairs(&[("project_id", "p1"), ("cluster_name", "c1"), ("index_id", "i1")])
            .unwrap();
        assert_eq!(encoded, "cluster_name:YzE=-index_id:aTE=-project_id:cDE=");
    }

    #[test]
    fn test_encoding_order_is_fixed_by_schema() {
        let a = SEARCH_INDEX
            .encode_pairs(&[("index_id", "i"), ("project_id", "p"), ("cluster_name", "c")])
            .unwrap();
        let b = SEARCH_INDEX
            .encode_pairs(&[("cluster_name", "c"), ("project_id", "p"), ("index_id", "i")])
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_encode_rejects_missing_and_extra_parts() {
        let missing = ALERT_CONFIGURATION.encode(&parts(&[("id", "x")]));
        assert!(matches!(missing, Err(StateIdError::Encoding { .. })));
        assert!(missing.unwrap_err().to_string().contains("missing part 'project_id'"));

        let extra = ALERT_CONFIGURATION.encode(&parts(&[
            ("id", "x"),
            ("project_id", "p"),
            ("cluster_name", "c"),
        ]));
        assert!(matches!(extra, Err(StateIdError::Encoding { .. })));

        let duplicate = ALERT_CONFIGURATION.encode_pairs(&[("id", "x"), ("id", "y")]);
        assert!(matches!(duplicate, Err(StateIdError::Encoding { .. })));
    }

    #[test]
    fn test_encode_rejects_reserved_part_names() {
        let schema = StateIdSchema::new("broken", &["bad-name"]);
        let result = schema.encode(&parts(&[("bad-name", "v")]));
        assert!(matches!(result, Err(StateIdError::Encoding { .. })));
    }

    #[test]
    fn test_decode_wrong_arity_fails() {
        let encoded = ALERT_CONFIGURATION
            .encode_pairs(&[("id", "x"), ("project_id", "p")])
            .unwrap();

        let err = SEARCH_INDEX.decode(&encoded).unwrap_err();
        assert!(matches!(err, StateIdError::Decoding { .. }));
        assert!(err.to_string().contains("expected 3 parts, found 2"));

        let truncated = encoded.split('-').next().unwrap();
        assert!(ALERT_CONFIGURATION.decode(truncated).is_err());
        assert!(ALERT_CONFIGURATION.decode("").is_err());
    }

    #[test]
    fn test_decode_rejects_malformed_segments() {
        assert!(ALERT_CONFIGURATION.decode("id:eA==-nocolon").is_err());
        assert!(ALERT_CONFIGURATION.decode("project_id:cA==-id:eA==").is_err());
        assert!(ALERT_CONFIGURATION.decode("id:!!!-project_id:cA==").is_err());
        // "//8=" decodes to invalid UTF-8
        let err = ALERT_CONFIGURATION.decode("id://8=-project_id:cA==").unwrap_err();
        assert!(err.to_string().contains("invalid UTF-8"));
    }

    #[test]
    fn test_part_or_raw() {
        let encoded = ALERT_CONFIGURATION
            .encode_pairs(&[("id", "alert-1"), ("project_id", "p")])
            .unwrap();
        assert_eq!(ALERT_CONFIGURATION.part_or_raw(&encoded, "id").unwrap(), "alert-1");
        assert_eq!(
            ALERT_CONFIGURATION
                .part_or_raw("5f1b2c3d4e5f6a7b8c9d0e1f", "id")
                .unwrap(),
            "5f1b2c3d4e5f6a7b8c9d0e1f"
        );
        assert!(ALERT_CONFIGURATION.part_or_raw(&encoded, "cluster_name").is_err());
    }

    #[test]
    fn test_import_id_parsing() {
        let parsed = SEARCH_INDEX_IMPORT.parse("proj--my-cluster--idx").unwrap();
        assert_eq!(
            parsed,
            parts(&[("project_id", "proj"), ("cluster_name", "my-cluster"), ("index_id", "idx")])
        );

        assert!(SEARCH_INDEX_IMPORT.parse("proj--cluster").is_err());
        assert!(SEARCH_INDEX_IMPORT.parse("proj----idx").is_err());

        let alert = ALERT_CONFIGURATION_IMPORT.parse("proj-alert").unwrap();
        assert_eq!(alert, parts(&[("project_id", "proj"), ("id", "alert")]));
        assert!(ALERT_CONFIGURATION_IMPORT.parse("proj").is_err());
    }

    #[test]
    fn test_schema_lookup() {
        assert_eq!(StateIdSchema::lookup("search_index"), Some(SEARCH_INDEX));
        assert_eq!(StateIdSchema::lookup("cluster"), None);
        assert_eq!(
            ImportIdFormat::lookup("alert_configuration"),
            Some(ALERT_CONFIGURATION_IMPORT)
        );
    }
}
