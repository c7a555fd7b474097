//! # Attribute Store
//!
//! The declarative engine keeps each resource as a flat map of named
//! attributes plus an opaque identifier. [`AttributeStore`] is the seam the
//! adapters write through; [`ResourceData`] is the in-memory implementation,
//! which type-checks every value against a [`Schema`].

pub mod schema;

use std::collections::BTreeMap;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use thiserror::Error;

pub use schema::{
    AttrMode, AttrType, AttributeSchema, Schema, alert_configuration_data_source_schema,
    alert_configuration_resource_schema, search_index_data_source_schema,
    search_index_resource_schema,
};

const REDACTED: &str = "[REDACTED]";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AttributeError {
    #[error("unknown attribute `{key}`")]
    UnknownAttribute { key: String },

    #[error("attribute `{key}` expects {expected}, got {found}")]
    TypeMismatch {
        key: String,
        expected: String,
        found: String,
    },

    #[error("required attribute `{key}` is not set")]
    MissingRequired { key: String },

    #[error("attribute `{key}` is computed and cannot be configured")]
    ComputedOnly { key: String },

    #[error("attribute `{key}` has an unexpected shape: {message}")]
    Deserialize { key: String, message: String },
}

/// Key/value storage for one resource instance.
pub trait AttributeStore: Send {
    /// Encoded state identifier; empty when the resource does not exist.
    fn id(&self) -> &str;

    fn set_id(&mut self, id: &str);

    fn get(&self, key: &str) -> Option<&Value>;

    /// Store `value` under `key`. `Value::Null` clears the attribute.
    fn set(&mut self, key: &str, value: Value) -> Result<(), AttributeError>;
}

/// Serialize `value` and store it.
pub fn set_value<T: Serialize + ?Sized>(
    store: &mut dyn AttributeStore,
    key: &str,
    value: &T,
) -> Result<(), AttributeError> {
    let value = serde_json::to_value(value).map_err(|err| AttributeError::Deserialize {
        key: key.to_string(),
        message: err.to_string(),
    })?;
    store.set(key, value)
}

/// Read an attribute back as `T`. Unset attributes yield `None`.
pub fn get_as<T: DeserializeOwned>(
    store: &dyn AttributeStore,
    key: &str,
) -> Result<Option<T>, AttributeError> {
    match store.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|err| AttributeError::Deserialize {
                key: key.to_string(),
                message: err.to_string(),
            }),
    }
}

/// In-memory [`AttributeStore`] validated against a [`Schema`].
#[derive(Debug, Clone)]
pub struct ResourceData {
    schema: Schema,
    id: String,
    values: BTreeMap<String, Value>,
}

impl ResourceData {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            id: String::new(),
            values: BTreeMap::new(),
        }
    }

    /// Build from user configuration. Computed-only attributes are rejected and
    /// every required attribute must be present.
    pub fn from_config(schema: Schema, config: Map<String, Value>) -> Result<Self, AttributeError> {
        let mut data = Self::new(schema);
        for (key, value) in config {
            let attribute = data.schema.attribute(&key)?;
            if attribute.mode == AttrMode::Computed {
                return Err(AttributeError::ComputedOnly { key });
            }
            data.set(&key, value)?;
        }
        for key in data.schema.required_keys() {
            if data.values.get(key).is_none_or(Value::is_null) {
                return Err(AttributeError::MissingRequired {
                    key: key.to_string(),
                });
            }
        }
        Ok(data)
    }

    /// Attribute values with every sensitive leaf replaced by a marker. Safe to log.
    pub fn redacted_json(&self) -> Value {
        let mut out = Map::new();
        for (key, value) in &self.values {
            let redacted = match self.schema.get(key) {
                Some(attribute) => redact(attribute, value),
                None => value.clone(),
            };
            out.insert(key.clone(), redacted);
        }
        Value::Object(out)
    }
}

fn redact(attribute: &AttributeSchema, value: &Value) -> Value {
    if attribute.sensitive {
        return match value {
            Value::String(s) if s.is_empty() => value.clone(),
            Value::Null => Value::Null,
            _ => Value::String(REDACTED.to_string()),
        };
    }
    match (&attribute.ty, value) {
        (AttrType::List(inner), Value::Array(items)) => {
            if let AttrType::Block(fields) = inner.as_ref() {
                Value::Array(
                    items
                        .iter()
                        .map(|item| redact_block(fields, item))
                        .collect(),
                )
            } else {
                value.clone()
            }
        }
        (AttrType::Block(fields), _) => redact_block(fields, value),
        _ => value.clone(),
    }
}

fn redact_block(fields: &Schema, value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let redacted = fields.get(k).map_or_else(|| v.clone(), |f| redact(f, v));
                    (k.clone(), redacted)
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

impl AttributeStore for ResourceData {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }

    fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), AttributeError> {
        let attribute = self.schema.attribute(key)?;
        if value.is_null() {
            self.values.remove(key);
            return Ok(());
        }
        attribute.ty.check(key, &value)?;
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}
