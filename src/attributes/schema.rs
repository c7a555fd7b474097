//! Attribute schemas for the alert configuration and search index resources.

use std::collections::BTreeMap;

use serde_json::Value;

use super::AttributeError;

/// Value type of an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrType {
    String,
    Bool,
    Int,
    Float,
    List(Box<AttrType>),
    /// Map of string to string.
    Map,
    /// Nested object with its own fields.
    Block(Schema),
}

impl AttrType {
    pub fn list(inner: AttrType) -> Self {
        AttrType::List(Box::new(inner))
    }

    fn name(&self) -> &'static str {
        match self {
            AttrType::String => "string",
            AttrType::Bool => "bool",
            AttrType::Int => "int",
            AttrType::Float => "float",
            AttrType::List(_) => "list",
            AttrType::Map => "map of string",
            AttrType::Block(_) => "block",
        }
    }

    pub(crate) fn check(&self, key: &str, value: &Value) -> Result<(), AttributeError> {
        let mismatch = || AttributeError::TypeMismatch {
            key: key.to_string(),
            expected: self.name().to_string(),
            found: value_kind(value).to_string(),
        };

        match (self, value) {
            (AttrType::String, Value::String(_)) => Ok(()),
            (AttrType::Bool, Value::Bool(_)) => Ok(()),
            (AttrType::Int, Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(()),
            (AttrType::Float, Value::Number(_)) => Ok(()),
            (AttrType::List(inner), Value::Array(items)) => {
                for (index, item) in items.iter().enumerate() {
                    inner.check(&format!("{}.{}", key, index), item)?;
                }
                Ok(())
            }
            (AttrType::Map, Value::Object(map)) => {
                for (name, item) in map {
                    if !item.is_string() {
                        return Err(AttributeError::TypeMismatch {
                            key: format!("{}.{}", key, name),
                            expected: "string".to_string(),
                            found: value_kind(item).to_string(),
                        });
                    }
                }
                Ok(())
            }
            (AttrType::Block(fields), Value::Object(map)) => {
                for (name, item) in map {
                    let nested = format!("{}.{}", key, name);
                    let field = fields
                        .get(name)
                        .ok_or_else(|| AttributeError::UnknownAttribute {
                            key: nested.clone(),
                        })?;
                    if !item.is_null() {
                        field.ty.check(&nested, item)?;
                    }
                }
                Ok(())
            }
            _ => Err(mismatch()),
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrMode {
    Required,
    Optional,
    Computed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSchema {
    pub ty: AttrType,
    pub mode: AttrMode,
    pub sensitive: bool,
}

impl AttributeSchema {
    fn with_mode(ty: AttrType, mode: AttrMode) -> Self {
        Self {
            ty,
            mode,
            sensitive: false,
        }
    }

    pub fn required(ty: AttrType) -> Self {
        Self::with_mode(ty, AttrMode::Required)
    }

    pub fn optional(ty: AttrType) -> Self {
        Self::with_mode(ty, AttrMode::Optional)
    }

    pub fn computed(ty: AttrType) -> Self {
        Self::with_mode(ty, AttrMode::Computed)
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }
}

/// Named attributes of a resource or nested block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    attributes: BTreeMap<&'static str, AttributeSchema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &'static str, attribute: AttributeSchema) -> Self {
        self.attributes.insert(name, attribute);
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.get(name)
    }

    pub(crate) fn attribute(&self, name: &str) -> Result<&AttributeSchema, AttributeError> {
        self.get(name).ok_or_else(|| AttributeError::UnknownAttribute {
            key: name.to_string(),
        })
    }

    pub fn required_keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.attributes
            .iter()
            .filter(|(_, a)| a.mode == AttrMode::Required)
            .map(|(name, _)| *name)
    }
}

type Field = fn(AttrType) -> AttributeSchema;

fn matcher_block(field: Field) -> AttrType {
    AttrType::list(AttrType::Block(
        Schema::new()
            .with("field_name", field(AttrType::String))
            .with("operator", field(AttrType::String))
            .with("value", field(AttrType::String)),
    ))
}

fn threshold_config_block(field: Field) -> AttrType {
    AttrType::list(AttrType::Block(
        Schema::new()
            .with("operator", field(AttrType::String))
            .with("threshold", field(AttrType::Float))
            .with("units", field(AttrType::String)),
    ))
}

fn metric_threshold_config_block(field: Field) -> AttrType {
    AttrType::list(AttrType::Block(
        Schema::new()
            .with("metric_name", field(AttrType::String))
            .with("operator", field(AttrType::String))
            .with("threshold", field(AttrType::Float))
            .with("units", field(AttrType::String))
            .with("mode", field(AttrType::String)),
    ))
}

fn notification_block(field: Field, type_name: AttributeSchema) -> AttrType {
    let secret = |ty| field(ty).sensitive();
    AttrType::list(AttrType::Block(
        Schema::new()
            .with("api_token", secret(AttrType::String))
            .with("channel_name", field(AttrType::String))
            .with("datadog_api_key", secret(AttrType::String))
            .with("datadog_region", field(AttrType::String))
            .with("delay_min", field(AttrType::Int))
            .with("email_address", field(AttrType::String))
            .with("email_enabled", field(AttrType::Bool))
            .with("flowdock_api_token", secret(AttrType::String))
            .with("flow_name", field(AttrType::String))
            .with("interval_min", field(AttrType::Int))
            .with("mobile_number", field(AttrType::String))
            .with("ops_genie_api_key", secret(AttrType::String))
            .with("ops_genie_region", field(AttrType::String))
            .with("org_name", field(AttrType::String))
            .with("service_key", secret(AttrType::String))
            .with("sms_enabled", field(AttrType::Bool))
            .with("team_id", field(AttrType::String))
            .with("team_name", field(AttrType::String))
            .with("type_name", type_name)
            .with("username", field(AttrType::String))
            .with("victor_ops_api_key", secret(AttrType::String))
            .with("victor_ops_routing_key", secret(AttrType::String))
            .with("roles", field(AttrType::list(AttrType::String)))
            .with("microsoft_teams_webhook_url", secret(AttrType::String))
            .with("webhook_secret", secret(AttrType::String))
            .with("webhook_url", secret(AttrType::String)),
    ))
}

/// Data source: looked up by project and alert id, everything else computed.
pub fn alert_configuration_data_source_schema() -> Schema {
    let computed: Field = AttributeSchema::computed;
    Schema::new()
        .with("project_id", AttributeSchema::required(AttrType::String))
        .with("alert_configuration_id", AttributeSchema::required(AttrType::String))
        .with("event_type", computed(AttrType::String))
        .with("created", computed(AttrType::String))
        .with("updated", computed(AttrType::String))
        .with("enabled", computed(AttrType::Bool))
        .with("matcher", computed(matcher_block(computed)))
        .with("metric_threshold", computed(AttrType::Map))
        .with("threshold", computed(AttrType::Map))
        .with(
            "metric_threshold_config",
            computed(metric_threshold_config_block(computed)),
        )
        .with("threshold_config", computed(threshold_config_block(computed)))
        .with(
            "notification",
            computed(notification_block(computed, computed(AttrType::String))),
        )
}

pub fn alert_configuration_resource_schema() -> Schema {
    let optional: Field = AttributeSchema::optional;
    Schema::new()
        .with("project_id", AttributeSchema::required(AttrType::String))
        .with(
            "alert_configuration_id",
            AttributeSchema::computed(AttrType::String),
        )
        .with("event_type", AttributeSchema::required(AttrType::String))
        .with("created", AttributeSchema::computed(AttrType::String))
        .with("updated", AttributeSchema::computed(AttrType::String))
        .with("enabled", optional(AttrType::Bool))
        .with("matcher", optional(matcher_block(optional)))
        .with(
            "metric_threshold_config",
            optional(metric_threshold_config_block(optional)),
        )
        .with("threshold_config", optional(threshold_config_block(optional)))
        .with(
            "notification",
            AttributeSchema::required(notification_block(
                optional,
                AttributeSchema::required(AttrType::String),
            )),
        )
}

fn synonyms_block(field: Field) -> AttrType {
    AttrType::list(AttrType::Block(
        Schema::new()
            .with("analyzer", field(AttrType::String))
            .with("name", field(AttrType::String))
            .with("source_collection", field(AttrType::String)),
    ))
}

pub fn search_index_resource_schema() -> Schema {
    let optional: Field = AttributeSchema::optional;
    Schema::new()
        .with("project_id", AttributeSchema::required(AttrType::String))
        .with("cluster_name", AttributeSchema::required(AttrType::String))
        .with("index_id", AttributeSchema::computed(AttrType::String))
        .with("name", AttributeSchema::required(AttrType::String))
        .with("database", AttributeSchema::required(AttrType::String))
        .with("collection_name", AttributeSchema::required(AttrType::String))
        .with("analyzer", optional(AttrType::String))
        .with("search_analyzer", optional(AttrType::String))
        .with("mappings_dynamic", optional(AttrType::Bool))
        .with("mappings_fields", optional(AttrType::String))
        .with("analyzers", optional(AttrType::String))
        .with("synonyms", optional(synonyms_block(optional)))
        .with("status", AttributeSchema::computed(AttrType::String))
}

pub fn search_index_data_source_schema() -> Schema {
    let computed: Field = AttributeSchema::computed;
    Schema::new()
        .with("project_id", AttributeSchema::required(AttrType::String))
        .with("cluster_name", AttributeSchema::required(AttrType::String))
        .with("index_id", AttributeSchema::required(AttrType::String))
        .with("name", computed(AttrType::String))
        .with("database", computed(AttrType::String))
        .with("collection_name", computed(AttrType::String))
        .with("analyzer", computed(AttrType::String))
        .with("search_analyzer", computed(AttrType::String))
        .with("mappings_dynamic", computed(AttrType::Bool))
        .with("mappings_fields", computed(AttrType::String))
        .with("analyzers", computed(AttrType::String))
        .with("synonyms", computed(synonyms_block(computed)))
        .with("status", computed(AttrType::String))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_source_keeps_legacy_threshold_maps() {
        let data_source = alert_configuration_data_source_schema();
        assert_eq!(data_source.get("threshold").unwrap().ty, AttrType::Map);
        assert!(alert_configuration_resource_schema().get("threshold").is_none());
    }

    #[test]
    fn test_notification_secrets_are_sensitive() {
        let schema = alert_configuration_resource_schema();
        let AttrType::List(inner) = &schema.get("notification").unwrap().ty else {
            panic!("notification should be a list");
        };
        let AttrType::Block(fields) = inner.as_ref() else {
            panic!("notification elements should be blocks");
        };
        assert!(fields.get("webhook_secret").unwrap().sensitive);
        assert!(fields.get("service_key").unwrap().sensitive);
        assert!(!fields.get("channel_name").unwrap().sensitive);
        assert!(!fields.get("roles").unwrap().sensitive);
    }

    #[test]
    fn test_nested_check_reports_path() {
        let ty = threshold_config_block(AttributeSchema::optional);
        let err = ty
            .check("threshold_config", &json!([{"threshold": "high"}]))
            .unwrap_err();
        assert_eq!(
            err,
            AttributeError::TypeMismatch {
                key: "threshold_config.0.threshold".to_string(),
                expected: "float".to_string(),
                found: "string".to_string(),
            }
        );
    }

    #[test]
    fn test_int_rejects_fractional_numbers() {
        assert!(AttrType::Int.check("delay_min", &json!(5)).is_ok());
        assert!(AttrType::Int.check("delay_min", &json!(5.5)).is_err());
        assert!(AttrType::Float.check("threshold", &json!(5)).is_ok());
    }

    #[test]
    fn test_required_keys() {
        let keys: Vec<_> = search_index_resource_schema().required_keys().collect();
        assert_eq!(
            keys,
            vec!["cluster_name", "collection_name", "database", "name", "project_id"]
        );
    }
}
