//! # Resource Adapters
//!
//! Create/read/update/delete/import handlers for the declarative engine. Every
//! handler receives the remote client and the attribute store explicitly; the
//! adapters keep no state between calls.
//!
//! Reads overwrite every attribute they own and finish by writing the encoded
//! state id. A read that finds the remote object gone clears the id so the
//! engine plans a re-creation.

pub mod alert_configuration;
pub mod search_index;

use serde::{Serialize, de::DeserializeOwned};

use crate::attributes::{AttributeError, AttributeStore, get_as, set_value};
use crate::error::{ProviderError, Result};
use crate::state_id::StateIdParts;

fn write_attr<T: Serialize + ?Sized>(
    store: &mut dyn AttributeStore,
    resource_id: &str,
    key: &str,
    value: &T,
) -> Result<()> {
    set_value(store, key, value)
        .map_err(|source| ProviderError::attribute_write(key, resource_id, source))
}

fn read_attr<T: DeserializeOwned>(
    store: &dyn AttributeStore,
    resource_id: &str,
    key: &str,
) -> Result<Option<T>> {
    get_as(store, key).map_err(|source| ProviderError::attribute_read(key, resource_id, source))
}

fn require_attr(store: &dyn AttributeStore, resource_id: &str, key: &str) -> Result<String> {
    read_attr::<String>(store, resource_id, key)?
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            ProviderError::attribute_read(
                key,
                resource_id,
                AttributeError::MissingRequired {
                    key: key.to_string(),
                },
            )
        })
}

fn optional_text(store: &dyn AttributeStore, resource_id: &str, key: &str) -> Result<Option<String>> {
    Ok(read_attr::<String>(store, resource_id, key)?.filter(|value| !value.is_empty()))
}

/// Named part of a decoded id. Decoding already guarantees every schema part
/// is present; this only guards against a schema/adapter mismatch.
fn part(parts: &StateIdParts, name: &str, id: &str) -> Result<String> {
    parts.get(name).cloned().ok_or_else(|| ProviderError::Decoding {
        id: id.to_string(),
        reason: format!("missing part `{}`", name),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{AttrType, AttributeSchema, ResourceData, Schema};

    fn store() -> ResourceData {
        ResourceData::new(
            Schema::new()
                .with("name", AttributeSchema::required(AttrType::String))
                .with("enabled", AttributeSchema::optional(AttrType::Bool)),
        )
    }

    #[test]
    fn test_write_attr_wraps_type_errors_with_context() {
        let mut data = store();
        let err = write_attr(&mut data, "index 1", "enabled", "yes").unwrap_err();
        assert!(matches!(
            err,
            ProviderError::AttributeWrite { ref field, ref resource_id, .. }
                if field == "enabled" && resource_id == "index 1"
        ));
    }

    #[test]
    fn test_require_attr_rejects_empty() {
        let mut data = store();
        write_attr(&mut data, "index 1", "name", "").unwrap();
        let err = require_attr(&data, "index 1", "name").unwrap_err();
        assert!(err.to_string().contains("`name`"));
        assert_eq!(optional_text(&data, "index 1", "name").unwrap(), None);
    }
}
