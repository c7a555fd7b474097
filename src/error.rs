//! # Error Handling
//!
//! Unified error type returned by the flatteners and resource adapters. Every
//! variant names the field or object it concerns and, where one is known,
//! the resource identifier, so callers can surface an actionable message.

use thiserror::Error;

use crate::attributes::AttributeError;
use crate::client::ClientError;
use crate::state_id::StateIdError;

/// Errors surfaced to the declarative engine.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A key part could not be encoded into a state id.
    #[error("encoding error: {reason}")]
    Encoding { reason: String },

    /// A state id or import id is malformed or has the wrong number of parts.
    #[error("decoding error for id '{id}': {reason}")]
    Decoding { id: String, reason: String },

    /// A remote object matched none (or more than one) of the known variants.
    #[error("cannot determine variant of {object}: {reason}")]
    VariantDetection { object: String, reason: String },

    /// The attribute store rejected a value.
    #[error("error setting `{field}` for {resource_id}: {source}")]
    AttributeWrite {
        field: String,
        resource_id: String,
        #[source]
        source: AttributeError,
    },

    /// A configured attribute is missing or has an unexpected shape.
    #[error("error reading `{field}` for {resource_id}: {source}")]
    AttributeRead {
        field: String,
        resource_id: String,
        #[source]
        source: AttributeError,
    },

    /// The remote API call failed.
    #[error("error {operation} {resource_id}: {source}")]
    Remote {
        operation: &'static str,
        resource_id: String,
        #[source]
        source: ClientError,
    },
}

impl ProviderError {
    pub fn variant_detection<O: Into<String>, R: Into<String>>(object: O, reason: R) -> Self {
        Self::VariantDetection {
            object: object.into(),
            reason: reason.into(),
        }
    }

    pub fn attribute_write<F: Into<String>, I: Into<String>>(
        field: F,
        resource_id: I,
        source: AttributeError,
    ) -> Self {
        Self::AttributeWrite {
            field: field.into(),
            resource_id: resource_id.into(),
            source,
        }
    }

    pub fn attribute_read<F: Into<String>, I: Into<String>>(
        field: F,
        resource_id: I,
        source: AttributeError,
    ) -> Self {
        Self::AttributeRead {
            field: field.into(),
            resource_id: resource_id.into(),
            source,
        }
    }

    pub fn remote<I: Into<String>>(
        operation: &'static str,
        resource_id: I,
        source: ClientError,
    ) -> Self {
        Self::Remote {
            operation,
            resource_id: resource_id.into(),
            source,
        }
    }

    /// Whether the remote object no longer exists.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ProviderError::Remote {
                source: ClientError::NotFound { .. },
                ..
            }
        )
    }
}

impl From<StateIdError> for ProviderError {
    fn from(error: StateIdError) -> Self {
        match error {
            StateIdError::Encoding { kind, reason } => ProviderError::Encoding {
                reason: format!("{}: {}", kind, reason),
            },
            StateIdError::Decoding { kind, id, reason } => ProviderError::Decoding {
                id,
                reason: format!("{}: {}", kind, reason),
            },
        }
    }
}

pub type Result<T, E = ProviderError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_id::ALERT_CONFIGURATION;

    #[test]
    fn test_state_id_errors_map_to_taxonomy() {
        let decode: ProviderError = ALERT_CONFIGURATION.decode("nope").unwrap_err().into();
        assert!(matches!(decode, ProviderError::Decoding { ref id, .. } if id == "nope"));

        let encode: ProviderError = ALERT_CONFIGURATION
            .encode_pairs(&[("id", "x")])
            .unwrap_err()
            .into();
        assert!(matches!(encode, ProviderError::Encoding { .. }));
        assert!(encode.to_string().contains("alert_configuration"));
    }

    #[test]
    fn test_attribute_write_message_names_field_and_resource() {
        let error = ProviderError::attribute_write(
            "threshold_config",
            "project 60ddf55c",
            AttributeError::TypeMismatch {
                key: "threshold_config".to_string(),
                expected: "list".to_string(),
                found: "string".to_string(),
            },
        );
        let message = error.to_string();
        assert!(message.contains("`threshold_config`"));
        assert!(message.contains("project 60ddf55c"));
    }

    #[test]
    fn test_not_found_detection() {
        let error = ProviderError::remote(
            "reading",
            "alert 1",
            ClientError::NotFound {
                resource: "alert configuration".to_string(),
            },
        );
        assert!(error.is_not_found());
        assert!(error.to_string().starts_with("error reading alert 1"));

        let other = ProviderError::variant_detection("notification[0]", "unknown type");
        assert!(!other.is_not_found());
    }
}
