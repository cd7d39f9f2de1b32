//! Named service credentials and the keychain interface that serves them.
//!
//! Tasks that need third-party credentials (a connected app, a source-control
//! token) look them up by service name through a [`Keychain`]. The keychain
//! itself lives outside the engine; backends are provided by `stagehand-util`.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors surfaced when a named service cannot be served.
///
/// Callers that only need service metadata (for example a client identifier)
/// are expected to fall back to a default instead of aborting.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Service '{name}' is not configured")]
    NotConfigured { name: String },

    #[error("Service '{name}' is not valid: {reason}")]
    NotValid { name: String, reason: String },
}

/// Attributes stored for a single named service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ServiceConfig {
    attributes: IndexMap<String, Value>,
}

impl ServiceConfig {
    pub fn new(attributes: IndexMap<String, Value>) -> Self {
        Self { attributes }
    }

    /// Returns a string attribute, if present.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// OAuth client identifier of a connected app service.
    pub fn client_id(&self) -> Option<&str> {
        self.get_str("client_id")
    }

    pub fn attributes(&self) -> &IndexMap<String, Value> {
        &self.attributes
    }
}

/// Read access to named service credentials.
pub trait Keychain: Send + Sync + fmt::Debug {
    /// Look up the service configuration registered under `name`.
    fn get_service(&self, name: &str) -> Result<ServiceConfig, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn service_config_deserializes_from_flat_object() {
        let config: ServiceConfig = serde_json::from_value(json!({
            "client_id": "3MVG9",
            "callback_url": "http://localhost:8080/callback"
        }))
        .expect("service config");

        assert_eq!(config.client_id(), Some("3MVG9"));
        assert_eq!(config.get_str("callback_url"), Some("http://localhost:8080/callback"));
        assert!(config.get("missing").is_none());
    }

    #[test]
    fn service_error_messages_name_the_service() {
        let error = ServiceError::NotValid {
            name: "connectedapp".into(),
            reason: "expected an object".into(),
        };
        assert_eq!(error.to_string(), "Service 'connectedapp' is not valid: expected an object");
    }
}
