//! Keychain backends serving named service credentials.
//!
//! Services are stored as JSON objects. The OS keychain (`keyring-rs`) is the
//! default store; setting `STAGEHAND_SECRETS_BACKEND=env` switches to reading
//! `STAGEHAND_SERVICE_<NAME>` environment variables so CI runs stay
//! keychain-free.

use std::sync::Arc;

use stagehand_types::{Keychain, ServiceConfig, ServiceError};
use tracing::debug;

static SERVICE: &str = "stagehand";
/// Environment variable used to select the secret resolution backend.
pub const SECRETS_BACKEND_ENV_VAR: &str = "STAGEHAND_SECRETS_BACKEND";
/// Prefix of the environment variables read by [`EnvironmentKeychain`].
pub const SERVICE_ENV_PREFIX: &str = "STAGEHAND_SERVICE_";

/// Secret resolution backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretsBackend {
    /// Services stored in the OS keychain.
    Keychain,
    /// Services read from process environment variables.
    Environment,
}

impl SecretsBackend {
    fn from_env_var(raw: Option<String>) -> Self {
        match raw.unwrap_or_default().trim().to_ascii_lowercase().as_str() {
            "env" => Self::Environment,
            _ => Self::Keychain,
        }
    }
}

/// Determine the currently configured secrets backend.
pub fn secrets_backend() -> SecretsBackend {
    SecretsBackend::from_env_var(std::env::var(SECRETS_BACKEND_ENV_VAR).ok())
}

/// Build the keychain selected by [`SECRETS_BACKEND_ENV_VAR`].
pub fn keychain_from_environment() -> Arc<dyn Keychain> {
    match secrets_backend() {
        SecretsBackend::Environment => Arc::new(EnvironmentKeychain),
        SecretsBackend::Keychain => Arc::new(KeyringKeychain),
    }
}

fn parse_service(name: &str, raw: &str) -> Result<ServiceConfig, ServiceError> {
    serde_json::from_str(raw).map_err(|error| ServiceError::NotValid {
        name: name.to_string(),
        reason: error.to_string(),
    })
}

/// Services stored as JSON in the OS keychain.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringKeychain;

impl KeyringKeychain {
    fn entry(name: &str) -> Result<keyring::Entry, ServiceError> {
        keyring::Entry::new(SERVICE, &format!("service:{name}")).map_err(|error| keyring_error(name, error))
    }
}

/// Classify a keyring failure: a missing entry means the service was never
/// configured, anything else makes it unusable.
fn keyring_error(name: &str, error: keyring::Error) -> ServiceError {
    match error {
        keyring::Error::NoEntry => ServiceError::NotConfigured { name: name.to_string() },
        other => ServiceError::NotValid {
            name: name.to_string(),
            reason: other.to_string(),
        },
    }
}

impl Keychain for KeyringKeychain {
    fn get_service(&self, name: &str) -> Result<ServiceConfig, ServiceError> {
        let payload = Self::entry(name)?.get_password().map_err(|error| keyring_error(name, error))?;
        debug!(service = %name, "resolved service from keychain");
        parse_service(name, &payload)
    }
}

/// Services read from `STAGEHAND_SERVICE_<NAME>` environment variables.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvironmentKeychain;

impl EnvironmentKeychain {
    /// Name of the environment variable holding service `name`.
    pub fn variable_name(name: &str) -> String {
        let normalized: String = name
            .chars()
            .map(|character| if character.is_ascii_alphanumeric() { character.to_ascii_uppercase() } else { '_' })
            .collect();
        format!("{SERVICE_ENV_PREFIX}{normalized}")
    }
}

impl Keychain for EnvironmentKeychain {
    fn get_service(&self, name: &str) -> Result<ServiceConfig, ServiceError> {
        let variable = Self::variable_name(name);
        match std::env::var(&variable) {
            Ok(payload) => parse_service(name, &payload),
            Err(_) => Err(ServiceError::NotConfigured { name: name.to_string() }),
        }
    }
}
