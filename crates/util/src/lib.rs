pub mod keystore;
pub mod logging;
pub mod path_processing;
pub mod text_processing;

pub use keystore::{EnvironmentKeychain, KeyringKeychain, SecretsBackend, keychain_from_environment, secrets_backend};
pub use logging::init_tracing;
pub use path_processing::{expand_tilde, resolve_against};
pub use text_processing::{is_sensitive_key, redact_options, redact_sensitive};
