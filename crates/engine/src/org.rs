//! Org session interface and credential refresh helpers.

use std::fmt;

use anyhow::Result;
use serde_json::Value;
use stagehand_types::{Keychain, ProjectConfig};

use crate::logger::TaskLogger;

/// Client name reported when no connected app is configured.
pub const DEFAULT_CLIENT_NAME: &str = concat!("Stagehand/", env!("CARGO_PKG_VERSION"));

/// Keychain service holding the connected app used for OAuth refreshes.
pub const CONNECTED_APP_SERVICE: &str = "connectedapp";

/// Authenticated session with a remote org.
pub trait OrgConfig: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn username(&self) -> Option<String>;

    fn org_id(&self) -> Option<String>;

    /// Comparable snapshot of the persisted state, used to detect changes.
    fn snapshot(&self) -> Value;

    /// Refresh the access token, consulting `keychain` for the connected app.
    fn refresh_oauth_token(&self, keychain: Option<&dyn Keychain>) -> Result<()>;

    /// Persist the current state.
    fn save(&self) -> Result<()>;
}

/// Run `action` and persist `org` when its snapshot changed.
///
/// Nothing is saved when `action` fails; its error is returned unchanged.
pub fn save_if_changed<T>(org: &dyn OrgConfig, logger: &TaskLogger, action: impl FnOnce() -> Result<T>) -> Result<T> {
    let before = org.snapshot();
    let value = action()?;
    if org.snapshot() != before {
        logger.info("Org info updated, writing to keychain");
        org.save()?;
    }
    Ok(value)
}

/// Refresh `org`'s token against the project's keychain, saving on change.
pub fn refresh_org_credentials(org: &dyn OrgConfig, project: &ProjectConfig, logger: &TaskLogger) -> Result<()> {
    save_if_changed(org, logger, || org.refresh_oauth_token(project.keychain()))
}

/// Client name to present to the remote platform.
///
/// Uses the connected app's client id and falls back to [`DEFAULT_CLIENT_NAME`]
/// when the service is absent or invalid.
pub fn client_name(project: &ProjectConfig) -> String {
    project
        .keychain()
        .and_then(|keychain| keychain.get_service(CONNECTED_APP_SERVICE).ok())
        .and_then(|service| service.client_id().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_CLIENT_NAME.to_string())
}
