//! # Redaction helpers
//!
//! Task options and captured output routinely carry credentials (access
//! tokens, connected-app secrets, database URLs). These helpers scrub such
//! values before they reach a log line.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Replacement token written in place of a redacted value.
pub const REDACTED: &str = "[REDACTED]";

static SENSITIVE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(password|passphrase|secret|token|api[_-]?key|private[_-]?key|refresh|session[_-]?id)").unwrap());

static REDACT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)(authorization:\s+)([^\s]+(?:\s+[^\s]+)*)").unwrap(),
        Regex::new(r"(?i)((?:^|\b)Bearer\s+)([A-Za-z0-9\-._~+/]+=*)").unwrap(),
        Regex::new(r"(?i)([A-Z0-9_]*(?:KEY|TOKEN|SECRET|PASSWORD)\s*=\s*)([^\s]+)").unwrap(),
        Regex::new(r"(?i)((?:access_token|refresh_token|client_secret)\s*[:=]\s*)([^\s,;]+)").unwrap(),
        Regex::new(r"(?i)(DATABASE_URL=)([^\s]+)").unwrap(),
        Regex::new(r"((?:gh[oprsu]|github_pat)_)([A-Za-z0-9_]{22,})").unwrap(),
        Regex::new(r"(00D[A-Za-z0-9]{12,15}!)([A-Za-z0-9._]+)").unwrap(),
    ]
});

/// Redacts values that look like secrets in a string.
///
/// The matched key (or prefix) is kept so the line stays useful for debugging.
///
/// ```rust
/// use stagehand_util::redact_sensitive;
///
/// assert_eq!(redact_sensitive("API_KEY=abc123"), "API_KEY=[REDACTED]");
/// assert_eq!(redact_sensitive("Authorization: Bearer xyz"), "Authorization: [REDACTED]");
/// ```
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for pattern in REDACT_PATTERNS.iter() {
        redacted = pattern
            .replace_all(&redacted, |captures: &regex::Captures| {
                let prefix = captures.get(1).map(|m| m.as_str()).unwrap_or("");
                format!("{prefix}{REDACTED}")
            })
            .to_string();
    }
    redacted
}

/// Whether an option or attribute name suggests it holds a credential.
pub fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEY.is_match(key)
}

/// Returns a copy of `options` that is safe to log.
///
/// Values stored under credential-looking keys are replaced wholesale; other
/// string values are scrubbed with [`redact_sensitive`].
pub fn redact_options(options: &IndexMap<String, Value>) -> IndexMap<String, Value> {
    options
        .iter()
        .map(|(key, value)| {
            let safe_value = if is_sensitive_key(key) {
                Value::String(REDACTED.to_string())
            } else {
                redact_value(value)
            };
            (key.clone(), safe_value)
        })
        .collect()
}

fn redact_value(value: &Value) -> Value {
    match value {
        Value::String(text) => Value::String(redact_sensitive(text)),
        Value::Array(items) => Value::Array(items.iter().map(redact_value).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, nested)| {
                    if is_sensitive_key(key) {
                        (key.clone(), Value::String(REDACTED.to_string()))
                    } else {
                        (key.clone(), redact_value(nested))
                    }
                })
                .collect(),
        ),
        _ => value.clone(),
    }
}
