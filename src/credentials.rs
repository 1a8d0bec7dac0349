//! Gemini API key resolution.
//!
//! The secret store (a TOML file) is consulted first; any lookup failure
//! falls through to the `GEMINI_API_KEY` environment variable. When neither
//! source has a key the application must not start.

use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{API_KEY_ENV_VAR, NutriaError, SECRET_KEY_NAME};

/// API credential. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Where the key came from, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    SecretStore,
    Environment,
}

/// Resolve the API key from `secrets_path`, then the real environment.
pub fn resolve_api_key(secrets_path: &Path) -> Result<(ApiKey, KeySource), NutriaError> {
    resolve_api_key_with(secrets_path, real_env_var)
}

/// Testable inner implementation with an injectable env lookup.
pub(crate) fn resolve_api_key_with(
    secrets_path: &Path,
    env_fn: fn(&str) -> Option<String>,
) -> Result<(ApiKey, KeySource), NutriaError> {
    if let Some(key) = read_secret(secrets_path) {
        tracing::debug!(path = %secrets_path.display(), "API key loaded from secret store");
        return Ok((ApiKey(key), KeySource::SecretStore));
    }
    if let Some(key) = env_fn(API_KEY_ENV_VAR) {
        tracing::debug!(var = API_KEY_ENV_VAR, "API key loaded from environment");
        return Ok((ApiKey(key), KeySource::Environment));
    }
    Err(NutriaError::CredentialMissing {
        secrets_path: secrets_path.to_path_buf(),
    })
}

/// Missing file, unparsable file, missing key and blank key all read as `None`.
fn read_secret(path: &Path) -> Option<String> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(path = %path.display(), err = %e, "secret store unavailable");
            return None;
        }
    };
    let table: toml::Table = match toml::from_str(&contents) {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(path = %path.display(), err = %e, "ignoring unparsable secret store");
            return None;
        }
    };
    table
        .get(SECRET_KEY_NAME)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn real_env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
