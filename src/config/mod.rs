//! # Harness Configuration
//!
//! Harness configuration loaded from environment variables.
//!
//! Credentials are required and their absence is a construction error.
//! Polling and cleanup tunables have defaults and can be overridden.

mod poll;

pub use poll::PollSettings;

use crate::constants::PURGE_RETRY_DELAY_MS;
use crate::credentials::AzureCredential;
use crate::error::HarnessError;
use crate::provider::azure::VaultSettings;
use std::time::Duration;

/// Service principal client ID
pub const ENV_CLIENT_ID: &str = "E2E_AZURE_CLIENT_ID";
/// Service principal client secret
pub const ENV_CLIENT_SECRET: &str = "E2E_AZURE_CLIENT_SECRET";
/// Azure AD tenant ID
pub const ENV_TENANT_ID: &str = "E2E_AZURE_TENANT_ID";
/// Key Vault URL or vault name
pub const ENV_VAULT_URL: &str = "E2E_AZURE_VAULT_URL";
/// Purge soft-deleted secrets after delete (default: true)
pub const ENV_PURGE_ON_DELETE: &str = "E2E_PURGE_ON_DELETE";
/// Base delay between purge attempts (milliseconds)
pub const ENV_PURGE_RETRY_DELAY_MS: &str = "E2E_PURGE_RETRY_DELAY_MS";
/// Route Key Vault calls to a local emulator
pub const ENV_MOCK_MODE: &str = "E2E_MOCK_MODE";
/// Emulator endpoint used when mock mode is enabled
pub const ENV_MOCK_ENDPOINT: &str = "AZURE_KEY_VAULT_ENDPOINT";

/// Complete configuration for an Azure Key Vault harness
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Credential shared by the Credential Object and the direct vault client
    pub credential: AzureCredential,
    /// Vault client behavior
    pub vault: VaultSettings,
    /// Convergence polling
    pub poll: PollSettings,
}

impl HarnessConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, HarnessError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// When mock mode is enabled the emulator endpoint replaces the vault URL,
    /// so the SecretStore and the direct client point at the same place.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, HarnessError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| HarnessError::Config(format!("{key} must be set")))
        };

        let mock_mode = lookup(ENV_MOCK_MODE).is_some_and(|v| parse_bool(&v));
        let vault_url = if mock_mode {
            required(ENV_MOCK_ENDPOINT)?
        } else {
            required(ENV_VAULT_URL)?
        };

        let credential = AzureCredential::new(
            required(ENV_CLIENT_ID)?,
            required(ENV_CLIENT_SECRET)?,
            required(ENV_TENANT_ID)?,
            &vault_url,
        );

        let vault = VaultSettings {
            purge_on_delete: lookup(ENV_PURGE_ON_DELETE).is_none_or(|v| parse_bool(&v)),
            static_token: mock_mode,
            purge_retry_delay: Duration::from_millis(var_or_default(
                &lookup,
                ENV_PURGE_RETRY_DELAY_MS,
                PURGE_RETRY_DELAY_MS,
            )),
        };

        Ok(Self {
            credential,
            vault,
            poll: PollSettings::from_lookup(&lookup),
        })
    }
}

/// Parse a truthy value in a tolerant way
pub(crate) fn parse_bool(value: &str) -> bool {
    ["1", "true", "yes"]
        .iter()
        .any(|pat| value.trim().eq_ignore_ascii_case(pat))
}

/// Read a value or return default
pub(crate) fn var_or_default<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
