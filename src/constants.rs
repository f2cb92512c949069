//! # Constants
//!
//! Names and defaults shared by the credential binder, the store declaration,
//! the vault operations and the convergence suite.

/// Name of the Credential Object created in every test namespace
pub const CREDENTIAL_SECRET_NAME: &str = "provider-secret";

/// Key holding the service principal client ID inside the Credential Object
pub const CLIENT_ID_KEY: &str = "client-id";

/// Key holding the service principal client secret inside the Credential Object
pub const CLIENT_SECRET_KEY: &str = "client-secret";

/// Kind used when an ExternalSecret references a namespaced store
pub const SECRET_STORE_KIND: &str = "SecretStore";

/// Provider label for the Azure Key Vault binding, in logs and metrics
pub const AZURE_PROVIDER_NAME: &str = "azure";

/// Field manager recorded on objects created by the harness
pub const FIELD_MANAGER: &str = "secret-store-e2e";

/// OAuth scope for the Azure Key Vault data plane
pub const AZURE_KEY_VAULT_SCOPE: &str = "https://vault.azure.net/.default";

/// Key Vault REST API version used for direct calls
pub const AZURE_KEY_VAULT_API_VERSION: &str = "7.4";

/// Entry read once at construction to confirm the vault accepts the principal;
/// it is never created, so a 404 is the expected answer
pub const VAULT_REACHABILITY_SECRET: &str = "secret-store-e2e-reachability";

/// Purge attempts while a deleted secret is still being soft-deleted
pub const PURGE_MAX_ATTEMPTS: u32 = 5;

/// Base delay between purge attempts (milliseconds), multiplied by the attempt number
pub const PURGE_RETRY_DELAY_MS: u64 = 500;

/// Default interval between cluster polls while waiting for convergence (milliseconds)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Default upper bound for a mirrored secret to appear (seconds)
pub const DEFAULT_CONVERGENCE_TIMEOUT_SECS: u64 = 120;

/// Default refresh interval written into ExternalSecrets created by the suite
pub const DEFAULT_REFRESH_INTERVAL: &str = "10s";

/// Default log filter when RUST_LOG is unset
pub const DEFAULT_LOG_FILTER: &str = "secret_store_e2e=info";
