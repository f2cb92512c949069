//! # STORECTL CLI
//!
//! Command-line interface for seeding and cleaning up e2e state by hand.
//!
//! Reads the same `E2E_AZURE_*` environment variables as the test harness, so
//! what it declares or writes is exactly what a test run would.
//!
//! ## Usage
//!
//! ```bash
//! # Bind credentials and declare the SecretStore in a namespace
//! storectl setup --namespace e2e-1a2b3c4d
//!
//! # Seed, read and remove a vault entry
//! storectl create-secret --key k1 --value v1
//! storectl get-secret --key k1
//! storectl delete-secret --key k1
//!
//! # Print the Credential Object and SecretStore without applying them
//! storectl render --namespace e2e-1a2b3c4d
//!
//! # Print operation metrics to stderr after the command
//! storectl --metrics delete-secret --key k1
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use secret_store_e2e::cluster::{Framework, KubeCluster};
use secret_store_e2e::config::HarnessConfig;
use secret_store_e2e::constants::AZURE_PROVIDER_NAME;
use secret_store_e2e::credentials::{bind_credentials, AzureCredential};
use secret_store_e2e::harness::{AzureHarness, ProviderHarness, Registration};
use secret_store_e2e::observability::{init_tracing, metrics};
use secret_store_e2e::provider::azure::{AzureAuthenticator, AzureKeyVault};
use secret_store_e2e::provider::VaultBackend;
use secret_store_e2e::store::declare_azure_store;
use std::sync::Arc;
use std::time::Instant;

const REDACTED: &str = "<redacted>";

/// SecretStore e2e harness CLI
#[derive(Parser)]
#[command(name = "storectl")]
#[command(about = "Seed and inspect SecretStore e2e state", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Test namespace
    #[arg(short, long, global = true, default_value = "default")]
    namespace: String,

    /// Print vault operation metrics (Prometheus text format) to stderr when done
    #[arg(long, global = true)]
    metrics: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the Credential Object and the SecretStore
    Setup,
    /// Create or overwrite a vault entry
    CreateSecret {
        #[arg(short, long)]
        key: String,

        #[arg(short, long)]
        value: String,
    },
    /// Delete a vault entry (absent entries are not an error)
    DeleteSecret {
        #[arg(short, long)]
        key: String,
    },
    /// Print a vault entry
    GetSecret {
        #[arg(short, long)]
        key: String,
    },
    /// Print the Credential Object and SecretStore as YAML
    Render {
        /// Print the client secret instead of a placeholder
        #[arg(long)]
        show_secrets: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_provider| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    init_tracing();
    metrics::register_metrics().context("Failed to register metrics")?;

    let cli = Cli::parse();
    let config = HarnessConfig::from_env().context("Failed to load harness configuration")?;
    let show_metrics = cli.metrics;

    let result = run(cli, config).await;
    if show_metrics {
        eprint!("{}", metrics::render()?);
    }
    result
}

async fn run(cli: Cli, config: HarnessConfig) -> Result<()> {
    match cli.command {
        Commands::Setup => setup_command(config, cli.namespace).await,
        Commands::CreateSecret { key, value } => {
            let vault = connect(&config).await?;
            let start = Instant::now();
            let result = vault.set_secret(&key, &value).await;
            metrics::observe_vault_operation(AZURE_PROVIDER_NAME, "create", start, result.is_ok());
            result.with_context(|| format!("Failed to create secret '{key}'"))?;
            println!("Created '{key}' in {}", vault.endpoint());
            Ok(())
        }
        Commands::DeleteSecret { key } => {
            let vault = connect(&config).await?;
            let start = Instant::now();
            let result = vault.delete_secret(&key).await;
            metrics::observe_vault_operation(AZURE_PROVIDER_NAME, "delete", start, result.is_ok());
            let existed = result.with_context(|| format!("Failed to delete secret '{key}'"))?;
            if existed {
                println!("Deleted '{key}' from {}", vault.endpoint());
            } else {
                println!("'{key}' was not present in {}", vault.endpoint());
            }
            Ok(())
        }
        Commands::GetSecret { key } => {
            let vault = connect(&config).await?;
            let start = Instant::now();
            let result = vault.get_secret(&key).await;
            metrics::observe_vault_operation(AZURE_PROVIDER_NAME, "get", start, result.is_ok());
            match result? {
                Some(value) => println!("{value}"),
                None => anyhow::bail!("Secret '{key}' not found in {}", vault.endpoint()),
            }
            Ok(())
        }
        Commands::Render { show_secrets } => {
            print!("{}", render(&cli.namespace, &config.credential, show_secrets)?);
            Ok(())
        }
    }
}

async fn connect(config: &HarnessConfig) -> Result<AzureKeyVault> {
    Ok(AzureKeyVault::connect(&config.credential, &config.vault).await?)
}

async fn setup_command(config: HarnessConfig, namespace: String) -> Result<()> {
    let cluster = KubeCluster::try_default()
        .await
        .context("Failed to create Kubernetes client. Ensure kubeconfig is configured.")?;
    let framework = Framework::new(namespace, Arc::new(cluster));
    let authenticator = AzureAuthenticator::new(config.vault);

    let harness = AzureHarness::new(framework, config.credential.clone(), &authenticator).await?;
    let mut registration = Registration::register(harness);
    let harness = registration.before_each().await?;

    println!(
        "Declared SecretStore {}/{} for {}",
        harness.namespace(),
        harness.store_ref().name,
        config.credential.vault_url()
    );
    Ok(())
}

/// Credential Object and SecretStore as a two-document YAML stream
fn render(namespace: &str, credential: &AzureCredential, show_secrets: bool) -> Result<String> {
    let shown = if show_secrets {
        credential.clone()
    } else {
        AzureCredential::new(
            credential.client_id(),
            REDACTED,
            credential.tenant_id(),
            credential.vault_url(),
        )
    };

    let secret = serde_yaml::to_string(&bind_credentials(namespace, &shown))?;
    let store = serde_yaml::to_string(&declare_azure_store(namespace, &shown))?;
    Ok(format!("{secret}---\n{store}"))
}
