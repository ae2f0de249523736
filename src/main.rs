//! keyvault CLI application.
//!
//! Lists, adds, exports and removes keys in a local encrypted keystore.

use clap::{Parser, Subcommand};
use keyvault::config::KeystoreConfig;
use keyvault::crypto::ed25519::{Ed25519Keypair, KeyMaterial};
use keyvault::error::{KeystoreError, Result};
use keyvault::storage::backend::OrderedStore;
use keyvault::storage::keystore::Keystore;
use keyvault::storage::sled_store::SledStore;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::{fmt, EnvFilter};
use zeroize::Zeroizing;

/// Environment variable consulted before prompting for the passphrase.
const PASSPHRASE_ENV: &str = "KEYVAULT_PASSPHRASE";

#[derive(Parser)]
#[command(name = "keyvault")]
#[command(about = "Passphrase-encrypted local keystore", long_about = None)]
struct Cli {
    /// JSON config file
    #[arg(long, env = "KEYVAULT_CONFIG")]
    config: Option<PathBuf>,

    /// Keystore directory (overrides the config file)
    #[arg(long, env = "KEYVAULT_PATH")]
    path: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "KEYVAULT_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all key names
    List,

    /// Store the contents of a file under a new name
    Add {
        /// Key name
        #[arg(long)]
        name: String,

        /// Input key file
        #[arg(long)]
        file: PathBuf,

        /// Require the file to be a 32-byte Ed25519 secret key
        #[arg(long)]
        ed25519: bool,
    },

    /// Decrypt and print or write a stored key
    Export {
        /// Key name
        #[arg(long)]
        name: String,

        /// Output format: hex or raw
        #[arg(long, default_value = "hex")]
        format: String,

        /// Optional output file (if not specified, prints to stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Remove a stored key
    Remove {
        /// Key name
        #[arg(long)]
        name: String,
    },
}

fn setup_logging(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| KeystoreError::Config(format!("Invalid log level '{}': {}", log_level, e)))?;

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| KeystoreError::Config(format!("Failed to set subscriber: {}", e)))
}

fn read_passphrase() -> Result<Zeroizing<String>> {
    if let Ok(passphrase) = std::env::var(PASSPHRASE_ENV) {
        debug!("Using passphrase from {}", PASSPHRASE_ENV);
        return Ok(Zeroizing::new(passphrase));
    }
    Ok(Zeroizing::new(rpassword::prompt_password(
        "Enter keystore passphrase: ",
    )?))
}

fn resolve_config(config: Option<&Path>, path: Option<PathBuf>) -> Result<KeystoreConfig> {
    let mut file_config = match config {
        Some(config_path) => KeystoreConfig::load(config_path)?,
        None => KeystoreConfig::default(),
    };
    if let Some(path) = path {
        file_config.storage_path = path;
    }
    Ok(file_config)
}

/// Listing a path with no store on it is an empty listing, not an error.
fn is_empty_listing(cmd: &Commands, storage_path: &Path) -> bool {
    matches!(cmd, Commands::List) && !SledStore::exists(storage_path)
}

/// Run `command`, then close the keystore. The command's error wins over a
/// close error.
fn run_and_close<S: OrderedStore>(
    keystore: &Keystore<S>,
    command: impl FnOnce(&Keystore<S>) -> Result<()>,
) -> Result<()> {
    let result = command(keystore);
    match keystore.close() {
        Ok(()) => result,
        Err(e) if result.is_err() => {
            warn!(error = %e, "Failed to close keystore");
            result
        }
        Err(e) => Err(e),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level)?;

    let mut config = resolve_config(cli.config.as_deref(), cli.path)?;
    if is_empty_listing(&cli.command, &config.storage_path) {
        println!("No keys found in keystore.");
        return Ok(());
    }

    config.read_only |= matches!(cli.command, Commands::List | Commands::Export { .. });
    let passphrase = read_passphrase()?;
    let keystore = Keystore::open(config.into_opts(passphrase.as_str()))?;

    run_and_close(&keystore, |keystore| handle_command(keystore, cli.command))
}

fn handle_command(keystore: &Keystore, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::List => {
            let mut names = keystore.list()?;
            names.sort();

            if names.is_empty() {
                println!("No keys found in keystore.");
            } else {
                for name in names {
                    println!("{}", name);
                }
            }

            Ok(())
        }

        Commands::Add {
            name,
            file,
            ed25519,
        } => {
            let key_bytes = Zeroizing::new(fs::read(&file)?);

            if ed25519 {
                let keypair = Ed25519Keypair::from_key_bytes(&key_bytes)?;
                keystore.put_key(&name, &keypair)?;
                println!("Stored key: {}", name);
                println!("Public key: {}", keypair.public_hex());
            } else {
                keystore.put(&name, &key_bytes)?;
                println!("Stored key: {}", name);
            }

            Ok(())
        }

        Commands::Export {
            name,
            format,
            output,
        } => {
            let key_bytes = keystore.get(&name)?;

            match (format.to_lowercase().as_str(), output) {
                ("hex", Some(output_path)) => {
                    let encoded = Zeroizing::new(hex::encode(key_bytes.as_slice()));
                    fs::write(&output_path, encoded.as_bytes())?;
                    println!("Exported key '{}' in hex format to: {}", name, output_path.display());
                }
                ("hex", None) => {
                    println!("{}", Zeroizing::new(hex::encode(key_bytes.as_slice())).as_str());
                }
                ("raw", Some(output_path)) => {
                    fs::write(&output_path, key_bytes.as_slice())?;
                    println!("Exported key '{}' in raw format to: {}", name, output_path.display());
                }
                ("raw", None) => {
                    return Err(KeystoreError::Config(
                        "raw format requires --output file (binary data)".to_string(),
                    ));
                }
                (other, _) => {
                    return Err(KeystoreError::Config(format!(
                        "Unsupported format: '{}'. Use 'hex' or 'raw'",
                        other
                    )));
                }
            }

            Ok(())
        }

        Commands::Remove { name } => {
            keystore.delete(&name)?;
            println!("Removed key: {}", name);
            Ok(())
        }
    }
}
