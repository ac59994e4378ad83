//! # op-bridge CLI (`opb`)
//!
//! Create, read and delete vault items from record files.
//!
//! ## Usage
//!
//! ```bash
//! opb --config ./config/opb.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `opb item get <id>` | Print an item as the vault stores it |
//! | `opb item delete <id>` | Delete an item of any category |
//! | `opb identity create <record>` | Create an identity from a TOML/JSON record |
//! | `opb identity read <id>` | Print an identity as a record |
//! | `opb document create <record>` | Upload a document from a TOML/JSON record |
//! | `opb document read <id>` | Print a document and its content |
//! | `opb vault get\|create\|delete` | Manage vaults |
//! | `opb categories` | List item categories and template ids |
//!
//! Results are printed to stdout as JSON; logs go to stderr. A missing
//! item or vault prints `null`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use op_bridge::category::Category;
use op_bridge::config::{self, Config};
use op_bridge::document::{self, DocumentConfig};
use op_bridge::identity::{self, IdentityConfig};
use op_bridge::{OpCli, OpClient};

const DEFAULT_CONFIG: &str = "./config/opb.toml";

/// op-bridge: manage password-manager items through the `op` CLI.
#[derive(Parser)]
#[command(name = "opb", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/opb.toml`; built-in defaults are used when
    /// that file does not exist.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v = debug, -vv = trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Raw items of any category.
    Item {
        #[command(subcommand)]
        action: ItemAction,
    },

    /// Identity items (name, address and internet details).
    Identity {
        #[command(subcommand)]
        action: RecordAction,
    },

    /// Document items (a stored file).
    Document {
        #[command(subcommand)]
        action: RecordAction,
    },

    /// Vaults.
    Vault {
        #[command(subcommand)]
        action: VaultAction,
    },

    /// List item categories and their template ids.
    Categories,
}

#[derive(Subcommand)]
enum ItemAction {
    /// Print an item and its category.
    Get {
        id: String,
        /// Vault to look in.
        #[arg(long)]
        vault: Option<String>,
    },
    /// Delete an item. Succeeds if it is already gone.
    Delete { id: String },
}

#[derive(Subcommand)]
enum RecordAction {
    /// Create an item from a record file (`.json`, otherwise TOML).
    Create { record: PathBuf },
    /// Read an item back as a record.
    Read {
        id: String,
        /// Vault to look in.
        #[arg(long)]
        vault: Option<String>,
    },
}

#[derive(Subcommand)]
enum VaultAction {
    Get { id: String },
    Create { name: String },
    /// Delete a vault. Succeeds if it is already gone.
    Delete { id: String },
}

fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => config::load_config(path),
        None if Path::new(DEFAULT_CONFIG).exists() => config::load_config(Path::new(DEFAULT_CONFIG)),
        None => Ok(Config::minimal()),
    }
}

/// Parse a record file: JSON when the extension is `.json`, TOML otherwise.
fn load_record<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read record file: {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON record: {}", path.display()))
    } else {
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML record: {}", path.display()))
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = load(cli.config.as_deref())?;

    let level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => cfg.logging.level.as_str(),
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    setup_logging(level);

    let client = OpClient::new(OpCli::from_config(&cfg.cli));

    match cli.command {
        Commands::Item { action } => match action {
            ItemAction::Get { id, vault } => {
                let item = client.read_item(&id, vault.as_deref())?;
                print_json(&item.map(|item| {
                    serde_json::json!({
                        "category": item.category().name(),
                        "item": item,
                    })
                }))?;
            }
            ItemAction::Delete { id } => {
                client.delete_item(&id)?;
            }
        },
        Commands::Identity { action } => match action {
            RecordAction::Create { record } => {
                let config: IdentityConfig = load_record(&record)?;
                let created = identity::create_identity(&client, &config)
                    .with_context(|| format!("Failed to create identity '{}'", config.name))?;
                print_json(&created)?;
            }
            RecordAction::Read { id, vault } => {
                print_json(&identity::read_identity(&client, &id, vault.as_deref())?)?;
            }
        },
        Commands::Document { action } => match action {
            RecordAction::Create { record } => {
                let config: DocumentConfig = load_record(&record)?;
                let created = document::create_document(&client, &config)
                    .with_context(|| format!("Failed to create document '{}'", config.name))?;
                print_json(&created)?;
            }
            RecordAction::Read { id, vault } => {
                print_json(&document::read_document(&client, &id, vault.as_deref())?)?;
            }
        },
        Commands::Vault { action } => match action {
            VaultAction::Get { id } => {
                print_json(&client.read_vault(&id)?)?;
            }
            VaultAction::Create { name } => {
                print_json(&client.create_vault(&name)?)?;
            }
            VaultAction::Delete { id } => {
                client.delete_vault(&id)?;
            }
        },
        Commands::Categories => {
            for category in Category::all() {
                println!("{}  {}", category.template(), category.name());
            }
        }
    }

    Ok(())
}
