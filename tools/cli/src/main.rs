//! Strongbox CLI - command line front end for a passphrase-protected vault.
//!
//! Each command opens the vault record, unlocks it if the command needs
//! item content, does its work and exits. `shell` keeps a session open with
//! the auto-lock monitor running.

mod shell;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use strongbox_common::{ItemId, Passphrase, Plaintext};
use strongbox_crypto::KdfParams;
use strongbox_storage::LocalStore;
use strongbox_vault::{
    ItemKind, ItemMetadata, LockState, NewItem, NewVaultScheme, VaultController, VaultSettings,
};

#[derive(Parser)]
#[command(name = "strongbox")]
#[command(about = "Strongbox - Passphrase-protected local vault")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Path to the vault record file.
    #[arg(long, env = "STRONGBOX_VAULT", global = true)]
    vault: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new vault.
    Init {
        /// Use Argon2id + XChaCha20-Poly1305 with passphrase verification.
        #[arg(long)]
        sealed: bool,

        /// Disable auto-lock.
        #[arg(long)]
        no_auto_lock: bool,

        /// Minutes of inactivity before auto-lock.
        #[arg(short, long)]
        timeout: Option<u32>,
    },

    /// Show vault state and settings.
    Status,

    /// List item metadata. Does not need the passphrase.
    List {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Add an item.
    Add {
        /// Item name.
        #[arg(short, long)]
        name: String,

        /// Item type: file, folder or note.
        #[arg(short, long, default_value = "note")]
        kind: ItemKind,

        /// Free-text description.
        #[arg(short, long, default_value = "")]
        description: String,

        /// Tag (repeatable).
        #[arg(short = 'g', long = "tag")]
        tags: Vec<String>,

        /// Content given inline.
        #[arg(short, long, conflicts_with = "file")]
        content: Option<String>,

        /// Read content from a file. Without --content or --file, stdin is read.
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Print an item's decrypted content.
    Reveal {
        /// Item id.
        id: String,
    },

    /// Remove an item.
    Remove {
        /// Item id.
        id: String,
    },

    /// Show or change auto-lock settings. Does not need the passphrase.
    Settings {
        /// Turn auto-lock on or off.
        #[arg(long)]
        auto_lock: Option<Toggle>,

        /// Minutes of inactivity before auto-lock.
        #[arg(short, long)]
        timeout: Option<u32>,
    },

    /// Interactive session with auto-lock.
    Shell {
        /// Seconds between auto-lock checks.
        #[arg(long, default_value_t = 60)]
        poll_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let path = resolve_vault_path(cli.vault)?;

    match cli.command {
        Commands::Init {
            sealed,
            no_auto_lock,
            timeout,
        } => cmd_init(&path, sealed, no_auto_lock, timeout).await,

        Commands::Status => cmd_status(&path).await,

        Commands::List { json } => cmd_list(&path, json).await,

        Commands::Add {
            name,
            kind,
            description,
            tags,
            content,
            file,
        } => {
            let content = read_content(content, file).await?;
            let item = NewItem::new(name, kind, content)
                .description(description)
                .tags(tags);
            cmd_add(&path, item).await
        }

        Commands::Reveal { id } => cmd_reveal(&path, &id).await,

        Commands::Remove { id } => cmd_remove(&path, &id).await,

        Commands::Settings { auto_lock, timeout } => cmd_settings(&path, auto_lock, timeout).await,

        Commands::Shell { poll_secs } => shell::run(open_vault(&path).await?, poll_secs).await,
    }
}

fn resolve_vault_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => LocalStore::default_path()
            .context("No data directory found; pass --vault or set STRONGBOX_VAULT"),
    }
}

/// Prompt for a passphrase without echo.
pub(crate) fn prompt_passphrase(prompt: &str) -> Result<Passphrase> {
    let passphrase = rpassword::prompt_password(prompt).context("Failed to read passphrase")?;
    Ok(Passphrase::new(passphrase))
}

/// Open the vault record at `path`.
pub(crate) async fn open_vault(path: &Path) -> Result<VaultController> {
    let store = Arc::new(LocalStore::new(path));
    VaultController::open(store)
        .await
        .with_context(|| format!("Failed to open vault at {}", path.display()))
}

/// Open and unlock the vault, prompting for the passphrase.
async fn unlock_vault(path: &Path) -> Result<VaultController> {
    let mut vault = open_vault(path).await?;
    if vault.state() == LockState::Uninitialized {
        anyhow::bail!("No vault at {}. Run `strongbox init` first.", path.display());
    }

    let passphrase = prompt_passphrase("Passphrase: ")?;
    vault.unlock(&passphrase).await.context("Failed to unlock vault")?;
    Ok(vault)
}

async fn read_content(content: Option<String>, file: Option<PathBuf>) -> Result<Plaintext> {
    if let Some(content) = content {
        return Ok(Plaintext::new(content.into_bytes()));
    }

    if let Some(file) = file {
        let data = tokio::fs::read(&file)
            .await
            .with_context(|| format!("Failed to read {}", file.display()))?;
        return Ok(Plaintext::new(data));
    }

    use tokio::io::AsyncReadExt;
    let mut data = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut data)
        .await
        .context("Failed to read content from stdin")?;
    Ok(Plaintext::new(data))
}

pub(crate) fn print_items(items: &[ItemMetadata]) {
    if items.is_empty() {
        println!("Vault is empty.");
        return;
    }

    for item in items {
        let tags = item.tags.iter().cloned().collect::<Vec<_>>().join(", ");
        println!("  {}  [{}] {}", item.id, item.kind, item.name);
        if !item.description.is_empty() {
            println!("      {}", item.description);
        }
        if !tags.is_empty() {
            println!("      tags: {}", tags);
        }
    }
}

pub(crate) fn print_revealed(content: &Plaintext) {
    match content.as_str() {
        Some(text) => println!("{}", text),
        None => {
            eprintln!("warning: content is not valid UTF-8; was the vault unlocked with the right passphrase?");
            println!("{}", content.to_string_lossy());
        }
    }
}

/// Create a new vault.
async fn cmd_init(path: &Path, sealed: bool, no_auto_lock: bool, timeout: Option<u32>) -> Result<()> {
    info!("Creating vault at {}", path.display());

    let mut vault = open_vault(path).await?;
    if vault.state() != LockState::Uninitialized {
        anyhow::bail!("A vault already exists at {}", path.display());
    }

    let mut settings = VaultSettings::default();
    settings.auto_lock_enabled = !no_auto_lock;
    if let Some(minutes) = timeout {
        settings.auto_lock_timeout_minutes = minutes;
    }

    let passphrase = prompt_passphrase("Enter passphrase: ")?;
    let confirm = prompt_passphrase("Confirm passphrase: ")?;

    let scheme = if sealed {
        NewVaultScheme::Sealed(KdfParams::interactive())
    } else {
        NewVaultScheme::Legacy
    };

    vault
        .create_vault_with(&passphrase, &confirm, settings, scheme)
        .await
        .context("Failed to create vault")?;

    println!("Vault created successfully!");
    println!("  Location: {}", path.display());
    if !sealed {
        println!("  Note: this vault does not verify passphrases. A wrong passphrase");
        println!("  unlocks it but reveals garbled content. Use --sealed to verify.");
    }

    Ok(())
}

/// Show vault state and settings.
async fn cmd_status(path: &Path) -> Result<()> {
    let vault = open_vault(path).await?;

    println!("Vault: {}", path.display());
    println!("  State: {}", vault.state());

    if let (Some(settings), Some(scheme)) = (vault.settings(), vault.scheme()) {
        println!("  Cipher: {:?}", scheme);
        println!("  Items: {}", vault.list_items().len());
        if settings.auto_lock_enabled {
            println!("  Auto-lock: after {} min", settings.auto_lock_timeout_minutes);
        } else {
            println!("  Auto-lock: off");
        }
    }

    Ok(())
}

/// List item metadata.
async fn cmd_list(path: &Path, json: bool) -> Result<()> {
    let vault = open_vault(path).await?;
    let items = vault.list_items();

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        print_items(&items);
    }

    Ok(())
}

/// Add an item.
async fn cmd_add(path: &Path, item: NewItem) -> Result<()> {
    let mut vault = unlock_vault(path).await?;
    let size = item.content.len();

    let metadata = vault.add_item(item).await.context("Failed to add item")?;
    vault.lock();

    println!("Item added: {} ({} bytes)", metadata.id, size);
    Ok(())
}

/// Print decrypted content.
async fn cmd_reveal(path: &Path, id: &str) -> Result<()> {
    let id = ItemId::new(id)?;
    let mut vault = unlock_vault(path).await?;

    let revealed = vault.reveal_item(&id).context("Failed to reveal item")?;
    print_revealed(&revealed.content);
    vault.lock();

    Ok(())
}

/// Remove an item.
async fn cmd_remove(path: &Path, id: &str) -> Result<()> {
    let id = ItemId::new(id)?;
    let mut vault = unlock_vault(path).await?;

    let removed = vault.remove_item(&id).await.context("Failed to remove item")?;
    vault.lock();

    if removed {
        println!("Item removed: {}", id);
    } else {
        println!("No item with id {}; nothing removed.", id);
    }
    Ok(())
}

/// Show or change settings.
async fn cmd_settings(path: &Path, auto_lock: Option<Toggle>, timeout: Option<u32>) -> Result<()> {
    let mut vault = open_vault(path).await?;
    let mut settings = vault
        .settings()
        .cloned()
        .with_context(|| format!("No vault at {}", path.display()))?;

    if auto_lock.is_some() || timeout.is_some() {
        if let Some(toggle) = auto_lock {
            settings.auto_lock_enabled = matches!(toggle, Toggle::On);
        }
        if let Some(minutes) = timeout {
            settings.auto_lock_timeout_minutes = minutes;
        }
        vault
            .update_settings(settings.clone())
            .await
            .context("Failed to update settings")?;
        println!("Settings updated.");
    }

    println!(
        "  Auto-lock: {}",
        if settings.auto_lock_enabled { "on" } else { "off" }
    );
    println!("  Timeout: {} min", settings.auto_lock_timeout_minutes);
    Ok(())
}
