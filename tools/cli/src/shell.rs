//! Interactive session.
//!
//! Keeps the vault open in one process so the auto-lock monitor can lock it
//! behind the user's back. Lock transitions are reported as they happen.

use anyhow::{Context, Result};
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::debug;

use strongbox_common::ItemId;
use strongbox_vault::{
    AutoLockMonitor, ItemKind, LockState, MonitorConfig, NewItem, VaultController, VaultHandle,
};

use crate::{print_items, print_revealed, prompt_passphrase};

const HELP: &str = "\
Commands:
  list                      List items
  add <kind> <name>         Add an item (kind: file, folder, note)
  reveal <id>               Print an item's content
  remove <id>               Remove an item
  lock                      Lock the vault
  unlock                    Unlock the vault
  status                    Show lock state and settings
  help                      Show this help
  quit                      Lock and exit";

type InputLines = Lines<BufReader<Stdin>>;

/// Run the session until `quit` or end of input.
pub async fn run(mut controller: VaultController, poll_secs: u64) -> Result<()> {
    if controller.state() == LockState::Uninitialized {
        anyhow::bail!("No vault found. Run `strongbox init` first.");
    }

    let passphrase = tokio::task::spawn_blocking(|| prompt_passphrase("Passphrase: ")).await??;
    controller
        .unlock(&passphrase)
        .await
        .context("Failed to unlock vault")?;
    drop(passphrase);

    let vault = controller.into_handle();
    let mut state_rx = vault.lock().await.subscribe();
    state_rx.borrow_and_update();

    let monitor = AutoLockMonitor::spawn(
        vault.clone(),
        MonitorConfig {
            poll_interval: Duration::from_secs(poll_secs.max(1)),
        },
    );

    println!("Vault unlocked. Type 'help' for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let mut screen = PromptState::default();

    loop {
        if screen.take_prompt() {
            prompt("strongbox> ");
        }

        let line = tokio::select! {
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *state_rx.borrow_and_update();
                if screen.on_state_change(state) {
                    println!();
                    println!("Vault locked. Type 'unlock' to continue.");
                }
                continue;
            }
            line = lines.next_line() => line.context("Failed to read input")?,
        };
        screen.on_line();

        let Some(line) = line else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };
        debug!(command, "Shell command");

        let outcome = match command {
            "quit" | "exit" => break,
            "help" => {
                println!("{}", HELP);
                Ok(())
            }
            "list" | "ls" => {
                print_items(&vault.lock().await.list_items());
                Ok(())
            }
            "status" => status(&vault).await,
            "add" => add(&vault, rest, &mut lines).await,
            "reveal" => reveal(&vault, rest).await,
            "remove" | "rm" => remove(&vault, rest).await,
            "lock" => {
                let mut controller = vault.lock().await;
                if controller.state() == LockState::Unlocked {
                    screen.on_user_lock();
                }
                controller.lock();
                println!("Vault locked.");
                Ok(())
            }
            "unlock" => unlock(&vault).await,
            other => Err(anyhow::anyhow!("Unknown command '{}'. Type 'help'.", other)),
        };

        if let Err(e) = outcome {
            println!("error: {:#}", e);
        }
    }

    vault.lock().await.lock();
    monitor.shutdown().await;
    println!("Vault locked. Goodbye.");
    Ok(())
}

/// Tracks when the prompt needs redrawing.
///
/// State changes the user caused from the prompt arrive on the watch
/// channel too; those must not print a notice or a second prompt.
#[derive(Debug)]
struct PromptState {
    show_prompt: bool,
    user_locked: bool,
}

impl Default for PromptState {
    fn default() -> Self {
        Self {
            show_prompt: true,
            user_locked: false,
        }
    }
}

impl PromptState {
    /// Whether to print the prompt now. Clears the request.
    fn take_prompt(&mut self) -> bool {
        std::mem::take(&mut self.show_prompt)
    }

    /// A line was read and handled.
    fn on_line(&mut self) {
        self.show_prompt = true;
    }

    /// The `lock` command is about to lock the vault.
    fn on_user_lock(&mut self) {
        self.user_locked = true;
    }

    /// A published state change. Returns whether to print the lock notice.
    fn on_state_change(&mut self, state: LockState) -> bool {
        let notify = state == LockState::Locked && !self.user_locked;
        self.user_locked = false;
        if notify {
            self.show_prompt = true;
        }
        notify
    }
}

fn prompt(text: &str) {
    print!("{}", text);
    let _ = std::io::stdout().flush();
}

async fn read_field(lines: &mut InputLines, label: &str) -> Result<String> {
    prompt(label);
    let line = lines
        .next_line()
        .await
        .context("Failed to read input")?
        .unwrap_or_default();
    Ok(line.trim().to_string())
}

async fn status(vault: &VaultHandle) -> Result<()> {
    let controller = vault.lock().await;
    println!("  State: {}", controller.state());
    if let Some(settings) = controller.settings() {
        if settings.auto_lock_enabled {
            println!("  Auto-lock: after {} min", settings.auto_lock_timeout_minutes);
        } else {
            println!("  Auto-lock: off");
        }
    }
    if controller.is_dirty() {
        println!("  Unsaved changes: yes (last save failed)");
    }
    Ok(())
}

async fn add(vault: &VaultHandle, args: &str, lines: &mut InputLines) -> Result<()> {
    let (kind, name) = args
        .split_once(char::is_whitespace)
        .context("Usage: add <kind> <name>")?;
    let kind: ItemKind = kind.parse()?;

    let description = read_field(lines, "Description: ").await?;
    let tags = read_field(lines, "Tags (comma separated): ").await?;
    let content = read_field(lines, "Content: ").await?;

    let item = NewItem::new(name.trim(), kind, content.as_str())
        .description(description)
        .tags(tags.split(','));

    let metadata = vault.lock().await.add_item(item).await?;
    println!("Item added: {}", metadata.id);
    Ok(())
}

async fn reveal(vault: &VaultHandle, args: &str) -> Result<()> {
    let id = ItemId::new(args).context("Usage: reveal <id>")?;
    let revealed = vault.lock().await.reveal_item(&id)?;
    print_revealed(&revealed.content);
    Ok(())
}

async fn remove(vault: &VaultHandle, args: &str) -> Result<()> {
    let id = ItemId::new(args).context("Usage: remove <id>")?;
    if vault.lock().await.remove_item(&id).await? {
        println!("Item removed: {}", id);
    } else {
        println!("No item with id {}.", id);
    }
    Ok(())
}

async fn unlock(vault: &VaultHandle) -> Result<()> {
    if vault.lock().await.state() == LockState::Unlocked {
        println!("Vault is already unlocked.");
        return Ok(());
    }

    let passphrase = tokio::task::spawn_blocking(|| prompt_passphrase("Passphrase: ")).await??;
    vault.lock().await.unlock(&passphrase).await?;
    println!("Vault unlocked.");
    Ok(())
}
