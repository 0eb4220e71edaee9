//! Vault engine for Strongbox.
//!
//! This module provides:
//! - The lock/unlock/create state machine ([`VaultController`])
//! - Item storage with per-item encrypted payloads ([`VaultItemStore`])
//! - Session handling with zeroized secrets ([`Session`])
//! - The inactivity auto-lock monitor ([`AutoLockMonitor`])
//!
//! # Architecture
//! The controller owns the record and the session. Every item operation
//! goes through it and is refused unless the vault is unlocked. Item
//! metadata stays listable while locked; content never does.

pub mod controller;
pub mod items;
pub mod monitor;
pub mod persistence;
pub mod record;
pub mod session;

pub use controller::{LockState, NewVaultScheme, VaultController, VaultHandle};
pub use items::{NewItem, Revealed, VaultItemStore};
pub use monitor::{AutoLockMonitor, MonitorConfig, MonitorHandle};
pub use persistence::PersistenceAdapter;
pub use record::{ItemKind, ItemMetadata, VaultItem, VaultRecord, VaultSettings};
pub use session::Session;
