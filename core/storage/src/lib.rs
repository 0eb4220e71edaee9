//! Durable storage for the vault record.
//!
//! A vault is persisted as one opaque record that is overwritten in full on
//! every save. Stores deal in bytes only; the vault crate owns the record
//! format.
//!
//! # Design Principles
//! - Whole-record writes: there is no partial update or append form
//! - Atomic replacement: a crashed write never leaves a torn record
//! - Async operations: all I/O goes through tokio

pub mod local;
pub mod memory;
pub mod store;

pub use local::LocalStore;
pub use memory::MemoryStore;
pub use store::RecordStore;
