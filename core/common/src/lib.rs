//! Common utilities and types shared across Strongbox modules.
//!
//! This module provides the error taxonomy every layer reports through, plus
//! the small wrapper types that carry secrets between crates.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{ItemId, Passphrase, Plaintext, MIN_PASSPHRASE_LEN};
