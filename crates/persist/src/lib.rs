//! Save slot storage.
//!
//! A slot store is a flat string key/value map. The kernel serializes save
//! snapshots to JSON text and hands them here under a prefixed key.
//!
//! # Invariants
//! - `set` either fully replaces the value or leaves the old one intact.
//! - A value whose integrity check fails reads as [`StoreError::Corrupt`],
//!   never as a partial value.

pub mod file;
pub mod store;

pub use file::FileSlotStore;
pub use store::{MemorySlotStore, SlotStore};

/// Errors from slot store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid slot key {0:?}")]
    InvalidKey(String),
    #[error("integrity check failed for {key}: expected {expected}, got {actual}")]
    Corrupt {
        key: String,
        expected: String,
        actual: String,
    },
}
