//! Asset bridge: content-addressed image and audio sources.
//!
//! Sources are identified by a hash of their text (usually a data URL). The
//! simulation and the renderer refer to assets by [`AssetId`] and poll
//! readiness; decoding happens off the tick thread.
//!
//! # Invariants
//! - A given source maps to one id; decode runs at most once per id.
//! - A failed decode stays failed for the lifetime of the bridge.
//! - `lookup` never blocks on a decode in progress.

pub mod bridge;
pub mod decode;

pub use bridge::{AssetBridge, DecodeMode};
pub use decode::{DataUrlDecoder, Decoder};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Content-addressed asset ID computed from the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u64);

impl AssetId {
    /// First eight bytes of the SHA-256 of `source`.
    pub fn of(source: &str) -> Self {
        let digest = Sha256::digest(source.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        AssetId(u64::from_le_bytes(bytes))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Image,
    Audio,
}

/// A decoded asset, ready for a renderer or audio backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetHandle {
    pub id: AssetId,
    pub kind: AssetKind,
    pub mime: String,
    /// Decoded payload size in bytes.
    pub byte_len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetStatus {
    Pending,
    Ready(AssetHandle),
    Failed,
}

impl AssetStatus {
    pub fn ready(&self) -> Option<&AssetHandle> {
        match self {
            Self::Ready(handle) => Some(handle),
            Self::Pending | Self::Failed => None,
        }
    }
}

/// Errors from decoding an asset source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    #[error("not a data URL")]
    NotDataUrl,
    #[error("expected {expected:?} content, got mime type {mime:?}")]
    WrongKind { expected: AssetKind, mime: String },
    #[error("invalid base64 payload")]
    BadPayload,
    #[error("empty payload")]
    Empty,
}
