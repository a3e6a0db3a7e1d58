use crate::decode::{DataUrlDecoder, Decoder};
use crate::{AssetId, AssetKind, AssetStatus};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Where decode work runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodeMode {
    /// One named worker thread per request.
    #[default]
    Background,
    /// Decode on the calling thread before `request` returns.
    Inline,
}

type Entries = Arc<Mutex<BTreeMap<AssetId, AssetStatus>>>;

/// Content-addressed registry of requested assets and their decode status.
///
/// Cloning shares the same registry.
#[derive(Clone)]
pub struct AssetBridge {
    entries: Entries,
    decoder: Arc<dyn Decoder>,
    mode: DecodeMode,
}

impl Default for AssetBridge {
    fn default() -> Self {
        Self::new(DataUrlDecoder, DecodeMode::Background)
    }
}

impl std::fmt::Debug for AssetBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetBridge")
            .field("entries", &lock(&self.entries).len())
            .field("mode", &self.mode)
            .finish()
    }
}

impl AssetBridge {
    pub fn new(decoder: impl Decoder, mode: DecodeMode) -> Self {
        Self {
            entries: Arc::default(),
            decoder: Arc::new(decoder),
            mode,
        }
    }

    /// Register a source and start decoding it. Requesting a source that is
    /// already known returns its id without decoding again.
    pub fn request(&self, kind: AssetKind, source: &str) -> AssetId {
        let id = AssetId::of(source);
        {
            let mut entries = lock(&self.entries);
            if entries.contains_key(&id) {
                return id;
            }
            entries.insert(id, AssetStatus::Pending);
        }

        match self.mode {
            DecodeMode::Inline => {
                let status = decode_status(self.decoder.as_ref(), id, kind, source);
                lock(&self.entries).insert(id, status);
            }
            DecodeMode::Background => {
                let entries = Arc::clone(&self.entries);
                let decoder = Arc::clone(&self.decoder);
                let source = source.to_string();
                let spawned = std::thread::Builder::new()
                    .name(format!("asset-decode-{:016x}", id.0))
                    .spawn(move || {
                        let status = decode_status(decoder.as_ref(), id, kind, &source);
                        lock(&entries).insert(id, status);
                    });
                if let Err(e) = spawned {
                    tracing::warn!(asset = id.0, error = %e, "failed to spawn decode thread");
                    lock(&self.entries).insert(id, AssetStatus::Failed);
                }
            }
        }
        id
    }

    /// Current status of an id. Unknown ids read as failed.
    pub fn lookup(&self, id: AssetId) -> AssetStatus {
        lock(&self.entries)
            .get(&id)
            .cloned()
            .unwrap_or(AssetStatus::Failed)
    }

    /// Status of a source without registering it.
    pub fn lookup_source(&self, source: &str) -> AssetStatus {
        self.lookup(AssetId::of(source))
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.entries)
            .values()
            .any(|s| matches!(s, AssetStatus::Pending))
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }
}

fn decode_status(decoder: &dyn Decoder, id: AssetId, kind: AssetKind, source: &str) -> AssetStatus {
    match decoder.decode(id, kind, source) {
        Ok(handle) => {
            tracing::debug!(asset = id.0, ?kind, bytes = handle.byte_len, "asset ready");
            AssetStatus::Ready(handle)
        }
        Err(e) => {
            tracing::warn!(asset = id.0, ?kind, error = %e, "asset decode failed");
            AssetStatus::Failed
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AssetError, AssetHandle};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    struct Counting(Arc<AtomicUsize>);

    impl Decoder for Counting {
        fn decode(
            &self,
            id: AssetId,
            kind: AssetKind,
            source: &str,
        ) -> Result<AssetHandle, AssetError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            DataUrlDecoder.decode(id, kind, source)
        }
    }

    #[test]
    fn inline_decode_is_ready_immediately() {
        let bridge = AssetBridge::new(DataUrlDecoder, DecodeMode::Inline);
        let id = bridge.request(AssetKind::Image, "data:image/png;base64,AAAA");
        assert!(bridge.lookup(id).ready().is_some());
        assert!(!bridge.is_pending());
    }

    #[test]
    fn repeated_requests_decode_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let bridge = AssetBridge::new(Counting(Arc::clone(&count)), DecodeMode::Inline);
        let a = bridge.request(AssetKind::Audio, "data:audio/wav;base64,AAAA");
        let b = bridge.request(AssetKind::Audio, "data:audio/wav;base64,AAAA");
        assert_eq!(a, b);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(bridge.len(), 1);
    }

    #[test]
    fn failure_is_sticky() {
        let bridge = AssetBridge::new(DataUrlDecoder, DecodeMode::Inline);
        let id = bridge.request(AssetKind::Image, "not a data url");
        assert_eq!(bridge.lookup(id), AssetStatus::Failed);
        bridge.request(AssetKind::Image, "not a data url");
        assert_eq!(bridge.lookup(id), AssetStatus::Failed);
    }

    #[test]
    fn background_decode_completes() {
        let bridge = AssetBridge::default();
        let id = bridge.request(AssetKind::Image, "data:image/gif;base64,R0lGODlh");
        let deadline = Instant::now() + Duration::from_secs(5);
        while matches!(bridge.lookup(id), AssetStatus::Pending) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(bridge.lookup(id).ready().map(|h| h.mime.as_str()), Some("image/gif"));
    }

    #[test]
    fn unknown_id_reads_failed() {
        let bridge = AssetBridge::new(DataUrlDecoder, DecodeMode::Inline);
        assert_eq!(bridge.lookup_source("data:image/png;base64,AAAA"), AssetStatus::Failed);
    }
}
