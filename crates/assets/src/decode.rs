use crate::{AssetError, AssetHandle, AssetId, AssetKind};

/// Turns a source string into a usable asset handle.
///
/// Implementations run on worker threads.
pub trait Decoder: Send + Sync + 'static {
    fn decode(&self, id: AssetId, kind: AssetKind, source: &str) -> Result<AssetHandle, AssetError>;
}

/// Validates `data:<mime>[;base64],<payload>` sources.
///
/// The mime type must match the requested kind (`image/*` or `audio/*`).
/// Payload bytes are not kept; hosts that need pixels or samples plug in
/// their own [`Decoder`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DataUrlDecoder;

impl Decoder for DataUrlDecoder {
    fn decode(&self, id: AssetId, kind: AssetKind, source: &str) -> Result<AssetHandle, AssetError> {
        let rest = source.strip_prefix("data:").ok_or(AssetError::NotDataUrl)?;
        let (header, payload) = rest.split_once(',').ok_or(AssetError::NotDataUrl)?;
        let (mime, is_base64) = match header.strip_suffix(";base64") {
            Some(mime) => (mime, true),
            None => (header, false),
        };
        let expected_prefix = match kind {
            AssetKind::Image => "image/",
            AssetKind::Audio => "audio/",
        };
        if !mime.starts_with(expected_prefix) {
            return Err(AssetError::WrongKind {
                expected: kind,
                mime: mime.to_string(),
            });
        }
        let byte_len = if is_base64 {
            base64_decoded_len(payload)?
        } else {
            payload.len()
        };
        if byte_len == 0 {
            return Err(AssetError::Empty);
        }
        Ok(AssetHandle {
            id,
            kind,
            mime: mime.to_string(),
            byte_len,
        })
    }
}

fn base64_decoded_len(payload: &str) -> Result<usize, AssetError> {
    let trimmed = payload.trim_end_matches('=');
    let padding = payload.len() - trimmed.len();
    let valid = trimmed
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/');
    if !valid || padding > 2 || payload.len() % 4 != 0 {
        return Err(AssetError::BadPayload);
    }
    Ok(payload.len() / 4 * 3 - padding)
}
