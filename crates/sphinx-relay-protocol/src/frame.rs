//! Native-messaging framing.
//!
//! Every message on the backend pipe is a 4-byte length in native byte
//! order followed by that many bytes of UTF-8 JSON:
//!
//! ```text
//! [4: payload_len (native endian)][N: JSON payload]
//! ```

use crate::error::{ProtocolError, ProtocolResult};
use serde::Serialize;

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX_BYTES: usize = 4;

/// Largest message accepted from the backend (1 MiB).
pub const MAX_INBOUND_FRAME_BYTES: usize = 1024 * 1024;

/// Encode a message as a length-prefixed frame.
pub fn encode_frame<T: Serialize>(message: &T) -> ProtocolResult<Vec<u8>> {
    let payload = serde_json::to_vec(message)?;
    let len = u32::try_from(payload.len()).map_err(|_| ProtocolError::FrameTooLarge {
        size: payload.len(),
        max: u32::MAX as usize,
    })?;

    let mut buf = Vec::with_capacity(LENGTH_PREFIX_BYTES + payload.len());
    buf.extend_from_slice(&len.to_ne_bytes());
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Split one complete frame off the front of a buffer.
///
/// Returns `Ok(None)` if the buffer does not yet hold a complete frame, and
/// `Ok(Some((payload, consumed)))` once it does. A length above `max` is an
/// error: the stream cannot be resynchronized after it.
pub fn split_frame(buf: &[u8], max: usize) -> ProtocolResult<Option<(&[u8], usize)>> {
    if buf.len() < LENGTH_PREFIX_BYTES {
        return Ok(None);
    }

    let mut prefix = [0u8; LENGTH_PREFIX_BYTES];
    prefix.copy_from_slice(&buf[..LENGTH_PREFIX_BYTES]);
    let len = u32::from_ne_bytes(prefix) as usize;

    if len > max {
        return Err(ProtocolError::FrameTooLarge { size: len, max });
    }

    let end = LENGTH_PREFIX_BYTES + len;
    if buf.len() < end {
        return Ok(None);
    }

    Ok(Some((&buf[LENGTH_PREFIX_BYTES..end], end)))
}
