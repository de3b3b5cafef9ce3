//! Length-prefixed framing for the clip-engine TCP channel.
//!
//! Wire format: `[u32 length (big-endian)][JSON payload]`.

use std::io::{self, Read, Write};

use serde::{de::DeserializeOwned, Serialize};

/// Frames larger than this are rejected; engine messages are small and
/// a bigger prefix means a desynchronized stream.
const MAX_FRAME: usize = 16_000_000;

/// Write a length-prefixed JSON message to a stream.
pub fn write_message<W: Write, T: Serialize>(writer: &mut W, msg: &T) -> io::Result<()> {
    let payload = serde_json::to_vec(msg)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let len = payload.len() as u32;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(&payload)?;
    writer.flush()?;

    Ok(())
}

/// Read a length-prefixed JSON message from a stream.
pub fn read_message<R: Read, T: DeserializeOwned>(reader: &mut R) -> io::Result<T> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_be_bytes(len_buf) as usize;

    if len > MAX_FRAME {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame too large: {} bytes", len),
        ));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;

    serde_json::from_slice(&payload).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn roundtrip_message() {
        use crate::protocol::{EngineRequest, StreamKind};

        let mut buf = Vec::new();
        write_message(
            &mut buf,
            &EngineRequest::Subscribe {
                stream: StreamKind::Slots,
                snapshot: true,
            },
        )
        .unwrap();

        let mut cursor = Cursor::new(buf);
        let result: EngineRequest = read_message(&mut cursor).unwrap();
        assert!(matches!(
            result,
            EngineRequest::Subscribe {
                stream: StreamKind::Slots,
                snapshot: true
            }
        ));
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(MAX_FRAME as u32 + 1).to_be_bytes());
        let mut cursor = Cursor::new(buf);
        let result: io::Result<serde_json::Value> = read_message(&mut cursor);
        assert!(result.is_err());
    }

    #[test]
    fn truncated_frame_is_an_error() {
        let mut buf = Vec::new();
        write_message(&mut buf, &serde_json::json!({"a": 1})).unwrap();
        buf.truncate(buf.len() - 2);
        let mut cursor = Cursor::new(buf);
        let result: io::Result<serde_json::Value> = read_message(&mut cursor);
        assert!(result.is_err());
    }
}
