// Length-delimited framing shared by the daemon's request reader and the
// CLI's response reader: one JSON line, optionally followed by an exact-size
// binary tail. Implemented once and reused by both sides (§4.1), grounded
// on the buffered-socket idiom used throughout the daemon's connection
// handling and on the original `recv_line`/`recv_binary` pair.

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt};

/// Hard cap on a single JSON line before a newline is seen.
pub const MAX_LINE_BYTES: usize = 256 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("line exceeded {MAX_LINE_BYTES} bytes before a newline was seen")]
    Oversize,
    #[error("connection closed before {expected} bytes were read (got {got})")]
    ClosedEarly { expected: usize, got: usize },
    #[error("invalid binary payload size: {0}")]
    InvalidSize(i64),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read one newline-terminated line, without the terminator.
///
/// Returns `Ok(String::new())` on a clean EOF with no bytes read at all
/// (the caller's cue to close the connection). Fails with `Oversize` once
/// the accumulated, newline-less buffer exceeds `MAX_LINE_BYTES` — the
/// read is abandoned at that point rather than continuing to buffer.
pub async fn read_line<R>(reader: &mut R) -> Result<String, TransportError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    loop {
        let chunk = reader.fill_buf().await?;
        if chunk.is_empty() {
            // EOF. Whatever is in `buf` arrived with no trailing newline.
            if buf.is_empty() {
                return Ok(String::new());
            }
            return Ok(String::from_utf8_lossy(&buf).into_owned());
        }

        if let Some(newline_at) = chunk.iter().position(|byte| *byte == b'\n') {
            buf.extend_from_slice(&chunk[..newline_at]);
            reader.consume(newline_at + 1);
            trim_trailing_cr(&mut buf);
            return Ok(String::from_utf8_lossy(&buf).into_owned());
        }

        if buf.len() + chunk.len() > MAX_LINE_BYTES {
            // Still consume what we peeked so the stream stays well-formed
            // for any caller that wants to keep reading past the error.
            let consumed = chunk.len();
            reader.consume(consumed);
            return Err(TransportError::Oversize);
        }

        buf.extend_from_slice(chunk);
        let consumed = chunk.len();
        reader.consume(consumed);
    }
}

fn trim_trailing_cr(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
}

/// Read exactly `n` bytes off `reader`. `n == 0` returns an empty vector
/// without issuing a read. `n < 0` (as carried by a signed `_binary_size`
/// before range-checking) is rejected as `InvalidSize`.
pub async fn read_exact_n<R>(reader: &mut R, n: i64) -> Result<Vec<u8>, TransportError>
where
    R: AsyncRead + Unpin,
{
    if n < 0 {
        return Err(TransportError::InvalidSize(n));
    }
    let n = n as usize;
    if n == 0 {
        return Ok(Vec::new());
    }

    let mut buf = vec![0u8; n];
    let mut filled = 0;
    while filled < n {
        let read = reader.read(&mut buf[filled..]).await?;
        if read == 0 {
            return Err(TransportError::ClosedEarly { expected: n, got: filled });
        }
        filled += read;
    }
    Ok(buf)
}

/// Read a `_binary_size` field out of a decoded JSON-RPC `result`, returning
/// `None` when the field is absent (no binary tail advertised).
pub fn binary_size_of(result: &serde_json::Value) -> Option<i64> {
    result.get("_binary_size").and_then(serde_json::Value::as_i64)
}
