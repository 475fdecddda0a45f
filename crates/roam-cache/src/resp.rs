//! Frame codec for the backend wire protocol.
//!
//! The backend speaks a RESP-style protocol: requests are arrays of bulk
//! strings, replies are simple strings, errors, integers, bulk strings,
//! nulls, or arrays. The codec is symmetric so the same type drives both the
//! client side and the in-process mock backend used in tests, each wrapping a
//! `TcpStream` in a `Framed`.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::CacheError;

/// Upper bound on a declared bulk payload length (512 MiB, the backend's own
/// limit). Larger declarations are corrupt frames, not data to wait for.
const MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Upper bound on a declared array element count. Requests and replies are
/// small command/key arrays; anything near this is a corrupt frame.
const MAX_ARRAY_LEN: usize = 1024 * 1024;

/// A single protocol frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// `+OK\r\n`
    Simple(String),
    /// `-ERR message\r\n`
    Error(String),
    /// `:42\r\n`
    Integer(i64),
    /// `$5\r\nhello\r\n` (binary safe)
    Bulk(Bytes),
    /// `$-1\r\n` / `*-1\r\n`
    Null,
    /// `*2\r\n...` (elements may nest)
    Array(Vec<RespValue>),
}

impl RespValue {
    /// Bulk frame from raw bytes.
    pub fn bulk(data: impl Into<Bytes>) -> Self {
        RespValue::Bulk(data.into())
    }

    /// Request frame: an array of bulk strings.
    pub fn command(parts: &[&[u8]]) -> Self {
        RespValue::Array(
            parts
                .iter()
                .map(|part| RespValue::Bulk(Bytes::copy_from_slice(part)))
                .collect(),
        )
    }

    /// Payload of a bulk frame, if this is one.
    pub fn as_bulk(&self) -> Option<&Bytes> {
        match self {
            RespValue::Bulk(data) => Some(data),
            _ => None,
        }
    }
}

/// Symmetric encoder/decoder for [`RespValue`] frames.
#[derive(Debug, Default)]
pub struct RespCodec;

impl Decoder for RespCodec {
    type Item = RespValue;
    type Error = CacheError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<RespValue>, CacheError> {
        match parse_frame(src, 0)? {
            Some((frame, consumed)) => {
                src.advance(consumed);
                Ok(Some(frame))
            }
            None => Ok(None),
        }
    }
}

impl Encoder<RespValue> for RespCodec {
    type Error = CacheError;

    fn encode(&mut self, frame: RespValue, dst: &mut BytesMut) -> Result<(), CacheError> {
        write_frame(&frame, dst);
        Ok(())
    }
}

/// Parse one frame starting at `at`. Returns the frame and the offset just
/// past it, or `None` when the buffer does not yet hold a complete frame.
fn parse_frame(src: &[u8], at: usize) -> Result<Option<(RespValue, usize)>, CacheError> {
    if at >= src.len() {
        return Ok(None);
    }
    let marker = src[at];
    let Some(line_end) = find_crlf(src, at + 1) else {
        return Ok(None);
    };
    let line = &src[at + 1..line_end];
    let after_line = line_end + 2;

    match marker {
        b'+' => Ok(Some((RespValue::Simple(line_text(line)?), after_line))),
        b'-' => Ok(Some((RespValue::Error(line_text(line)?), after_line))),
        b':' => Ok(Some((RespValue::Integer(line_integer(line)?), after_line))),
        b'$' => {
            let declared = line_integer(line)?;
            if declared < 0 {
                return Ok(Some((RespValue::Null, after_line)));
            }
            let len = declared as usize;
            if len > MAX_BULK_LEN {
                return Err(CacheError::Protocol(format!(
                    "declared bulk length {len} exceeds limit {MAX_BULK_LEN}"
                )));
            }
            let end = after_line + len;
            if src.len() < end + 2 {
                return Ok(None);
            }
            if &src[end..end + 2] != b"\r\n" {
                return Err(CacheError::Protocol(
                    "bulk payload not terminated by CRLF".to_string(),
                ));
            }
            let data = Bytes::copy_from_slice(&src[after_line..end]);
            Ok(Some((RespValue::Bulk(data), end + 2)))
        }
        b'*' => {
            let declared = line_integer(line)?;
            if declared < 0 {
                return Ok(Some((RespValue::Null, after_line)));
            }
            let len = declared as usize;
            if len > MAX_ARRAY_LEN {
                return Err(CacheError::Protocol(format!(
                    "declared array length {len} exceeds limit {MAX_ARRAY_LEN}"
                )));
            }
            let mut items = Vec::with_capacity(len);
            let mut pos = after_line;
            for _ in 0..len {
                match parse_frame(src, pos)? {
                    Some((item, next)) => {
                        items.push(item);
                        pos = next;
                    }
                    None => return Ok(None),
                }
            }
            Ok(Some((RespValue::Array(items), pos)))
        }
        other => Err(CacheError::Protocol(format!(
            "unexpected frame marker 0x{other:02x}"
        ))),
    }
}

fn write_frame(frame: &RespValue, dst: &mut BytesMut) {
    match frame {
        RespValue::Simple(text) => {
            dst.put_u8(b'+');
            dst.extend_from_slice(text.as_bytes());
            dst.extend_from_slice(b"\r\n");
        }
        RespValue::Error(message) => {
            dst.put_u8(b'-');
            dst.extend_from_slice(message.as_bytes());
            dst.extend_from_slice(b"\r\n");
        }
        RespValue::Integer(value) => {
            dst.extend_from_slice(format!(":{value}\r\n").as_bytes());
        }
        RespValue::Bulk(data) => {
            dst.extend_from_slice(format!("${}\r\n", data.len()).as_bytes());
            dst.extend_from_slice(data);
            dst.extend_from_slice(b"\r\n");
        }
        RespValue::Null => {
            dst.extend_from_slice(b"$-1\r\n");
        }
        RespValue::Array(items) => {
            dst.extend_from_slice(format!("*{}\r\n", items.len()).as_bytes());
            for item in items {
                write_frame(item, dst);
            }
        }
    }
}

fn find_crlf(src: &[u8], from: usize) -> Option<usize> {
    src[from..]
        .windows(2)
        .position(|window| window == b"\r\n")
        .map(|offset| from + offset)
}

fn line_text(line: &[u8]) -> Result<String, CacheError> {
    std::str::from_utf8(line)
        .map(|text| text.to_string())
        .map_err(|_| CacheError::Protocol("frame line is not valid utf-8".to_string()))
}

fn line_integer(line: &[u8]) -> Result<i64, CacheError> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|text| text.parse().ok())
        .ok_or_else(|| CacheError::Protocol("frame line is not a valid integer".to_string()))
}
