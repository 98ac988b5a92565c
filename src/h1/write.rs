//! Response serialization.
use crate::arena::{Arena, ArenaError, ByteBuffer};
use crate::http::Response;

/// Written as is when the arena can not hold the serialized response.
pub const INTERNAL_ERROR_FALLBACK: &[u8] =
    b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

/// Exact length of the serialized response.
pub fn encoded_len(res: &Response) -> usize {
    let status = res.status();
    let status_line = res.version().as_str().len()
        + 1
        + itoa::Buffer::new().format(status.as_u16()).len()
        + 1
        + status.message().len()
        + 2;

    let headers: usize = res
        .headers()
        .iter()
        .map(|field| field.name().len() + 2 + field.value().len() + 2)
        .sum();

    status_line + headers + 2 + res.body().len()
}

/// Serialize response into a buffer allocated from `arena`.
///
/// Renders the status line, each header in insertion order, the blank line and the body. Framing
/// headers are not computed here, a response without `Content-Length` is framed as zero length
/// by the peer.
pub fn serialize(res: &Response, arena: &mut Arena) -> Result<ByteBuffer, ArenaError> {
    let mut buf = ByteBuffer::with_capacity(arena, encoded_len(res))?;
    let mut code = itoa::Buffer::new();

    buf.extend_from_slice(arena, res.version().as_str().as_bytes())?;
    buf.push(arena, b' ')?;
    buf.extend_from_slice(arena, code.format(res.status().as_u16()).as_bytes())?;
    buf.push(arena, b' ')?;
    buf.extend_from_slice(arena, res.status().message().as_bytes())?;
    buf.extend_from_slice(arena, b"\r\n")?;

    for field in res.headers() {
        buf.extend_from_slice(arena, field.name())?;
        buf.extend_from_slice(arena, b": ")?;
        buf.extend_from_slice(arena, field.value())?;
        buf.extend_from_slice(arena, b"\r\n")?;
    }

    buf.extend_from_slice(arena, b"\r\n")?;
    buf.extend_from_slice(arena, res.body())?;

    Ok(buf)
}
