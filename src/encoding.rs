//! `Content-Encoding` negotiation.
//!
//! The client's `Accept-Encoding` list is intersected with the codecs the server supports, in
//! the client's order, and the response body is encoded with every accepted coding in that order.
//! The accepted tokens are joined with `", "` into `Content-Encoding`, which lists codings in the
//! order they were applied.
use std::sync::Arc;

use crate::codec::{Codec, CodecError, Gzip};
use crate::http::Response;
use crate::http::headers::CONTENT_ENCODING;
use crate::log::debug;

/// Supported content codings.
#[derive(Clone)]
pub struct Encodings {
    codecs: Vec<Arc<dyn Codec>>,
}

impl Encodings {
    /// Create empty set, negotiation never encodes.
    #[inline]
    pub fn new() -> Self {
        Self { codecs: Vec::new() }
    }

    /// Add a codec to the supported set.
    pub fn with(mut self, codec: impl Codec) -> Self {
        self.codecs.push(Arc::new(codec));
        self
    }

    /// Returns `true` if no codec is supported.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    /// Supported codecs accepted by an `Accept-Encoding` value, in the client's order.
    pub fn accepted(&self, accept: &[u8]) -> Vec<&dyn Codec> {
        let mut accepted: Vec<&dyn Codec> = Vec::new();

        for token in accept.split(|b| *b == b',').filter_map(coding_token) {
            let Some(codec) = self
                .codecs
                .iter()
                .find(|codec| codec.name().as_bytes().eq_ignore_ascii_case(token))
            else {
                continue;
            };
            if accepted.iter().any(|c| c.name() == codec.name()) {
                continue;
            }
            accepted.push(codec.as_ref());
        }

        accepted
    }

    /// Encode the response body according to `accept`.
    ///
    /// Responses with an empty body, or with `Content-Encoding` already set, are left alone. An
    /// empty body gets no `Content-Encoding` even when a coding is accepted.
    ///
    /// On success returns `true` if the body was encoded, `Content-Encoding` and `Content-Length`
    /// are then set. On error the response is unchanged.
    pub fn negotiate(&self, accept: Option<&[u8]>, res: &mut Response) -> Result<bool, CodecError> {
        let Some(accept) = accept else {
            return Ok(false);
        };
        if res.body().is_empty() || res.headers().contains(CONTENT_ENCODING) {
            return Ok(false);
        }

        let accepted = self.accepted(accept);
        let Some((first, rest)) = accepted.split_first() else {
            return Ok(false);
        };

        let mut body = first.compress(res.body())?;
        for codec in rest {
            body = codec.compress(&body)?;
        }

        let names = accepted.iter().map(|c| c.name()).collect::<Vec<_>>().join(", ");
        debug!("content encoding: {names}");

        res.headers_mut().insert(CONTENT_ENCODING, names);
        res.replace_body(body);
        res.set_content_length();
        Ok(true)
    }
}

impl Default for Encodings {
    /// `gzip` only.
    fn default() -> Self {
        Self::new().with(Gzip::new())
    }
}

impl std::fmt::Debug for Encodings {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_list()
            .entries(self.codecs.iter().map(|c| c.name()))
            .finish()
    }
}

/// Coding token of one list element, `None` if empty or explicitly refused with `q=0`.
fn coding_token(element: &[u8]) -> Option<&[u8]> {
    let mut parts = element.split(|b| *b == b';');
    let token = parts.next()?.trim_ascii();
    if token.is_empty() {
        return None;
    }

    for param in parts {
        let param = param.trim_ascii();
        let Some((name, value)) = param.split_first_chunk::<2>() else {
            continue;
        };
        if name.eq_ignore_ascii_case(b"q=") && is_zero_qvalue(value.trim_ascii()) {
            return None;
        }
    }

    Some(token)
}

fn is_zero_qvalue(value: &[u8]) -> bool {
    match value.split_first() {
        Some((b'0', rest)) => rest.iter().all(|b| matches!(b, b'.' | b'0')),
        _ => false,
    }
}
