//! HTTP Request view.
use std::ops::Range;

use super::headers::{CONNECTION, HeaderMatch};

/// Byte range into the connection buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    /// Create span of `start..end`.
    #[inline]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Span of a sub slice of `base`, `sub` must be derived from `base`.
    #[inline]
    pub(crate) fn within(base: &[u8], sub: &[u8]) -> Self {
        let start = sub.as_ptr() as usize - base.as_ptr() as usize;
        Self::new(start, start + sub.len())
    }

    /// Returns span length.
    #[inline]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` if span is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns span as range.
    #[inline]
    pub const fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    #[inline]
    fn slice<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        &bytes[self.range()]
    }
}

/// Parsed request head, as spans into the bytes it was parsed from.
///
/// The head owns no request bytes, so it can be kept and reused across arena resets, it only
/// means something together with the buffer it was parsed from.
#[derive(Debug, Clone, Default)]
pub struct RequestHead {
    pub(crate) method: Span,
    pub(crate) url: Span,
    pub(crate) version: Span,
    pub(crate) headers: Vec<(Span, Span)>,
    pub(crate) matching: HeaderMatch,
}

impl RequestHead {
    /// Create empty head with room for `max_headers` fields.
    pub fn with_capacity(max_headers: usize, matching: HeaderMatch) -> Self {
        Self {
            method: Span::default(),
            url: Span::default(),
            version: Span::default(),
            headers: Vec::with_capacity(max_headers),
            matching,
        }
    }

    /// Number of header fields.
    #[inline]
    pub fn header_count(&self) -> usize {
        self.headers.len()
    }

    /// Returns value span of the last header named `name`.
    pub(crate) fn find(&self, bytes: &[u8], name: &str) -> Option<Span> {
        self.headers
            .iter()
            .rev()
            .find(|(key, _)| self.matching.matches(key.slice(bytes), name.as_bytes()))
            .map(|(_, value)| *value)
    }

    pub(crate) fn clear(&mut self) {
        self.method = Span::default();
        self.url = Span::default();
        self.version = Span::default();
        self.headers.clear();
    }
}

/// Framed HTTP Request.
///
/// All accessors return views into the connection buffer, the request cannot outlive the
/// arena generation it was framed in.
#[derive(Clone, Copy)]
pub struct Request<'a> {
    bytes: &'a [u8],
    head: &'a RequestHead,
    body: Span,
}

impl<'a> Request<'a> {
    /// Create request view over `bytes` parsed as `head` with body at `body`.
    #[inline]
    pub fn new(bytes: &'a [u8], head: &'a RequestHead, body: Span) -> Self {
        Self { bytes, head, body }
    }

    /// Returns request method, e.g: `b"GET"`.
    #[inline]
    pub fn method(&self) -> &'a [u8] {
        self.head.method.slice(self.bytes)
    }

    /// Returns request target as sent by the client.
    #[inline]
    pub fn url(&self) -> &'a [u8] {
        self.head.url.slice(self.bytes)
    }

    /// Returns the version token of the request line, e.g: `b"HTTP/1.1"`.
    #[inline]
    pub fn version(&self) -> &'a [u8] {
        self.head.version.slice(self.bytes)
    }

    /// Returns message body.
    #[inline]
    pub fn body(&self) -> &'a [u8] {
        self.body.slice(self.bytes)
    }

    /// Returns the value of the last header named `name`.
    pub fn header(&self, name: &str) -> Option<&'a [u8]> {
        self.head
            .find(self.bytes, name)
            .map(|span| span.slice(self.bytes))
    }

    /// Iterate header fields in arrival order.
    pub fn headers(&self) -> impl Iterator<Item = (&'a [u8], &'a [u8])> + 'a {
        let bytes = self.bytes;
        self.head
            .headers
            .iter()
            .map(move |(key, value)| (key.slice(bytes), value.slice(bytes)))
    }

    /// Returns `true` if the client asked to close the connection after this request.
    ///
    /// The `close` value is compared with the same [`HeaderMatch`] as header names.
    pub fn is_close(&self) -> bool {
        self.header(CONNECTION)
            .is_some_and(|value| self.head.matching.matches(value, b"close"))
    }
}

impl std::fmt::Debug for Request<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &String::from_utf8_lossy(self.method()))
            .field("url", &String::from_utf8_lossy(self.url()))
            .field("version", &String::from_utf8_lossy(self.version()))
            .field("headers", &self.head.headers.len())
            .field("body", &self.body.len())
            .finish()
    }
}
