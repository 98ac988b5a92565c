//! HTTP Response
use bytes::Bytes;

use super::headers::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap};
use super::{StatusCode, Version};

/// HTTP Response.
///
/// The serializer writes exactly what is here, it does not compute `Content-Length` itself. Use
/// [`Response::set_body`] or [`Response::set_empty`] to keep the framing headers right.
#[derive(Debug, Default, Clone)]
pub struct Response {
    version: Version,
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// Create `200 OK` response without headers and body.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create response with no body, `Content-Length: 0` is set.
    pub fn empty(status: StatusCode) -> Self {
        let mut response = Self::new();
        response.set_empty(status);
        response
    }

    /// Returns [`Version`].
    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns mutable reference to [`Version`].
    #[inline]
    pub fn version_mut(&mut self) -> &mut Version {
        &mut self.version
    }

    /// Returns [`StatusCode`].
    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns mutable reference to [`StatusCode`].
    #[inline]
    pub fn status_mut(&mut self) -> &mut StatusCode {
        &mut self.status
    }

    /// Returns shared reference to [`HeaderMap`].
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns mutable reference to [`HeaderMap`].
    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns the body bytes.
    #[inline]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Replace the body, framing headers are left as is.
    #[inline]
    pub fn replace_body(&mut self, body: impl Into<Bytes>) -> Bytes {
        std::mem::replace(&mut self.body, body.into())
    }

    /// Set status and `Content-Length: 0`, the body is cleared.
    pub fn set_empty(&mut self, status: StatusCode) {
        self.status = status;
        self.body = Bytes::new();
        self.headers.insert(CONTENT_LENGTH, "0");
    }

    /// Set status, `Content-Type`, `Content-Length` and body.
    pub fn set_body(
        &mut self,
        status: StatusCode,
        content_type: &'static str,
        body: impl Into<Bytes>,
    ) {
        self.status = status;
        self.body = body.into();
        self.headers.insert(CONTENT_TYPE, content_type);
        self.set_content_length();
    }

    /// Set `Content-Length` from the current body length.
    pub fn set_content_length(&mut self) {
        let mut buffer = itoa::Buffer::new();
        let len = buffer.format(self.body.len());
        self.headers
            .insert(CONTENT_LENGTH, Bytes::copy_from_slice(len.as_bytes()));
    }
}
