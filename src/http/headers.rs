//! Header fields.
//!
//! Request headers are never copied: they live as spans in the request head, see
//! [`Request`][crate::http::Request]. Response headers are owned by [`HeaderMap`] since they
//! are produced by the handler after the request is framed.
use bytes::Bytes;

/// `Accept-Encoding`
pub const ACCEPT_ENCODING: &str = "Accept-Encoding";
/// `Connection`
pub const CONNECTION: &str = "Connection";
/// `Content-Encoding`
pub const CONTENT_ENCODING: &str = "Content-Encoding";
/// `Content-Length`
pub const CONTENT_LENGTH: &str = "Content-Length";
/// `Content-Type`
pub const CONTENT_TYPE: &str = "Content-Type";
/// `User-Agent`
pub const USER_AGENT: &str = "User-Agent";

/// How header names are compared on lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderMatch {
    /// ASCII case insensitive comparison, as HTTP defines field names.
    #[default]
    IgnoreCase,
    /// Byte for byte comparison.
    Exact,
}

impl HeaderMatch {
    /// Returns `true` if `name` matches `target` under this mode.
    #[inline]
    pub fn matches(self, name: &[u8], target: &[u8]) -> bool {
        match self {
            Self::IgnoreCase => name.eq_ignore_ascii_case(target),
            Self::Exact => name == target,
        }
    }
}

/// Single header field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderField {
    name: Bytes,
    value: Bytes,
}

impl HeaderField {
    /// Create new header field.
    pub fn new(name: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Returns header name.
    #[inline]
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    /// Returns header value.
    #[inline]
    pub fn value(&self) -> &[u8] {
        &self.value
    }
}

/// Insertion ordered response header collection.
///
/// Duplicates are kept, lookups by name return the last matching field. Names are compared
/// case insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    fields: Vec<HeaderField>,
}

impl HeaderMap {
    /// Create new empty [`HeaderMap`].
    #[inline]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Create new empty [`HeaderMap`] with at least the specified capacity.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of fields.
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if there is no fields.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the value of the last field named `name`.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.fields
            .iter()
            .rev()
            .find(|field| HeaderMatch::IgnoreCase.matches(&field.name, name.as_bytes()))
            .map(HeaderField::value)
    }

    /// Returns `true` if any field is named `name`.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Append a field at the end, existing fields with the same name are kept.
    pub fn append(&mut self, name: impl Into<Bytes>, value: impl Into<Bytes>) {
        self.fields.push(HeaderField::new(name, value));
    }

    /// Replace every field named `name` with a single one holding `value`.
    ///
    /// The field keeps the position of the first match, or is appended if there was none.
    pub fn insert(&mut self, name: &'static str, value: impl Into<Bytes>) {
        let value = value.into();
        let mut found = false;
        self.fields.retain_mut(|field| {
            if !HeaderMatch::IgnoreCase.matches(&field.name, name.as_bytes()) {
                return true;
            }
            if found {
                return false;
            }
            found = true;
            field.value = value.clone();
            true
        });
        if !found {
            self.append(name, value);
        }
    }

    /// Remove every field named `name`, returns `true` if any was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let len = self.fields.len();
        self.fields
            .retain(|field| !HeaderMatch::IgnoreCase.matches(&field.name, name.as_bytes()));
        len != self.fields.len()
    }

    /// Iterate fields in insertion order.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, HeaderField> {
        self.fields.iter()
    }

    /// Remove all fields, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.fields.clear();
    }
}

impl<'a> IntoIterator for &'a HeaderMap {
    type Item = &'a HeaderField;

    type IntoIter = std::slice::Iter<'a, HeaderField>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
