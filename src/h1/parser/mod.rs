//! HTTP/1.1 head parser.
//!
//! [`parse_head`] works on a complete head region, the bytes before the `\r\n\r\n` terminator,
//! it is the framer that decides when such region is available. Every parsed token is recorded
//! as a [`Span`] into the region, nothing is copied.
//!
//! [`find_terminator`] searches for the terminator, and is meant to be resumed from where the
//! previous search stopped.
use crate::http::{RequestHead, Span};

mod error;


pub use error::ParseError;

/// Line separator.
pub const CRLF: &[u8] = b"\r\n";

/// Header and body separator.
pub const CRLF_CRLF: &[u8] = b"\r\n\r\n";

/// Find the start of `\r\n\r\n` in `bytes`, searching from `from`.
pub fn find_terminator(bytes: &[u8], from: usize) -> Option<usize> {
    let haystack = bytes.get(from..)?;
    haystack
        .windows(CRLF_CRLF.len())
        .position(|window| window == CRLF_CRLF)
        .map(|pos| from + pos)
}

/// Non empty `\r\n` separated lines.
struct Lines<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let rest = self.rest;
            if rest.is_empty() {
                return None;
            }
            let (line, next) = match rest.windows(CRLF.len()).position(|w| w == CRLF) {
                Some(pos) => (&rest[..pos], &rest[pos + CRLF.len()..]),
                None => (rest, &rest[rest.len()..]),
            };
            self.rest = next;
            if !line.is_empty() {
                return Some(line);
            }
        }
    }
}

/// Parse the head region into `head`.
///
/// `region` must not contain the terminator. The request line is split on single spaces with
/// empty tokens skipped, and must yield exactly method, url and version. Each following line is
/// split on the first `:`, name and value have surrounding whitespace trimmed.
///
/// On error, `head` is left in an unspecified state.
pub fn parse_head(
    region: &[u8],
    head: &mut RequestHead,
    max_headers: usize,
) -> Result<(), ParseError> {
    head.clear();

    let mut lines = Lines { rest: region };
    let reqline = lines.next().ok_or(ParseError::InvalidRequestLine)?;

    let mut tokens = reqline.split(|b| *b == b' ').filter(|t| !t.is_empty());
    let (Some(method), Some(url), Some(version), None) =
        (tokens.next(), tokens.next(), tokens.next(), tokens.next())
    else {
        return Err(ParseError::InvalidRequestLine);
    };

    head.method = Span::within(region, method);
    head.url = Span::within(region, url);
    head.version = Span::within(region, version);

    for line in lines {
        let Some(colon) = line.iter().position(|b| *b == b':') else {
            return Err(ParseError::InvalidHeader);
        };

        let name = line[..colon].trim_ascii();
        let value = line[colon + 1..].trim_ascii();
        if name.is_empty() {
            return Err(ParseError::InvalidHeader);
        }

        if head.headers.len() == max_headers {
            return Err(ParseError::TooManyHeaders);
        }
        head.headers
            .push((Span::within(region, name), Span::within(region, value)));
    }

    Ok(())
}

/// Parse a `Content-Length` value.
pub fn parse_content_length(value: &[u8]) -> Result<usize, ParseError> {
    let value = value.trim_ascii();
    if value.is_empty() {
        return Err(ParseError::InvalidContentLength);
    }

    value.iter().try_fold(0usize, |acc, byte| {
        if !byte.is_ascii_digit() {
            return Err(ParseError::InvalidContentLength);
        }
        acc.checked_mul(10)
            .and_then(|acc| acc.checked_add((byte - b'0') as usize))
            .ok_or(ParseError::InvalidContentLength)
    })
}
