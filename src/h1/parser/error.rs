/// HTTP/1.1 request head parsing error.
///
/// Every variant means the request is malformed and the connection can not find the next
/// message boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Request line is not exactly three space separated tokens.
    InvalidRequestLine,
    /// Header line without `:` separator.
    InvalidHeader,
    /// More header fields than configured.
    TooManyHeaders,
    /// `Content-Length` is not a decimal number.
    InvalidContentLength,
    /// Header terminator not found within the configured size.
    HeadTooLarge,
}

impl std::error::Error for ParseError {}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::InvalidRequestLine => f.write_str("invalid request line"),
            Self::InvalidHeader => f.write_str("invalid header"),
            Self::TooManyHeaders => f.write_str("too many headers"),
            Self::InvalidContentLength => f.write_str("invalid content length"),
            Self::HeadTooLarge => f.write_str("request head too large"),
        }
    }
}
