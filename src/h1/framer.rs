//! Request framing.
//!
//! [`Framer`] decides when the bytes accumulated from a connection hold one complete request. It
//! is fed the whole buffer after every read, the buffer only ever grows between calls, and it
//! remembers how far the terminator search went so already scanned bytes are not searched again.
//!
//! ```text
//! ReadingHeaders --(\r\n\r\n found, head parsed)--> AwaitingBody --(len >= body_end)--> Complete
//! ```
//!
//! Both transitions can happen within one [`Framer::advance`] call when a read delivers the head
//! and the whole body at once.
use crate::common::ParseResult;
use crate::config::Config;
use crate::h1::parser::{self, CRLF_CRLF, ParseError};
use crate::http::headers::CONTENT_LENGTH;
use crate::http::{HeaderMatch, Request, RequestHead, Span};

/// Byte boundaries of a framed request within the connection buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Offset right after the `\r\n\r\n` terminator, where the body starts.
    pub header_end: usize,
    /// Offset right after the body, where the next request starts.
    pub body_end: usize,
}

impl Frame {
    /// Body span.
    #[inline]
    pub fn body(&self) -> Span {
        Span::new(self.header_end, self.body_end)
    }
}

/// Framing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Searching for the header terminator.
    ReadingHeaders,
    /// Head parsed, waiting for `body_end` bytes.
    AwaitingBody(Frame),
    /// A full request is available.
    Complete(Frame),
}

/// Incremental request framer.
#[derive(Debug)]
pub struct Framer {
    state: State,
    /// Bytes already searched for the terminator.
    scanned: usize,
    head: RequestHead,
    max_headers: usize,
    max_head_size: usize,
}

impl Framer {
    /// Create framer with the given bounds.
    pub fn new(max_headers: usize, max_head_size: usize, matching: HeaderMatch) -> Self {
        Self {
            state: State::ReadingHeaders,
            scanned: 0,
            head: RequestHead::with_capacity(max_headers, matching),
            max_headers,
            max_head_size,
        }
    }

    /// Create framer with bounds from [`Config`].
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_headers, config.max_head_size, config.header_match)
    }

    /// Returns current state.
    #[inline]
    pub fn state(&self) -> State {
        self.state
    }

    /// Returns the parsed head, meaningful once headers are done.
    #[inline]
    pub fn head(&self) -> &RequestHead {
        &self.head
    }

    /// Re-evaluate framing over `bytes`.
    ///
    /// `bytes` must be the whole connection buffer from the start of the request, with the bytes
    /// of the previous call as its prefix. Returns [`ParseResult::Pending`] until the request is
    /// complete, after which the same [`Frame`] is returned until [`Framer::reset`].
    pub fn advance(&mut self, bytes: &[u8]) -> ParseResult<Frame, ParseError> {
        match self.try_advance(bytes) {
            Ok(Some(frame)) => ParseResult::Ok(frame),
            Ok(None) => ParseResult::Pending,
            Err(err) => ParseResult::Err(err),
        }
    }

    fn try_advance(&mut self, bytes: &[u8]) -> Result<Option<Frame>, ParseError> {
        if let State::ReadingHeaders = self.state {
            // the terminator may straddle the previous and the new bytes
            let from = self.scanned.saturating_sub(CRLF_CRLF.len() - 1);

            let Some(terminator) = parser::find_terminator(bytes, from) else {
                self.scanned = bytes.len();
                if bytes.len() > self.max_head_size {
                    return Err(ParseError::HeadTooLarge);
                }
                return Ok(None);
            };

            if terminator > self.max_head_size {
                return Err(ParseError::HeadTooLarge);
            }

            parser::parse_head(&bytes[..terminator], &mut self.head, self.max_headers)?;

            let header_end = terminator + CRLF_CRLF.len();
            let content_length = match self.head.find(bytes, CONTENT_LENGTH) {
                Some(span) => parser::parse_content_length(&bytes[span.range()])?,
                None => 0,
            };
            let body_end = header_end
                .checked_add(content_length)
                .ok_or(ParseError::InvalidContentLength)?;

            self.scanned = header_end;
            self.state = State::AwaitingBody(Frame { header_end, body_end });
        }

        match self.state {
            State::AwaitingBody(frame) if bytes.len() >= frame.body_end => {
                self.state = State::Complete(frame);
                Ok(Some(frame))
            }
            State::Complete(frame) => Ok(Some(frame)),
            _ => Ok(None),
        }
    }

    /// Returns the framed request, once complete.
    pub fn request<'a>(&'a self, bytes: &'a [u8]) -> Option<Request<'a>> {
        match self.state {
            State::Complete(frame) => Some(Request::new(
                &bytes[..frame.body_end],
                &self.head,
                frame.body(),
            )),
            _ => None,
        }
    }

    /// Returns bytes past the framed request that belong to the next one, once complete.
    pub fn leftover<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        match self.state {
            State::Complete(frame) => &bytes[frame.body_end..],
            _ => &[],
        }
    }

    /// Start framing a new request, the parsed head allocation is kept.
    pub fn reset(&mut self) {
        self.state = State::ReadingHeaders;
        self.scanned = 0;
        self.head.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const GET: &[u8] = b"GET / HTTP/1.1\r\nHost: a\r\n\r\n";

    fn framer() -> Framer {
        Framer::new(16, 1024, HeaderMatch::IgnoreCase)
    }

    fn fields(framer: &Framer, bytes: &[u8]) -> (Vec<u8>, Vec<u8>, Vec<u8>, Vec<(Vec<u8>, Vec<u8>)>) {
        let req = framer.request(bytes).unwrap();
        (
            req.method().to_vec(),
            req.url().to_vec(),
            req.version().to_vec(),
            req.headers().map(|(k, v)| (k.to_vec(), v.to_vec())).collect(),
        )
    }

    #[test]
    fn test_single_chunk() {
        let mut framer = framer();
        assert!(framer.advance(GET).is_ok());
        assert_eq!(framer.state(), State::Complete(Frame { header_end: GET.len(), body_end: GET.len() }));

        let (method, url, version, headers) = fields(&framer, GET);
        assert_eq!(method, b"GET");
        assert_eq!(url, b"/");
        assert_eq!(version, b"HTTP/1.1");
        assert_eq!(headers, [(b"Host".to_vec(), b"a".to_vec())]);
    }

    #[test]
    fn test_split_across_reads() {
        let mut whole = framer();
        assert!(whole.advance(GET).is_ok());
        let expected = fields(&whole, GET);

        for split in 0..GET.len() {
            let mut framer = framer();
            assert!(framer.advance(&GET[..split]).is_pending(), "split at {split}");
            assert!(framer.advance(GET).is_ok(), "split at {split}");
            assert_eq!(fields(&framer, GET), expected, "split at {split}");
        }
    }

    #[test]
    fn test_byte_by_byte() {
        let mut framer = framer();
        for end in 1..GET.len() {
            assert!(framer.advance(&GET[..end]).is_pending());
        }
        assert!(framer.advance(GET).is_ok());
    }

    #[test]
    fn test_content_length_body() {
        let input = b"POST /x HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";

        let mut framer = framer();
        let frame = match framer.advance(input) {
            ParseResult::Ok(frame) => frame,
            other => panic!("expected complete frame, got {other:?}"),
        };
        assert_eq!(frame.body_end, input.len());
        assert_eq!(framer.request(input).unwrap().body(), b"hello");
    }

    #[test]
    fn test_awaits_remaining_body() {
        let input = b"POST /x HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";
        let partial = &input[..input.len() - 2];

        let mut framer = framer();
        assert!(framer.advance(partial).is_pending());
        assert!(matches!(framer.state(), State::AwaitingBody(_)));
        assert!(framer.request(partial).is_none());

        assert!(framer.advance(&input[..input.len() - 1]).is_pending());
        assert!(framer.advance(input).is_ok());
        assert_eq!(framer.request(input).unwrap().body(), b"hello");
    }

    #[test]
    fn test_pipelined_leftover() {
        let mut input = b"POST /a HTTP/1.1\r\nContent-Length: 3\r\n\r\nabc".to_vec();
        input.extend_from_slice(b"GET /b HTTP/1.1\r\nX-Second: yes\r\n\r\n");

        let mut framer = framer();
        assert!(framer.advance(&input).is_ok());
        {
            let req = framer.request(&input).unwrap();
            assert_eq!(req.url(), b"/a");
            assert_eq!(req.body(), b"abc");
            assert_eq!(req.header("X-Second"), None);
        }

        let leftover = framer.leftover(&input).to_vec();
        framer.reset();
        assert!(framer.advance(&leftover).is_ok());

        let req = framer.request(&leftover).unwrap();
        assert_eq!(req.method(), b"GET");
        assert_eq!(req.url(), b"/b");
        assert_eq!(req.body(), b"");
        assert_eq!(req.header("content-length"), None);
        assert_eq!(req.header("x-second"), Some(&b"yes"[..]));
        assert!(framer.leftover(&leftover).is_empty());
    }

    #[test]
    fn test_malformed() {
        let mut request_line = framer();
        assert_eq!(
            request_line.advance(b"GET /\r\n\r\n"),
            ParseResult::Err(ParseError::InvalidRequestLine)
        );

        let mut content_length = framer();
        assert_eq!(
            content_length.advance(b"POST / HTTP/1.1\r\nContent-Length: five\r\n\r\n"),
            ParseResult::Err(ParseError::InvalidContentLength)
        );
    }

    #[test]
    fn test_head_too_large() {
        let mut framer = Framer::new(16, 16, HeaderMatch::IgnoreCase);
        assert!(framer.advance(b"GET / HTTP/1.1\r\n").is_pending());
        assert_eq!(
            framer.advance(b"GET / HTTP/1.1\r\nHost"),
            ParseResult::Err(ParseError::HeadTooLarge)
        );
    }

    #[test]
    fn test_exact_header_match() {
        let input = b"POST / HTTP/1.1\r\ncontent-length: 2\r\n\r\nhi";
        let mut framer = Framer::new(16, 1024, HeaderMatch::Exact);
        let frame = match framer.advance(input) {
            ParseResult::Ok(frame) => frame,
            other => panic!("expected complete frame, got {other:?}"),
        };
        // lowercase name is not recognized, the body is left for the next request
        assert_eq!(frame.body_end, input.len() - 2);
        assert_eq!(framer.leftover(input), b"hi");
    }

    #[test]
    fn test_connection_close_value() {
        let lower = b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n";
        let upper = b"GET / HTTP/1.1\r\nConnection: Close\r\n\r\n";

        for (matching, input, close) in [
            (HeaderMatch::IgnoreCase, &lower[..], true),
            (HeaderMatch::IgnoreCase, &upper[..], true),
            (HeaderMatch::Exact, &lower[..], true),
            (HeaderMatch::Exact, &upper[..], false),
        ] {
            let mut framer = Framer::new(16, 1024, matching);
            assert!(framer.advance(input).is_ok());
            assert_eq!(framer.request(input).unwrap().is_close(), close, "{matching:?}");
        }
    }
}
