//! HTTP Protocol.
mod status;
mod version;
mod request;
mod response;

pub mod headers;

pub use status::{StatusCode, UNKNOWN_REASON};
pub use version::Version;
pub use headers::{HeaderField, HeaderMap, HeaderMatch};
pub use request::{Request, RequestHead, Span};
pub use response::Response;
