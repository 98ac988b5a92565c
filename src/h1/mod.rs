//! HTTP/1.1 Protocol.
//!
//! - [`parser`] contains HTTP/1.1 head parser.
//! - [`framer`] decides when a complete request is buffered.
//! - [`write`] contains response serialization.
//! - [`connection`] contains the integration of all the components above into single API

pub mod parser;
pub mod framer;
pub mod write;
pub mod connection;

pub use connection::{Connection, ConnectionError};

#[cfg(test)]
mod test;
