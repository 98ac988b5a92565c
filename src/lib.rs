//! Arena backed HTTP/1.1 Server
//!
//! Every connection owns a fixed size [`Arena`][arena::Arena]. The request bytes, the framed
//! request head and the serialized response all live in it, and it is reset after each
//! response. Bytes of pipelined requests read past the current one are carried over the reset.
#![warn(missing_debug_implementations)]

mod log;

pub mod common;
pub mod arena;
pub mod http;
pub mod h1;

pub mod codec;
pub mod encoding;
pub mod config;
pub mod service;
pub mod server;

pub use config::Config;
pub use service::HttpService;
pub use server::Server;
