//! Per connection bounds and deadlines.
use std::time::Duration;

use crate::http::HeaderMatch;

/// Invalid [`Config`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("`{0}` must be greater than zero")]
    Zero(&'static str),
    #[error("`{field}` ({value}) exceeds arena capacity ({arena})")]
    ExceedsArena {
        field: &'static str,
        value: usize,
        arena: usize,
    },
}

/// Connection configuration.
///
/// Every connection owns one arena of `arena_capacity` bytes, reset after each response. The
/// request buffer, the header region and the serialized response all live in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Size of the per connection arena.
    pub arena_capacity: usize,
    /// Initial capacity of the request buffer.
    pub read_buffer_capacity: usize,
    /// Maximum bytes requested from the socket per read.
    pub read_chunk: usize,
    /// Maximum pipelined bytes carried over to the next request.
    pub carry_capacity: usize,
    /// Maximum number of request header fields.
    pub max_headers: usize,
    /// Maximum size of the request head, terminator excluded.
    pub max_head_size: usize,
    /// Request header name comparison.
    pub header_match: HeaderMatch,
    /// Deadline for one request to be read, `None` waits forever.
    pub read_timeout: Option<Duration>,
    /// Deadline for one response to be written, `None` waits forever.
    pub write_timeout: Option<Duration>,
    /// Negotiate `Content-Encoding`.
    pub compression: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            arena_capacity: 2 * 1024 * 1024,
            read_buffer_capacity: 8 * 1024,
            read_chunk: 4 * 1024,
            carry_capacity: 4 * 1024,
            max_headers: 32,
            max_head_size: 64 * 1024,
            header_match: HeaderMatch::IgnoreCase,
            read_timeout: Some(Duration::from_secs(30)),
            write_timeout: Some(Duration::from_secs(30)),
            compression: true,
        }
    }
}

macro_rules! setter {
    ($($(#[$doc:meta])* $name:ident: $ty:ty;)*) => {
        $(
            $(#[$doc])*
            #[inline]
            pub fn $name(mut self, $name: $ty) -> Self {
                self.$name = $name;
                self
            }
        )*
    };
}

impl Config {
    /// Create default configuration.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    setter! {
        /// Set [`Config::arena_capacity`].
        arena_capacity: usize;
        /// Set [`Config::read_buffer_capacity`].
        read_buffer_capacity: usize;
        /// Set [`Config::read_chunk`].
        read_chunk: usize;
        /// Set [`Config::carry_capacity`].
        carry_capacity: usize;
        /// Set [`Config::max_headers`].
        max_headers: usize;
        /// Set [`Config::max_head_size`].
        max_head_size: usize;
        /// Set [`Config::header_match`].
        header_match: HeaderMatch;
        /// Set [`Config::read_timeout`].
        read_timeout: Option<Duration>;
        /// Set [`Config::write_timeout`].
        write_timeout: Option<Duration>;
        /// Set [`Config::compression`].
        compression: bool;
    }

    /// Check bound combinations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let nonzero = [
            ("arena_capacity", self.arena_capacity),
            ("read_chunk", self.read_chunk),
            ("max_headers", self.max_headers),
            ("max_head_size", self.max_head_size),
        ];
        if let Some(&(field, _)) = nonzero.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Zero(field));
        }

        let bounded = [
            ("read_buffer_capacity", self.read_buffer_capacity),
            ("carry_capacity", self.carry_capacity),
            ("max_head_size", self.max_head_size),
        ];
        if let Some(&(field, value)) = bounded.iter().find(|(_, value)| *value > self.arena_capacity) {
            return Err(ConfigError::ExceedsArena {
                field,
                value,
                arena: self.arena_capacity,
            });
        }

        Ok(())
    }
}
