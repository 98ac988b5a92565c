//! Content codecs.
use bytes::Bytes;
use std::io::{self, Read, Write};

use flate2::Compression;
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::GzEncoder;

/// Compression or decompression failure.
#[derive(Debug, thiserror::Error)]
#[error("codec error: {0}")]
pub struct CodecError(#[from] io::Error);

/// A content coding usable in `Content-Encoding`.
pub trait Codec: Send + Sync + 'static {
    /// Coding token, e.g: `"gzip"`.
    fn name(&self) -> &'static str;

    /// Encode `input`.
    fn compress(&self, input: &[u8]) -> Result<Bytes, CodecError>;

    /// Decode `input`.
    fn decompress(&self, input: &[u8]) -> Result<Bytes, CodecError>;
}

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// `gzip` coding.
///
/// Decompression also accepts zlib wrapped input, told apart by the gzip magic bytes.
#[derive(Debug, Clone, Copy)]
pub struct Gzip {
    level: Compression,
}

impl Gzip {
    /// Create gzip codec with the default compression level.
    #[inline]
    pub fn new() -> Self {
        Self {
            level: Compression::default(),
        }
    }

    /// Create gzip codec with compression `level`, from 0 to 9.
    #[inline]
    pub fn with_level(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }
}

impl Default for Gzip {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for Gzip {
    fn name(&self) -> &'static str {
        "gzip"
    }

    fn compress(&self, input: &[u8]) -> Result<Bytes, CodecError> {
        let mut encoder = GzEncoder::new(Vec::with_capacity(input.len() / 2 + 32), self.level);
        encoder.write_all(input)?;
        Ok(encoder.finish()?.into())
    }

    fn decompress(&self, input: &[u8]) -> Result<Bytes, CodecError> {
        let mut output = Vec::with_capacity(input.len() * 2);
        if input.starts_with(&GZIP_MAGIC) {
            GzDecoder::new(input).read_to_end(&mut output)?;
        } else {
            ZlibDecoder::new(input).read_to_end(&mut output)?;
        }
        Ok(output.into())
    }
}
