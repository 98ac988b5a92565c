use bytes::BytesMut;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;

use crate::arena::{Arena, ArenaError, ByteBuffer};
use crate::common::ParseResult;
use crate::config::Config;
use crate::encoding::Encodings;
use crate::h1::framer::Framer;
use crate::h1::parser::ParseError;
use crate::h1::write::{self, INTERNAL_ERROR_FALLBACK};
use crate::http::headers::{ACCEPT_ENCODING, CONNECTION};
use crate::http::{Response, StatusCode, Version};
use crate::log::{debug, trace, warning};
use crate::service::HttpService;

/// Error that ends a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("request read timed out")]
    ReadTimeout,
    #[error("response write timed out")]
    WriteTimeout,
    #[error("arena error: {0}")]
    Arena(#[from] ArenaError),
}

/// How reading one request ended.
enum Read {
    Complete,
    Closed,
    Malformed(ParseError),
    OutOfSpace(ArenaError),
}

/// HTTP/1.1 connection worker.
///
/// Serves requests in arrival order until the peer closes, a request asks to close, or an error
/// occurs. The arena is owned by the worker and freed with it on every exit path.
pub struct Connection<IO, S> {
    io: IO,
    service: Arc<S>,
    config: Arc<Config>,
    encodings: Arc<Encodings>,
    arena: Arena,
    framer: Framer,
    /// Pipelined bytes read past the current request.
    carry: BytesMut,
    scratch: Box<[u8]>,
}

impl<IO, S> Connection<IO, S>
where
    IO: AsyncRead + AsyncWrite + Unpin + Send,
    S: HttpService,
{
    pub fn new(io: IO, service: Arc<S>, config: Arc<Config>, encodings: Arc<Encodings>) -> Self {
        Self {
            io,
            service,
            arena: Arena::with_capacity(config.arena_capacity),
            framer: Framer::from_config(&config),
            carry: BytesMut::with_capacity(config.carry_capacity),
            scratch: vec![0; config.read_chunk].into_boxed_slice(),
            config,
            encodings,
        }
    }

    /// Serve the connection to completion.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        loop {
            let mut buffer = ByteBuffer::new();

            let read = match self.seed(&mut buffer) {
                Ok(()) => self.read_request(&mut buffer).await?,
                Err(err) => Read::OutOfSpace(err),
            };

            match read {
                Read::Complete => {}
                Read::Closed => return Ok(()),
                Read::Malformed(err) => {
                    warning!("malformed request: {err}");
                    return self.reject(StatusCode::BAD_REQUEST).await;
                }
                Read::OutOfSpace(err) => {
                    warning!("request does not fit the arena: {err}");
                    return self.reject(StatusCode::INTERNAL_SERVER_ERROR).await;
                }
            }

            let close = self.serve(&buffer).await?;

            self.arena.reset();
            self.framer.reset();

            if close {
                debug!("closing connection");
                return Ok(());
            }
        }
    }

    /// Allocate the request buffer, starting with carried bytes.
    fn seed(&mut self, buffer: &mut ByteBuffer) -> Result<(), ArenaError> {
        let capacity = self.config.read_buffer_capacity.max(self.carry.len());
        *buffer = ByteBuffer::with_capacity(&mut self.arena, capacity)?;
        buffer.extend_from_slice(&mut self.arena, &self.carry)?;
        if !self.carry.is_empty() {
            debug!("seeded {} carried bytes", self.carry.len());
        }
        self.carry.clear();
        Ok(())
    }

    async fn read_request(&mut self, buffer: &mut ByteBuffer) -> Result<Read, ConnectionError> {
        let deadline = self.config.read_timeout.map(|timeout| Instant::now() + timeout);

        loop {
            match self.framer.advance(buffer.as_slice(&self.arena)?) {
                ParseResult::Ok(_) => return Ok(Read::Complete),
                ParseResult::Err(err) => return Ok(Read::Malformed(err)),
                ParseResult::Pending => {}
            }

            let read = self.io.read(&mut self.scratch);
            let read = match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, read)
                    .await
                    .map_err(|_| ConnectionError::ReadTimeout)??,
                None => read.await?,
            };
            trace!("read {read} bytes");

            if read == 0 {
                if !buffer.is_empty() {
                    debug!("peer closed with {} unframed bytes", buffer.len());
                }
                return Ok(Read::Closed);
            }

            // the buffer is the arena's only allocation while reading, exact growth stays in
            // place and leaves the rest of the region for the response
            if let Err(err) = buffer.reserve_exact(&mut self.arena, read) {
                return Ok(Read::OutOfSpace(err));
            }
            buffer.extend_from_slice(&mut self.arena, &self.scratch[..read])?;
        }
    }

    /// Call the handler on the framed request and write the response, returns `true` if the
    /// connection should close.
    async fn serve(&mut self, buffer: &ByteBuffer) -> Result<bool, ConnectionError> {
        let mut res = Response::new();

        let close = {
            let bytes = buffer.as_slice(&self.arena)?;
            let Some(request) = self.framer.request(bytes) else {
                return Ok(true);
            };
            debug!(
                "{} {} {}",
                String::from_utf8_lossy(request.method()),
                String::from_utf8_lossy(request.url()),
                String::from_utf8_lossy(request.version()),
            );

            *res.version_mut() = Version::from_bytes(request.version()).unwrap_or_default();

            let close_requested = request.is_close();
            let close = self.service.call(&request, &mut res).await || close_requested;

            if self.config.compression {
                let accept = request.header(ACCEPT_ENCODING);
                if let Err(err) = self.encodings.negotiate(accept, &mut res) {
                    warning!("response encoding failed: {err}");
                    let version = res.version();
                    res = Response::empty(StatusCode::INTERNAL_SERVER_ERROR);
                    *res.version_mut() = version;
                }
            }

            if close_requested {
                res.headers_mut().insert(CONNECTION, "close");
            }

            carry(&mut self.carry, self.config.carry_capacity, self.framer.leftover(bytes));
            close
        };

        let written = self.respond(&res).await?;
        Ok(close || !written)
    }

    /// Respond with a bodyless `status` and end the connection.
    async fn reject(&mut self, status: StatusCode) -> Result<(), ConnectionError> {
        self.arena.reset();
        let mut res = Response::empty(status);
        res.headers_mut().insert(CONNECTION, "close");
        self.respond(&res).await?;
        Ok(())
    }

    /// Serialize and write `res`.
    ///
    /// If the arena can not hold the response, the internal error fallback is written in place
    /// and `false` is returned.
    async fn respond(&mut self, res: &Response) -> Result<bool, ConnectionError> {
        let written = match write::serialize(res, &mut self.arena) {
            Ok(output) => {
                let bytes = output.as_slice(&self.arena)?;
                write_all(&mut self.io, bytes, self.config.write_timeout).await?;
                true
            }
            Err(err @ ArenaError::OutOfSpace { .. }) => {
                warning!("response does not fit the arena: {err}");
                write_all(&mut self.io, INTERNAL_ERROR_FALLBACK, self.config.write_timeout).await?;
                false
            }
            Err(err) => return Err(err.into()),
        };
        Ok(written)
    }
}

/// Copy pipelined bytes out of the arena before it is reset.
fn carry(carry: &mut BytesMut, capacity: usize, leftover: &[u8]) {
    if leftover.is_empty() {
        return;
    }
    let keep = leftover.len().min(capacity.saturating_sub(carry.len()));
    if keep < leftover.len() {
        warning!("pipelined bytes truncated from {} to {keep}", leftover.len());
    }
    carry.extend_from_slice(&leftover[..keep]);
}

async fn write_all<IO>(
    io: &mut IO,
    bytes: &[u8],
    timeout: Option<std::time::Duration>,
) -> Result<(), ConnectionError>
where
    IO: AsyncWrite + Unpin,
{
    let write = async {
        io.write_all(bytes).await?;
        io.flush().await
    };
    match timeout {
        Some(timeout) => tokio::time::timeout(timeout, write)
            .await
            .map_err(|_| ConnectionError::WriteTimeout)??,
        None => write.await?,
    }
    Ok(())
}

impl<IO, S> std::fmt::Debug for Connection<IO, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("arena", &self.arena)
            .field("framer", &self.framer)
            .field("carry", &self.carry.len())
            .finish_non_exhaustive()
    }
}
