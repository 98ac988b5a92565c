//! Accept loop.
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::{Config, ConfigError};
use crate::encoding::Encodings;
use crate::h1::Connection;
use crate::log::{debug, error};
use crate::service::HttpService;

pub use listener::Listener;

/// HTTP/1.1 server, one task per accepted connection.
#[derive(Debug)]
pub struct Server<L, S> {
    listener: L,
    service: Arc<S>,
    config: Arc<Config>,
    encodings: Arc<Encodings>,
}

impl<L, S> Server<L, S> {
    /// Create server with default [`Config`] and `gzip` encoding.
    pub fn new(listener: L, service: S) -> Self {
        Self {
            listener,
            service: Arc::new(service),
            config: Arc::new(Config::default()),
            encodings: Arc::new(Encodings::default()),
        }
    }

    /// Replace the connection configuration.
    pub fn config(mut self, config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        self.config = Arc::new(config);
        Ok(self)
    }

    /// Replace the supported content codings.
    pub fn encodings(mut self, encodings: Encodings) -> Self {
        self.encodings = Arc::new(encodings);
        self
    }
}

impl<L, S> Server<L, S>
where
    L: Listener<Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static>,
    S: HttpService,
{
    /// Accept connections forever.
    ///
    /// Accept errors are logged and the loop continues, connection errors end only that
    /// connection.
    pub async fn run(self) {
        loop {
            let (io, addr) = match std::future::poll_fn(|cx| self.listener.poll_accept(cx)).await {
                Ok(ok) => ok,
                Err(err) => {
                    error!("failed to accept connection: {err}");
                    continue;
                }
            };
            debug!("accepted connection from {addr:?}");

            let conn = Connection::new(
                io,
                Arc::clone(&self.service),
                Arc::clone(&self.config),
                Arc::clone(&self.encodings),
            );

            tokio::spawn(async move {
                if let Err(err) = conn.run().await {
                    error!("connection from {addr:?} ended: {err}");
                }
            });
        }
    }
}

mod listener {
    use std::{io, net::SocketAddr, task::Poll};
    use tokio::net::{TcpListener, TcpStream};

    #[cfg(unix)]
    use tokio::net::{UnixListener, UnixStream};

    /// Source of accepted streams.
    pub trait Listener {
        type Stream;

        type Addr: std::fmt::Debug + Send + 'static;

        fn poll_accept(
            &self,
            cx: &mut std::task::Context,
        ) -> Poll<io::Result<(Self::Stream, Self::Addr)>>;
    }

    impl Listener for TcpListener {
        type Stream = TcpStream;

        type Addr = SocketAddr;

        #[inline]
        fn poll_accept(
            &self,
            cx: &mut std::task::Context,
        ) -> Poll<io::Result<(Self::Stream, Self::Addr)>> {
            TcpListener::poll_accept(self, cx)
        }
    }

    #[cfg(unix)]
    impl Listener for UnixListener {
        type Stream = UnixStream;

        type Addr = tokio::net::unix::SocketAddr;

        #[inline]
        fn poll_accept(
            &self,
            cx: &mut std::task::Context,
        ) -> Poll<io::Result<(Self::Stream, Self::Addr)>> {
            UnixListener::poll_accept(self, cx)
        }
    }
}
