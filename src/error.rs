//! Error types for pq-timeouts

use std::io;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type
#[derive(Debug, Error)]
pub enum Error {
    /// Operation attempted after the connection handle was released by `close`
    #[error("connection is nil")]
    NilConnection,

    /// The peer reset the connection; the pool must discard it and redial.
    ///
    /// This is the sentinel a connection pool checks for. Match on the variant
    /// (or use [`Error::is_bad_connection`]) rather than on the message.
    #[error("bad connection")]
    BadConnection,

    /// Transport error passed through from the underlying socket
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A keepalive socket option could not be applied
    #[error("setsockopt {op}: {source}")]
    SocketOption {
        /// Name of the socket option that failed
        op: &'static str,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },

    /// Keepalive tuning was attempted on a connection that is not TCP
    #[error("bad conn type: {0}")]
    UnexpectedConnectionType(String),

    /// Invalid configuration (unsupported network, malformed parameter)
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Whether this is the pool's "discard this connection" sentinel
    pub fn is_bad_connection(&self) -> bool {
        matches!(self, Error::BadConnection)
    }

    /// Whether the operation hit a connection that was already closed
    pub fn is_nil_connection(&self) -> bool {
        matches!(self, Error::NilConnection)
    }

    /// Whether this wraps an `ECONNRESET` from the operating system.
    ///
    /// Only the raw OS error counts; an `io::ErrorKind::ConnectionReset`
    /// synthesised by a higher layer is not treated as a socket reset.
    pub fn is_reset_by_peer(&self) -> bool {
        match self {
            Error::Io(err) => err.raw_os_error() == Some(libc::ECONNRESET),
            _ => false,
        }
    }

    /// Whether this is a deadline or connect timeout reported by the transport
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Io(err) => matches!(
                err.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}
