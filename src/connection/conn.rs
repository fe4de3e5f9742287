//! Stream connection capability

use crate::dialer::KeepaliveSocket;
use crate::Result;
use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::time::Instant;

/// Address of one end of a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Addr {
    /// TCP endpoint
    Tcp(SocketAddr),
    /// Unix domain socket (unnamed sockets have no path)
    Unix(Option<PathBuf>),
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Addr::Tcp(addr) => write!(f, "{}", addr),
            Addr::Unix(Some(path)) => write!(f, "{}", path.display()),
            Addr::Unix(None) => f.write_str("@"),
        }
    }
}

/// A stream connection with per-direction deadlines.
///
/// This is the capability set a database driver expects from its transport:
/// byte-level read/write, close, address accessors and absolute deadlines.
/// A deadline of `None` means "no deadline". Once a deadline passes, pending
/// and future operations in that direction fail with
/// [`std::io::ErrorKind::TimedOut`] until the deadline is moved or cleared.
///
/// Implementations are driven by a single owner through `&mut self`.
pub trait Conn: Send {
    /// Read into `buf`, returning the number of bytes read (0 at EOF)
    fn read(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<usize>> + Send;

    /// Write from `buf`, returning the number of bytes written
    fn write(&mut self, buf: &[u8]) -> impl Future<Output = Result<usize>> + Send;

    /// Close the connection
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Local address, if known
    fn local_addr(&self) -> Option<Addr>;

    /// Remote address, if known
    fn remote_addr(&self) -> Option<Addr>;

    /// Set both the read and the write deadline
    fn set_deadline(&mut self, deadline: Option<Instant>) -> Result<()> {
        self.set_read_deadline(deadline)?;
        self.set_write_deadline(deadline)
    }

    /// Set the read deadline
    fn set_read_deadline(&mut self, deadline: Option<Instant>) -> Result<()>;

    /// Set the write deadline
    fn set_write_deadline(&mut self, deadline: Option<Instant>) -> Result<()>;

    /// Keepalive capability, implemented only by TCP connections
    fn as_keepalive(&self) -> Option<&dyn KeepaliveSocket> {
        None
    }
}
