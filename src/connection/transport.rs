//! Transport implementations (TCP vs Unix socket)

use super::conn::{Addr, Conn};
use crate::dialer::{KeepaliveParam, KeepaliveSocket};
use crate::{Error, Result};
use socket2::SockRef;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UnixStream};
use tokio::time::Instant;

/// Run `fut` under an optional absolute deadline
async fn with_deadline<T>(
    deadline: Option<Instant>,
    fut: impl Future<Output = io::Result<T>>,
) -> Result<T> {
    match deadline {
        Some(deadline) => match tokio::time::timeout_at(deadline, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(Error::Io(io::Error::new(
                io::ErrorKind::TimedOut,
                "i/o timeout",
            ))),
        },
        None => Ok(fut.await?),
    }
}

/// TCP connection with emulated deadlines
#[derive(Debug)]
pub struct TcpConn {
    stream: TcpStream,
    read_deadline: Option<Instant>,
    write_deadline: Option<Instant>,
}

impl TcpConn {
    /// Connect to a resolved socket address
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::from_stream(stream))
    }

    /// Wrap an already connected stream
    pub fn from_stream(stream: TcpStream) -> Self {
        Self {
            stream,
            read_deadline: None,
            write_deadline: None,
        }
    }

    /// Underlying tokio stream
    pub fn stream(&self) -> &TcpStream {
        &self.stream
    }
}

impl Conn for TcpConn {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        with_deadline(self.read_deadline, self.stream.read(buf)).await
    }

    async fn write(&mut self, buf: &[u8]) -> Result<usize> {
        with_deadline(self.write_deadline, self.stream.write(buf)).await
    }

    async fn close(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }

    fn local_addr(&self) -> Option<Addr> {
        self.stream.local_addr().ok().map(Addr::Tcp)
    }

    fn remote_addr(&self) -> Option<Addr> {
        self.stream.peer_addr().ok().map(Addr::Tcp)
    }

    fn set_read_deadline(&mut self, deadline: Option<Instant>) -> Result<()> {
        self.read_deadline = deadline;
        Ok(())
    }

    fn set_write_deadline(&mut self, deadline: Option<Instant>) -> Result<()> {
        self.write_deadline = deadline;
        Ok(())
    }

    fn as_keepalive(&self) -> Option<&dyn KeepaliveSocket> {
        Some(self)
    }
}

impl KeepaliveSocket for TcpConn {
    fn set_keepalive(&self, enabled: bool) -> io::Result<()> {
        SockRef::from(&self.stream).set_keepalive(enabled)
    }

    fn set_keepalive_param(&self, param: KeepaliveParam) -> io::Result<()> {
        param.apply(SockRef::from(&self.stream))
    }
}

/// Unix domain socket connection with emulated deadlines
#[derive(Debug)]
pub struct UnixConn {
    stream: UnixStream,
    read_deadline: Option<Instant>,
    write_deadline: Option<Instant>,
}

impl UnixConn {
    /// Connect to the socket at `path`
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let stream = UnixStream::connect(path).await?;
        Ok(Self::from_stream(stream))
    }

    /// Wrap an already connected stream
    pub fn from_stream(stream: UnixStream) -> Self {
        Self {
            stream,
            read_deadline: None,
            write_deadline: None,
        }
    }
}

fn unix_addr(addr: io::Result<tokio::net::unix::SocketAddr>) -> Option<Addr> {
    addr.ok()
        .map(|a| Addr::Unix(a.as_pathname().map(Path::to_path_buf)))
}

impl Conn for UnixConn {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        with_deadline(self.read_deadline, self.stream.read(buf)).await
    }

    async fn write(&mut self, buf: &[u8]) -> Result<usize> {
        with_deadline(self.write_deadline, self.stream.write(buf)).await
    }

    async fn close(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }

    fn local_addr(&self) -> Option<Addr> {
        unix_addr(self.stream.local_addr())
    }

    fn remote_addr(&self) -> Option<Addr> {
        unix_addr(self.stream.peer_addr())
    }

    fn set_read_deadline(&mut self, deadline: Option<Instant>) -> Result<()> {
        self.read_deadline = deadline;
        Ok(())
    }

    fn set_write_deadline(&mut self, deadline: Option<Instant>) -> Result<()> {
        self.write_deadline = deadline;
        Ok(())
    }
}

/// Connection produced by [`crate::dialer::NetConnector`]
#[derive(Debug)]
pub enum NetConn {
    /// TCP socket
    Tcp(TcpConn),
    /// Unix domain socket
    Unix(UnixConn),
}

impl NetConn {
    /// Whether this is a TCP connection
    pub fn is_tcp(&self) -> bool {
        matches!(self, NetConn::Tcp(_))
    }
}

impl Conn for NetConn {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self {
            NetConn::Tcp(conn) => conn.read(buf).await,
            NetConn::Unix(conn) => conn.read(buf).await,
        }
    }

    async fn write(&mut self, buf: &[u8]) -> Result<usize> {
        match self {
            NetConn::Tcp(conn) => conn.write(buf).await,
            NetConn::Unix(conn) => conn.write(buf).await,
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self {
            NetConn::Tcp(conn) => conn.close().await,
            NetConn::Unix(conn) => conn.close().await,
        }
    }

    fn local_addr(&self) -> Option<Addr> {
        match self {
            NetConn::Tcp(conn) => conn.local_addr(),
            NetConn::Unix(conn) => conn.local_addr(),
        }
    }

    fn remote_addr(&self) -> Option<Addr> {
        match self {
            NetConn::Tcp(conn) => conn.remote_addr(),
            NetConn::Unix(conn) => conn.remote_addr(),
        }
    }

    fn set_read_deadline(&mut self, deadline: Option<Instant>) -> Result<()> {
        match self {
            NetConn::Tcp(conn) => conn.set_read_deadline(deadline),
            NetConn::Unix(conn) => conn.set_read_deadline(deadline),
        }
    }

    fn set_write_deadline(&mut self, deadline: Option<Instant>) -> Result<()> {
        match self {
            NetConn::Tcp(conn) => conn.set_write_deadline(deadline),
            NetConn::Unix(conn) => conn.set_write_deadline(deadline),
        }
    }

    fn as_keepalive(&self) -> Option<&dyn KeepaliveSocket> {
        match self {
            NetConn::Tcp(conn) => conn.as_keepalive(),
            NetConn::Unix(_) => None,
        }
    }
}
