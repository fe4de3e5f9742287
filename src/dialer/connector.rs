//! Connection establishment

use crate::connection::{Conn, NetConn, TcpConn, UnixConn};
use crate::{Error, Result};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

/// Establishes raw connections, with and without an overall timeout.
///
/// [`crate::Dialer`] is generic over this trait so tests can substitute an
/// in-memory connector for the real network.
pub trait Connector: Send + Sync {
    /// Connection type produced
    type Conn: Conn;

    /// Connect to `address` over `network`
    fn connect(
        &self,
        network: &str,
        address: &str,
    ) -> impl Future<Output = Result<Self::Conn>> + Send;

    /// Connect to `address` over `network`, giving up after `timeout`
    fn connect_timeout(
        &self,
        network: &str,
        address: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<Self::Conn>> + Send;
}

/// Supported network kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    /// TCP over IPv4 or IPv6
    Tcp,
    /// TCP over IPv4 only
    Tcp4,
    /// TCP over IPv6 only
    Tcp6,
    /// Unix domain socket; the address is a filesystem path
    Unix,
}

impl Network {
    fn accepts(&self, addr: &SocketAddr) -> bool {
        match self {
            Network::Tcp4 => addr.is_ipv4(),
            Network::Tcp6 => addr.is_ipv6(),
            Network::Tcp | Network::Unix => true,
        }
    }
}

impl std::str::FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Self::Tcp),
            "tcp4" => Ok(Self::Tcp4),
            "tcp6" => Ok(Self::Tcp6),
            "unix" => Ok(Self::Unix),
            _ => Err(Error::Config(format!(
                "unsupported network '{}': expected tcp, tcp4, tcp6, or unix",
                s
            ))),
        }
    }
}

/// Connector for real TCP and Unix sockets
#[derive(Debug, Clone, Copy, Default)]
pub struct NetConnector;

impl NetConnector {
    async fn dial(network: Network, address: &str) -> Result<NetConn> {
        if network == Network::Unix {
            return Ok(NetConn::Unix(UnixConn::connect(address).await?));
        }

        // Try each resolved address of the requested family in turn
        let mut last_err = None;
        for addr in tokio::net::lookup_host(address).await? {
            if !network.accepts(&addr) {
                continue;
            }
            match TcpConn::connect(addr).await {
                Ok(conn) => return Ok(NetConn::Tcp(conn)),
                Err(e) => {
                    tracing::debug!("connect to {} failed: {}", addr, e);
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("no suitable address found for {}", address),
            ))
        }))
    }
}

impl Connector for NetConnector {
    type Conn = NetConn;

    async fn connect(&self, network: &str, address: &str) -> Result<NetConn> {
        let network = network.parse()?;
        Self::dial(network, address).await
    }

    async fn connect_timeout(
        &self,
        network: &str,
        address: &str,
        timeout: Duration,
    ) -> Result<NetConn> {
        let network = network.parse()?;
        match tokio::time::timeout(timeout, Self::dial(network, address)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Io(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("connect to {} timed out after {:?}", address, timeout),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_parse_network() {
        assert_eq!("tcp".parse::<Network>().unwrap(), Network::Tcp);
        assert_eq!("tcp4".parse::<Network>().unwrap(), Network::Tcp4);
        assert_eq!("tcp6".parse::<Network>().unwrap(), Network::Tcp6);
        assert_eq!("unix".parse::<Network>().unwrap(), Network::Unix);
    }

    #[test]
    fn test_parse_unsupported_network() {
        let err = "udp".parse::<Network>().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("udp"));
    }

    #[test]
    fn test_family_filter() {
        let v4: SocketAddr = "127.0.0.1:5432".parse().unwrap();
        let v6: SocketAddr = "[::1]:5432".parse().unwrap();
        assert!(Network::Tcp4.accepts(&v4));
        assert!(!Network::Tcp4.accepts(&v6));
        assert!(Network::Tcp6.accepts(&v6));
        assert!(!Network::Tcp6.accepts(&v4));
        assert!(Network::Tcp.accepts(&v4) && Network::Tcp.accepts(&v6));
    }

    #[tokio::test]
    async fn test_connect_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let conn = assert_ok!(NetConnector.connect("tcp", &address).await);
        assert!(conn.is_tcp());
    }

    #[tokio::test]
    async fn test_connect_tcp6_skips_ipv4_addresses() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let err = assert_err!(NetConnector.connect("tcp6", &address).await);
        match err {
            Error::Io(e) => assert_eq!(e.kind(), io::ErrorKind::AddrNotAvailable),
            other => panic!("expected io error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connect_timeout_success() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let conn = assert_ok!(
            NetConnector
                .connect_timeout("tcp4", &address, Duration::from_secs(5))
                .await
        );
        assert!(conn.is_tcp());
    }

    #[tokio::test]
    async fn test_connect_unsupported_network() {
        let err = assert_err!(NetConnector.connect("udp", "127.0.0.1:1").await);
        assert!(matches!(err, Error::Config(_)));
    }
}
