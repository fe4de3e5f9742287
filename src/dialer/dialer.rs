//! Timeout-aware dialer

use super::connector::{Connector, NetConnector};
use super::keepalive::{tune_keepalive, KeepaliveSocket};
use crate::config::DialerConfig;
use crate::connection::{Addr, Conn, DeadlineConn};
use crate::metrics::{counters, labels};
use crate::{Error, Result};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::Instrument;

/// Dials raw connections and decorates them with read/write deadlines.
///
/// When neither timeout is configured the connector's connection is returned
/// untouched. Otherwise the connection is wrapped in a [`DeadlineConn`]; on the
/// [`Dialer::dial`] path TCP keepalive is tuned first.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> pq_timeouts::Result<()> {
/// use pq_timeouts::{Conn, DialerConfig, Dialer};
/// use std::time::Duration;
///
/// let config = DialerConfig::builder()
///     .read_timeout(Duration::from_secs(30))
///     .write_timeout(Duration::from_secs(10))
///     .build();
/// let dialer = Dialer::new(&config);
///
/// let mut conn = dialer.dial("tcp", "localhost:5432").await.map_err(|e| e.into_error())?;
/// conn.write(b"...").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Dialer<K = NetConnector> {
    connector: K,
    read_timeout: Duration,
    write_timeout: Duration,
    tune_keepalive_on_dial_timeout: bool,
}

impl Dialer<NetConnector> {
    /// Dialer over real TCP and Unix sockets
    pub fn new(config: &DialerConfig) -> Self {
        Self::with_connector(NetConnector, config)
    }
}

impl<K: Connector> Dialer<K> {
    /// Dialer over a custom connector
    pub fn with_connector(connector: K, config: &DialerConfig) -> Self {
        Self {
            connector,
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
            tune_keepalive_on_dial_timeout: config.tune_keepalive_on_dial_timeout,
        }
    }

    /// Read timeout applied to every connection this dialer decorates
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Write timeout applied to every connection this dialer decorates
    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    /// Whether dialed connections get wrapped in a [`DeadlineConn`]
    pub fn timeouts_enabled(&self) -> bool {
        !self.read_timeout.is_zero() || !self.write_timeout.is_zero()
    }

    /// Connect to `address` over `network`.
    ///
    /// If keepalive tuning fails the connection is still open; it is handed
    /// back inside the [`DialError`] so the caller can decide whether an
    /// untuned connection is acceptable.
    pub async fn dial(&self, network: &str, address: &str) -> DialResult<K::Conn> {
        let span = tracing::debug_span!("dial", network = %network, address = %address);
        self.dial_inner(network, address).instrument(span).await
    }

    /// Connect to `address` over `network`, giving up after `timeout`.
    ///
    /// Unlike [`Dialer::dial`], keepalive is not tuned on this path unless
    /// [`DialerConfig::tune_keepalive_on_dial_timeout`] is set.
    pub async fn dial_timeout(
        &self,
        network: &str,
        address: &str,
        timeout: Duration,
    ) -> DialResult<K::Conn> {
        let span = tracing::debug_span!(
            "dial_timeout",
            network = %network,
            address = %address,
            timeout_ms = millis(timeout)
        );
        self.dial_timeout_inner(network, address, timeout)
            .instrument(span)
            .await
    }

    async fn dial_inner(&self, network: &str, address: &str) -> DialResult<K::Conn> {
        let connected = self.connector.connect(network, address).await;
        let conn = self.record(labels::PATH_DIAL, connected)?;

        if !self.timeouts_enabled() {
            counters::dial_completed(labels::PATH_DIAL, labels::OUTCOME_PLAIN);
            return Ok(Dialed::Plain(conn));
        }

        self.decorate(labels::PATH_DIAL, conn, true)
    }

    async fn dial_timeout_inner(
        &self,
        network: &str,
        address: &str,
        timeout: Duration,
    ) -> DialResult<K::Conn> {
        let connected = self
            .connector
            .connect_timeout(network, address, timeout)
            .await;
        let conn = self.record(labels::PATH_DIAL_TIMEOUT, connected)?;

        if !self.timeouts_enabled() {
            counters::dial_completed(labels::PATH_DIAL_TIMEOUT, labels::OUTCOME_PLAIN);
            return Ok(Dialed::Plain(conn));
        }

        self.decorate(
            labels::PATH_DIAL_TIMEOUT,
            conn,
            self.tune_keepalive_on_dial_timeout,
        )
    }

    fn record(&self, path: &'static str, connected: Result<K::Conn>) -> Result<K::Conn> {
        if let Err(e) = &connected {
            tracing::debug!("connect failed: {}", e);
            counters::dial_completed(path, labels::OUTCOME_CONNECT_ERROR);
        }
        connected
    }

    fn decorate(&self, path: &'static str, conn: K::Conn, tune: bool) -> DialResult<K::Conn> {
        if tune {
            if let Err(error) = tune_keepalive(&conn) {
                tracing::warn!("keepalive tuning failed: {}", error);
                counters::dial_completed(path, labels::OUTCOME_TUNING_ERROR);
                return Err(DialError::with_conn(conn, error));
            }
        }

        tracing::debug!(
            read_timeout_ms = millis(self.read_timeout),
            write_timeout_ms = millis(self.write_timeout),
            "connection wrapped with deadlines"
        );
        counters::dial_completed(path, labels::OUTCOME_DEADLINE);
        Ok(Dialed::Deadline(DeadlineConn::new(
            conn,
            self.read_timeout,
            self.write_timeout,
        )))
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Result of a dial
pub type DialResult<C> = std::result::Result<Dialed<C>, DialError<C>>;

/// Connection returned by a [`Dialer`]
#[derive(Debug)]
pub enum Dialed<C> {
    /// The connector's connection, untouched (no timeouts configured)
    Plain(C),
    /// The connection wrapped with read/write deadlines
    Deadline(DeadlineConn<C>),
}

impl<C: Conn> Dialed<C> {
    /// Whether the connection is wrapped with deadlines
    pub fn is_deadline(&self) -> bool {
        matches!(self, Dialed::Deadline(_))
    }

    /// The deadline wrapper, if any
    pub fn as_deadline(&self) -> Option<&DeadlineConn<C>> {
        match self {
            Dialed::Deadline(conn) => Some(conn),
            Dialed::Plain(_) => None,
        }
    }
}

impl<C: Conn> Conn for Dialed<C> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self {
            Dialed::Plain(conn) => conn.read(buf).await,
            Dialed::Deadline(conn) => conn.read(buf).await,
        }
    }

    async fn write(&mut self, buf: &[u8]) -> Result<usize> {
        match self {
            Dialed::Plain(conn) => conn.write(buf).await,
            Dialed::Deadline(conn) => conn.write(buf).await,
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self {
            Dialed::Plain(conn) => conn.close().await,
            Dialed::Deadline(conn) => conn.close().await,
        }
    }

    fn local_addr(&self) -> Option<Addr> {
        match self {
            Dialed::Plain(conn) => conn.local_addr(),
            Dialed::Deadline(conn) => conn.local_addr(),
        }
    }

    fn remote_addr(&self) -> Option<Addr> {
        match self {
            Dialed::Plain(conn) => conn.remote_addr(),
            Dialed::Deadline(conn) => conn.remote_addr(),
        }
    }

    fn set_deadline(&mut self, deadline: Option<Instant>) -> Result<()> {
        match self {
            Dialed::Plain(conn) => conn.set_deadline(deadline),
            Dialed::Deadline(conn) => conn.set_deadline(deadline),
        }
    }

    fn set_read_deadline(&mut self, deadline: Option<Instant>) -> Result<()> {
        match self {
            Dialed::Plain(conn) => conn.set_read_deadline(deadline),
            Dialed::Deadline(conn) => conn.set_read_deadline(deadline),
        }
    }

    fn set_write_deadline(&mut self, deadline: Option<Instant>) -> Result<()> {
        match self {
            Dialed::Plain(conn) => conn.set_write_deadline(deadline),
            Dialed::Deadline(conn) => conn.set_write_deadline(deadline),
        }
    }

    fn as_keepalive(&self) -> Option<&dyn KeepaliveSocket> {
        match self {
            Dialed::Plain(conn) => conn.as_keepalive(),
            Dialed::Deadline(conn) => conn.as_keepalive(),
        }
    }
}

/// Failed dial.
///
/// When the connect itself failed there is no connection. When keepalive
/// tuning failed afterwards, the raw (undecorated, untuned) connection is
/// carried alongside the error.
pub struct DialError<C> {
    conn: Option<C>,
    error: Error,
}

impl<C> DialError<C> {
    fn with_conn(conn: C, error: Error) -> Self {
        Self {
            conn: Some(conn),
            error,
        }
    }

    /// The underlying error
    pub fn error(&self) -> &Error {
        &self.error
    }

    /// The raw connection, if one was established
    pub fn conn(&self) -> Option<&C> {
        self.conn.as_ref()
    }

    /// Split into the raw connection (if any) and the error
    pub fn into_parts(self) -> (Option<C>, Error) {
        (self.conn, self.error)
    }

    /// Discard the connection (if any) and keep the error
    pub fn into_error(self) -> Error {
        self.error
    }
}

impl<C> From<Error> for DialError<C> {
    fn from(error: Error) -> Self {
        Self { conn: None, error }
    }
}

impl<C> fmt::Debug for DialError<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialError")
            .field("conn", &self.conn.as_ref().map(|_| ".."))
            .field("error", &self.error)
            .finish()
    }
}

impl<C> fmt::Display for DialError<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dial failed: {}", self.error)
    }
}

impl<C> std::error::Error for DialError<C> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
