//! TCP keepalive tuning
//!
//! The OS default waits roughly two hours of idle time before probing a
//! connection. Database connections sitting behind NAT gateways and load
//! balancers die silently much sooner, so every timeout-enabled dial applies a
//! fixed, aggressive profile: first probe after 30 s idle, then a probe every
//! 5 s, declaring the peer dead after 6 unanswered probes.

use crate::connection::Conn;
use crate::metrics::counters;
use crate::{Error, Result};
use socket2::{SockRef, TcpKeepalive};
use std::io;
use std::time::Duration;

/// Idle time before the first keepalive probe (`TCP_KEEPIDLE`)
pub const KEEPALIVE_IDLE: Duration = Duration::from_secs(30);

/// Unanswered probes before the connection is declared dead (`TCP_KEEPCNT`)
pub const KEEPALIVE_PROBES: u32 = 6;

/// Interval between keepalive probes (`TCP_KEEPINTVL`)
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(5);

/// A single TCP-level keepalive option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepaliveParam {
    /// `TCP_KEEPIDLE`
    Idle(Duration),
    /// `TCP_KEEPCNT`
    Probes(u32),
    /// `TCP_KEEPINTVL`
    Interval(Duration),
}

impl KeepaliveParam {
    /// Socket option name, used in errors and metrics
    pub fn option_name(&self) -> &'static str {
        match self {
            Self::Idle(_) => "TCP_KEEPIDLE",
            Self::Probes(_) => "TCP_KEEPCNT",
            Self::Interval(_) => "TCP_KEEPINTVL",
        }
    }

    /// Apply this option alone to the socket behind `socket`
    pub fn apply(&self, socket: SockRef<'_>) -> io::Result<()> {
        // A TcpKeepalive with a single field set only touches that option
        let keepalive = match *self {
            Self::Idle(time) => TcpKeepalive::new().with_time(time),
            Self::Probes(count) => TcpKeepalive::new().with_retries(count),
            Self::Interval(interval) => TcpKeepalive::new().with_interval(interval),
        };
        socket.set_tcp_keepalive(&keepalive)
    }
}

/// Socket that supports OS keepalive configuration.
///
/// Only TCP connections implement this; [`Conn::as_keepalive`] returns it.
pub trait KeepaliveSocket {
    /// Enable or disable `SO_KEEPALIVE`
    fn set_keepalive(&self, enabled: bool) -> io::Result<()>;

    /// Set one TCP keepalive option
    fn set_keepalive_param(&self, param: KeepaliveParam) -> io::Result<()>;
}

/// The fixed tuning sequence, in the order it is applied
pub const KEEPALIVE_PROFILE: [KeepaliveParam; 3] = [
    KeepaliveParam::Idle(KEEPALIVE_IDLE),
    KeepaliveParam::Probes(KEEPALIVE_PROBES),
    KeepaliveParam::Interval(KEEPALIVE_INTERVAL),
];

/// Enable keepalive on `conn` and apply [`KEEPALIVE_PROFILE`].
///
/// Fails with [`Error::UnexpectedConnectionType`] when `conn` is not a TCP
/// connection, and with [`Error::SocketOption`] naming the first option the
/// OS rejected. Later options are not attempted after a failure.
pub fn tune_keepalive<C: Conn>(conn: &C) -> Result<()> {
    let socket = conn.as_keepalive().ok_or_else(|| {
        counters::keepalive_failed("type");
        Error::UnexpectedConnectionType(std::any::type_name::<C>().to_string())
    })?;

    socket.set_keepalive(true).map_err(|source| {
        counters::keepalive_failed("SO_KEEPALIVE");
        Error::SocketOption {
            op: "SO_KEEPALIVE",
            source,
        }
    })?;

    for param in KEEPALIVE_PROFILE {
        socket.set_keepalive_param(param).map_err(|source| {
            counters::keepalive_failed(param.option_name());
            Error::SocketOption {
                op: param.option_name(),
                source,
            }
        })?;
    }

    tracing::debug!(
        idle_secs = KEEPALIVE_IDLE.as_secs(),
        probes = KEEPALIVE_PROBES,
        interval_secs = KEEPALIVE_INTERVAL.as_secs(),
        "tcp keepalive tuned"
    );
    Ok(())
}
