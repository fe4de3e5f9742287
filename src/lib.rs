//! Read/write deadlines and keepalive tuning for database client sockets.
//!
//! `pq-timeouts` sits between a database driver and its sockets:
//!
//! * [`Dialer`] establishes connections through a [`Connector`], tunes TCP
//!   keepalive (30 s idle, 5 s interval, 6 probes) and wraps the result in a
//!   [`DeadlineConn`] when read or write timeouts are configured.
//! * [`DeadlineConn`] sets a fresh deadline before every read and write,
//!   clears it afterwards, and reports a reset by the peer as
//!   [`Error::BadConnection`] so the connection pool evicts the socket.
//!
//! The crate does not speak any database protocol, pool connections or retry.
//!
//! ```no_run
//! # async fn example() -> pq_timeouts::Result<()> {
//! use pq_timeouts::{config::extract_timeouts, Conn, Dialer};
//!
//! let (config, conn_str) =
//!     extract_timeouts("postgres://localhost/mydb?read_timeout=5000&write_timeout=5000")?;
//! let dialer = Dialer::new(&config);
//! let mut conn = dialer
//!     .dial("tcp", "localhost:5432")
//!     .await
//!     .map_err(|e| e.into_error())?;
//!
//! let mut buf = [0u8; 1024];
//! match conn.read(&mut buf).await {
//!     Err(e) if e.is_bad_connection() => { /* discard and redial */ }
//!     other => { other?; }
//! }
//! # let _ = conn_str;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod connection;
pub mod dialer;
pub mod error;
pub mod metrics;

#[cfg(test)]
mod testing;

pub use config::DialerConfig;
pub use connection::{Addr, Conn, DeadlineConn};
pub use dialer::{Connector, DialError, Dialed, Dialer, NetConnector};
pub use error::{Error, Result};
