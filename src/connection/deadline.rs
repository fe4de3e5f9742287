//! Deadline-enforcing connection decorator

use super::conn::{Addr, Conn};
use crate::dialer::KeepaliveSocket;
use crate::metrics::{counters, labels};
use crate::{Error, Result};
use std::time::Duration;
use tokio::time::Instant;

/// Connection wrapper that applies a fresh deadline around every read and write.
///
/// Before each read (write) with a non-zero read (write) timeout, the read
/// (write) deadline of the inner connection is set to `now + timeout`, and it
/// is cleared once the call returns. A reset by the peer is reported as
/// [`Error::BadConnection`] so the connection pool discards the socket instead
/// of handing a half-open connection to the next caller.
///
/// The inner handle is released on the first successful [`Conn::close`];
/// afterwards every operation fails with [`Error::NilConnection`].
#[derive(Debug)]
pub struct DeadlineConn<C> {
    conn: Option<C>,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl<C: Conn> DeadlineConn<C> {
    /// Wrap `conn`. A zero timeout disables deadlines in that direction.
    pub fn new(conn: C, read_timeout: Duration, write_timeout: Duration) -> Self {
        Self {
            conn: Some(conn),
            read_timeout,
            write_timeout,
        }
    }

    /// Configured read timeout
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Configured write timeout
    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    /// Inner connection, or `None` once closed
    pub fn get_ref(&self) -> Option<&C> {
        self.conn.as_ref()
    }

    /// Mutable inner connection, or `None` once closed
    pub fn get_mut(&mut self) -> Option<&mut C> {
        self.conn.as_mut()
    }

    /// Unwrap the inner connection, or `None` once closed
    pub fn into_inner(self) -> Option<C> {
        self.conn
    }

    /// Whether the handle was released by a successful close
    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }
}

/// Roughly 30 years, the same horizon tokio uses for an unbounded timer
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// `now + timeout`, saturating to a far-future instant instead of overflowing
fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE)
}

impl<C: Conn> Conn for DeadlineConn<C> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let conn = self.conn.as_mut().ok_or(Error::NilConnection)?;
        let timed = !self.read_timeout.is_zero();

        if timed {
            if let Err(e) = conn.set_read_deadline(Some(deadline_after(self.read_timeout))) {
                tracing::warn!("failed to set read deadline: {}", e);
            }
        }

        let result = conn.read(buf).await;
        if matches!(&result, Err(e) if e.is_reset_by_peer()) {
            tracing::warn!("connection reset by peer during read, marking connection bad");
            counters::bad_connection(labels::DIRECTION_READ);
            return Err(Error::BadConnection);
        }

        if timed {
            if let Err(e) = conn.set_read_deadline(None) {
                tracing::warn!("failed to clear read deadline: {}", e);
            }
        }
        result
    }

    async fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let conn = self.conn.as_mut().ok_or(Error::NilConnection)?;
        let timed = !self.write_timeout.is_zero();

        if timed {
            if let Err(e) = conn.set_write_deadline(Some(deadline_after(self.write_timeout))) {
                tracing::warn!("failed to set write deadline: {}", e);
            }
        }

        let result = conn.write(buf).await;
        if matches!(&result, Err(e) if e.is_reset_by_peer()) {
            tracing::warn!("connection reset by peer during write, marking connection bad");
            counters::bad_connection(labels::DIRECTION_WRITE);
            return Err(Error::BadConnection);
        }

        if timed {
            if let Err(e) = conn.set_write_deadline(None) {
                tracing::warn!("failed to clear write deadline: {}", e);
            }
        }
        result
    }

    async fn close(&mut self) -> Result<()> {
        let conn = self.conn.as_mut().ok_or(Error::NilConnection)?;
        conn.close().await?;
        // Only a successful close releases the handle
        self.conn = None;
        tracing::debug!("connection closed, handle released");
        Ok(())
    }

    fn local_addr(&self) -> Option<Addr> {
        self.conn.as_ref().and_then(Conn::local_addr)
    }

    fn remote_addr(&self) -> Option<Addr> {
        self.conn.as_ref().and_then(Conn::remote_addr)
    }

    fn set_deadline(&mut self, deadline: Option<Instant>) -> Result<()> {
        self.conn
            .as_mut()
            .ok_or(Error::NilConnection)?
            .set_deadline(deadline)
    }

    fn set_read_deadline(&mut self, deadline: Option<Instant>) -> Result<()> {
        self.conn
            .as_mut()
            .ok_or(Error::NilConnection)?
            .set_read_deadline(deadline)
    }

    fn set_write_deadline(&mut self, deadline: Option<Instant>) -> Result<()> {
        self.conn
            .as_mut()
            .ok_or(Error::NilConnection)?
            .set_write_deadline(deadline)
    }

    fn as_keepalive(&self) -> Option<&dyn KeepaliveSocket> {
        self.conn.as_ref().and_then(Conn::as_keepalive)
    }
}
