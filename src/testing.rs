//! Recording test doubles for connections and connectors

use crate::connection::{Addr, Conn};
use crate::dialer::{Connector, KeepaliveParam, KeepaliveSocket};
use crate::{Error, Result};
use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// A call observed by a [`MockConn`]
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Read,
    Write(usize),
    Close,
    SetDeadline(Option<Instant>),
    SetReadDeadline(Option<Instant>),
    SetWriteDeadline(Option<Instant>),
    SetKeepalive(bool),
    SetKeepaliveParam(KeepaliveParam),
}

impl Call {
    pub(crate) fn is_deadline(&self) -> bool {
        matches!(
            self,
            Call::SetDeadline(_) | Call::SetReadDeadline(_) | Call::SetWriteDeadline(_)
        )
    }
}

/// Shared view of the calls a mock received, usable after the mock moved
#[derive(Debug, Clone, Default)]
pub(crate) struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub(crate) fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }
}

pub(crate) fn reset_error() -> io::Error {
    io::Error::from_raw_os_error(libc::ECONNRESET)
}

/// Scripted connection. Reads and writes pop queued results; once a queue is
/// empty reads return EOF and writes accept the whole buffer.
#[derive(Debug)]
pub(crate) struct MockConn {
    id: u32,
    log: CallLog,
    reads: VecDeque<io::Result<Vec<u8>>>,
    writes: VecDeque<io::Result<usize>>,
    closes: VecDeque<io::Result<()>>,
    fail_deadlines: bool,
    keepalive: Option<MockKeepalive>,
}

impl MockConn {
    pub(crate) fn new(id: u32) -> (Self, CallLog) {
        let log = CallLog::default();
        let conn = Self {
            id,
            log: log.clone(),
            reads: VecDeque::new(),
            writes: VecDeque::new(),
            closes: VecDeque::new(),
            fail_deadlines: false,
            keepalive: None,
        };
        (conn, log)
    }

    pub(crate) fn id(&self) -> u32 {
        self.id
    }

    pub(crate) fn local() -> Addr {
        Addr::Tcp(SocketAddr::from(([127, 0, 0, 1], 40000)))
    }

    pub(crate) fn remote() -> Addr {
        Addr::Tcp(SocketAddr::from(([127, 0, 0, 1], 5432)))
    }

    pub(crate) fn with_read(mut self, result: io::Result<Vec<u8>>) -> Self {
        self.reads.push_back(result);
        self
    }

    pub(crate) fn with_write(mut self, result: io::Result<usize>) -> Self {
        self.writes.push_back(result);
        self
    }

    pub(crate) fn with_close(mut self, result: io::Result<()>) -> Self {
        self.closes.push_back(result);
        self
    }

    pub(crate) fn failing_deadlines(mut self) -> Self {
        self.fail_deadlines = true;
        self
    }

    /// Expose the keepalive capability, as a TCP connection would
    pub(crate) fn tcp(mut self) -> Self {
        self.keepalive = Some(MockKeepalive {
            log: self.log.clone(),
            fail_on: None,
        });
        self
    }

    /// Expose the keepalive capability but fail setting the named option
    pub(crate) fn tcp_failing(mut self, option: &'static str) -> Self {
        self.keepalive = Some(MockKeepalive {
            log: self.log.clone(),
            fail_on: Some(option),
        });
        self
    }

    fn deadline(&self, call: Call) -> Result<()> {
        self.log.push(call);
        if self.fail_deadlines {
            return Err(Error::Io(io::Error::from_raw_os_error(libc::EBADF)));
        }
        Ok(())
    }
}

impl Conn for MockConn {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.log.push(Call::Read);
        match self.reads.pop_front() {
            Some(Ok(data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                Ok(n)
            }
            Some(Err(e)) => Err(e.into()),
            None => Ok(0),
        }
    }

    async fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.log.push(Call::Write(buf.len()));
        match self.writes.pop_front() {
            Some(result) => Ok(result?),
            None => Ok(buf.len()),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.log.push(Call::Close);
        match self.closes.pop_front() {
            Some(result) => Ok(result?),
            None => Ok(()),
        }
    }

    fn local_addr(&self) -> Option<Addr> {
        Some(Self::local())
    }

    fn remote_addr(&self) -> Option<Addr> {
        Some(Self::remote())
    }

    fn set_deadline(&mut self, deadline: Option<Instant>) -> Result<()> {
        self.deadline(Call::SetDeadline(deadline))
    }

    fn set_read_deadline(&mut self, deadline: Option<Instant>) -> Result<()> {
        self.deadline(Call::SetReadDeadline(deadline))
    }

    fn set_write_deadline(&mut self, deadline: Option<Instant>) -> Result<()> {
        self.deadline(Call::SetWriteDeadline(deadline))
    }

    fn as_keepalive(&self) -> Option<&dyn KeepaliveSocket> {
        self.keepalive.as_ref().map(|k| k as &dyn KeepaliveSocket)
    }
}

#[derive(Debug)]
struct MockKeepalive {
    log: CallLog,
    fail_on: Option<&'static str>,
}

impl MockKeepalive {
    fn outcome(&self, option: &'static str) -> io::Result<()> {
        if self.fail_on == Some(option) {
            return Err(io::Error::from_raw_os_error(libc::ENOPROTOOPT));
        }
        Ok(())
    }
}

impl KeepaliveSocket for MockKeepalive {
    fn set_keepalive(&self, enabled: bool) -> io::Result<()> {
        self.log.push(Call::SetKeepalive(enabled));
        self.outcome("SO_KEEPALIVE")
    }

    fn set_keepalive_param(&self, param: KeepaliveParam) -> io::Result<()> {
        self.log.push(Call::SetKeepaliveParam(param));
        self.outcome(param.option_name())
    }
}

/// Which connector entry point was used
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Dial {
    Connect {
        network: String,
        address: String,
    },
    ConnectTimeout {
        network: String,
        address: String,
        timeout: Duration,
    },
}

/// Connector handing out queued results
#[derive(Debug, Default)]
pub(crate) struct MockConnector {
    results: Mutex<VecDeque<Result<MockConn>>>,
    dials: Mutex<Vec<Dial>>,
}

impl MockConnector {
    pub(crate) fn returning(result: Result<MockConn>) -> Self {
        let connector = Self::default();
        connector.results.lock().unwrap().push_back(result);
        connector
    }

    pub(crate) fn dials(&self) -> Vec<Dial> {
        self.dials.lock().unwrap().clone()
    }

    fn next(&self) -> Result<MockConn> {
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Io(io::Error::from_raw_os_error(libc::ECONNREFUSED))))
    }
}

impl Connector for MockConnector {
    type Conn = MockConn;

    async fn connect(&self, network: &str, address: &str) -> Result<MockConn> {
        self.dials.lock().unwrap().push(Dial::Connect {
            network: network.to_string(),
            address: address.to_string(),
        });
        self.next()
    }

    async fn connect_timeout(
        &self,
        network: &str,
        address: &str,
        timeout: Duration,
    ) -> Result<MockConn> {
        self.dials.lock().unwrap().push(Dial::ConnectTimeout {
            network: network.to_string(),
            address: address.to_string(),
            timeout,
        });
        self.next()
    }
}
