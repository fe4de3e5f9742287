//! Connection management
//!
//! This module handles:
//! * The stream connection capability (`Conn`)
//! * Deadline enforcement and reset translation (`DeadlineConn`)
//! * Transport implementations (TCP vs Unix socket)

mod conn;
mod deadline;
mod transport;

pub use conn::{Addr, Conn};
pub use deadline::DeadlineConn;
pub use transport::{NetConn, TcpConn, UnixConn};
