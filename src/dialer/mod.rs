//! Connection establishment
//!
//! This module handles:
//! * Pluggable connectors (real sockets or test doubles)
//! * TCP keepalive tuning
//! * Wrapping dialed connections with read/write deadlines

mod connector;
#[allow(clippy::module_inception)]
mod dialer;
mod keepalive;

pub use connector::{Connector, NetConnector, Network};
pub use dialer::{DialError, DialResult, Dialed, Dialer};
pub use keepalive::{
    tune_keepalive, KeepaliveParam, KeepaliveSocket, KEEPALIVE_IDLE, KEEPALIVE_INTERVAL,
    KEEPALIVE_PROBES, KEEPALIVE_PROFILE,
};
