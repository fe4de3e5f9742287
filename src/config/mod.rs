//! Dialer configuration
//!
//! This module handles:
//! * Read/write timeouts and the keepalive switch for the dialer
//! * Extracting timeout settings from driver connection strings

mod connection_string;
mod dialer_config;

pub use connection_string::{extract_timeouts, READ_TIMEOUT_PARAM, WRITE_TIMEOUT_PARAM};
pub use dialer_config::{DialerConfig, DialerConfigBuilder};
