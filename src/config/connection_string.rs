//! Timeout parameters embedded in database connection strings
//!
//! Supports both formats accepted by Postgres drivers:
//! * postgres://user@host:5432/db?read_timeout=500&write_timeout=1000
//! * host=localhost dbname=db read_timeout=500 write_timeout=1000
//!
//! Values are integer milliseconds. The timeout parameters are removed from
//! the returned string so the driver never sees settings it does not know.

use super::DialerConfig;
use crate::{Error, Result};
use std::time::Duration;

/// Read timeout parameter name
pub const READ_TIMEOUT_PARAM: &str = "read_timeout";
/// Write timeout parameter name
pub const WRITE_TIMEOUT_PARAM: &str = "write_timeout";

/// Split the timeout settings out of `connection_string`.
///
/// Returns the dialer configuration and the connection string with
/// `read_timeout` and `write_timeout` removed. Parameters that are absent
/// leave the corresponding timeout disabled.
///
/// # Examples
///
/// ```
/// use pq_timeouts::config::extract_timeouts;
/// use std::time::Duration;
///
/// let (config, rest) =
///     extract_timeouts("postgres://localhost/mydb?sslmode=disable&read_timeout=250")?;
/// assert_eq!(config.read_timeout, Duration::from_millis(250));
/// assert_eq!(rest, "postgres://localhost/mydb?sslmode=disable");
/// # Ok::<(), pq_timeouts::Error>(())
/// ```
pub fn extract_timeouts(connection_string: &str) -> Result<(DialerConfig, String)> {
    let connection_string = connection_string.trim();
    if connection_string.starts_with("postgres://")
        || connection_string.starts_with("postgresql://")
    {
        extract_from_url(connection_string)
    } else {
        extract_from_dsn(connection_string)
    }
}

/// Apply `key=value` to `config` if `key` is a timeout parameter.
///
/// Returns `false` when the setting belongs to the driver.
fn apply_setting(config: &mut DialerConfig, key: &str, value: &str) -> Result<bool> {
    let slot = match key {
        READ_TIMEOUT_PARAM => &mut config.read_timeout,
        WRITE_TIMEOUT_PARAM => &mut config.write_timeout,
        _ => return Ok(false),
    };
    *slot = parse_millis(key, value)?;
    Ok(true)
}

fn parse_millis(key: &str, value: &str) -> Result<Duration> {
    value
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| {
            Error::Config(format!(
                "invalid value for {} '{}': expected milliseconds",
                key, value
            ))
        })
}

fn extract_from_url(url: &str) -> Result<(DialerConfig, String)> {
    let mut config = DialerConfig::default();

    let (base, query_string) = match url.split_once('?') {
        Some((base, query)) => (base, query),
        None => return Ok((config, url.to_string())),
    };

    let mut kept = Vec::new();
    for pair in query_string.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if !apply_setting(&mut config, key, value)? {
            kept.push(pair);
        }
    }

    let rest = if kept.is_empty() {
        base.to_string()
    } else {
        format!("{}?{}", base, kept.join("&"))
    };
    Ok((config, rest))
}

fn extract_from_dsn(dsn: &str) -> Result<(DialerConfig, String)> {
    let mut config = DialerConfig::default();

    let mut kept = Vec::new();
    for setting in dsn.split_whitespace() {
        let (key, value) = setting.split_once('=').unwrap_or((setting, ""));
        if !apply_setting(&mut config, key, value)? {
            kept.push(setting);
        }
    }

    Ok((config, kept.join(" ")))
}
