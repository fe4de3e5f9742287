//! Metric names and label values

/// Resets translated into the bad-connection sentinel
pub const BAD_CONNECTIONS_TOTAL: &str = "pq_timeouts_bad_connections_total";
/// Dial attempts by path and outcome
pub const DIALS_TOTAL: &str = "pq_timeouts_dials_total";
/// Keepalive tuning failures by socket option
pub const KEEPALIVE_FAILURES_TOTAL: &str = "pq_timeouts_keepalive_failures_total";

/// Reset seen by a read
pub const DIRECTION_READ: &str = "read";
/// Reset seen by a write
pub const DIRECTION_WRITE: &str = "write";

/// `Dialer::dial`
pub const PATH_DIAL: &str = "dial";
/// `Dialer::dial_timeout`
pub const PATH_DIAL_TIMEOUT: &str = "dial_timeout";

/// Returned undecorated
pub const OUTCOME_PLAIN: &str = "plain";
/// Wrapped with deadlines
pub const OUTCOME_DEADLINE: &str = "deadline";
/// Connector failed
pub const OUTCOME_CONNECT_ERROR: &str = "connect_error";
/// Keepalive tuning failed
pub const OUTCOME_TUNING_ERROR: &str = "tuning_error";
