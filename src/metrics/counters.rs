//! Counter helpers

use super::labels;

/// A reset by peer was translated into `Error::BadConnection`
pub fn bad_connection(direction: &'static str) {
    ::metrics::counter!(labels::BAD_CONNECTIONS_TOTAL, "direction" => direction).increment(1);
}

/// A dial finished
pub fn dial_completed(path: &'static str, outcome: &'static str) {
    ::metrics::counter!(labels::DIALS_TOTAL, "path" => path, "outcome" => outcome).increment(1);
}

/// A keepalive option (or the type check before it) failed
pub fn keepalive_failed(option: &'static str) {
    ::metrics::counter!(labels::KEEPALIVE_FAILURES_TOTAL, "option" => option).increment(1);
}
