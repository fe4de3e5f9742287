#![no_main]

use libfuzzer_sys::fuzz_target;
use pq_timeouts::config::{extract_timeouts, READ_TIMEOUT_PARAM, WRITE_TIMEOUT_PARAM};

fn is_timeout_key(setting: &str) -> bool {
    let key = setting.split('=').next().unwrap_or_default();
    key == READ_TIMEOUT_PARAM || key == WRITE_TIMEOUT_PARAM
}

fuzz_target!(|data: &str| {
    let Ok((_, rest)) = extract_timeouts(data) else {
        return;
    };

    // Extracted parameters must never leak through to the driver
    if rest.starts_with("postgres://") || rest.starts_with("postgresql://") {
        if let Some((_, query)) = rest.split_once('?') {
            assert!(!query.split('&').any(is_timeout_key));
        }
    } else {
        assert!(!rest.split_whitespace().any(is_timeout_key));
    }
});
