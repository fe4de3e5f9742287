//! Dialer configuration

use std::time::Duration;

/// Timeouts propagated to every connection a [`crate::Dialer`] creates.
///
/// A zero duration disables the deadline in that direction. With both
/// timeouts disabled the dialer returns plain connections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialerConfig {
    /// Deadline applied around each read (default: disabled)
    pub read_timeout: Duration,
    /// Deadline applied around each write (default: disabled)
    pub write_timeout: Duration,
    /// Also tune TCP keepalive on `dial_timeout` (default: false)
    pub tune_keepalive_on_dial_timeout: bool,
}

impl DialerConfig {
    /// Configuration with every timeout disabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder
    ///
    /// # Examples
    ///
    /// ```
    /// use pq_timeouts::DialerConfig;
    /// use std::time::Duration;
    ///
    /// let config = DialerConfig::builder()
    ///     .read_timeout(Duration::from_secs(30))
    ///     .write_timeout(Duration::from_secs(5))
    ///     .build();
    /// assert!(config.timeouts_enabled());
    /// ```
    pub fn builder() -> DialerConfigBuilder {
        DialerConfigBuilder {
            config: Self::default(),
        }
    }

    /// Whether either timeout is enabled
    pub fn timeouts_enabled(&self) -> bool {
        !self.read_timeout.is_zero() || !self.write_timeout.is_zero()
    }
}

/// Builder for [`DialerConfig`]
#[derive(Debug, Clone)]
pub struct DialerConfigBuilder {
    config: DialerConfig,
}

impl DialerConfigBuilder {
    /// Set the read timeout
    ///
    /// Default: disabled
    pub fn read_timeout(mut self, duration: Duration) -> Self {
        self.config.read_timeout = duration;
        self
    }

    /// Set the write timeout
    ///
    /// Default: disabled
    pub fn write_timeout(mut self, duration: Duration) -> Self {
        self.config.write_timeout = duration;
        self
    }

    /// Tune keepalive on the `dial_timeout` path as well as on `dial`
    ///
    /// Default: false. Without it, connections from `dial_timeout` keep the
    /// OS keepalive defaults.
    pub fn tune_keepalive_on_dial_timeout(mut self, enabled: bool) -> Self {
        self.config.tune_keepalive_on_dial_timeout = enabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> DialerConfig {
        self.config
    }
}
