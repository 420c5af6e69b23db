//! Resynchronization settings.

use crate::error::ConfigError;

/// Settings for the network time resync.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClockConfig {
    /// Time server host name
    pub ntp_server: &'static str,

    pub ntp_port: u16,

    /// Fixed offset added to UTC, in seconds
    pub utc_offset_secs: i32,

    /// Steady-state resync happens when `second % resync_period_secs == 0`
    pub resync_period_secs: u8,

    /// Connectivity handshakes per resync before giving up
    pub max_connect_attempts: u8,

    /// Pause between connectivity handshakes
    pub retry_delay_ms: u32,

    /// Budget for a single connectivity handshake
    pub connect_timeout_secs: u32,

    /// Budget for the time server's reply
    pub response_timeout_ms: u32,

    /// Network times below this local epoch second are rejected
    pub min_plausible_epoch: i64,
}

impl ClockConfig {
    pub const DEFAULT: Self = Self {
        ntp_server: "ntp1.aliyun.com",
        ntp_port: 123,
        utc_offset_secs: 8 * 60 * 60,
        resync_period_secs: 10,
        max_connect_attempts: 31,
        retry_delay_ms: 1000,
        connect_timeout_secs: 5,
        response_timeout_ms: 2000,
        min_plausible_epoch: 1_643_308_074,
    };

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resync_period_secs == 0 {
            return Err(ConfigError::ZeroResyncPeriod);
        }
        if self.max_connect_attempts == 0 {
            return Err(ConfigError::ZeroAttemptCap);
        }
        if self.ntp_server.is_empty() {
            return Err(ConfigError::MissingServer);
        }
        Ok(())
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(ClockConfig::default().validate(), Ok(()));
        assert_eq!(ClockConfig::DEFAULT.max_connect_attempts, 31);
        assert_eq!(ClockConfig::DEFAULT.utc_offset_secs, 28_800);
    }

    #[test]
    fn zero_period_is_rejected() {
        let config = ClockConfig {
            resync_period_secs: 0,
            ..ClockConfig::DEFAULT
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroResyncPeriod));
    }

    #[test]
    fn zero_attempt_cap_is_rejected() {
        let config = ClockConfig {
            max_connect_attempts: 0,
            ..ClockConfig::DEFAULT
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroAttemptCap));
    }
}
