use crate::timestamp::Timestamp;

/// Why a resync sequence ended without touching the clock.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncError {
    #[error("no connectivity after {attempts} attempts")]
    ConnectivityUnavailable { attempts: u8 },
    #[error("network time {fetched} is not newer than local time {local}")]
    TimeRegression { fetched: Timestamp, local: Timestamp },
    #[error("network time {0} is implausibly old")]
    Implausible(Timestamp),
    #[error("time service returned no time")]
    NoNetworkTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Peripheral {
    RealTimeClock,
    Display,
}

impl core::fmt::Display for Peripheral {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Peripheral::RealTimeClock => f.write_str("real-time clock"),
            Peripheral::Display => f.write_str("display"),
        }
    }
}

/// Fatal startup faults.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitError {
    #[error("{0} not responding")]
    HardwareInitFailure(Peripheral),
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    #[error("resync period must be non-zero")]
    ZeroResyncPeriod,
    #[error("connect attempt cap must be non-zero")]
    ZeroAttemptCap,
    #[error("time server is not set")]
    MissingServer,
}

/// Failures of the serial link to the network co-processor.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    #[error("timed out waiting for the modem")]
    Timeout,
    #[error("modem answered ERROR")]
    Rejected,
    #[error("response does not fit the buffer")]
    Overflow,
    #[error("serial port error")]
    Serial,
    #[error("command does not fit the buffer")]
    Format,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SntpError {
    #[error("reply shorter than an NTP header")]
    Truncated,
    #[error("unexpected association mode {0}")]
    UnexpectedMode(u8),
    #[error("server sent kiss-of-death")]
    KissOfDeath,
    #[error("reply carries no transmit time")]
    ZeroTransmit,
}
