//! Binary LED clock kept on time by a battery-backed RTC and periodic SNTP resyncs.
#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod clock;
pub mod config;
pub mod controller;
pub mod display;
pub mod encoder;
pub mod error;
pub mod esp_at;
pub mod network;
pub mod resync;
pub mod sntp;
pub mod tick;
pub mod timestamp;


pub use clock::{SoftClock, TimeSource};
pub use config::ClockConfig;
pub use controller::{Controller, TickReport};
pub use display::{IndicatorDisplay, IndicatorSet, Renderer};
pub use error::{InitError, LinkError, Peripheral, SyncError};
pub use network::{Connectivity, NetworkTime, SntpClient, UdpLink};
pub use resync::{Resync, ResyncOutcome, ResyncState};
pub use tick::{PeriodicAlarm, TickFlag};
pub use timestamp::Timestamp;
