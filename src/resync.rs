//! Network resynchronization policy.
//!
//! One resync sequence runs `Idle -> Connecting(n) -> Validating -> Applied`
//! or ends in `Skipped`. The control loop drives it with [`Resync::step`]
//! until [`ResyncState::is_terminal`], then collects the result with
//! [`Resync::finish`]. The sequence always completes inside the tick that
//! started it.

use embedded_hal::blocking::delay::DelayMs;

use crate::clock::TimeSource;
use crate::config::ClockConfig;
use crate::error::SyncError;
use crate::network::{Connectivity, NetworkTime};
use crate::timestamp::Timestamp;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResyncState {
    Idle,
    /// `attempt` handshakes have been started, counting the current one.
    Connecting { attempt: u8 },
    Validating,
    Applied(Timestamp),
    Skipped(SyncError),
}

impl ResyncState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ResyncState::Applied(_) | ResyncState::Skipped(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResyncOutcome {
    Success(Timestamp),
    NoConnectivity,
    Rejected(SyncError),
}

pub struct Resync {
    state: ResyncState,
    calibrated: bool,
    period: u8,
    max_attempts: u8,
    retry_delay_ms: u32,
    connect_timeout_secs: u32,
    min_plausible_epoch: i64,
}

impl Resync {
    pub fn new(config: &ClockConfig) -> Self {
        Self {
            state: ResyncState::Idle,
            calibrated: false,
            period: config.resync_period_secs.max(1),
            max_attempts: config.max_connect_attempts.max(1),
            retry_delay_ms: config.retry_delay_ms,
            connect_timeout_secs: config.connect_timeout_secs,
            min_plausible_epoch: config.min_plausible_epoch,
        }
    }

    pub fn state(&self) -> ResyncState {
        self.state
    }

    /// `true` once any resync sequence has completed since boot.
    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    /// Resync on every period boundary, and on every tick until calibrated.
    pub fn should_resync(&self, second: u8) -> bool {
        second % self.period == 0 || !self.calibrated
    }

    /// Performs one transition and returns the new state.
    ///
    /// Terminal states are sticky until [`finish`](Self::finish).
    pub fn step<T, N, W>(&mut self, clock: &mut T, network: &mut N, delay: &mut W) -> ResyncState
    where
        T: TimeSource,
        N: Connectivity + NetworkTime,
        W: DelayMs<u32>,
    {
        self.state = match self.state {
            ResyncState::Idle => {
                debug!("resync: connecting");
                ResyncState::Connecting { attempt: 1 }
            }
            ResyncState::Connecting { attempt } => {
                if network.establish_connection(self.connect_timeout_secs) {
                    info!("resync: connected after {} attempt(s)", attempt);
                    ResyncState::Validating
                } else if attempt >= self.max_attempts {
                    warn!("resync: no connectivity after {} attempts, giving up", attempt);
                    ResyncState::Skipped(SyncError::ConnectivityUnavailable { attempts: attempt })
                } else {
                    delay.delay_ms(self.retry_delay_ms);
                    ResyncState::Connecting { attempt: attempt + 1 }
                }
            }
            ResyncState::Validating => self.validate(clock, network),
            terminal => terminal,
        };

        if self.state.is_terminal() {
            self.calibrated = true;
        }
        self.state
    }

    fn validate<T, N>(&self, clock: &mut T, network: &mut N) -> ResyncState
    where
        T: TimeSource,
        N: NetworkTime,
    {
        let Some(fetched) = network.fetch() else {
            warn!("resync: no time from the time service");
            return ResyncState::Skipped(SyncError::NoNetworkTime);
        };
        if fetched.unix() < self.min_plausible_epoch {
            warn!("resync: implausible network time {}", fetched);
            return ResyncState::Skipped(SyncError::Implausible(fetched));
        }

        let local = clock.now();
        if fetched > local {
            clock.adjust(fetched);
            info!("resync: clock set to {} (was {})", fetched, local);
            ResyncState::Applied(fetched)
        } else {
            warn!("resync: network time {} not after local {}, kept local", fetched, local);
            ResyncState::Skipped(SyncError::TimeRegression { fetched, local })
        }
    }

    /// Returns the outcome of a finished sequence and rearms the machine.
    ///
    /// `None` while a sequence is still in progress or none has started.
    pub fn finish(&mut self) -> Option<ResyncOutcome> {
        let outcome = match self.state {
            ResyncState::Applied(time) => ResyncOutcome::Success(time),
            ResyncState::Skipped(SyncError::ConnectivityUnavailable { .. }) => ResyncOutcome::NoConnectivity,
            ResyncState::Skipped(reason) => ResyncOutcome::Rejected(reason),
            _ => return None,
        };
        self.state = ResyncState::Idle;
        Some(outcome)
    }

    /// Drives a whole sequence from `Idle` to its outcome.
    pub fn run<T, N, W>(&mut self, clock: &mut T, network: &mut N, delay: &mut W) -> ResyncOutcome
    where
        T: TimeSource,
        N: Connectivity + NetworkTime,
        W: DelayMs<u32>,
    {
        loop {
            if self.step(clock, network, delay).is_terminal() {
                if let Some(outcome) = self.finish() {
                    return outcome;
                }
            }
        }
    }
}
