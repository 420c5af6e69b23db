use embedded_hal::blocking::delay::DelayMs;

use crate::clock::TimeSource;
use crate::config::ClockConfig;
use crate::display::{IndicatorDisplay, IndicatorSet, Renderer, STATUS_CONNECTED, STATUS_DONE};
use crate::network::{Connectivity, NetworkTime};
use crate::resync::{Resync, ResyncOutcome, ResyncState};
use crate::tick::TickFlag;
use crate::timestamp::Timestamp;

/// What one control loop iteration did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickReport {
    pub now: Timestamp,
    pub shown: IndicatorSet,
    pub resync: Option<ResyncOutcome>,
    pub temperature: f32,
}

/// The control loop: owns every peripheral handle and runs one iteration per tick.
pub struct Controller<T, N, D: IndicatorDisplay, W> {
    clock: T,
    network: N,
    display: D,
    delay: W,
    resync: Resync,
    renderer: Renderer<D::Color>,
}

impl<T, N, D, W> Controller<T, N, D, W>
where
    T: TimeSource,
    N: Connectivity + NetworkTime,
    D: IndicatorDisplay,
    W: DelayMs<u32>,
{
    pub fn new(clock: T, network: N, display: D, delay: W, config: &ClockConfig, color: D::Color) -> Self {
        Self {
            clock,
            network,
            display,
            delay,
            resync: Resync::new(config),
            renderer: Renderer::new(color),
        }
    }

    /// Runs one iteration if a tick is pending, clearing it afterwards.
    pub fn poll(&mut self, tick: &TickFlag) -> Option<TickReport> {
        if !tick.is_pending() {
            return None;
        }
        let report = self.iterate();
        tick.clear();
        Some(report)
    }

    /// Resync decision, time read, full redraw.
    pub fn iterate(&mut self) -> TickReport {
        let second = self.clock.now().second();
        let resync = if self.resync.should_resync(second) {
            Some(self.resync_now())
        } else {
            None
        };

        let now = self.clock.now();
        let temperature = self.clock.temperature();
        info!("temperature {}C, clock {}", temperature, now);

        let shown = self.renderer.render(&mut self.display, &now);
        TickReport {
            now,
            shown,
            resync,
            temperature,
        }
    }

    /// Runs a full resync sequence, showing progress on the display.
    fn resync_now(&mut self) -> ResyncOutcome {
        loop {
            let state = self
                .resync
                .step(&mut self.clock, &mut self.network, &mut self.delay);
            if state == ResyncState::Validating {
                self.renderer.show_status(&mut self.display, STATUS_CONNECTED);
            }
            if state.is_terminal() {
                self.renderer.show_status(&mut self.display, STATUS_DONE);
                if let Some(outcome) = self.resync.finish() {
                    return outcome;
                }
            }
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.resync.is_calibrated()
    }

    pub fn clock(&self) -> &T {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut T {
        &mut self.clock
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut N {
        &mut self.network
    }

    pub fn display(&self) -> &D {
        &self.display
    }
}
