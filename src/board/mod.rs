//! Raspberry Pi Pico adapters for the clock's peripherals.

mod matrix;
mod rtc;

pub use matrix::MatrixDisplay;
pub use rtc::RtcClock;

use binclock::PeriodicAlarm;
use rp_pico::hal::fugit::ExtU32;
use rp_pico::hal::timer::{Alarm, Alarm0};

/// Hardware alarm 0 drives the tick interrupt.
pub struct TickAlarm(pub Alarm0);

impl PeriodicAlarm for TickAlarm {
    fn acknowledge(&mut self) {
        self.0.clear_interrupt();
    }

    fn rearm(&mut self, period_us: u32) {
        if self.0.schedule(period_us.micros()).is_err() {
            defmt::error!("tick alarm could not be rearmed");
        }
    }
}
