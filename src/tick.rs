//! 1 Hz tick signalling between the timer interrupt and the control loop.

use core::sync::atomic::{AtomicBool, Ordering};

/// Tick period in microseconds.
pub const TICK_PERIOD_US: u32 = 1_000_000;

/// Single-producer, single-consumer tick flag.
///
/// The timer interrupt is the only caller of [`signal`](Self::signal); the
/// control loop is the only caller of [`clear`](Self::clear). Ticks raised while
/// an iteration is running are coalesced, not queued. Only plain loads and
/// stores are used, so it works on cores without atomic read-modify-write.
pub struct TickFlag(AtomicBool);

impl TickFlag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn signal(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_pending(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Called once the iteration for the pending tick has finished.
    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for TickFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Hardware countdown that raises the tick interrupt.
pub trait PeriodicAlarm {
    /// Clears the pending interrupt.
    fn acknowledge(&mut self);

    /// Arms the next expiry `period_us` from now.
    fn rearm(&mut self, period_us: u32);
}

/// Complete body of the tick interrupt handler.
pub fn service_interrupt<A: PeriodicAlarm>(alarm: &mut A, flag: &TickFlag) {
    alarm.acknowledge();
    alarm.rearm(TICK_PERIOD_US);
    flag.signal();
}
