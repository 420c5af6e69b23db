use crate::timestamp::Timestamp;

/// Owner of the authoritative wall-clock time.
///
/// Reads never fail: a missing clock is a startup fault, and adapters absorb
/// transient bus errors by answering with their last good reading.
pub trait TimeSource {
    fn now(&mut self) -> Timestamp;

    /// Overwrites the time; subsequent `now()` calls reflect it immediately.
    fn adjust(&mut self, time: Timestamp);

    /// Diagnostic only, in degrees Celsius.
    fn temperature(&mut self) -> f32;
}

/// Software clock advanced one second per `tick()`.
pub struct SoftClock {
    now: Timestamp,
    temperature: f32,
}

impl SoftClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now,
            temperature: 25.0,
        }
    }

    pub fn with_temperature(mut self, celsius: f32) -> Self {
        self.temperature = celsius;
        self
    }

    /// Increments the second, rolling minutes, hours and the date.
    pub fn tick(&mut self) {
        if let Some(next) = self.now.checked_add_secs(1) {
            self.now = next;
        }
    }
}

impl TimeSource for SoftClock {
    fn now(&mut self) -> Timestamp {
        self.now
    }

    fn adjust(&mut self, time: Timestamp) {
        self.now = time;
    }

    fn temperature(&mut self) -> f32 {
        self.temperature
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_rolls_over_midnight() {
        let mut clock = SoftClock::new(Timestamp::from_ymd_hms(2023, 12, 31, 23, 59, 59).unwrap());
        clock.tick();
        let now = clock.now();
        assert_eq!((now.year(), now.month(), now.day()), (2024, 1, 1));
        assert_eq!((now.hour(), now.minute(), now.second()), (0, 0, 0));
    }

    #[test]
    fn adjust_is_visible_immediately() {
        let mut clock = SoftClock::new(Timestamp::from_ymd_hms(2024, 1, 1, 10, 0, 0).unwrap());
        let target = Timestamp::from_ymd_hms(2024, 1, 1, 11, 30, 0).unwrap();
        clock.adjust(target);
        assert_eq!(clock.now(), target);
    }

    #[test]
    fn temperature_is_stable_across_reads() {
        let mut clock = SoftClock::new(Timestamp::from_unix(0).unwrap()).with_temperature(21.5);
        assert_eq!(clock.temperature(), 21.5);
        assert_eq!(clock.temperature(), 21.5);
    }
}
