use binclock::{InitError, Peripheral, TimeSource, Timestamp};
use ds323x::interface::I2cInterface;
use ds323x::{ic, DateTimeAccess, Ds323x};
use embedded_hal::blocking::i2c::{Write, WriteRead};

/// DS3231 on I2C as the authoritative time source.
pub struct RtcClock<I2C> {
    rtc: Ds323x<I2cInterface<I2C>, ic::DS3231>,
    last: Timestamp,
}

impl<I2C, E> RtcClock<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    /// Fails when the chip does not answer a time read.
    pub fn begin(i2c: I2C) -> Result<Self, InitError> {
        let mut rtc = Ds323x::new_ds3231(i2c);
        let now = rtc
            .datetime()
            .map_err(|_| InitError::HardwareInitFailure(Peripheral::RealTimeClock))?;
        Ok(Self {
            rtc,
            last: Timestamp::from_datetime(now),
        })
    }
}

impl<I2C, E> TimeSource for RtcClock<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    fn now(&mut self) -> Timestamp {
        match self.rtc.datetime() {
            Ok(now) => self.last = Timestamp::from_datetime(now),
            Err(_) => defmt::warn!("rtc read failed, reusing {}", self.last),
        }
        self.last
    }

    fn adjust(&mut self, time: Timestamp) {
        match self.rtc.set_datetime(&time.datetime()) {
            Ok(()) => self.last = time,
            Err(_) => defmt::error!("rtc write of {} failed", time),
        }
    }

    fn temperature(&mut self) -> f32 {
        self.rtc.temperature().unwrap_or_else(|_| {
            defmt::warn!("rtc temperature read failed");
            f32::NAN
        })
    }
}
