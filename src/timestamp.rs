use core::fmt;

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};

/// A whole-second point in local wall-clock time.
///
/// `unix()` counts seconds since 1970-01-01 00:00:00 on the local clock face,
/// i.e. with the configured UTC offset already applied. The calendar fields are
/// derived once at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    secs: i64,
    civil: NaiveDateTime,
}

impl Timestamp {
    /// Returns `None` when `secs` falls outside the representable calendar.
    pub fn from_unix(secs: i64) -> Option<Self> {
        let civil = DateTime::from_timestamp(secs, 0)?.naive_utc();
        Some(Self { secs, civil })
    }

    /// Builds a timestamp from calendar fields, truncating any sub-second part.
    pub fn from_datetime(civil: NaiveDateTime) -> Self {
        let civil = civil.with_nanosecond(0).unwrap_or(civil);
        Self {
            secs: civil.and_utc().timestamp(),
            civil,
        }
    }

    pub fn from_ymd_hms(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Option<Self> {
        let civil = chrono::NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, min, sec)?;
        Some(Self::from_datetime(civil))
    }

    pub const fn unix(&self) -> i64 {
        self.secs
    }

    pub const fn datetime(&self) -> NaiveDateTime {
        self.civil
    }

    pub fn year(&self) -> i32 {
        self.civil.year()
    }

    pub fn month(&self) -> u8 {
        self.civil.month() as u8
    }

    pub fn day(&self) -> u8 {
        self.civil.day() as u8
    }

    pub fn hour(&self) -> u8 {
        self.civil.hour() as u8
    }

    pub fn minute(&self) -> u8 {
        self.civil.minute() as u8
    }

    pub fn second(&self) -> u8 {
        self.civil.second() as u8
    }

    pub fn checked_add_secs(self, secs: i64) -> Option<Self> {
        Self::from_unix(self.secs.checked_add(secs)?)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}/{:02}/{:02} {:02}:{:02}:{:02}",
            self.year(),
            self.month(),
            self.day(),
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Timestamp {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "{}/{}/{} {}:{}:{}",
            self.year(),
            self.month(),
            self.day(),
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_fields_follow_unix_seconds() {
        // 2022-01-27 18:27:54
        let ts = Timestamp::from_unix(1_643_308_074).unwrap();
        assert_eq!(ts.year(), 2022);
        assert_eq!(ts.month(), 1);
        assert_eq!(ts.day(), 27);
        assert_eq!(ts.hour(), 18);
        assert_eq!(ts.minute(), 27);
        assert_eq!(ts.second(), 54);
    }

    #[test]
    fn datetime_conversion_agrees_with_unix() {
        let ts = Timestamp::from_ymd_hms(2024, 2, 29, 23, 59, 58).unwrap();
        assert_eq!(Timestamp::from_unix(ts.unix()), Some(ts));
        assert_eq!(ts.checked_add_secs(2).unwrap().to_string(), "2024/03/01 00:00:00");
    }

    #[test]
    fn sub_second_part_is_dropped() {
        let civil = chrono::NaiveDate::from_ymd_opt(2023, 5, 1)
            .unwrap()
            .and_hms_milli_opt(12, 0, 0, 750)
            .unwrap();
        let ts = Timestamp::from_datetime(civil);
        assert_eq!(ts, Timestamp::from_ymd_hms(2023, 5, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn ordering_is_chronological() {
        let earlier = Timestamp::from_ymd_hms(2024, 1, 1, 9, 59, 59).unwrap();
        let later = Timestamp::from_ymd_hms(2024, 1, 1, 10, 0, 0).unwrap();
        assert!(earlier < later);
    }
}
