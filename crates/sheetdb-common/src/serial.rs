//! Day-serial date codec.
//!
//! The remote source stores dates as a fractional day count: the integer
//! part is days since the sheet epoch, the fraction encodes time-of-day.
//! Serial 25569 is 1970-01-01T00:00:00Z, which anchors the conversion to
//! Unix time. Serials carry no timezone; a serial's calendar parts are
//! wall-clock fields, and the `Local` conversions re-interpret them in the
//! process timezone for callers that traffic in zoned datetimes.

use chrono::{DateTime, Duration, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime};
use chrono::{Datelike, TimeZone, Timelike};

/// Serial value of the Unix epoch (1970-01-01T00:00:00Z).
pub const UNIX_EPOCH_SERIAL: f64 = 25_569.0;

const MS_PER_DAY: i64 = 86_400_000;

const UNIX_EPOCH_DATE: NaiveDate = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();

/// A point in time as a fractional day serial. Immutable value object.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct SerialDate(f64);

impl SerialDate {
    pub const fn new(serial: f64) -> Self {
        SerialDate(serial)
    }

    pub const fn serial(self) -> f64 {
        self.0
    }

    pub fn from_utc_millis(ms: i64) -> Self {
        SerialDate(ms as f64 / MS_PER_DAY as f64 + UNIX_EPOCH_SERIAL)
    }

    /// Milliseconds since the Unix epoch, rounded to the nearest ms.
    pub fn utc_millis(self) -> i64 {
        ((self.0 - UNIX_EPOCH_SERIAL) * MS_PER_DAY as f64).round() as i64
    }

    /// Calendar parts of the UTC instant:
    /// (year, month 1-12, day, hour, minute, second, millisecond).
    pub fn parts(self) -> (i32, u32, u32, u32, u32, u32, u32) {
        let dt = self.to_naive();
        (
            dt.year(),
            dt.month(),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second(),
            dt.nanosecond() / 1_000_000,
        )
    }

    /// Build a serial from UTC wall-clock fields. Month 1 = January.
    /// Returns `None` for out-of-range fields.
    pub fn from_parts(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        milli: u32,
    ) -> Option<Self> {
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        let time = NaiveTime::from_hms_milli_opt(hour, minute, second, milli)?;
        Some(Self::from_naive(date.and_time(time)))
    }

    /// Date-only shorthand for [`SerialDate::from_parts`]; the time-of-day
    /// fields default to 0.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        Self::from_parts(year, month, day, 0, 0, 0, 0)
    }

    /// The serial's wall-clock fields as a zone-less datetime, at
    /// millisecond resolution.
    pub fn to_naive(self) -> NaiveDateTime {
        let ms = self.utc_millis();
        let days = ms.div_euclid(MS_PER_DAY);
        let in_day = ms.rem_euclid(MS_PER_DAY) as u32;
        let date = UNIX_EPOCH_DATE + Duration::days(days);
        let time = NaiveTime::from_num_seconds_from_midnight_opt(
            in_day / 1_000,
            (in_day % 1_000) * 1_000_000,
        )
        .unwrap();
        date.and_time(time)
    }

    /// Inverse of [`SerialDate::to_naive`]: treat the fields as UTC
    /// wall-clock and convert to a serial.
    pub fn from_naive(dt: NaiveDateTime) -> Self {
        let days = (dt.date() - UNIX_EPOCH_DATE).num_days();
        let in_day = dt.time().num_seconds_from_midnight() as i64 * 1_000
            + (dt.time().nanosecond() / 1_000_000) as i64;
        Self::from_utc_millis(days * MS_PER_DAY + in_day)
    }

    /// Re-interpret the wall-clock fields in the process-local timezone.
    /// A field combination that falls into a DST gap maps to the earliest
    /// valid instant.
    pub fn to_local(self) -> DateTime<Local> {
        let naive = self.to_naive();
        match Local.from_local_datetime(&naive) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt,
            LocalResult::None => Local.from_utc_datetime(&naive),
        }
    }

    /// Inverse of [`SerialDate::to_local`]: strip the local offset and
    /// encode the wall-clock fields.
    pub fn from_local(dt: DateTime<Local>) -> Self {
        Self::from_naive(dt.naive_local())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_anchor() {
        let s = SerialDate::new(UNIX_EPOCH_SERIAL);
        assert_eq!(s.utc_millis(), 0);
        assert_eq!(s.parts(), (1970, 1, 1, 0, 0, 0, 0));
    }

    #[test]
    fn fractional_serial_encodes_time_of_day() {
        // 2023-05-01 06:00 = serial 45047.25
        let s = SerialDate::new(45_047.25);
        assert_eq!(s.parts(), (2023, 5, 1, 6, 0, 0, 0));
    }

    #[test]
    fn parts_round_trip() {
        let s = SerialDate::from_parts(2024, 2, 29, 13, 45, 30, 250).unwrap();
        assert_eq!(s.parts(), (2024, 2, 29, 13, 45, 30, 250));
        assert!(SerialDate::from_parts(2024, 13, 1, 0, 0, 0, 0).is_none());
    }

    #[test]
    fn naive_round_trip_is_exact_to_the_millisecond() {
        for &serial in &[0.0, 25_569.0, 45_000.5, 45_123.999_988_4] {
            let s = SerialDate::new(serial);
            let back = SerialDate::from_naive(s.to_naive());
            assert!((back.utc_millis() - s.utc_millis()).abs() <= 1);
        }
    }

    #[test]
    fn local_round_trip_is_exact_to_the_millisecond() {
        let s = SerialDate::from_parts(2023, 7, 14, 9, 30, 0, 0).unwrap();
        let back = SerialDate::from_local(s.to_local());
        assert!((back.utc_millis() - s.utc_millis()).abs() <= 1);
    }

    #[test]
    fn pre_epoch_serials() {
        let s = SerialDate::from_ymd(1969, 12, 31).unwrap();
        assert_eq!(s.serial(), UNIX_EPOCH_SERIAL - 1.0);
        assert_eq!(s.parts().0, 1969);
    }
}
