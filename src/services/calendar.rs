//! Calendar arithmetic in the business time zone.
//!
//! Entries are stored with UTC timestamps, but "a day" and "a week" are
//! always the supplier's local days. Every window produced here is inclusive
//! on both ends at millisecond precision: 00:00:00.000 through 23:59:59.999.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    TimeZone, Utc, Weekday,
};
use serde::Serialize;
use std::ops::RangeInclusive;

/// Years accepted from clients. Keeps every week window and day bound well
/// inside chrono's representable range.
pub const SUPPORTED_YEARS: RangeInclusive<i32> = 1..=9999;

/// Inclusive `[start, end]` range of instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    offset: FixedOffset,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl Calendar {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Local calendar date of an instant.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// First millisecond of `day`.
    pub fn start_of_day(&self, day: NaiveDate) -> DateTime<Utc> {
        self.local_to_utc(day.and_time(NaiveTime::MIN))
    }

    /// Last millisecond of `day`.
    pub fn end_of_day(&self, day: NaiveDate) -> DateTime<Utc> {
        self.start_of_day(day) + Duration::days(1) - Duration::milliseconds(1)
    }

    /// Every instant of the days `from..=to`.
    pub fn day_range(&self, from: NaiveDate, to: NaiveDate) -> DateWindow {
        DateWindow {
            start: self.start_of_day(from),
            end: self.end_of_day(to),
        }
    }

    /// Week ending on `sunday`: the six preceding days plus `sunday` itself.
    ///
    /// The anchor is not checked to be a Sunday; any date closes its own
    /// seven-day window.
    pub fn sunday_anchored_week(&self, sunday: NaiveDate) -> DateWindow {
        self.day_range(sunday - Duration::days(6), sunday)
    }

    /// Monday-to-Sunday week containing `today`. A Sunday belongs to the week
    /// that started six days earlier.
    pub fn monday_anchored_week(&self, today: NaiveDate) -> DateWindow {
        let monday = Self::monday_of(today);
        self.day_range(monday, monday + Duration::days(6))
    }

    /// Monday-anchored week of the local day `now` falls on.
    pub fn current_week(&self, now: DateTime<Utc>) -> DateWindow {
        self.monday_anchored_week(self.local_date(now))
    }

    pub fn monday_of(day: NaiveDate) -> NaiveDate {
        day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
    }

    /// The seven local dates covered by a week window, in order.
    pub fn days_of_week(&self, window: &DateWindow) -> [NaiveDate; 7] {
        let first = self.local_date(window.start);
        let mut days = [first; 7];
        for (offset, day) in days.iter_mut().enumerate() {
            *day = first + Duration::days(offset as i64);
        }
        days
    }

    /// Parses a day given either as `YYYY-MM-DD` or as an RFC 3339 timestamp
    /// (reduced to its local date). Days outside [`SUPPORTED_YEARS`] are
    /// rejected.
    pub fn parse_day(&self, raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| {
                DateTime::parse_from_rfc3339(raw)
                    .ok()
                    .map(|ts| self.local_date(ts.with_timezone(&Utc)))
            })
            .filter(is_supported)
    }

    /// Parses an instant given as RFC 3339, or a bare `YYYY-MM-DD` meaning the
    /// start of that local day.
    pub fn parse_instant(&self, raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
            .filter(|ts| is_supported(&ts.date_naive()))
            .or_else(|| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .filter(is_supported)
                    .map(|day| self.start_of_day(day))
            })
    }

    fn local_to_utc(&self, local: NaiveDateTime) -> DateTime<Utc> {
        let utc = local - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        Utc.from_utc_datetime(&utc)
    }
}

fn is_supported(day: &NaiveDate) -> bool {
    SUPPORTED_YEARS.contains(&day.year())
}

/// English weekday name, as shown on day-wise reports.
pub fn weekday_name(day: NaiveDate) -> &'static str {
    match day.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ist() -> Calendar {
        Calendar::new(FixedOffset::east_opt(330 * 60).unwrap())
    }

    #[test]
    fn monday_anchored_week_from_tuesday() {
        let cal = Calendar::utc();
        // 2024-06-11 is a Tuesday
        let week = cal.monday_anchored_week(day(2024, 6, 11));
        assert_eq!(
            week.start,
            Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap()
        );
        assert_eq!(
            week.end,
            Utc.with_ymd_and_hms(2024, 6, 16, 23, 59, 59).unwrap() + Duration::milliseconds(999)
        );
        assert!(week.contains(week.start));
        assert!(week.contains(week.end));
        assert!(!week.contains(week.end + Duration::milliseconds(1)));
        assert!(!week.contains(week.start - Duration::milliseconds(1)));
    }

    #[test]
    fn monday_anchored_week_from_sunday_looks_back_six_days() {
        let cal = Calendar::utc();
        let week = cal.monday_anchored_week(day(2024, 6, 16));
        assert_eq!(cal.local_date(week.start), day(2024, 6, 10));
        assert_eq!(cal.local_date(week.end), day(2024, 6, 16));
    }

    #[test]
    fn monday_anchored_week_from_monday_starts_same_day() {
        let cal = Calendar::utc();
        let week = cal.monday_anchored_week(day(2024, 6, 10));
        assert_eq!(cal.local_date(week.start), day(2024, 6, 10));
    }

    #[test]
    fn sunday_anchored_week_covers_monday_through_sunday() {
        let cal = Calendar::utc();
        let week = cal.sunday_anchored_week(day(2024, 6, 16));
        assert_eq!(
            week.start,
            Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap()
        );
        assert_eq!(cal.local_date(week.end), day(2024, 6, 16));
        assert_eq!(
            week,
            cal.monday_anchored_week(day(2024, 6, 12)),
            "both conventions agree when the anchor is a Sunday"
        );
    }

    #[test]
    fn local_days_respect_business_offset() {
        let cal = ist();
        // 20:00 UTC on the 10th is 01:30 on the 11th in IST
        let late = Utc.with_ymd_and_hms(2024, 6, 10, 20, 0, 0).unwrap();
        assert_eq!(cal.local_date(late), day(2024, 6, 11));
        assert_eq!(
            cal.start_of_day(day(2024, 6, 11)),
            Utc.with_ymd_and_hms(2024, 6, 10, 18, 30, 0).unwrap()
        );
    }

    #[test]
    fn days_of_week_lists_seven_consecutive_days() {
        let cal = ist();
        let week = cal.monday_anchored_week(day(2024, 6, 13));
        let days = cal.days_of_week(&week);
        assert_eq!(days[0], day(2024, 6, 10));
        assert_eq!(days[6], day(2024, 6, 16));
        assert_eq!(weekday_name(days[2]), "Wednesday");
    }

    #[test]
    fn parses_days_and_instants() {
        let cal = ist();
        assert_eq!(cal.parse_day("2024-06-11"), Some(day(2024, 6, 11)));
        assert_eq!(
            cal.parse_day("2024-06-10T20:00:00Z"),
            Some(day(2024, 6, 11))
        );
        assert_eq!(cal.parse_day("11/06/2024"), None);
        assert_eq!(
            cal.parse_instant("2024-06-11"),
            Some(cal.start_of_day(day(2024, 6, 11)))
        );
        assert_eq!(
            cal.parse_instant("2024-06-11T10:15:00+05:30"),
            Some(Utc.with_ymd_and_hms(2024, 6, 11, 4, 45, 0).unwrap())
        );
    }

    #[test]
    fn days_at_the_edge_of_chrono_range_are_rejected() {
        let cal = ist();
        assert_eq!(cal.parse_day("+262143-12-31"), None);
        assert_eq!(cal.parse_day("-262143-01-01"), None);
        assert_eq!(cal.parse_day("0000-01-03"), None);
        assert_eq!(cal.parse_instant("+262143-12-31"), None);

        let last = cal.parse_day("9999-12-31").unwrap();
        let week = cal.sunday_anchored_week(last);
        assert!(week.contains(cal.end_of_day(last)));
        let first = cal.parse_day("0001-01-01").unwrap();
        assert_eq!(cal.local_date(cal.monday_anchored_week(first).start).weekday(), Weekday::Mon);
    }
}
