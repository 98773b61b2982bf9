//! Half-open time range types for reservation periods.
//!
//! This module provides the [`TimeRange`] value type used everywhere a
//! booking period appears. Ranges are always half-open (`[start, end)`)
//! and always in UTC: external inputs (local dates, facility day bounds)
//! are normalized exactly once, at construction, so internal overlap
//! logic never re-interprets ambiguous local times.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Default start-of-day for whole-day bookings (facility opening).
pub const DAY_START: NaiveTime = match NaiveTime::from_hms_opt(7, 30, 0) {
    Some(t) => t,
    None => unreachable!(),
};

/// Default end-of-day for whole-day bookings (facility closing).
pub const DAY_END: NaiveTime = match NaiveTime::from_hms_opt(16, 30, 0) {
    Some(t) => t,
    None => unreachable!(),
};

/// A half-open UTC time range `[start, end)`.
///
/// The end instant itself is excluded, so back-to-back reservations
/// (`[09:00, 10:00)` followed by `[10:00, 11:00)`) never conflict.
///
/// # Examples
///
/// ```
/// use aula::TimeRange;
/// use chrono::{TimeZone, Utc};
///
/// let morning = TimeRange::new(
///     Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
///     Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap(),
/// ).unwrap();
/// let next = TimeRange::new(
///     Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap(),
///     Utc.with_ymd_and_hms(2026, 3, 2, 11, 0, 0).unwrap(),
/// ).unwrap();
///
/// // Back-to-back is not an overlap.
/// assert!(!morning.intersects(&next));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeRange {
    /// Creates a new range from explicit UTC instants.
    ///
    /// # Errors
    ///
    /// Returns an error if `start >= end` (empty or inverted ranges are
    /// never valid reservation periods).
    ///
    /// # Examples
    ///
    /// ```
    /// use aula::TimeRange;
    /// use chrono::{TimeZone, Utc};
    ///
    /// let start = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();
    /// let end = Utc.with_ymd_and_hms(2026, 3, 2, 17, 0, 0).unwrap();
    /// assert!(TimeRange::new(start, end).is_ok());
    /// assert!(TimeRange::new(end, start).is_err());
    /// assert!(TimeRange::new(start, start).is_err());
    /// ```
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, InvalidRangeError> {
        if start >= end {
            return Err(InvalidRangeError {
                start,
                end,
                reason: "range start must be strictly before range end".into(),
            });
        }
        Ok(Self { start, end })
    }

    /// Normalizes a pair of calendar dates into a whole-day booking range.
    ///
    /// The range spans from [`DAY_START`] on `start_date` to [`DAY_END`]
    /// on `end_date`, interpreted as UTC. This is the single normalization
    /// boundary for date-based external input; callers must not construct
    /// day ranges any other way.
    ///
    /// # Errors
    ///
    /// Returns an error if `end_date` is before `start_date`.
    ///
    /// # Examples
    ///
    /// ```
    /// use aula::TimeRange;
    /// use chrono::NaiveDate;
    ///
    /// let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    /// let range = TimeRange::from_dates(day, day).unwrap();
    /// assert_eq!(range.start().time().to_string(), "07:30:00");
    /// assert_eq!(range.end().time().to_string(), "16:30:00");
    /// ```
    pub fn from_dates(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self, InvalidRangeError> {
        Self::from_dates_with_hours(start_date, end_date, DAY_START, DAY_END)
    }

    /// Normalizes calendar dates with explicit facility day bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting range would be empty or inverted.
    pub fn from_dates_with_hours(
        start_date: NaiveDate,
        end_date: NaiveDate,
        day_start: NaiveTime,
        day_end: NaiveTime,
    ) -> Result<Self, InvalidRangeError> {
        let start = start_date.and_time(day_start).and_utc();
        let end = end_date.and_time(day_end).and_utc();
        Self::new(start, end)
    }

    /// Reconstructs a range from stored Unix epoch seconds.
    ///
    /// # Errors
    ///
    /// Returns an error if either timestamp is out of the representable
    /// range or the pair is empty/inverted. Stored rows always satisfy
    /// this, so a failure indicates corruption.
    pub fn from_unix(start_secs: i64, end_secs: i64) -> Result<Self, InvalidRangeError> {
        let start = DateTime::from_timestamp(start_secs, 0).ok_or_else(|| InvalidRangeError {
            start: DateTime::UNIX_EPOCH,
            end: DateTime::UNIX_EPOCH,
            reason: format!("stored start timestamp {start_secs} is unrepresentable"),
        })?;
        let end = DateTime::from_timestamp(end_secs, 0).ok_or_else(|| InvalidRangeError {
            start,
            end: DateTime::UNIX_EPOCH,
            reason: format!("stored end timestamp {end_secs} is unrepresentable"),
        })?;
        Self::new(start, end)
    }

    /// Returns the inclusive start instant.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Returns the exclusive end instant.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns the start instant as Unix epoch seconds for storage.
    #[must_use]
    pub const fn start_unix(&self) -> i64 {
        self.start.timestamp()
    }

    /// Returns the end instant as Unix epoch seconds for storage.
    #[must_use]
    pub const fn end_unix(&self) -> i64 {
        self.end.timestamp()
    }

    /// Checks whether two half-open ranges overlap by a positive duration.
    ///
    /// The test is `a.start < b.end && b.start < a.end`; touching
    /// endpoints do not intersect.
    ///
    /// # Examples
    ///
    /// ```
    /// use aula::TimeRange;
    /// use chrono::{TimeZone, Utc};
    ///
    /// let a = TimeRange::new(
    ///     Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap(),
    ///     Utc.with_ymd_and_hms(2026, 3, 2, 17, 0, 0).unwrap(),
    /// ).unwrap();
    /// let b = TimeRange::new(
    ///     Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap(),
    ///     Utc.with_ymd_and_hms(2026, 3, 2, 13, 0, 0).unwrap(),
    /// ).unwrap();
    /// assert!(a.intersects(&b));
    /// assert!(b.intersects(&a));
    /// ```
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Checks whether an instant falls inside the range.
    ///
    /// The start is included, the end is not.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Returns true if the whole range lies before `instant`.
    ///
    /// Because the end is exclusive, a range ending exactly at `instant`
    /// has already completed.
    #[must_use]
    pub fn ends_before(&self, instant: DateTime<Utc>) -> bool {
        self.end <= instant
    }

    /// Returns true if the range has started at or before `instant`.
    #[must_use]
    pub fn started_by(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}

/// Error type for invalid reservation ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRangeError {
    /// The offending start instant.
    pub start: DateTime<Utc>,
    /// The offending end instant.
    pub end: DateTime<Utc>,
    /// The reason the range is invalid.
    pub reason: String,
}

impl fmt::Display for InvalidRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid range {} .. {}: {}",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M"),
            self.reason
        )
    }
}

impl std::error::Error for InvalidRangeError {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn range(start: DateTime<Utc>, end: DateTime<Utc>) -> TimeRange {
        TimeRange::new(start, end).unwrap()
    }

    #[test]
    fn test_new_rejects_inverted_range() {
        let start = utc(2026, 3, 2, 8, 0);
        let end = utc(2026, 3, 2, 17, 0);
        assert!(TimeRange::new(end, start).is_err());
    }

    #[test]
    fn test_new_rejects_empty_range() {
        let start = utc(2026, 3, 2, 8, 0);
        let result = TimeRange::new(start, start);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.reason.contains("strictly before"));
    }

    #[test]
    fn test_back_to_back_ranges_do_not_intersect() {
        let a = range(utc(2026, 3, 2, 9, 0), utc(2026, 3, 2, 10, 0));
        let b = range(utc(2026, 3, 2, 10, 0), utc(2026, 3, 2, 11, 0));
        assert!(!a.intersects(&b));
        assert!(!b.intersects(&a));
    }

    #[test]
    fn test_positive_overlap_intersects() {
        let a = range(utc(2026, 3, 2, 8, 0), utc(2026, 3, 2, 17, 0));
        let b = range(utc(2026, 3, 2, 12, 0), utc(2026, 3, 2, 13, 0));
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn test_identical_ranges_intersect() {
        let a = range(utc(2026, 3, 2, 8, 0), utc(2026, 3, 2, 17, 0));
        assert!(a.intersects(&a));
    }

    #[test]
    fn test_disjoint_ranges_do_not_intersect() {
        let a = range(utc(2026, 3, 2, 8, 0), utc(2026, 3, 2, 12, 0));
        let b = range(utc(2026, 3, 3, 8, 0), utc(2026, 3, 3, 12, 0));
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_contains_half_open() {
        let a = range(utc(2026, 3, 2, 8, 0), utc(2026, 3, 2, 17, 0));
        assert!(a.contains(utc(2026, 3, 2, 8, 0)));
        assert!(a.contains(utc(2026, 3, 2, 16, 59)));
        assert!(!a.contains(utc(2026, 3, 2, 17, 0)));
        assert!(!a.contains(utc(2026, 3, 2, 7, 59)));
    }

    #[test]
    fn test_from_dates_uses_facility_day_bounds() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        let r = TimeRange::from_dates(start, end).unwrap();
        assert_eq!(r.start().time(), DAY_START);
        assert_eq!(r.end().time(), DAY_END);
        assert_eq!(r.start().date_naive(), start);
        assert_eq!(r.end().date_naive(), end);
    }

    #[test]
    fn test_from_dates_rejects_inverted_dates() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert!(TimeRange::from_dates(start, end).is_err());
    }

    #[test]
    fn test_unix_round_trip() {
        let r = range(utc(2026, 3, 2, 8, 0), utc(2026, 3, 2, 17, 0));
        let restored = TimeRange::from_unix(r.start_unix(), r.end_unix()).unwrap();
        assert_eq!(r, restored);
    }

    #[test]
    fn test_from_unix_rejects_inverted() {
        assert!(TimeRange::from_unix(100, 50).is_err());
        assert!(TimeRange::from_unix(100, 100).is_err());
    }

    #[test]
    fn test_ends_before_is_exclusive() {
        let r = range(utc(2026, 3, 2, 8, 0), utc(2026, 3, 2, 17, 0));
        assert!(r.ends_before(utc(2026, 3, 2, 17, 0)));
        assert!(!r.ends_before(utc(2026, 3, 2, 16, 59)));
    }

    #[test]
    fn test_display_format() {
        let r = range(utc(2026, 3, 2, 8, 0), utc(2026, 3, 2, 17, 0));
        let display = format!("{r}");
        assert!(display.starts_with('['));
        assert!(display.ends_with(')'));
        assert!(display.contains("2026-03-02 08:00"));
    }

    #[test]
    fn test_serde_round_trip() {
        let r = range(utc(2026, 3, 2, 8, 0), utc(2026, 3, 2, 17, 0));
        let json = serde_json::to_string(&r).unwrap();
        let restored: TimeRange = serde_json::from_str(&json).unwrap();
        assert_eq!(r, restored);
    }
}
