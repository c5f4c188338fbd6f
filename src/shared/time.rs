use std::{
    fmt::Display,
    ops::{Add, AddAssign, Sub},
};

use chrono::{Datelike, Local, NaiveDate, Timelike, Weekday};
use serde::{Deserialize, Serialize};

pub const MAX: Time = Time(u32::MAX);
pub const MIN: Time = Time(u32::MIN);

/// Seconds since midnight of the service day. GTFS allows values past 24:00:00
/// for trips that run over midnight, so this is not wrapped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Time(u32);

impl From<u32> for Time {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl Sub<Time> for Time {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Self::Output {
        Duration(self.0.saturating_sub(rhs.0))
    }
}

impl Add<Duration> for Time {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign<Duration> for Time {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 = self.0.saturating_add(rhs.0)
    }
}

impl Display for Time {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hms_string())
    }
}

impl Time {
    pub fn now() -> Self {
        let now = Local::now();
        Self(now.num_seconds_from_midnight())
    }

    pub const fn from_seconds(secs: u32) -> Self {
        Self(secs)
    }

    pub const fn from_hms_parts(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self(hours * 3600 + minutes * 60 + seconds)
    }

    pub const fn as_seconds(&self) -> u32 {
        self.0
    }

    pub fn to_hms_string(&self) -> String {
        let h = self.0 / 3600;
        let m = (self.0 % 3600) / 60;
        let s = self.0 % 60;
        format!("{:02}:{:02}:{:02}", h, m, s)
    }

    /// Parses `HH:MM:SS`. Surrounding whitespace is ignored, single digit
    /// hours (`8:00:00`) are accepted as GTFS feeds commonly contain them.
    pub fn from_hms(time: &str) -> Option<Self> {
        const HOUR_TO_SEC: u32 = 60 * 60;
        const MINUTE_TO_SEC: u32 = 60;
        let mut split = time.trim().split(':');
        let hours: u32 = split.next()?.parse().ok()?;
        let minutes: u32 = split.next()?.parse().ok()?;
        let seconds: u32 = split.next()?.parse().ok()?;
        if split.next().is_some() || minutes >= 60 || seconds >= 60 {
            return None;
        }
        Some(Self(hours * HOUR_TO_SEC + minutes * MINUTE_TO_SEC + seconds))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Duration(u32);

impl From<u32> for Duration {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl Duration {
    pub const ZERO: Duration = Duration(0);

    pub const fn from_seconds(secs: u32) -> Self {
        Self(secs)
    }

    pub const fn from_minutes(minutes: u32) -> Self {
        Self(minutes * 60)
    }

    pub const fn from_hours(hours: u32) -> Self {
        Self(hours * 60 * 60)
    }

    pub const fn as_seconds(&self) -> u32 {
        self.0
    }
}

impl Add for Duration {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Duration {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0)
    }
}

/// A calendar day of service.
///
/// GTFS writes dates as `YYYYMMDD`; this keeps them as a [`NaiveDate`] so that
/// stepping to the next day handles month ends and leap years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceDate(NaiveDate);

impl ServiceDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Parses the integer form, e.g. `20250507`.
    pub fn from_yyyymmdd(value: u32) -> Option<Self> {
        let year = (value / 10_000) as i32;
        let month = (value / 100) % 100;
        let day = value % 100;
        Self::from_ymd(year, month, day)
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.len() != 8 {
            return None;
        }
        Self::from_yyyymmdd(value.parse().ok()?)
    }

    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    pub fn as_yyyymmdd(&self) -> u32 {
        self.0.year() as u32 * 10_000 + self.0.month() * 100 + self.0.day()
    }

    pub fn weekday(&self) -> Weekday {
        self.0.weekday()
    }

    pub fn succ(&self) -> Option<Self> {
        self.0.succ_opt().map(Self)
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for ServiceDate {
    fn from(value: NaiveDate) -> Self {
        Self(value)
    }
}

impl Display for ServiceDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08}", self.as_yyyymmdd())
    }
}

/// The moment a query leaves: a time of day on a given service date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Departure {
    pub time: Time,
    pub date: ServiceDate,
}

impl Departure {
    pub fn new(time: Time, date: ServiceDate) -> Self {
        Self { time, date }
    }

    pub fn now() -> Self {
        Self::new(Time::now(), ServiceDate::today())
    }

    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }

    /// The same query moved to `start` on the following service day.
    pub fn next_day(&self, start: Time) -> Option<Self> {
        Some(Self::new(start, self.date.succ()?))
    }
}

#[test]
fn parse_unparse() {
    for time in ["00:00:00", "00:00:30", "00:30:00", "12:00:00", "12:30:30", "25:10:00"] {
        let stime = Time::from_hms(time).unwrap();
        assert_eq!(time, stime.to_hms_string())
    }
}

#[test]
fn valid_time_test() {
    assert_eq!(Time::from_hms("00:00:30").unwrap().as_seconds(), 30);
    assert_eq!(Time::from_hms("00:01:30").unwrap().as_seconds(), 90);
    assert_eq!(Time::from_hms(" 01:01:30 ").unwrap().as_seconds(), 3690);
    assert_eq!(Time::from_hms("8:00:00").unwrap().as_seconds(), 28_800);
}

#[test]
fn invalid_time_test() {
    assert!(Time::from_hms("00:00:0a").is_none());
    assert!(Time::from_hms("00:00").is_none());
    assert!(Time::from_hms("00:61:00").is_none());
}

#[test]
fn date_rollover_test() {
    let next = |value| ServiceDate::from_yyyymmdd(value).unwrap().succ().unwrap().as_yyyymmdd();
    assert_eq!(next(20250507), 20250508);
    assert_eq!(next(20250430), 20250501);
    assert_eq!(next(20241231), 20250101);
    assert_eq!(next(20240228), 20240229);
    assert_eq!(next(20250228), 20250301);
    assert_eq!(next(21000228), 21000301);
    assert_eq!(next(20000228), 20000229);
}

#[test]
fn invalid_date_test() {
    assert!(ServiceDate::from_yyyymmdd(20250230).is_none());
    assert!(ServiceDate::parse("2025-05-07").is_none());
    assert_eq!(
        ServiceDate::parse("20250507").map(|d| d.weekday()),
        Some(Weekday::Wed)
    );
}
