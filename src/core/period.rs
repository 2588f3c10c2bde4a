use std::{
    fmt::{Debug, Display, Formatter},
    str::FromStr,
};

use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use serde_with::{DeserializeFromStr, SerializeDisplay};

/// Start of a fixed-width settlement period.
///
/// The wrapped timestamp is always aligned to [`SettlementPeriod::DURATION`],
/// so two periods compare and hash equal if and only if they denote the same accounting window.
#[must_use]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct SettlementPeriod(NaiveDateTime);

impl SettlementPeriod {
    pub const DURATION: TimeDelta = TimeDelta::minutes(30);

    /// Text form used for ledger and prediction keys.
    pub const FORMAT: &'static str = "%Y-%m-%dT%H:%M:%S";

    /// Wrap the period start, rejecting timestamps not aligned to the period grid.
    pub fn try_from_start(start: NaiveDateTime) -> Result<Self, InvalidPeriod> {
        let is_aligned = start.nanosecond() == 0
            && start.second() == 0
            && start.minute() % Self::minutes_per_period() == 0;
        if is_aligned { Ok(Self(start)) } else { Err(InvalidPeriod::Misaligned(start)) }
    }

    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn minutes_per_period() -> u32 {
        Self::DURATION.num_minutes() as u32
    }

    #[must_use]
    pub const fn start(self) -> NaiveDateTime {
        self.0
    }

    /// Calendar day the period belongs to.
    #[must_use]
    pub const fn day(self) -> NaiveDate {
        self.0.date()
    }

    #[must_use]
    pub fn is_start_of_day(self) -> bool {
        self.0.time() == chrono::NaiveTime::MIN
    }

    pub fn offset(self, n_periods: i32) -> Self {
        Self(self.0 + Self::DURATION * n_periods)
    }

    pub fn next(self) -> Self {
        self.offset(1)
    }

    /// Number of whole periods from `self` to `other`, negative when `other` is earlier.
    #[must_use]
    pub fn periods_until(self, other: Self) -> i64 {
        (other.0 - self.0).num_minutes() / Self::DURATION.num_minutes()
    }

    /// Convert a lead time into the number of periods, requiring a positive multiple of the period width.
    pub fn n_periods_in(lead_time: TimeDelta) -> Result<i32, InvalidPeriod> {
        i32::try_from(lead_time.num_seconds() / Self::DURATION.num_seconds())
            .ok()
            .filter(|n_periods| *n_periods > 0 && Self::DURATION * *n_periods == lead_time)
            .ok_or(InvalidPeriod::LeadTime(lead_time))
    }
}

impl Display for SettlementPeriod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0.format(Self::FORMAT), f)
    }
}

impl Debug for SettlementPeriod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl FromStr for SettlementPeriod {
    type Err = InvalidPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from_start(NaiveDateTime::parse_from_str(s, Self::FORMAT)?)
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum InvalidPeriod {
    #[display("malformed settlement period: {_0}")]
    Malformed(chrono::ParseError),

    #[display("`{_0}` is not aligned to a settlement period boundary")]
    #[from(ignore)]
    Misaligned(#[error(not(source))] NaiveDateTime),

    #[display("lead time `{_0}` is not a positive multiple of the settlement period")]
    #[from(ignore)]
    LeadTime(#[error(not(source))] TimeDelta),
}

/// Inclusive range of settlement periods to simulate.
#[must_use]
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct Window {
    pub first: SettlementPeriod,
    pub last: SettlementPeriod,
}

impl Debug for Window {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}..={:?}", self.first, self.last)
    }
}

impl Window {
    pub const fn new(first: SettlementPeriod, last: SettlementPeriod) -> Self {
        Self { first, last }
    }

    #[must_use]
    pub fn len(self) -> usize {
        usize::try_from(self.first.periods_until(self.last) + 1).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    pub fn iter(self) -> impl Iterator<Item = SettlementPeriod> {
        (0..self.len())
            .map_while(move |index| i32::try_from(index).ok().map(|index| self.first.offset(index)))
    }
}
