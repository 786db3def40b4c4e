// libs/booking-cell/src/services/slot_table.rs
//! Fixed mapping between bookable local hours and their UTC clock time.
//!
//! Providers keep their calendar at a constant UTC-3 offset, so the mapping is
//! a literal table rather than a timezone lookup.

use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use thiserror::Error;

use crate::models::CalendarDate;

/// Local hour → UTC hour, one row per bookable slot.
static SLOT_TABLE: [(u8, u32); 10] = [
    (8, 11),
    (9, 12),
    (10, 13),
    (11, 14),
    (12, 15),
    (13, 16),
    (14, 17),
    (15, 18),
    (16, 19),
    (17, 20),
];

const PROVIDER_OFFSET_SECONDS: i64 = -3 * 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("hour {hour} is not bookable")]
pub struct NotBookable {
    pub hour: u8,
}

pub fn bookable_hours() -> impl Iterator<Item = u8> {
    SLOT_TABLE.iter().map(|(local, _)| *local)
}

pub fn is_bookable(hour: u8) -> bool {
    SLOT_TABLE.iter().any(|(local, _)| *local == hour)
}

/// UTC instant of a bookable `hour` on `date`, minutes and seconds zero.
pub fn utc_instant_for(date: CalendarDate, hour: u8) -> Result<DateTime<Utc>, NotBookable> {
    let utc_hour = SLOT_TABLE
        .iter()
        .find(|(local, _)| *local == hour)
        .map(|(_, utc)| *utc)
        .ok_or(NotBookable { hour })?;

    let time = NaiveTime::from_hms_opt(utc_hour, 0, 0).ok_or(NotBookable { hour })?;
    Ok(Utc.from_utc_datetime(&date.naive().and_time(time)))
}

fn provider_wall_clock(instant: DateTime<Utc>) -> NaiveDateTime {
    (instant + Duration::seconds(PROVIDER_OFFSET_SECONDS)).naive_utc()
}

/// Hour of `instant` on the provider's clock.
pub fn local_hour_for(instant: DateTime<Utc>) -> u8 {
    provider_wall_clock(instant).hour() as u8
}

/// Calendar day of `instant` on the provider's clock.
pub fn local_date_for(instant: DateTime<Utc>) -> CalendarDate {
    CalendarDate::from(provider_wall_clock(instant).date())
}
