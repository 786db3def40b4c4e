use crate::models::{AvailabilitySlot, DayPartition, DisplaySlot};

/// First hour that belongs to the afternoon group.
pub const NOON: u8 = 12;

pub fn hour_label(hour: u8) -> String {
    format!("{:02}:00", hour)
}

/// Splits a day's slots into morning (< 12h) and afternoon groups, keeping input order.
pub fn partition(slots: &[AvailabilitySlot]) -> DayPartition {
    let (morning, afternoon): (Vec<_>, Vec<_>) = slots
        .iter()
        .map(|slot| DisplaySlot {
            hour: slot.hour,
            label: hour_label(slot.hour),
            available: slot.available,
        })
        .partition(|slot| slot.hour < NOON);

    DayPartition { morning, afternoon }
}
