use crate::models::{AvailabilityTable, CalendarDate, Selection};

/// The in-progress (provider, date, hour) choice of one booking screen.
///
/// Changing the provider or the date keeps the stored hour so the user's pick
/// survives date browsing, but the hour only counts once it is cross-checked
/// against an availability table for the current pair (see [`verified_hour`]).
/// `set_hour` does not validate; callers gate it on availability.
///
/// [`verified_hour`]: SelectionState::verified_hour
#[derive(Debug, Clone)]
pub struct SelectionState {
    provider_id: String,
    date: CalendarDate,
    hour: Option<u8>,
}

impl SelectionState {
    pub fn new(provider_id: impl Into<String>, date: CalendarDate) -> Self {
        Self {
            provider_id: provider_id.into(),
            date,
            hour: None,
        }
    }

    /// Returns whether the provider actually changed.
    pub fn set_provider(&mut self, provider_id: &str) -> bool {
        if self.provider_id == provider_id {
            return false;
        }
        self.provider_id = provider_id.to_string();
        true
    }

    /// Returns whether the date actually changed.
    pub fn set_date(&mut self, date: CalendarDate) -> bool {
        if self.date == date {
            return false;
        }
        self.date = date;
        true
    }

    pub fn set_hour(&mut self, hour: u8) {
        self.hour = Some(hour);
    }

    pub fn clear_hour(&mut self) {
        self.hour = None;
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    pub fn date(&self) -> CalendarDate {
        self.date
    }

    /// Stored hour, verified or not.
    pub fn hour(&self) -> Option<u8> {
        self.hour
    }

    pub fn selection(&self) -> Selection {
        Selection {
            provider_id: self.provider_id.clone(),
            date: self.date,
            hour: self.hour,
        }
    }

    /// The stored hour, if `table` belongs to the current pair and marks it available.
    pub fn verified_hour(&self, table: Option<&AvailabilityTable>) -> Option<u8> {
        let hour = self.hour?;
        let table = table?;

        if table.is_for(&self.provider_id, self.date) && table.is_available(hour) {
            Some(hour)
        } else {
            None
        }
    }

    pub fn is_hour_selected(&self, hour: u8, table: Option<&AvailabilityTable>) -> bool {
        self.verified_hour(table) == Some(hour)
    }
}
