// libs/booking-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, Datelike, Local, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

// ==============================================================================
// CALENDAR
// ==============================================================================

/// A day in the requester's local calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    /// `month` is 1-based. Returns `None` for dates that do not exist.
    pub fn new(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn naive(&self) -> NaiveDate {
        self.0
    }

    /// `day`, `month`, `year` query parameters, as the API expects them.
    pub fn query_params(&self) -> [(&'static str, String); 3] {
        [
            ("day", self.day().to_string()),
            ("month", self.month().to_string()),
            ("year", self.year().to_string()),
        ]
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

// ==============================================================================
// PROVIDERS AND AVAILABILITY
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub hour: u8,
    pub available: bool,
}

impl AvailabilitySlot {
    pub fn new(hour: u8, available: bool) -> Self {
        Self { hour, available }
    }
}

/// All slots for one (provider, date) pair. Replaced wholesale on every fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityTable {
    pub provider_id: String,
    pub date: CalendarDate,
    pub slots: Vec<AvailabilitySlot>,
}

impl AvailabilityTable {
    pub fn new(provider_id: impl Into<String>, date: CalendarDate, slots: Vec<AvailabilitySlot>) -> Self {
        Self {
            provider_id: provider_id.into(),
            date,
            slots,
        }
    }

    pub fn is_for(&self, provider_id: &str, date: CalendarDate) -> bool {
        self.provider_id == provider_id && self.date == date
    }

    pub fn is_available(&self, hour: u8) -> bool {
        self.slots.iter().any(|slot| slot.hour == hour && slot.available)
    }

    pub fn available_hours(&self) -> impl Iterator<Item = u8> + '_ {
        self.slots.iter().filter(|slot| slot.available).map(|slot| slot.hour)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplaySlot {
    pub hour: u8,
    /// Two-digit 24h hour followed by `:00`, e.g. `08:00`.
    pub label: String,
    pub available: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DayPartition {
    pub morning: Vec<DisplaySlot>,
    pub afternoon: Vec<DisplaySlot>,
}

// ==============================================================================
// SELECTION AND SESSION STATE
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub provider_id: String,
    pub date: CalendarDate,
    pub hour: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingPhase {
    Idle,
    ProviderChosen,
    /// Provider and date known, waiting for the matching availability.
    DateChosen,
    AvailabilityLoaded,
    HourChosen,
    Submitting,
    Succeeded,
    Failed,
}

impl fmt::Display for BookingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingPhase::Idle => write!(f, "idle"),
            BookingPhase::ProviderChosen => write!(f, "provider_chosen"),
            BookingPhase::DateChosen => write!(f, "date_chosen"),
            BookingPhase::AvailabilityLoaded => write!(f, "availability_loaded"),
            BookingPhase::HourChosen => write!(f, "hour_chosen"),
            BookingPhase::Submitting => write!(f, "submitting"),
            BookingPhase::Succeeded => write!(f, "succeeded"),
            BookingPhase::Failed => write!(f, "failed"),
        }
    }
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

/// Body of `POST /appointments`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAppointment {
    pub provider_id: String,
    #[serde(serialize_with = "serialize_millis_utc")]
    pub date: DateTime<Utc>,
}

/// Server-side appointment as returned on creation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub provider_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub date: DateTime<Utc>,
}

/// Entry of `GET /appointments/me`; `user` is the other party of the booking.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScheduledAppointment {
    pub id: String,
    pub provider_id: String,
    pub user_id: String,
    pub date: DateTime<Utc>,
    pub user: Provider,
}

/// Dashboard row derived from a [`ScheduledAppointment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgendaEntry {
    pub id: String,
    pub provider_name: String,
    pub avatar_url: String,
    /// `DD/MM/YYYY` in the provider calendar.
    pub date_label: String,
    pub hour_label: String,
}

/// Result of a successful submission, handed to the confirmation view.
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    pub appointment: Appointment,
    pub requested_date: DateTime<Utc>,
}

impl Confirmation {
    pub fn timestamp_millis(&self) -> i64 {
        self.requested_date.timestamp_millis()
    }
}

/// `2024-03-10T11:00:00.000Z`; the server compares this string form.
fn serialize_millis_utc<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Millis, true))
}
