// libs/booking-cell/src/session.rs
use std::sync::Arc;

use tracing::{debug, info};

use shared_api::ApiClient;

use crate::error::BookingError;
use crate::models::{AvailabilityTable, BookingPhase, CalendarDate, Confirmation, DayPartition, Selection};
use crate::services::availability::{AvailabilityFetcher, AvailabilityTracker, FetchOutcome, FetchRequest, FetchResolution};
use crate::services::partition;
use crate::services::selection::SelectionState;
use crate::services::submission::AppointmentSubmitter;

/// State of one "create appointment" screen, from entry until the booking is made.
///
/// Provider and date changes hand back a [`FetchRequest`]. The caller resolves
/// it with [`fetcher`](Self::fetcher) (possibly on a spawned task) and feeds
/// the outcome to [`apply_availability`](Self::apply_availability); responses
/// to superseded requests are dropped there.
pub struct BookingSession {
    selection: SelectionState,
    availability: AvailabilityTracker,
    fetcher: AvailabilityFetcher,
    submitter: AppointmentSubmitter,
    phase: BookingPhase,
}

impl BookingSession {
    /// Opens the screen with the provider picked on the previous view and `today` as the date.
    pub fn open(api: Arc<ApiClient>, provider_id: &str, today: CalendarDate) -> (Self, FetchRequest) {
        let mut session = Self {
            selection: SelectionState::new(provider_id, today),
            availability: AvailabilityTracker::new(),
            fetcher: AvailabilityFetcher::new(Arc::clone(&api)),
            submitter: AppointmentSubmitter::new(api),
            phase: BookingPhase::Idle,
        };

        session.transition(BookingPhase::ProviderChosen);
        session.transition(BookingPhase::DateChosen);
        let request = session.availability.issue(provider_id, today);

        (session, request)
    }

    pub fn phase(&self) -> BookingPhase {
        self.phase
    }

    pub fn selection(&self) -> Selection {
        self.selection.selection()
    }

    pub fn fetcher(&self) -> &AvailabilityFetcher {
        &self.fetcher
    }

    /// The table on screen. It may still belong to the previous provider or date.
    pub fn availability(&self) -> Option<&AvailabilityTable> {
        self.availability.table()
    }

    pub fn is_awaiting_availability(&self) -> bool {
        self.availability.is_awaiting()
    }

    pub fn select_provider(&mut self, provider_id: &str) -> Result<Option<FetchRequest>, BookingError> {
        self.ensure_editable("change provider")?;

        if !self.selection.set_provider(provider_id) {
            return Ok(None);
        }

        self.transition(BookingPhase::DateChosen);
        Ok(Some(self.issue_fetch()))
    }

    pub fn select_date(&mut self, date: CalendarDate) -> Result<Option<FetchRequest>, BookingError> {
        self.ensure_editable("change date")?;

        if !self.selection.set_date(date) {
            return Ok(None);
        }

        self.transition(BookingPhase::DateChosen);
        Ok(Some(self.issue_fetch()))
    }

    /// Re-requests availability for the current pair, e.g. after a failed fetch.
    pub fn refresh_availability(&mut self) -> Result<FetchRequest, BookingError> {
        self.ensure_editable("refresh availability")?;
        Ok(self.issue_fetch())
    }

    pub fn apply_availability(&mut self, outcome: FetchOutcome) -> Result<FetchResolution, BookingError> {
        if matches!(self.phase, BookingPhase::Submitting | BookingPhase::Succeeded) {
            debug!("Ignoring availability response #{} while {}", outcome.request.tag, self.phase);
            return Ok(FetchResolution::Discarded);
        }

        let resolution = self.availability.apply(outcome)?;

        if resolution == FetchResolution::Applied {
            let next = if self.selection.verified_hour(self.availability.table()).is_some() {
                BookingPhase::HourChosen
            } else {
                BookingPhase::AvailabilityLoaded
            };
            self.transition(next);
        }

        Ok(resolution)
    }

    /// Morning and afternoon groups of the table on screen.
    pub fn partition(&self) -> DayPartition {
        self.availability
            .table()
            .map(|table| partition::partition(&table.slots))
            .unwrap_or_default()
    }

    /// Records a tapped hour. Only hours marked available in the current table are accepted.
    pub fn select_hour(&mut self, hour: u8) -> Result<(), BookingError> {
        match self.phase {
            BookingPhase::AvailabilityLoaded | BookingPhase::HourChosen | BookingPhase::Failed => {}
            BookingPhase::Submitting | BookingPhase::Succeeded => {
                return Err(BookingError::InvalidTransition { from: self.phase, action: "select hour" });
            }
            _ => return Err(BookingError::AvailabilityNotLoaded),
        }

        let table = self
            .availability
            .table_for(self.selection.provider_id(), self.selection.date())
            .ok_or(BookingError::AvailabilityNotLoaded)?;

        if !table.is_available(hour) {
            return Err(BookingError::SlotUnavailable { hour });
        }

        self.selection.set_hour(hour);
        self.transition(BookingPhase::HourChosen);
        Ok(())
    }

    /// Whether `hour` should render as selected: stored and available in the current table.
    pub fn is_hour_selected(&self, hour: u8) -> bool {
        self.verified_hour() == Some(hour)
    }

    /// The stored hour, if the current table still offers it. `None` while a
    /// provider or date change is waiting for its table.
    pub fn verified_hour(&self) -> Option<u8> {
        if self.phase == BookingPhase::DateChosen {
            return None;
        }
        self.selection.verified_hour(self.availability.table())
    }

    /// Submits the current selection. On a transport failure the selection is kept for a retry.
    pub async fn submit(&mut self) -> Result<Confirmation, BookingError> {
        match self.phase {
            BookingPhase::HourChosen | BookingPhase::Failed => {}
            BookingPhase::DateChosen | BookingPhase::AvailabilityLoaded => {
                debug!("Nothing to submit while {}", self.phase);
                return Err(BookingError::StaleSelection);
            }
            _ => return Err(BookingError::InvalidTransition { from: self.phase, action: "submit" }),
        }

        let selection = self.selection.selection();
        self.transition(BookingPhase::Submitting);

        let result = self.submitter.submit(&selection, self.availability.table()).await;

        match &result {
            Ok(confirmation) => {
                info!("Booking confirmed: appointment {}", confirmation.appointment.id);
                self.transition(BookingPhase::Succeeded);
            }
            Err(BookingError::TransportFailure(_)) => self.transition(BookingPhase::Failed),
            Err(_) => self.transition(BookingPhase::AvailabilityLoaded),
        }

        result
    }

    fn ensure_editable(&self, action: &'static str) -> Result<(), BookingError> {
        match self.phase {
            BookingPhase::Submitting | BookingPhase::Succeeded => {
                Err(BookingError::InvalidTransition { from: self.phase, action })
            }
            _ => Ok(()),
        }
    }

    fn issue_fetch(&mut self) -> FetchRequest {
        self.availability.issue(self.selection.provider_id(), self.selection.date())
    }

    fn transition(&mut self, next: BookingPhase) {
        if self.phase != next {
            debug!("Booking session: {} -> {}", self.phase, next);
            self.phase = next;
        }
    }
}
