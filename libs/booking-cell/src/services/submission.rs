// libs/booking-cell/src/services/submission.rs
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use shared_api::ApiClient;

use crate::error::BookingError;
use crate::models::{Appointment, AvailabilityTable, Confirmation, NewAppointment, Selection};
use crate::services::slot_table;

/// Creates appointments from a selection, one submission at a time.
pub struct AppointmentSubmitter {
    api: Arc<ApiClient>,
    in_flight: Mutex<()>,
}

impl AppointmentSubmitter {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            in_flight: Mutex::new(()),
        }
    }

    /// Re-validates `selection` against the live `table` and posts the appointment.
    ///
    /// Nothing is sent when the hour is unset or no longer available, and a
    /// call made while another is pending fails with
    /// [`BookingError::SubmissionInProgress`].
    pub async fn submit(
        &self,
        selection: &Selection,
        table: Option<&AvailabilityTable>,
    ) -> Result<Confirmation, BookingError> {
        let _guard = self.in_flight.try_lock().map_err(|_| {
            warn!("Rejecting submission for provider {}: another one is pending", selection.provider_id);
            BookingError::SubmissionInProgress
        })?;

        let hour = Self::validate(selection, table)?;

        let date = slot_table::utc_instant_for(selection.date, hour).map_err(|e| {
            error!("Selection reached submission with a non-bookable hour: {}", e);
            BookingError::InvalidSlot { hour }
        })?;

        let body = NewAppointment {
            provider_id: selection.provider_id.clone(),
            date,
        };

        debug!("Creating appointment with provider {} at {}", body.provider_id, date);

        let appointment: Appointment = self
            .api
            .post("appointments", &body)
            .await
            .map_err(|e| {
                warn!("Appointment creation failed: {}", e);
                BookingError::TransportFailure(e)
            })?;

        info!("Appointment {} created with provider {}", appointment.id, appointment.provider_id);

        Ok(Confirmation {
            appointment,
            requested_date: date,
        })
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    fn validate(selection: &Selection, table: Option<&AvailabilityTable>) -> Result<u8, BookingError> {
        let hour = selection.hour.ok_or(BookingError::StaleSelection)?;

        let still_available = table
            .filter(|table| table.is_for(&selection.provider_id, selection.date))
            .map(|table| table.is_available(hour))
            .unwrap_or(false);

        if !still_available {
            debug!(
                "Hour {} is not available for provider {} on {}",
                hour, selection.provider_id, selection.date
            );
            return Err(BookingError::StaleSelection);
        }

        Ok(hour)
    }
}
