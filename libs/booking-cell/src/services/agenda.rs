// libs/booking-cell/src/services/agenda.rs
use std::sync::Arc;

use tracing::{debug, warn};

use shared_api::ApiClient;
use shared_config::AppConfig;

use crate::error::BookingError;
use crate::models::{AgendaEntry, CalendarDate, ScheduledAppointment};
use crate::services::slot_table;

/// The signed-in user's appointments for one day (dashboard list).
pub struct AgendaService {
    api: Arc<ApiClient>,
    default_avatar_url: String,
}

impl AgendaService {
    pub fn new(api: Arc<ApiClient>, config: &AppConfig) -> Self {
        Self {
            api,
            default_avatar_url: config.default_avatar_url.clone(),
        }
    }

    /// `GET /appointments/me?day=D&month=M&year=Y`
    pub async fn scheduled_on(&self, date: CalendarDate) -> Result<Vec<ScheduledAppointment>, BookingError> {
        debug!("Fetching own appointments for {}", date);

        self.api
            .get("appointments/me", &date.query_params())
            .await
            .map_err(|e| {
                warn!("Failed to fetch appointments for {}: {}", date, e);
                BookingError::FetchFailure(e)
            })
    }

    /// Dashboard rows for `date`; an empty list means nothing is booked.
    pub async fn appointments_on(&self, date: CalendarDate) -> Result<Vec<AgendaEntry>, BookingError> {
        let appointments = self.scheduled_on(date).await?;

        Ok(appointments
            .iter()
            .map(|appointment| self.entry_for(appointment))
            .collect())
    }

    /// Labels come from the appointment's own instant on the provider clock.
    pub fn entry_for(&self, appointment: &ScheduledAppointment) -> AgendaEntry {
        let local_date = slot_table::local_date_for(appointment.date);
        let local_hour = slot_table::local_hour_for(appointment.date);

        AgendaEntry {
            id: appointment.id.clone(),
            provider_name: appointment.user.name.clone(),
            avatar_url: appointment
                .user
                .avatar_url
                .clone()
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| self.default_avatar_url.clone()),
            date_label: local_date.naive().format("%d/%m/%Y").to_string(),
            hour_label: format!("Às {} Horas", local_hour),
        }
    }
}
