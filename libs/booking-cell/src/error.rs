use thiserror::Error;

use shared_models::error::AppError;

use crate::models::BookingPhase;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookingError {
    #[error("Failed to fetch booking data: {0}")]
    FetchFailure(AppError),

    #[error("Selected hour is no longer available")]
    StaleSelection,

    #[error("Hour {hour} is not a bookable slot")]
    InvalidSlot { hour: u8 },

    #[error("Failed to create appointment: {0}")]
    TransportFailure(AppError),

    #[error("An appointment submission is already in progress")]
    SubmissionInProgress,

    #[error("Availability has not been loaded for the current provider and date")]
    AvailabilityNotLoaded,

    #[error("Hour {hour} is not available")]
    SlotUnavailable { hour: u8 },

    #[error("Cannot {action} while {from}")]
    InvalidTransition { from: BookingPhase, action: &'static str },
}

impl BookingError {
    /// Errors that leave the session usable; only a finished booking is final.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, BookingError::InvalidTransition { from: BookingPhase::Succeeded, .. })
    }

    /// Whether the user has to pick an hour again before submitting.
    pub fn requires_reselection(&self) -> bool {
        matches!(
            self,
            BookingError::StaleSelection | BookingError::InvalidSlot { .. } | BookingError::SlotUnavailable { .. }
        )
    }
}
