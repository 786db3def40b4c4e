// libs/booking-cell/src/services/availability.rs
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, warn};

use shared_api::ApiClient;
use shared_models::error::AppError;

use crate::error::BookingError;
use crate::models::{AvailabilitySlot, AvailabilityTable, CalendarDate};

/// One issued availability request. `tag` grows with every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub tag: u64,
    pub provider_id: String,
    pub date: CalendarDate,
}

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub request: FetchRequest,
    pub result: Result<Vec<AvailabilitySlot>, AppError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchResolution {
    /// The response belonged to the latest request and replaced the table.
    Applied,
    /// A newer request was issued after this one; the response was dropped.
    Discarded,
}

/// Requests day availability for a provider.
#[derive(Clone)]
pub struct AvailabilityFetcher {
    api: Arc<ApiClient>,
}

impl AvailabilityFetcher {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// `GET /providers/{id}/day-availability?day=D&month=M&year=Y`
    pub async fn fetch_day(
        &self,
        provider_id: &str,
        date: CalendarDate,
    ) -> Result<Vec<AvailabilitySlot>, BookingError> {
        Self::request_day(&self.api, provider_id, date)
            .await
            .map_err(BookingError::FetchFailure)
    }

    /// Resolves `request` without borrowing the fetcher, so the future can be spawned.
    pub fn fetch(&self, request: FetchRequest) -> BoxFuture<'static, FetchOutcome> {
        let api = Arc::clone(&self.api);

        async move {
            let result = Self::request_day(&api, &request.provider_id, request.date).await;
            FetchOutcome { request, result }
        }
        .boxed()
    }

    async fn request_day(
        api: &ApiClient,
        provider_id: &str,
        date: CalendarDate,
    ) -> Result<Vec<AvailabilitySlot>, AppError> {
        debug!("Fetching availability for provider {} on {}", provider_id, date);

        let path = format!("providers/{}/day-availability", urlencoding::encode(provider_id));
        let slots: Vec<AvailabilitySlot> = api.get(&path, &date.query_params()).await?;

        let (valid, invalid): (Vec<_>, Vec<_>) = slots.into_iter().partition(|slot| slot.hour <= 23);
        if !invalid.is_empty() {
            warn!("Dropping {} availability slots with an hour outside 0-23", invalid.len());
        }

        Ok(valid)
    }
}

/// Holds the live availability table and applies only the latest fetch.
#[derive(Debug, Default)]
pub struct AvailabilityTracker {
    latest_tag: u64,
    settled_tag: u64,
    table: Option<AvailabilityTable>,
}

impl AvailabilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new request for `(provider_id, date)`; every earlier request becomes stale.
    pub fn issue(&mut self, provider_id: &str, date: CalendarDate) -> FetchRequest {
        self.latest_tag += 1;
        debug!("Issuing availability request #{} for {} on {}", self.latest_tag, provider_id, date);

        FetchRequest {
            tag: self.latest_tag,
            provider_id: provider_id.to_string(),
            date,
        }
    }

    pub fn is_current(&self, request: &FetchRequest) -> bool {
        request.tag == self.latest_tag
    }

    /// True while the latest issued request has not come back yet.
    pub fn is_awaiting(&self) -> bool {
        self.settled_tag != self.latest_tag
    }

    /// Applies `outcome` if it answers the latest request.
    ///
    /// A failed latest request leaves the previous table in place and is
    /// reported as [`BookingError::FetchFailure`].
    pub fn apply(&mut self, outcome: FetchOutcome) -> Result<FetchResolution, BookingError> {
        let FetchOutcome { request, result } = outcome;

        if !self.is_current(&request) {
            warn!(
                "Discarding stale availability response #{} (latest is #{})",
                request.tag, self.latest_tag
            );
            return Ok(FetchResolution::Discarded);
        }

        self.settled_tag = request.tag;

        match result {
            Ok(slots) => {
                debug!(
                    "Applying availability #{}: {} slots for {} on {}",
                    request.tag,
                    slots.len(),
                    request.provider_id,
                    request.date
                );
                self.table = Some(AvailabilityTable::new(request.provider_id, request.date, slots));
                Ok(FetchResolution::Applied)
            }
            Err(e) => {
                warn!(
                    "Availability request #{} for {} on {} failed: {}",
                    request.tag, request.provider_id, request.date, e
                );
                Err(BookingError::FetchFailure(e))
            }
        }
    }

    pub fn table(&self) -> Option<&AvailabilityTable> {
        self.table.as_ref()
    }

    /// The table, only if it belongs to `(provider_id, date)`.
    pub fn table_for(&self, provider_id: &str, date: CalendarDate) -> Option<&AvailabilityTable> {
        self.table.as_ref().filter(|table| table.is_for(provider_id, date))
    }
}
