pub mod slot_table;
pub mod partition;
pub mod selection;
pub mod availability;
pub mod submission;
pub mod providers;
pub mod agenda;

pub use availability::{AvailabilityFetcher, AvailabilityTracker, FetchOutcome, FetchRequest, FetchResolution};
pub use submission::AppointmentSubmitter;
pub use providers::ProviderDirectory;
pub use agenda::AgendaService;
pub use selection::SelectionState;
