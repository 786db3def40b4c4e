use std::sync::Arc;

use tracing::{debug, warn};

use shared_api::ApiClient;
use shared_config::AppConfig;

use crate::error::BookingError;
use crate::models::Provider;

/// Provider list shown at the top of the booking screen.
pub struct ProviderDirectory {
    api: Arc<ApiClient>,
    list_key: String,
    default_avatar_url: String,
    providers: Vec<Provider>,
}

impl ProviderDirectory {
    pub fn new(api: Arc<ApiClient>, config: &AppConfig) -> Self {
        Self {
            api,
            list_key: config.provider_list_key.clone(),
            default_avatar_url: config.default_avatar_url.clone(),
            providers: Vec::new(),
        }
    }

    /// `GET /providers?key=..`, replacing the whole list. On failure the old list stays.
    pub async fn refresh(&mut self) -> Result<&[Provider], BookingError> {
        debug!("Refreshing provider list");

        let providers: Vec<Provider> = self
            .api
            .get("providers", &[("key", self.list_key.clone())])
            .await
            .map_err(|e| {
                warn!("Failed to refresh providers, keeping {} cached: {}", self.providers.len(), e);
                BookingError::FetchFailure(e)
            })?;

        self.providers = providers;
        Ok(&self.providers)
    }

    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    pub fn find(&self, provider_id: &str) -> Option<&Provider> {
        self.providers.iter().find(|provider| provider.id == provider_id)
    }

    pub fn avatar_for<'a>(&'a self, provider: &'a Provider) -> &'a str {
        provider
            .avatar_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(&self.default_avatar_url)
    }
}
