use std::env;
use tracing::warn;

pub const DEFAULT_PROVIDER_LIST_KEY: &str = "1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_AVATAR_URL: &str =
    "https://encrypted-tbn0.gstatic.com/images?q=tbn:ANd9GcSUI4ueoXqXOfnVlpC3cXaSM9BEuVni-t7qmQ&usqp=CAU";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub api_auth_token: Option<String>,
    pub provider_list_key: String,
    pub request_timeout_secs: u64,
    pub default_avatar_url: String,
}

impl AppConfig {
    /// Reads a `.env` file when one exists, then the process environment.
    pub fn load() -> Self {
        dotenv::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            api_base_url: lookup("BOOKING_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| {
                    warn!("BOOKING_API_URL not set, using empty value");
                    String::new()
                }),
            api_auth_token: lookup("BOOKING_API_TOKEN").filter(|token| !token.is_empty()),
            provider_list_key: lookup("BOOKING_PROVIDER_LIST_KEY")
                .unwrap_or_else(|| DEFAULT_PROVIDER_LIST_KEY.to_string()),
            request_timeout_secs: match lookup("BOOKING_REQUEST_TIMEOUT_SECS") {
                Some(raw) => raw.parse().unwrap_or_else(|_| {
                    warn!("BOOKING_REQUEST_TIMEOUT_SECS is not a number ({}), using default", raw);
                    DEFAULT_REQUEST_TIMEOUT_SECS
                }),
                None => DEFAULT_REQUEST_TIMEOUT_SECS,
            },
            default_avatar_url: lookup("BOOKING_DEFAULT_AVATAR_URL")
                .unwrap_or_else(|| DEFAULT_AVATAR_URL.to_string()),
        };

        if !config.is_configured() {
            warn!("Booking client not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.api_base_url.is_empty()
    }

    /// Configuration pointing at an explicit base URL, everything else defaulted.
    pub fn for_base_url(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            api_auth_token: None,
            provider_list_key: DEFAULT_PROVIDER_LIST_KEY.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            default_avatar_url: DEFAULT_AVATAR_URL.to_string(),
        }
    }
}
