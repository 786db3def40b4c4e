use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;

pub struct TestConfig {
    pub api_base_url: String,
    pub api_auth_token: Option<String>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3333".to_string(),
            api_auth_token: Some("test-auth-token".to_string()),
        }
    }
}

impl TestConfig {
    pub fn with_base_url(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        let mut config = AppConfig::for_base_url(self.api_base_url.clone());
        config.api_auth_token = self.api_auth_token.clone();
        config.request_timeout_secs = 5;
        config
    }
}

pub struct TestProvider {
    pub id: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

impl Default for TestProvider {
    fn default() -> Self {
        Self::new("Test Provider")
    }
}

impl TestProvider {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            avatar_url: None,
        }
    }

    pub fn with_avatar(mut self, avatar_url: &str) -> Self {
        self.avatar_url = Some(avatar_url.to_string());
        self
    }

    pub fn to_json(&self) -> serde_json::Value {
        MockApiResponses::provider_response(&self.id, &self.name, self.avatar_url.as_deref())
    }
}

pub struct MockApiResponses;

impl MockApiResponses {
    pub fn provider_response(id: &str, name: &str, avatar_url: Option<&str>) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "email": format!("{}@example.com", id),
            "avatar_url": avatar_url,
            "created_at": "2024-01-01T00:00:00.000Z",
            "updated_at": "2024-01-01T00:00:00.000Z"
        })
    }

    /// A day-availability body built from `(hour, available)` pairs.
    pub fn availability_response(slots: &[(u8, bool)]) -> serde_json::Value {
        let slots: Vec<serde_json::Value> = slots
            .iter()
            .map(|(hour, available)| json!({ "hour": hour, "available": available }))
            .collect();
        json!(slots)
    }

    /// Every bookable hour, with the listed ones marked as taken.
    pub fn full_day_availability(taken: &[u8]) -> serde_json::Value {
        let slots: Vec<(u8, bool)> = (8..=17).map(|hour| (hour, !taken.contains(&hour))).collect();
        Self::availability_response(&slots)
    }

    pub fn appointment_response(provider_id: &str, user_id: &str, date: &str) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "provider_id": provider_id,
            "user_id": user_id,
            "date": date,
            "created_at": "2024-01-01T00:00:00.000Z",
            "updated_at": "2024-01-01T00:00:00.000Z"
        })
    }

    /// An entry of `GET /appointments/me`, embedding the other party as `user`.
    pub fn scheduled_appointment_response(
        provider_id: &str,
        user: &TestProvider,
        date: &str,
    ) -> serde_json::Value {
        let mut appointment = Self::appointment_response(provider_id, &user.id, date);
        appointment["user"] = user.to_json();
        appointment
    }

    pub fn error_response(message: &str) -> serde_json::Value {
        json!({
            "status": "error",
            "message": message
        })
    }
}
