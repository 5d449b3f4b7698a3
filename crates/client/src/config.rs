use std::env;

/// Connection settings for the portal backend.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_token: Option<String>,
}

impl ClientConfig {
    /// Reads configuration from the environment.
    ///
    /// `PORTAL_BASE_URL` selects the backend (defaults to the local
    /// development server); `PORTAL_API_TOKEN`, when set and non-blank, is
    /// sent as a bearer token on every request.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url =
            env::var("PORTAL_BASE_URL").unwrap_or_else(|_| "http://localhost:7000/".into());
        let api_token = env::var("PORTAL_API_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());
        Self {
            base_url,
            api_token,
        }
    }

    /// Builds a config pointing at the given base URL, without a token.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: None,
        }
    }
}
