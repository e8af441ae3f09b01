//! Environment-driven configuration for the CLI.

use anyhow::{anyhow, Result};
use atwill_core::Endpoints;

const DEFAULT_REDIRECT_URI: &str = "http://localhost:9876/callback";

/// Twitter app credentials and endpoints, read from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub endpoints: Endpoints,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let client_id = lookup("TWITTER_CLIENT_ID")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| anyhow!("TWITTER_CLIENT_ID is not set"))?;

        let mut endpoints = Endpoints::default();
        if let Some(url) = lookup("TWITTER_AUTHORIZE_URL") {
            endpoints.authorize_url = url;
        }
        if let Some(url) = lookup("TWITTER_TOKEN_URL") {
            endpoints.token_url = url;
        }
        if let Some(url) = lookup("TWITTER_API_BASE") {
            endpoints.api_base = url;
        }

        Ok(Self {
            client_id,
            client_secret: lookup("TWITTER_CLIENT_SECRET").filter(|v| !v.is_empty()),
            redirect_uri: lookup("TWITTER_REDIRECT_URI")
                .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
            endpoints,
        })
    }

    /// The secret is only needed for the code exchange
    pub fn client_secret(&self) -> Result<&str> {
        self.client_secret
            .as_deref()
            .ok_or_else(|| anyhow!("TWITTER_CLIENT_SECRET is not set"))
    }
}
