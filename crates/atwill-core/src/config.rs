//! Provider endpoint configuration.

use serde::{Deserialize, Serialize};
use url::{ParseError, Url};

use crate::types::{Result, TwitterError};

const TWITTER_AUTH_URL: &str = "https://twitter.com/i/oauth2/authorize";
const TWITTER_TOKEN_URL: &str = "https://api.twitter.com/2/oauth2/token";
const TWITTER_API_BASE: &str = "https://api.twitter.com";

/// URLs of the authorization server and resource server.
/// Defaults point at Twitter; tests override them with a local stub.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Endpoints {
    pub authorize_url: String,
    pub token_url: String,
    pub api_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            authorize_url: TWITTER_AUTH_URL.to_string(),
            token_url: TWITTER_TOKEN_URL.to_string(),
            api_base: TWITTER_API_BASE.to_string(),
        }
    }
}

impl Endpoints {
    /// Point the token and tweet endpoints at a single base URL
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            authorize_url: format!("{}/i/oauth2/authorize", base),
            token_url: format!("{}/2/oauth2/token", base),
            api_base: base.to_string(),
        }
    }

    /// `POST /2/tweets`
    pub fn tweets_url(&self) -> Result<Url> {
        self.api_url(&["2", "tweets"])
    }

    /// `GET /2/tweets/{id}`, with the id kept as a single encoded segment
    pub fn tweet_url(&self, id: &str) -> Result<Url> {
        if id.is_empty() || id.chars().all(|c| c == '.') {
            return Err(TwitterError::InvalidTweetId(id.to_string()));
        }
        self.api_url(&["2", "tweets", id])
    }

    fn api_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.api_base)?;
        url.path_segments_mut()
            .map_err(|_| ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}
