//! ============================================================================
//! Core Types for the Twitter Client
//! ============================================================================
//! Wire types shared by the read and write paths, the optional typed view of
//! the token endpoint body, and the error type for the whole crate.
//! ============================================================================

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, TwitterError>;

// ============================================================================
// Tweet Envelope
// ============================================================================

/// Every Twitter v2 payload travels under a single `data` key.
///
/// On the read path `data` is `None` when the body could not be understood,
/// which callers treat as "not found / unparseable".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TweetEnvelope<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> TweetEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self { data: Some(data) }
    }

    /// An envelope with no payload
    pub fn empty() -> Self {
        Self { data: None }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_none()
    }

    pub fn into_inner(self) -> Option<T> {
        self.data
    }
}

impl<T> Default for TweetEnvelope<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: serde::de::DeserializeOwned> TweetEnvelope<T> {
    /// Parse a response body, falling back to an empty envelope instead of failing
    pub fn from_body_or_empty(body: &str) -> Self {
        match serde_json::from_str::<Self>(body) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!("Response body did not match the data envelope: {}", e);
                Self::empty()
            }
        }
    }
}

/// A tweet as returned by `GET /2/tweets/{id}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tweet {
    pub id: String,
    pub text: String,
}

/// Body of `POST /2/tweets`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewTweet {
    pub text: String,
}

// ============================================================================
// Token Endpoint Body
// ============================================================================

/// Typed view over the raw token endpoint body.
/// The exchange call returns the body as text; parsing it is up to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    #[serde(default)]
    pub token_type: String,
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct TokenErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl TokenResponse {
    /// Parse a token endpoint body, surfacing provider error payloads as errors
    pub fn from_body(body: &str) -> Result<Self> {
        if let Ok(err) = serde_json::from_str::<TokenErrorBody>(body) {
            return Err(TwitterError::TokenEndpoint {
                error: err.error,
                description: err.error_description.unwrap_or_default(),
            });
        }

        Ok(serde_json::from_str(body)?)
    }

    /// Granted scopes as individual wire strings
    pub fn scopes(&self) -> Vec<&str> {
        self.scope
            .as_deref()
            .map(|s| s.split_whitespace().collect())
            .unwrap_or_default()
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error types for the Twitter client
#[derive(Debug, thiserror::Error)]
pub enum TwitterError {
    #[error("state is not valid: expected {expected}, received {received:?}")]
    InvalidState {
        expected: String,
        received: Option<String>,
    },

    #[error("No authorization code in callback")]
    MissingCode,

    #[error("Authorization denied by provider: {error} - {description}")]
    AuthorizationDenied { error: String, description: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Token endpoint error: {error} - {description}")]
    TokenEndpoint { error: String, description: String },

    #[error("Invalid tweet id: {0:?}")]
    InvalidTweetId(String),

    #[error("Unknown scope: {0}")]
    UnknownScope(String),

    #[error("{0} is not supported yet")]
    Unsupported(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_parses_tweet() {
        let envelope: TweetEnvelope<Tweet> =
            TweetEnvelope::from_body_or_empty(r#"{"data":{"id":"1","text":"hello"}}"#);
        let tweet = envelope.into_inner().unwrap();
        assert_eq!(tweet.id, "1");
        assert_eq!(tweet.text, "hello");
    }

    #[test]
    fn test_envelope_falls_back_to_empty() {
        let malformed: TweetEnvelope<Tweet> = TweetEnvelope::from_body_or_empty("{not json");
        assert!(malformed.is_empty());

        let wrong_shape: TweetEnvelope<Tweet> =
            TweetEnvelope::from_body_or_empty(r#"{"data":{"id":1}}"#);
        assert!(wrong_shape.is_empty());

        // Provider error payloads carry no `data` key
        let errors: TweetEnvelope<Tweet> = TweetEnvelope::from_body_or_empty(
            r#"{"errors":[{"detail":"Could not find tweet with id: [2]."}]}"#,
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_new_tweet_serialization() {
        let body = TweetEnvelope::new(NewTweet {
            text: "hi".to_string(),
        });
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"data":{"text":"hi"}}"#
        );
    }

    #[test]
    fn test_token_response_parsing() {
        let body = r#"{
            "token_type": "bearer",
            "expires_in": 7200,
            "access_token": "abc",
            "scope": "tweet.read users.read"
        }"#;
        let token = TokenResponse::from_body(body).unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.expires_in, Some(7200));
        assert_eq!(token.scopes(), vec!["tweet.read", "users.read"]);
        assert!(token.refresh_token.is_none());
    }

    #[test]
    fn test_token_error_body() {
        let body = r#"{"error":"invalid_request","error_description":"Value passed for the authorization code was invalid."}"#;
        match TokenResponse::from_body(body) {
            Err(TwitterError::TokenEndpoint { error, description }) => {
                assert_eq!(error, "invalid_request");
                assert!(description.contains("authorization code"));
            }
            other => panic!("expected token endpoint error, got {:?}", other),
        }
    }

    #[test]
    fn test_token_garbage_body() {
        assert!(matches!(
            TokenResponse::from_body("<html>"),
            Err(TwitterError::Json(_))
        ));
    }
}
