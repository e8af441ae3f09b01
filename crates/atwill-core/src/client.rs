//! ============================================================================
//! Twitter Client - OAuth 2.0 + PKCE and Tweet Endpoints
//! ============================================================================
//! Stateless wrapper around the Twitter authorization and resource servers:
//! - Build the authorize URL and validate the redirected callback
//! - Exchange an authorization code for tokens (confidential client, Basic auth)
//! - Read a tweet and post a tweet with a Bearer token
//! ============================================================================

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::auth::{join_scopes, Scope};
use crate::config::Endpoints;
use crate::types::{NewTweet, Result, Tweet, TweetEnvelope, TwitterError};

/// Client for the Twitter OAuth 2.0 and tweet endpoints.
///
/// The wrapped [`reqwest::Client`] is the process-wide connection pool; build
/// it once and hand it in. Clones of this client share that pool, and each
/// call builds its own request, so concurrent use needs no locking.
#[derive(Debug, Clone)]
pub struct TwitterClient {
    client: Client,
    endpoints: Endpoints,
}

impl TwitterClient {
    /// Create a client against the public Twitter endpoints
    pub fn new(client: Client) -> Self {
        Self::with_endpoints(client, Endpoints::default())
    }

    pub fn with_endpoints(client: Client, endpoints: Endpoints) -> Self {
        Self { client, endpoints }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Build the URL the user is sent to for authorization.
    ///
    /// Scopes are joined with spaces; the `scope` parameter is left out when
    /// the slice is empty.
    pub fn authorize_url(
        &self,
        client_id: &str,
        redirect_uri: &str,
        scopes: &[Scope],
        state: &str,
        challenge: &str,
    ) -> Result<Url> {
        let mut url = Url::parse(&self.endpoints.authorize_url)?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", client_id)
                .append_pair("redirect_uri", redirect_uri);
            if !scopes.is_empty() {
                query.append_pair("scope", &join_scopes(scopes));
            }
            query
                .append_pair("state", state)
                .append_pair("code_challenge", challenge)
                .append_pair("code_challenge_method", "S256");
        }

        debug!("Generated auth URL with state: {}", state);
        Ok(url)
    }

    /// Pull the authorization code out of the URL the provider redirected to.
    ///
    /// The code is only valid for about 30 seconds, so exchange it right away.
    pub fn extract_authorization_code(callback_url: &str, expected_state: &str) -> Result<String> {
        let parsed = Url::parse(callback_url)?;
        let params: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();

        // A repeated state never matches, even if one of the copies does
        let states = values_of(&params, "state");
        if states != [expected_state] {
            error!(
                "State mismatch: expected {}, got {:?}",
                expected_state, states
            );
            return Err(TwitterError::InvalidState {
                expected: expected_state.to_string(),
                received: (!states.is_empty()).then(|| states.join(",")),
            });
        }

        if let Some(error) = values_of(&params, "error").first() {
            let description = values_of(&params, "error_description")
                .first()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(TwitterError::AuthorizationDenied {
                error: error.to_string(),
                description,
            });
        }

        match values_of(&params, "code").as_slice() {
            [code] if !code.is_empty() => {
                info!("Successfully received authorization code");
                Ok(code.to_string())
            }
            _ => Err(TwitterError::MissingCode),
        }
    }

    /// Exchange an authorization code for tokens.
    ///
    /// Returns the raw token endpoint body. The HTTP status is not checked, so
    /// provider errors arrive as a JSON body; see [`crate::TokenResponse::from_body`].
    pub async fn exchange_code(
        &self,
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
        code: &str,
        verifier: &str,
    ) -> Result<String> {
        info!("Exchanging authorization code for tokens");

        let params = [
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
            ("code_verifier", verifier),
        ];

        let response = self
            .client
            .post(&self.endpoints.token_url)
            .header(AUTHORIZATION, basic_auth_header(client_id, client_secret))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Token endpoint responded with {}", status);
        }

        Ok(response.text().await?)
    }

    /// Token refresh is not implemented.
    pub async fn refresh_token(&self) -> Result<String> {
        Err(TwitterError::Unsupported("token refresh"))
    }

    /// Token revocation is not implemented.
    pub async fn revoke_token(&self) -> Result<String> {
        Err(TwitterError::Unsupported("token revocation"))
    }

    /// Look up a single tweet.
    /// A body that is not a `data` envelope yields an empty envelope.
    pub async fn get_tweet(&self, access_token: &str, id: &str) -> Result<TweetEnvelope<Tweet>> {
        debug!("Fetching tweet {}", id);

        let response = self
            .client
            .get(self.endpoints.tweet_url(id)?)
            .header(AUTHORIZATION, bearer_auth_header(access_token))
            .send()
            .await?;

        let body = response.text().await?;
        Ok(TweetEnvelope::from_body_or_empty(&body))
    }

    /// Post a tweet and return the response status. The body is discarded.
    pub async fn post_tweet(&self, access_token: &str, text: &str) -> Result<StatusCode> {
        info!(
            "Posting tweet: {}...",
            text.chars().take(50).collect::<String>()
        );

        let body = TweetEnvelope::new(NewTweet {
            text: text.to_string(),
        });

        let response = self
            .client
            .post(self.endpoints.tweets_url()?)
            .header(AUTHORIZATION, bearer_auth_header(access_token))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!("Tweet posted ({})", status);
        } else {
            warn!("Tweet endpoint responded with {}", status);
        }

        Ok(status)
    }
}

/// Every value of a query parameter, in order
fn values_of<'a>(params: &'a [(String, String)], name: &str) -> Vec<&'a str> {
    params
        .iter()
        .filter(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
        .collect()
}

/// `Basic base64(client_id:client_secret)`
pub fn basic_auth_header(client_id: &str, client_secret: &str) -> String {
    let credentials = STANDARD.encode(format!("{}:{}", client_id, client_secret));
    format!("Basic {}", credentials)
}

fn bearer_auth_header(access_token: &str) -> String {
    format!("Bearer {}", access_token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn client() -> TwitterClient {
        TwitterClient::new(Client::new())
    }

    fn query_of(url: &Url) -> Vec<(String, String)> {
        url.query_pairs().into_owned().collect()
    }

    #[test]
    fn test_auth_url_generation() {
        let url = client()
            .authorize_url(
                "test_client_id",
                "https://example.com/callback",
                &[Scope::TweetRead, Scope::UsersRead],
                "state123",
                "challenge456",
            )
            .unwrap();

        assert_eq!(url.host_str(), Some("twitter.com"));
        assert_eq!(url.path(), "/i/oauth2/authorize");
        assert_eq!(
            query_of(&url),
            vec![
                ("response_type".to_string(), "code".to_string()),
                ("client_id".to_string(), "test_client_id".to_string()),
                (
                    "redirect_uri".to_string(),
                    "https://example.com/callback".to_string()
                ),
                ("scope".to_string(), "tweet.read users.read".to_string()),
                ("state".to_string(), "state123".to_string()),
                ("code_challenge".to_string(), "challenge456".to_string()),
                ("code_challenge_method".to_string(), "S256".to_string()),
            ]
        );
    }

    #[test]
    fn test_auth_url_round_trips_awkward_values() {
        let inputs = [
            ("id with spaces", "http://localhost:9876/callback?x=1&y=2", "s+t/a=te", "E9Mel-_~"),
            ("日本語", "myapp://cb#frag", "%41%", ""),
        ];

        for (client_id, redirect_uri, state, challenge) in inputs {
            let url = client()
                .authorize_url(client_id, redirect_uri, &[], state, challenge)
                .unwrap();
            let params: HashMap<_, _> = url.query_pairs().into_owned().collect();

            assert_eq!(params["client_id"], client_id);
            assert_eq!(params["redirect_uri"], redirect_uri);
            assert_eq!(params["state"], state);
            assert_eq!(params["code_challenge"], challenge);
            assert!(!params.contains_key("scope"));
        }
    }

    #[test]
    fn test_extract_code() {
        let code = TwitterClient::extract_authorization_code(
            "https://example.com/callback?state=abc&code=xyz",
            "abc",
        )
        .unwrap();
        assert_eq!(code, "xyz");
    }

    #[test]
    fn test_extract_code_state_mismatch() {
        for (url, state) in [
            ("https://example.com/cb?state=abc&code=xyz", "abd"),
            ("https://example.com/cb?state=ABC&code=xyz", "abc"),
            ("https://example.com/cb?code=xyz", "abc"),
            ("https://example.com/cb?state=&code=xyz", "abc"),
        ] {
            let err = TwitterClient::extract_authorization_code(url, state).unwrap_err();
            assert!(
                matches!(err, TwitterError::InvalidState { .. }),
                "{} / {} gave {:?}",
                url,
                state,
                err
            );
        }
    }

    #[test]
    fn test_extract_code_repeated_state() {
        for url in [
            "https://example.com/cb?state=forged&code=evil&state=abc",
            "https://example.com/cb?state=abc&code=xyz&state=abc",
        ] {
            match TwitterClient::extract_authorization_code(url, "abc").unwrap_err() {
                TwitterError::InvalidState { received, .. } => {
                    assert!(received.unwrap().contains(','))
                }
                other => panic!("{} gave {:?}", url, other),
            }
        }
    }

    #[test]
    fn test_extract_code_repeated_code() {
        let err = TwitterClient::extract_authorization_code(
            "https://example.com/cb?state=abc&code=one&code=two",
            "abc",
        )
        .unwrap_err();
        assert!(matches!(err, TwitterError::MissingCode));
    }

    #[test]
    fn test_extract_code_missing() {
        let err =
            TwitterClient::extract_authorization_code("https://example.com/cb?state=abc", "abc")
                .unwrap_err();
        assert!(matches!(err, TwitterError::MissingCode));

        let err = TwitterClient::extract_authorization_code(
            "https://example.com/cb?state=abc&code=",
            "abc",
        )
        .unwrap_err();
        assert!(matches!(err, TwitterError::MissingCode));
    }

    #[test]
    fn test_extract_code_denied() {
        let err = TwitterClient::extract_authorization_code(
            "https://example.com/cb?state=abc&error=access_denied",
            "abc",
        )
        .unwrap_err();
        match err {
            TwitterError::AuthorizationDenied { error, description } => {
                assert_eq!(error, "access_denied");
                assert_eq!(description, "Unknown error");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_extract_code_bad_url() {
        let err = TwitterClient::extract_authorization_code("/callback?code=x", "abc").unwrap_err();
        assert!(matches!(err, TwitterError::InvalidUrl(_)));
    }

    #[test]
    fn test_basic_auth_header() {
        assert_eq!(basic_auth_header("id", "secret"), "Basic aWQ6c2VjcmV0");
        assert_eq!(basic_auth_header("client", "pass"), "Basic Y2xpZW50OnBhc3M=");
    }
}
