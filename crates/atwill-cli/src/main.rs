// ============================================================================
// atwill — drive the Twitter OAuth 2.0 + PKCE flow from a terminal
// ============================================================================
// Usage:
//   atwill scopes                                       List known scopes
//   atwill authorize [--scope S]...                     Print an authorize URL
//   atwill login [--scope S]...                         Authorize, wait, exchange
//   atwill exchange --callback-url U --state S --verifier V
//   atwill get-tweet --token T ID                       Read a tweet
//   atwill post-tweet --token T TEXT                    Post a tweet
// ============================================================================

mod callback;
mod config;

use anyhow::{Context, Result};
use atwill_core::{generate_pkce_pair, generate_state, Scope, TokenResponse, TwitterClient};
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::AppConfig;

const DEFAULT_SCOPES: [Scope; 3] = [Scope::TweetRead, Scope::TweetWrite, Scope::UsersRead];

/// AtWill Twitter client
#[derive(Parser)]
#[command(name = "atwill", version, about = "Authorize against Twitter and read/post tweets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the scopes that can be requested
    Scopes,

    /// Generate PKCE values and state, and print the authorize URL
    Authorize {
        /// Scope to request (repeatable, default: tweet.read tweet.write users.read)
        #[arg(long = "scope")]
        scopes: Vec<Scope>,
    },

    /// Authorize, wait for the redirect locally, and exchange the code
    Login {
        /// Scope to request (repeatable, default: tweet.read tweet.write users.read)
        #[arg(long = "scope")]
        scopes: Vec<Scope>,

        /// Seconds to wait for the browser redirect
        #[arg(long, default_value = "300")]
        timeout: u64,
    },

    /// Validate a callback URL and exchange its code for a token
    Exchange {
        /// Full URL the provider redirected to
        #[arg(long)]
        callback_url: String,

        /// State printed by `authorize`
        #[arg(long)]
        state: String,

        /// Code verifier printed by `authorize`
        #[arg(long)]
        verifier: String,
    },

    /// Read a tweet by id
    GetTweet {
        #[arg(long, env = "TWITTER_ACCESS_TOKEN")]
        token: String,

        id: String,
    },

    /// Post a tweet
    PostTweet {
        #[arg(long, env = "TWITTER_ACCESS_TOKEN")]
        token: String,

        text: String,
    },
}

fn requested_scopes(scopes: Vec<Scope>) -> Vec<Scope> {
    if scopes.is_empty() {
        DEFAULT_SCOPES.to_vec()
    } else {
        scopes
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Could not load .env file: {}", e);
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("atwill=info,atwill_core=info")),
        )
        .init();

    let cli = Cli::parse();

    if let Commands::Scopes = cli.command {
        return cmd_scopes();
    }

    let config = AppConfig::from_env()?;
    // One pool for the whole process
    let client = TwitterClient::with_endpoints(reqwest::Client::new(), config.endpoints.clone());
    debug!("Using Twitter API at {}", client.endpoints().api_base);

    match cli.command {
        Commands::Scopes => cmd_scopes(),
        Commands::Authorize { scopes } => cmd_authorize(&client, &config, scopes),
        Commands::Login { scopes, timeout } => cmd_login(&client, &config, scopes, timeout).await,
        Commands::Exchange {
            callback_url,
            state,
            verifier,
        } => cmd_exchange(&client, &config, &callback_url, &state, &verifier).await,
        Commands::GetTweet { token, id } => cmd_get_tweet(&client, &token, &id).await,
        Commands::PostTweet { token, text } => cmd_post_tweet(&client, &token, &text).await,
    }
}

fn cmd_scopes() -> Result<()> {
    for scope in Scope::ALL {
        println!("{:<22} {:?}", scope, scope);
    }
    Ok(())
}

fn cmd_authorize(client: &TwitterClient, config: &AppConfig, scopes: Vec<Scope>) -> Result<()> {
    let pkce = generate_pkce_pair();
    let state = generate_state();

    let url = client.authorize_url(
        &config.client_id,
        &config.redirect_uri,
        &requested_scopes(scopes),
        &state,
        &pkce.code_challenge,
    )?;

    println!("Open this URL in a browser:\n\n  {}\n", url);
    println!("state:    {}", state);
    println!("verifier: {}", pkce.code_verifier);
    println!("\nThe authorization code expires ~30 seconds after the redirect.");
    Ok(())
}

async fn cmd_login(
    client: &TwitterClient,
    config: &AppConfig,
    scopes: Vec<Scope>,
    timeout: u64,
) -> Result<()> {
    let client_secret = config.client_secret()?.to_string();
    // Bind before the browser can be redirected
    let listener = callback::CallbackListener::bind(&config.redirect_uri)?;
    let pkce = generate_pkce_pair();
    let state = generate_state();

    let url = client.authorize_url(
        &config.client_id,
        &config.redirect_uri,
        &requested_scopes(scopes),
        &state,
        &pkce.code_challenge,
    )?;
    println!("Open this URL in a browser:\n\n  {}\n", url);

    let callback_url =
        tokio::task::spawn_blocking(move || listener.wait(Duration::from_secs(timeout)))
            .await
            .context("Callback listener panicked")??;

    let code = TwitterClient::extract_authorization_code(&callback_url, &state)?;
    let body = client
        .exchange_code(
            &config.client_id,
            &client_secret,
            &config.redirect_uri,
            &code,
            &pkce.code_verifier,
        )
        .await?;

    print_token_body(&body);
    Ok(())
}

async fn cmd_exchange(
    client: &TwitterClient,
    config: &AppConfig,
    callback_url: &str,
    state: &str,
    verifier: &str,
) -> Result<()> {
    let code = TwitterClient::extract_authorization_code(callback_url, state)?;
    let body = client
        .exchange_code(
            &config.client_id,
            config.client_secret()?,
            &config.redirect_uri,
            &code,
            verifier,
        )
        .await?;

    print_token_body(&body);
    Ok(())
}

fn print_token_body(body: &str) {
    println!("{}", body);

    match TokenResponse::from_body(body) {
        Ok(token) => info!(
            "Token granted for scopes [{}], expires in {}s",
            token.scopes().join(", "),
            token.expires_in.unwrap_or_default()
        ),
        Err(e) => warn!("Token endpoint did not return a token: {}", e),
    }
}

async fn cmd_get_tweet(client: &TwitterClient, token: &str, id: &str) -> Result<()> {
    let envelope = client.get_tweet(token, id).await?;

    match envelope.data {
        Some(tweet) => println!("{}", serde_json::to_string_pretty(&tweet)?),
        None => println!("Tweet {} not found or response unreadable.", id),
    }
    Ok(())
}

async fn cmd_post_tweet(client: &TwitterClient, token: &str, text: &str) -> Result<()> {
    let status = client.post_tweet(token, text).await?;
    println!("{}", status);

    if !status.is_success() {
        anyhow::bail!("Tweet was not posted ({})", status);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_scopes() {
        let cli = Cli::try_parse_from([
            "atwill",
            "authorize",
            "--scope",
            "tweet.read",
            "--scope",
            "follow.read",
        ])
        .unwrap();

        match cli.command {
            Commands::Authorize { scopes } => {
                assert_eq!(scopes, vec![Scope::TweetRead, Scope::FollowRead])
            }
            _ => panic!("expected authorize"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_scope() {
        assert!(Cli::try_parse_from(["atwill", "authorize", "--scope", "dm.write"]).is_err());
    }

    #[test]
    fn test_default_scopes() {
        assert_eq!(requested_scopes(Vec::new()), DEFAULT_SCOPES.to_vec());
        assert_eq!(
            requested_scopes(vec![Scope::UsersRead]),
            vec![Scope::UsersRead]
        );
    }
}
