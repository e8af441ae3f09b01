//! ============================================================================
//! ATWILL-CORE: Twitter API v2 Client
//! ============================================================================
//! This crate handles all outbound calls made by the AtWill web app:
//! - OAuth 2.0 authorization URL building and callback validation (PKCE)
//! - Authorization code exchange against the token endpoint
//! - Tweet lookup and tweet posting with a Bearer token
//! - Scope registry mapping permissions to their wire strings
//! ============================================================================

pub mod auth;
pub mod client;
pub mod config;
pub mod types;

// Re-export main types for convenience
pub use auth::{challenge_for, generate_pkce_pair, generate_state, join_scopes, PkcePair, Scope};
pub use client::TwitterClient;
pub use config::Endpoints;
pub use types::*;
