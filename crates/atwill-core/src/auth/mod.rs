//! ============================================================================
//! Auth Module - OAuth 2.0 Building Blocks
//! ============================================================================
//! Pieces the caller needs around the authorization code flow:
//! - Scope registry (permission -> wire string)
//! - PKCE verifier/challenge and state generation
//! ============================================================================

mod pkce;
mod scopes;

pub use pkce::{challenge_for, generate_pkce_pair, generate_state, PkcePair};
pub use scopes::{join_scopes, Scope};
