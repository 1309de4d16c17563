//! ============================================================================
//! LOGIN-CORE: Log in with Twitter over OAuth 1.0a
//! ============================================================================
//! Server-side half of the three-legged OAuth 1.0a flow:
//! - Request token + authenticate redirect (`begin_login`)
//! - Verifier for access token exchange (`complete_login`)
//! - HMAC-SHA1 request signing
//! - Pluggable HTTP transport (reqwest by default)
//!
//! Sessions, token storage and routing are the host application's job.
//! ============================================================================

pub mod auth;
pub mod config;
pub mod form;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use auth::{LoginWithTwitter, OAuthSigner};
pub use transport::{HttpClient, HttpRequest, HttpResponse, ReqwestClient};
pub use types::*;
