//! ============================================================================
//! Auth Module - OAuth 1.0a signing and the login flow
//! ============================================================================
//! - OAuthSigner: HMAC-SHA1 request signing (RFC 5849)
//! - LoginWithTwitter: request-token / access-token exchange
//! ============================================================================

pub mod signer;
mod twitter_oauth;

pub use signer::{percent_encode, OAuthSigner, OAuthStamp, SignableRequest};
pub use twitter_oauth::{LoginWithTwitter, ACCESS_TOKEN_URL, AUTHENTICATE_URL, REQUEST_TOKEN_URL};
