//! ============================================================================
//! Core Types for Login with Twitter
//! ============================================================================
//! Request-scoped values that flow through the two-step OAuth 1.0a login:
//! credentials, the redirect handed back by step 1, the callback parameters
//! the provider appends to the redirect, and the terminal access token.
//! Nothing here is persisted by this crate.
//! ============================================================================

use serde::{Deserialize, Serialize};

/// Provider credentials for one registered application.
///
/// Immutable once handed to [`crate::LoginWithTwitter`]. Accepts both
/// snake_case and the camelCase spellings used by JSON config files.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(alias = "consumerKey")]
    pub consumer_key: String,
    #[serde(alias = "consumerSecret")]
    pub consumer_secret: String,
    #[serde(alias = "callbackUrl")]
    pub callback_url: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("callback_url", &self.callback_url)
            .finish()
    }
}

/// Result of step 1: where to send the visitor, and the secret the caller
/// must keep (e.g. in a session) until the callback arrives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRedirect {
    pub url: String,
    pub token_secret: String,
}

/// Query parameters the provider appends to the callback URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub oauth_token: Option<String>,
    #[serde(default)]
    pub oauth_verifier: Option<String>,
    /// Present (carrying the request token) when the user declined
    #[serde(default)]
    pub denied: Option<String>,
}

/// Long-lived user credential produced by step 2.
///
/// Fields are copied verbatim from the provider response; an absent field
/// stays `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub user_token: Option<String>,
    pub user_token_secret: Option<String>,
    pub user_name: Option<String>,
    pub user_id: Option<String>,
}

/// Error types for the login flow
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    #[error("Invalid or missing configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Missing `oauth_callback_confirmed` parameter in response (is the callback URL approved for this client application?)")]
    CallbackNotConfirmed,

    #[error("User denied login permission")]
    UserDeniedAuthorization,

    #[error("Invalid or missing `oauth_token` parameter for login callback")]
    MissingOAuthToken,

    #[error("Invalid or missing `oauth_verifier` parameter for login callback")]
    MissingOAuthVerifier,

    #[error("Invalid or missing `tokenSecret` argument for login callback")]
    MissingTokenSecret,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl LoginError {
    /// The visitor declined on the consent screen. Not a system fault.
    pub fn is_user_denial(&self) -> bool {
        matches!(self, LoginError::UserDeniedAuthorization)
    }

    /// The callback request itself was malformed or the session lost the
    /// step-1 secret. Restarting the flow is the usual remedy.
    pub fn is_callback_error(&self) -> bool {
        matches!(
            self,
            LoginError::MissingOAuthToken
                | LoginError::MissingOAuthVerifier
                | LoginError::MissingTokenSecret
        )
    }
}

pub type Result<T> = std::result::Result<T, LoginError>;
