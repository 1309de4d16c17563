//! ============================================================================
//! Login with Twitter - OAuth 1.0a three-legged flow
//! ============================================================================
//! Step 1 (`begin_login`): signed POST to the request-token endpoint, returns
//! the authenticate URL to redirect the visitor to plus the request-token
//! secret the caller must keep.
//! Step 2 (`complete_login`): validates the callback parameters, then a
//! signed POST to the access-token endpoint exchanges the verifier for the
//! user's access token.
//! No state is kept between the two steps; the caller threads it through.
//! ============================================================================

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::signer::{OAuthSigner, SignableRequest};
use crate::form::{to_form, AccessTokenResponse, FormFields, RequestTokenResponse};
use crate::transport::{HttpClient, HttpRequest, ReqwestClient, FORM_CONTENT_TYPE};
use crate::types::{AccessToken, CallbackParams, Credentials, LoginError, LoginRedirect, Result};

pub const REQUEST_TOKEN_URL: &str = "https://api.twitter.com/oauth/request_token";
pub const AUTHENTICATE_URL: &str = "https://api.twitter.com/oauth/authenticate";
pub const ACCESS_TOKEN_URL: &str = "https://api.twitter.com/oauth/access_token";

/// Server-side half of "log in with Twitter"
pub struct LoginWithTwitter {
    credentials: Credentials,
    signer: OAuthSigner,
    transport: Arc<dyn HttpClient>,
}

impl LoginWithTwitter {
    /// Create a login flow that talks to Twitter over reqwest
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_transport(credentials, Arc::new(ReqwestClient::new()))
    }

    /// Create a login flow over a caller-supplied transport
    pub fn with_transport(credentials: Credentials, transport: Arc<dyn HttpClient>) -> Result<Self> {
        credentials.validate()?;
        let signer = OAuthSigner::new(&credentials.consumer_key, &credentials.consumer_secret);
        Ok(Self {
            credentials,
            signer,
            transport,
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Obtain a request token and build the URL to send the visitor to.
    ///
    /// The returned `token_secret` must be kept by the caller until the
    /// callback arrives and handed to [`Self::complete_login`].
    pub async fn begin_login(&self) -> Result<LoginRedirect> {
        info!("Requesting OAuth request token");

        let request = SignableRequest::post(REQUEST_TOKEN_URL)
            .with_oauth_param("oauth_callback", &self.credentials.callback_url);
        let fields = self.post_signed(&request, "").await?;
        let response = RequestTokenResponse::from_form(&fields);

        // Twitter requires this echo; without it the callback is not registered
        if !response.callback_confirmed() {
            warn!(
                "Request token response did not confirm callback {}",
                self.credentials.callback_url
            );
            return Err(LoginError::CallbackNotConfirmed);
        }

        let token = response.oauth_token.ok_or_else(|| {
            LoginError::Protocol("Request token response is missing `oauth_token`".to_string())
        })?;
        let token_secret = response.oauth_token_secret.ok_or_else(|| {
            LoginError::Protocol("Request token response is missing `oauth_token_secret`".to_string())
        })?;

        let url = format!("{}?{}", AUTHENTICATE_URL, to_form(&[("oauth_token", &token)]));
        debug!("Obtained request token {}", token);

        Ok(LoginRedirect { url, token_secret })
    }

    /// Exchange the callback's verifier for the user's access token.
    ///
    /// Checks run in order: denial, `oauth_token`, `oauth_verifier`, then
    /// `token_secret`. Any failure here returns before a request is sent.
    pub async fn complete_login(&self, params: &CallbackParams, token_secret: &str) -> Result<AccessToken> {
        let (token, verifier) = validate_callback(params, token_secret)?;

        info!("Exchanging OAuth verifier for access token");

        let request = SignableRequest::post(ACCESS_TOKEN_URL)
            .with_param("oauth_token", token)
            .with_param("oauth_verifier", verifier);
        let fields = self.post_signed(&request, token_secret).await?;
        let access = AccessToken::from(AccessTokenResponse::from_form(&fields));

        info!(
            "Login completed for user {}",
            access.user_name.as_deref().unwrap_or("<unknown>")
        );

        Ok(access)
    }

    /// Sign, send and decode one provider POST
    async fn post_signed(&self, request: &SignableRequest, token_secret: &str) -> Result<FormFields> {
        let authorization = self.signer.authorization_header(request, token_secret)?;

        let response = self
            .transport
            .send(HttpRequest {
                method: request.method.clone(),
                url: request.url.clone(),
                headers: vec![
                    ("Authorization".to_string(), authorization),
                    ("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()),
                ],
                body: to_form(&request.params),
            })
            .await?;

        if !response.is_success() {
            let body = String::from_utf8_lossy(&response.body);
            warn!("{} returned HTTP {}", request.url, response.status);
            return Err(LoginError::Protocol(format!(
                "{} returned HTTP {}: {}",
                request.url, response.status, body
            )));
        }

        FormFields::from_body(&response.body)
    }
}

/// Returns the `(oauth_token, oauth_verifier)` pair when the callback is usable
fn validate_callback<'a>(params: &'a CallbackParams, token_secret: &str) -> Result<(&'a str, &'a str)> {
    if params.denied.as_deref().is_some_and(|d| !d.is_empty()) {
        info!("User denied login permission");
        return Err(LoginError::UserDeniedAuthorization);
    }

    let token = params
        .oauth_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or(LoginError::MissingOAuthToken)?;

    let verifier = params
        .oauth_verifier
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or(LoginError::MissingOAuthVerifier)?;

    if token_secret.is_empty() {
        return Err(LoginError::MissingTokenSecret);
    }

    Ok((token, verifier))
}
