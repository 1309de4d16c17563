//! ============================================================================
//! Form Codec - application/x-www-form-urlencoded bodies
//! ============================================================================
//! Both provider endpoints answer with form-encoded text. This module turns
//! that text into the two typed responses, and builds form bodies and
//! callback parameters on the way in.
//! ============================================================================

use url::form_urlencoded;

use crate::types::{AccessToken, CallbackParams, LoginError, Result};

/// Parse a form body into ordered key/value pairs (`+` decodes to a space)
pub fn parse_form(input: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(input.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Serialize key/value pairs as a form body
pub fn to_form<K, V>(pairs: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter().map(|(k, v)| (k.as_ref(), v.as_ref())))
        .finish()
}

/// Decoded form fields with first-occurrence lookup
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    pairs: Vec<(String, String)>,
}

impl FormFields {
    pub fn parse(input: &str) -> Self {
        Self {
            pairs: parse_form(input),
        }
    }

    /// Decode a response body, rejecting anything that is not UTF-8
    pub fn from_body(body: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(body).map_err(|e| {
            LoginError::Protocol(format!("Response body is not valid UTF-8: {}", e))
        })?;
        Ok(Self::parse(text))
    }

    /// First value for `key`, if any
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First value for `key`, treating an empty value as absent
    pub fn non_empty(&self, key: &str) -> Option<String> {
        self.get(key).filter(|v| !v.is_empty()).map(str::to_string)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Body returned by the request-token endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestTokenResponse {
    pub oauth_token: Option<String>,
    pub oauth_token_secret: Option<String>,
    pub oauth_callback_confirmed: Option<String>,
}

impl RequestTokenResponse {
    pub fn from_form(fields: &FormFields) -> Self {
        Self {
            oauth_token: fields.non_empty("oauth_token"),
            oauth_token_secret: fields.non_empty("oauth_token_secret"),
            oauth_callback_confirmed: fields.non_empty("oauth_callback_confirmed"),
        }
    }

    /// The provider must echo `oauth_callback_confirmed=true` exactly
    pub fn callback_confirmed(&self) -> bool {
        self.oauth_callback_confirmed.as_deref() == Some("true")
    }
}

/// Body returned by the access-token endpoint.
///
/// Copied verbatim: only a missing key is `None`, an empty value stays `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessTokenResponse {
    pub oauth_token: Option<String>,
    pub oauth_token_secret: Option<String>,
    pub screen_name: Option<String>,
    pub user_id: Option<String>,
}

impl AccessTokenResponse {
    pub fn from_form(fields: &FormFields) -> Self {
        Self {
            oauth_token: fields.get("oauth_token").map(str::to_string),
            oauth_token_secret: fields.get("oauth_token_secret").map(str::to_string),
            screen_name: fields.get("screen_name").map(str::to_string),
            user_id: fields.get("user_id").map(str::to_string),
        }
    }
}

impl From<AccessTokenResponse> for AccessToken {
    fn from(resp: AccessTokenResponse) -> Self {
        AccessToken {
            user_token: resp.oauth_token,
            user_token_secret: resp.oauth_token_secret,
            user_name: resp.screen_name,
            user_id: resp.user_id,
        }
    }
}

impl CallbackParams {
    /// Build from the raw query string of the callback request (no leading `?`)
    pub fn from_query(query: &str) -> Self {
        let fields = FormFields::parse(query.trim_start_matches('?'));
        Self {
            oauth_token: fields.get("oauth_token").map(str::to_string),
            oauth_verifier: fields.get("oauth_verifier").map(str::to_string),
            denied: fields.get("denied").map(str::to_string),
        }
    }

    /// Build from the full callback URL the provider redirected to
    pub fn from_callback_url(callback_url: &str) -> Result<Self> {
        let parsed = url::Url::parse(callback_url)
            .map_err(|e| LoginError::Protocol(format!("Failed to parse callback URL: {}", e)))?;
        Ok(Self::from_query(parsed.query().unwrap_or_default()))
    }
}
