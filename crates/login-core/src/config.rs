//! ============================================================================
//! Credential Validation
//! ============================================================================
//! Construction-time checks on the application credentials. Typed callers go
//! through `Credentials::new`/`validate`; hosts holding loosely-typed JSON
//! config go through `Credentials::from_json`.
//! ============================================================================

use serde_json::Value;

use crate::types::{Credentials, LoginError, Result};

/// Field names as they appear in JSON configuration, in check order
const CONSUMER_KEY: &str = "consumerKey";
const CONSUMER_SECRET: &str = "consumerSecret";
const CALLBACK_URL: &str = "callbackUrl";

impl Credentials {
    /// Build and validate credentials
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> Result<Self> {
        let creds = Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            callback_url: callback_url.into(),
        };
        creds.validate()?;
        Ok(creds)
    }

    /// Check that every field is non-empty.
    ///
    /// The callback is not parsed: `oob` (PIN-based login) is a legal value.
    pub fn validate(&self) -> Result<()> {
        require_non_empty(CONSUMER_KEY, &self.consumer_key)?;
        require_non_empty(CONSUMER_SECRET, &self.consumer_secret)?;
        require_non_empty(CALLBACK_URL, &self.callback_url)?;
        Ok(())
    }

    /// Read credentials out of an arbitrary JSON object.
    ///
    /// Each field must be present and a non-empty string. Both camelCase and
    /// snake_case keys are accepted; camelCase wins when both are present.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            LoginError::InvalidConfiguration("configuration must be a JSON object".to_string())
        })?;

        let field = |camel: &str, snake: &str| -> Result<String> {
            match obj.get(camel).or_else(|| obj.get(snake)) {
                Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
                _ => Err(invalid_option(camel)),
            }
        };

        let consumer_key = field(CONSUMER_KEY, "consumer_key")?;
        let consumer_secret = field(CONSUMER_SECRET, "consumer_secret")?;
        let callback_url = field(CALLBACK_URL, "callback_url")?;

        Self::new(consumer_key, consumer_secret, callback_url)
    }
}

fn require_non_empty(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(invalid_option(name));
    }
    Ok(())
}

fn invalid_option(name: &str) -> LoginError {
    LoginError::InvalidConfiguration(format!("Invalid or missing `{}` option", name))
}
