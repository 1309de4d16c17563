//! ============================================================================
//! OAuth 1.0a Request Signer (RFC 5849, HMAC-SHA1)
//! ============================================================================
//! Builds the signature base string from the method, normalized URL and the
//! sorted parameter set, signs it with `consumer_secret&token_secret`, and
//! renders the `Authorization: OAuth ...` header.
//! ============================================================================

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha1::Sha1;

use crate::types::{LoginError, Result};

pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";
pub const OAUTH_VERSION: &str = "1.0";

/// RFC 5849 §3.6: everything except ALPHA / DIGIT / "-" / "." / "_" / "~"
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

type HmacSha1 = Hmac<Sha1>;

/// Percent-encode per RFC 5849 (uppercase hex, `!*'()` included)
pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, OAUTH_ENCODE_SET).to_string()
}

/// Per-request nonce and timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthStamp {
    pub nonce: String,
    pub timestamp: String,
}

impl OAuthStamp {
    /// Fresh 32-hex-char nonce and the current Unix time
    pub fn generate() -> Self {
        let nonce = (0..16)
            .map(|_| format!("{:02x}", rand::random::<u8>()))
            .collect();
        Self {
            nonce,
            timestamp: chrono::Utc::now().timestamp().to_string(),
        }
    }

    pub fn fixed(nonce: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            nonce: nonce.into(),
            timestamp: timestamp.into(),
        }
    }
}

/// Unsigned description of one outbound request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignableRequest {
    pub method: String,
    /// May carry a query string; its pairs are signed
    pub url: String,
    /// `oauth_token` placed in the header, if acting with a token
    pub token: Option<String>,
    /// Extra protocol parameters for the header, e.g. `oauth_callback`
    pub oauth_params: Vec<(String, String)>,
    /// Form body parameters: signed, transmitted in the body
    pub params: Vec<(String, String)>,
}

impl SignableRequest {
    pub fn new(method: &str, url: &str) -> Self {
        Self {
            method: method.to_uppercase(),
            url: url.to_string(),
            token: None,
            oauth_params: Vec::new(),
            params: Vec::new(),
        }
    }

    pub fn post(url: &str) -> Self {
        Self::new("POST", url)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_oauth_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.oauth_params.push((key.into(), value.into()));
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }
}

/// Signs requests on behalf of one consumer key/secret pair
#[derive(Clone)]
pub struct OAuthSigner {
    consumer_key: String,
    consumer_secret: String,
}

impl std::fmt::Debug for OAuthSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthSigner")
            .field("consumer_key", &self.consumer_key)
            .field("signature_method", &SIGNATURE_METHOD)
            .finish()
    }
}

impl OAuthSigner {
    pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    /// `Authorization` header value with a fresh nonce and timestamp.
    ///
    /// `token_secret` is the empty string when no token is held yet.
    pub fn authorization_header(&self, request: &SignableRequest, token_secret: &str) -> Result<String> {
        self.authorization_header_with_stamp(request, token_secret, &OAuthStamp::generate())
    }

    /// Same as [`Self::authorization_header`] with a caller-chosen stamp
    pub fn authorization_header_with_stamp(
        &self,
        request: &SignableRequest,
        token_secret: &str,
        stamp: &OAuthStamp,
    ) -> Result<String> {
        let mut header_params = self.protocol_params(request, stamp);
        let signature = self.sign(request, token_secret, stamp)?;
        header_params.push(("oauth_signature".to_string(), signature));
        header_params.sort();

        let header = header_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!("OAuth {}", header))
    }

    /// Base64 HMAC-SHA1 signature for the request
    pub fn sign(&self, request: &SignableRequest, token_secret: &str, stamp: &OAuthStamp) -> Result<String> {
        let mut params = self.protocol_params(request, stamp);
        params.extend(request.params.iter().cloned());

        let base_string = signature_base_string(&request.method, &request.url, &params)?;
        let signing_key = format!(
            "{}&{}",
            percent_encode(&self.consumer_secret),
            percent_encode(token_secret)
        );

        hmac_sha1(&signing_key, &base_string)
    }

    /// Every `oauth_*` parameter except the signature itself
    fn protocol_params(&self, request: &SignableRequest, stamp: &OAuthStamp) -> Vec<(String, String)> {
        let mut params = vec![
            ("oauth_consumer_key".to_string(), self.consumer_key.clone()),
            ("oauth_nonce".to_string(), stamp.nonce.clone()),
            ("oauth_signature_method".to_string(), SIGNATURE_METHOD.to_string()),
            ("oauth_timestamp".to_string(), stamp.timestamp.clone()),
            ("oauth_version".to_string(), OAUTH_VERSION.to_string()),
        ];
        if let Some(token) = &request.token {
            params.push(("oauth_token".to_string(), token.clone()));
        }
        params.extend(request.oauth_params.iter().cloned());
        params
    }
}

/// `METHOD&encoded-base-uri&encoded-normalized-params`.
///
/// Query pairs found on `url` join `params` before normalization.
pub fn signature_base_string(method: &str, url: &str, params: &[(String, String)]) -> Result<String> {
    let (base_uri, query_pairs) = base_string_uri(url)?;

    let mut encoded: Vec<(String, String)> = params
        .iter()
        .chain(query_pairs.iter())
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    Ok(format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(&base_uri),
        percent_encode(&param_string)
    ))
}

/// RFC 5849 §3.4.1.2: lowercase scheme/host, no default port, no query or fragment
fn base_string_uri(raw: &str) -> Result<(String, Vec<(String, String)>)> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| LoginError::Protocol(format!("Cannot sign invalid URL {}: {}", raw, e)))?;

    let host = parsed
        .host_str()
        .ok_or_else(|| LoginError::Protocol(format!("Cannot sign URL without host: {}", raw)))?;

    // Url::port() is None for the scheme's default port
    let authority = match parsed.port() {
        Some(port) => format!("{}:{}", host.to_lowercase(), port),
        None => host.to_lowercase(),
    };

    let base_uri = format!("{}://{}{}", parsed.scheme(), authority, parsed.path());
    let query_pairs = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    Ok((base_uri, query_pairs))
}

fn hmac_sha1(key: &str, data: &str) -> Result<String> {
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| LoginError::Protocol(format!("HMAC key rejected: {}", e)))?;
    mac.update(data.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode("hello world"), "hello%20world");
        assert_eq!(percent_encode("foo=bar&baz"), "foo%3Dbar%26baz");
        assert_eq!(percent_encode("test-value_123.txt~"), "test-value_123.txt~");
        assert_eq!(percent_encode("!*'()"), "%21%2A%27%28%29");
        assert_eq!(percent_encode("a+b/c"), "a%2Bb%2Fc");
        assert_eq!(percent_encode("☃"), "%E2%98%83");
    }

    #[test]
    fn test_stamp_generation() {
        let a = OAuthStamp::generate();
        let b = OAuthStamp::generate();
        assert_eq!(a.nonce.len(), 32);
        assert!(a.nonce.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a.nonce, b.nonce);
        assert!(a.timestamp.parse::<i64>().unwrap() > 1_600_000_000);
    }

    #[test]
    fn test_base_string_normalizes_url() {
        let base = signature_base_string(
            "get",
            "HTTPS://API.Twitter.com:443/oauth/request_token?b=2#frag",
            &[("a".to_string(), "1".to_string())],
        )
        .unwrap();
        assert_eq!(
            base,
            "GET&https%3A%2F%2Fapi.twitter.com%2Foauth%2Frequest_token&a%3D1%26b%3D2"
        );

        let base = signature_base_string("GET", "http://example.com:8080/r", &[]).unwrap();
        assert_eq!(base, "GET&http%3A%2F%2Fexample.com%3A8080%2Fr&");
    }

    #[test]
    fn test_duplicate_keys_sorted_by_value() {
        let params = vec![
            ("a".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string()),
        ];
        let base = signature_base_string("POST", "https://example.com/", &params).unwrap();
        assert!(base.ends_with("&a%3D1%26a%3D2"));
    }

    /// Published Twitter "creating a signature" example
    #[test]
    fn test_twitter_reference_signature() {
        let signer = OAuthSigner::new(
            "xvz1evFS4wEEPTGEFPHBog",
            "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw",
        );
        let request = SignableRequest::post(
            "https://api.twitter.com/1.1/statuses/update.json?include_entities=true",
        )
        .with_token("370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb")
        .with_param("status", "Hello Ladies + Gentlemen, a signed OAuth request!");
        let stamp = OAuthStamp::fixed("kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg", "1318622958");

        let signature = signer
            .sign(&request, "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE", &stamp)
            .unwrap();
        assert_eq!(signature, "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
    }

    /// RFC 5849 photos example
    #[test]
    fn test_rfc5849_reference_signature() {
        let signer = OAuthSigner::new("dpf43f3p2l4k3l03", "kd94hf93k423kf44");
        let request = SignableRequest::new("GET", "http://photos.example.net/photos?file=vacation.jpg&size=original")
            .with_token("nnch734d00sl2jdk");
        let stamp = OAuthStamp::fixed("kllo9940pd9333jh", "1191242096");

        let signature = signer.sign(&request, "pfkkdhi9sl3r4s00", &stamp).unwrap();
        assert_eq!(signature, "tR3+Ty81lMeYAr/Fid0kMTYa/WM=");
    }

    #[test]
    fn test_request_token_header_is_deterministic() {
        let signer = OAuthSigner::new(
            "cChZNFj6T5R0TigYB9yd1w",
            "L8qq9PZyRg6ieKGEKhZolGC0vJWLw8iEJ88DRdyOg",
        );
        let request = SignableRequest::post("https://api.twitter.com/oauth/request_token")
            .with_oauth_param("oauth_callback", "http://localhost:3000/twitter/callback");
        let stamp = OAuthStamp::fixed("ea9ec8429b68d6b77cd5600adbbb0456", "1318467427");

        let header = signer
            .authorization_header_with_stamp(&request, "", &stamp)
            .unwrap();
        assert_eq!(
            header,
            "OAuth oauth_callback=\"http%3A%2F%2Flocalhost%3A3000%2Ftwitter%2Fcallback\", \
             oauth_consumer_key=\"cChZNFj6T5R0TigYB9yd1w\", \
             oauth_nonce=\"ea9ec8429b68d6b77cd5600adbbb0456\", \
             oauth_signature=\"4jL2FMJgHCmB3GfGx3YOEvEGyTE%3D\", \
             oauth_signature_method=\"HMAC-SHA1\", \
             oauth_timestamp=\"1318467427\", \
             oauth_version=\"1.0\""
        );
        assert_eq!(
            header,
            signer.authorization_header_with_stamp(&request, "", &stamp).unwrap()
        );
    }

    #[test]
    fn test_body_params_signed_but_not_in_header() {
        let signer = OAuthSigner::new("ck", "cs");
        let request = SignableRequest::post("https://api.twitter.com/oauth/access_token")
            .with_param("oauth_token", "t")
            .with_param("oauth_verifier", "v");
        let stamp = OAuthStamp::fixed("n0nce", "1700000000");

        let header = signer
            .authorization_header_with_stamp(&request, "secret", &stamp)
            .unwrap();
        assert_eq!(
            header,
            "OAuth oauth_consumer_key=\"ck\", oauth_nonce=\"n0nce\", \
             oauth_signature=\"iFAmOIJKQy6fYlWASGl5E%2Brlubs%3D\", \
             oauth_signature_method=\"HMAC-SHA1\", oauth_timestamp=\"1700000000\", \
             oauth_version=\"1.0\""
        );
        assert!(!header.contains("secret"));
        assert!(!header.contains("oauth_verifier"));
    }

    #[test]
    fn test_token_secret_changes_signature() {
        let signer = OAuthSigner::new("ck", "cs");
        let request = SignableRequest::post("https://api.twitter.com/oauth/access_token");
        let stamp = OAuthStamp::fixed("n", "1");
        let a = signer.sign(&request, "", &stamp).unwrap();
        let b = signer.sign(&request, "other", &stamp).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let signer = OAuthSigner::new("ck", "cs");
        let request = SignableRequest::post("not a url");
        assert!(matches!(
            signer.authorization_header(&request, ""),
            Err(LoginError::Protocol(_))
        ));
    }

    #[test]
    fn test_debug_hides_secret() {
        let signer = OAuthSigner::new("ck", "very-secret");
        assert!(!format!("{:?}", signer).contains("very-secret"));
    }
}
