// ============================================================================
// Local callback listener for `twitter-login login`
// ============================================================================
// Binds the host/port of the registered callback URL and waits for the one
// browser redirect carrying oauth_token/oauth_verifier (or denied).
// ============================================================================

use anyhow::{anyhow, Result};
use std::time::{Duration, Instant};
use tiny_http::{Header, Response, Server};
use tracing::{debug, info};

const DONE_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Twitter login</title></head>
<body style="font-family: sans-serif; text-align: center; margin-top: 20vh">
    <h1>Login received</h1>
    <p>You can close this window and return to the terminal.</p>
</body>
</html>
"#;

/// Bind address and expected path for a callback URL
pub fn listen_target(callback_url: &str) -> Result<(String, String)> {
    let parsed = url::Url::parse(callback_url)
        .map_err(|e| anyhow!("Failed to parse callback URL {}: {}", callback_url, e))?;

    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("Callback URL has no host: {}", callback_url))?;
    let port = parsed
        .port_or_known_default()
        .ok_or_else(|| anyhow!("Callback URL has no port: {}", callback_url))?;

    let bind_host = if host == "localhost" { "127.0.0.1" } else { host };
    Ok((format!("{}:{}", bind_host, port), parsed.path().to_string()))
}

/// Block until the redirect arrives; returns the full callback URL.
/// Requests to other paths (favicon etc.) get a 404 and are skipped.
pub fn wait_for_callback(callback_url: &str, timeout: Duration) -> Result<String> {
    let (addr, path) = listen_target(callback_url)?;
    let server = Server::http(&addr)
        .map_err(|e| anyhow!("Failed to start callback server on {}: {}", addr, e))?;

    info!("Waiting for Twitter callback on {}{}", addr, path);

    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let request = server
            .recv_timeout(remaining)
            .map_err(|e| anyhow!("Callback server error: {}", e))?
            .ok_or_else(|| anyhow!("Timed out waiting for the Twitter callback"))?;

        let target = request.url().to_string();
        debug!("Received request: {}", target.split('?').next().unwrap_or_default());

        if target.split('?').next() != Some(path.as_str()) {
            if let Err(e) = request.respond(Response::empty(404)) {
                debug!("Failed to answer stray request: {}", e);
            }
            continue;
        }

        let content_type = Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..])
            .map_err(|_| anyhow!("Invalid response header"))?;
        if let Err(e) = request.respond(Response::from_string(DONE_HTML).with_header(content_type)) {
            debug!("Failed to send confirmation page to the browser: {}", e);
        }

        return Ok(format!("http://{}{}", addr, target));
    }
}
