// ============================================================================
// twitter-login — drive the OAuth 1.0a login flow from a terminal
// ============================================================================
// Usage:
//   twitter-login begin                                   Get a request token + redirect URL
//   twitter-login complete --redirect URL --token-secret S Exchange the callback for a user token
//   twitter-login login [--timeout 300]                   Both steps, catching the callback locally
//
// Credentials come from TWITTER_CONSUMER_KEY, TWITTER_CONSUMER_SECRET and
// TWITTER_CALLBACK_URL (a .env file is honoured), or the matching flags.
// ============================================================================

mod callback;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use login_core::{CallbackParams, Credentials, LoginWithTwitter};
use std::time::Duration;
use tracing::info;

/// Log in with Twitter from the command line
#[derive(Parser)]
#[command(name = "twitter-login", version, about = "Run the Twitter OAuth 1.0a login flow")]
struct Cli {
    /// Consumer key (default: $TWITTER_CONSUMER_KEY)
    #[arg(long, global = true)]
    consumer_key: Option<String>,

    /// Consumer secret (default: $TWITTER_CONSUMER_SECRET)
    #[arg(long, global = true)]
    consumer_secret: Option<String>,

    /// Callback URL registered for the app (default: $TWITTER_CALLBACK_URL)
    #[arg(long, global = true)]
    callback_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Obtain a request token and print the URL to send the user to
    Begin,

    /// Exchange the callback parameters for the user's access token
    Complete {
        /// Full URL Twitter redirected the browser to
        #[arg(long, conflicts_with_all = ["oauth_token", "oauth_verifier", "denied"])]
        redirect: Option<String>,

        /// `oauth_token` from the callback query
        #[arg(long)]
        oauth_token: Option<String>,

        /// `oauth_verifier` from the callback query
        #[arg(long)]
        oauth_verifier: Option<String>,

        /// `denied` from the callback query
        #[arg(long)]
        denied: Option<String>,

        /// Token secret printed by `begin`
        #[arg(long, default_value = "")]
        token_secret: String,
    },

    /// Run both steps, listening on the callback URL for the redirect
    Login {
        /// Seconds to wait for the browser to come back
        #[arg(long, default_value = "300")]
        timeout: u64,
    },
}

/// Credentials as gathered from flags and environment
struct CliConfig {
    consumer_key: Option<String>,
    consumer_secret: Option<String>,
    callback_url: Option<String>,
}

impl CliConfig {
    fn from_env() -> Self {
        Self {
            consumer_key: std::env::var("TWITTER_CONSUMER_KEY").ok(),
            consumer_secret: std::env::var("TWITTER_CONSUMER_SECRET").ok(),
            callback_url: std::env::var("TWITTER_CALLBACK_URL").ok(),
        }
    }

    /// Flags win over environment
    fn merge(self, cli: &Cli) -> Self {
        Self {
            consumer_key: cli.consumer_key.clone().or(self.consumer_key),
            consumer_secret: cli.consumer_secret.clone().or(self.consumer_secret),
            callback_url: cli.callback_url.clone().or(self.callback_url),
        }
    }

    fn credentials(self) -> Result<Credentials> {
        let creds = Credentials::new(
            self.consumer_key.unwrap_or_default(),
            self.consumer_secret.unwrap_or_default(),
            self.callback_url.unwrap_or_default(),
        )?;
        Ok(creds)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Could not load .env file: {}", e);
        }
    }

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("login_cli=info".parse()?)
                .add_directive("login_core=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let credentials = CliConfig::from_env().merge(&cli).credentials()?;
    let login = LoginWithTwitter::new(credentials)?;

    match cli.command {
        Commands::Begin => cmd_begin(&login).await,
        Commands::Complete {
            redirect,
            oauth_token,
            oauth_verifier,
            denied,
            token_secret,
        } => {
            let params = match redirect {
                Some(url) => CallbackParams::from_callback_url(&url)?,
                None => CallbackParams {
                    oauth_token,
                    oauth_verifier,
                    denied,
                },
            };
            cmd_complete(&login, &params, &token_secret).await
        }
        Commands::Login { timeout } => cmd_login(&login, Duration::from_secs(timeout)).await,
    }
}

async fn cmd_begin(login: &LoginWithTwitter) -> Result<()> {
    let redirect = login.begin_login().await?;

    println!("Open this URL to authorize:");
    println!("  {}", redirect.url);
    println!();
    println!("Token secret (pass to `complete --token-secret`):");
    println!("  {}", redirect.token_secret);

    Ok(())
}

async fn cmd_complete(login: &LoginWithTwitter, params: &CallbackParams, token_secret: &str) -> Result<()> {
    let token = login.complete_login(params, token_secret).await?;
    println!("{}", serde_json::to_string_pretty(&token)?);
    Ok(())
}

async fn cmd_login(login: &LoginWithTwitter, timeout: Duration) -> Result<()> {
    let redirect = login.begin_login().await?;

    println!("Open this URL to authorize:");
    println!("  {}", redirect.url);

    let callback_url = login.credentials().callback_url.clone();
    let received = tokio::task::spawn_blocking(move || callback::wait_for_callback(&callback_url, timeout))
        .await
        .context("Callback listener panicked")??;

    info!("Callback received, completing login");
    let params = CallbackParams::from_callback_url(&received)?;
    cmd_complete(login, &params, &redirect.token_secret).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_flags_override_environment() {
        let parsed = cli(&[
            "twitter-login",
            "--consumer-key",
            "flag-key",
            "begin",
        ]);
        let env = CliConfig {
            consumer_key: Some("env-key".to_string()),
            consumer_secret: Some("env-secret".to_string()),
            callback_url: Some("http://localhost:3000/cb".to_string()),
        };
        let creds = env.merge(&parsed).credentials().unwrap();
        assert_eq!(creds.consumer_key, "flag-key");
        assert_eq!(creds.consumer_secret, "env-secret");
    }

    #[test]
    fn test_missing_credentials_fail() {
        let parsed = cli(&["twitter-login", "begin"]);
        let empty = CliConfig {
            consumer_key: None,
            consumer_secret: None,
            callback_url: None,
        };
        assert!(empty.merge(&parsed).credentials().is_err());
    }

    #[test]
    fn test_redirect_conflicts_with_explicit_params() {
        let result = Cli::try_parse_from([
            "twitter-login",
            "complete",
            "--redirect",
            "http://localhost/cb?oauth_token=t",
            "--oauth-token",
            "t",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_login_default_timeout() {
        match cli(&["twitter-login", "login"]).command {
            Commands::Login { timeout } => assert_eq!(timeout, 300),
            _ => panic!("expected login command"),
        }
    }
}
