use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    /// How long a profile load may take before the session is reported as timed out.
    pub profile_timeout: Duration,
    pub sign_in_timeout: Duration,
    /// Where verification emails send the user back to.
    pub email_redirect_url: Option<String>,
    pub storage_dir: PathBuf,
    pub poll_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            supabase_url: env::var("SUPABASE_URL").context("SUPABASE_URL must be set")?,
            supabase_anon_key: env::var("SUPABASE_ANON_KEY")
                .context("SUPABASE_ANON_KEY must be set")?,
            profile_timeout: secs_var("GAMESTA_PROFILE_TIMEOUT_SECS", 10)?,
            sign_in_timeout: secs_var("GAMESTA_SIGN_IN_TIMEOUT_SECS", 15)?,
            email_redirect_url: env::var("GAMESTA_EMAIL_REDIRECT_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            storage_dir: env::var("GAMESTA_STORAGE_DIR")
                .unwrap_or_else(|_| ".gamesta".to_string())
                .into(),
            poll_interval: secs_var("GAMESTA_POLL_INTERVAL_SECS", 5)?,
        })
    }

    /// Configuration with default timings for the given project.
    pub fn new(supabase_url: impl Into<String>, supabase_anon_key: impl Into<String>) -> Self {
        Self {
            supabase_url: supabase_url.into(),
            supabase_anon_key: supabase_anon_key.into(),
            profile_timeout: Duration::from_secs(10),
            sign_in_timeout: Duration::from_secs(15),
            email_redirect_url: None,
            storage_dir: PathBuf::from(".gamesta"),
            poll_interval: Duration::from_secs(5),
        }
    }
}

fn secs_var(name: &str, default: u64) -> Result<Duration> {
    let secs = match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a whole number of seconds", name))?,
        Err(_) => default,
    };
    Ok(Duration::from_secs(secs))
}
