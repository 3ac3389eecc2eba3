//! Configuration and settings management
//!
//! Loads settings from environment variables and defines the size and
//! retry constants used across the download pipeline.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// TCP port for the webhook-mode HTTP listener
    #[serde(default = "default_port")]
    pub port: u16,

    /// Explicit public webhook base URL override
    pub webhook_url: Option<String>,
    /// Externally reachable URL provided by Railway
    pub railway_static_url: Option<String>,
    /// Externally reachable URL provided by Render
    pub render_external_url: Option<String>,
    /// Shared secret attached to the webhook registration
    pub secret_token: Option<String>,

    /// Media fetcher binary to invoke
    #[serde(default = "default_ytdl_bin")]
    pub ytdl_bin: String,
}

const fn default_port() -> u16 {
    8000
}

fn default_ytdl_bin() -> String {
    "yt-dlp".to_string()
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails, in particular when the
    /// required `TELEGRAM_TOKEN` is absent.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(File::with_name("config/default").required(false))
            // Add in the current environment file
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked into git
            .add_source(File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of APP)
            .add_source(Environment::with_prefix("APP").separator("__"))
            // Also add settings from environment variables directly (without prefix)
            // Note: Environment::default() auto-converts UPPER_SNAKE_CASE to snake_case
            // ignore_empty treats empty env vars as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        s.try_deserialize()
    }

    /// Resolves the full webhook endpoint, if any base URL is configured.
    ///
    /// The explicit `WEBHOOK_URL` override wins over the Railway and
    /// Render platform variables. `/webhook` is appended to the resolved
    /// base. `None` means the bot should fall back to long polling.
    #[must_use]
    pub fn webhook_endpoint(&self) -> Option<String> {
        let base = self
            .webhook_url
            .as_deref()
            .or(self.railway_static_url.as_deref())
            .or(self.render_external_url.as_deref())?;
        Some(format!("{}/webhook", base.trim_end_matches('/')))
    }
}

/// One mebibyte in bytes
pub const MIB: u64 = 1024 * 1024;
/// Largest deliverable file size, in mebibytes
pub const DELIVERY_LIMIT_MIB: u64 = 50;
/// Source-size ceiling passed to the fetcher, mirroring the delivery limit
pub const FETCH_MAX_FILESIZE_BYTES: u64 = DELIVERY_LIMIT_MIB * MIB;
/// Target bitrate for extracted audio
pub const AUDIO_BITRATE: &str = "192K";
/// Character cap applied to the content title in output file names
pub const TITLE_MAX_CHARS: usize = 70;
/// Character cap for the audio title shown in Telegram players
pub const AUDIO_TITLE_MAX_CHARS: usize = 64;

// Telegram API retry configuration
/// Initial backoff delay for Telegram API retries (milliseconds)
pub const TELEGRAM_API_INITIAL_BACKOFF_MS: u64 = 500;
/// Maximum backoff delay for Telegram API retries (milliseconds)
pub const TELEGRAM_API_MAX_BACKOFF_MS: u64 = 4000;
/// Maximum retry attempts for Telegram API operations
pub const TELEGRAM_API_MAX_RETRIES: usize = 3;

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn bare_settings() -> Settings {
        Settings {
            telegram_token: "dummy".to_string(),
            port: default_port(),
            webhook_url: None,
            railway_static_url: None,
            render_external_url: None,
            secret_token: None,
            ytdl_bin: default_ytdl_bin(),
        }
    }

    #[test]
    fn test_webhook_endpoint_resolution() {
        let mut settings = bare_settings();
        assert_eq!(settings.webhook_endpoint(), None);

        // Render is the last fallback
        settings.render_external_url = Some("https://app.onrender.com".to_string());
        assert_eq!(
            settings.webhook_endpoint(),
            Some("https://app.onrender.com/webhook".to_string())
        );

        // Railway wins over Render
        settings.railway_static_url = Some("https://app.up.railway.app".to_string());
        assert_eq!(
            settings.webhook_endpoint(),
            Some("https://app.up.railway.app/webhook".to_string())
        );

        // Explicit override wins over both, trailing slash normalized
        settings.webhook_url = Some("https://bot.example.com/".to_string());
        assert_eq!(
            settings.webhook_endpoint(),
            Some("https://bot.example.com/webhook".to_string())
        );
    }

    // Env-dependent assertions live in one test to avoid variable races
    #[test]
    fn test_config_env_loading() -> Result<(), Box<dyn std::error::Error>> {
        env::set_var("TELEGRAM_TOKEN", "dummy_token");

        let settings = Settings::new()?;
        assert_eq!(settings.telegram_token, "dummy_token");
        assert_eq!(settings.port, 8000);
        assert_eq!(settings.ytdl_bin, "yt-dlp");
        assert_eq!(settings.secret_token, None);

        env::set_var("PORT", "9100");
        let settings = Settings::new()?;
        assert_eq!(settings.port, 9100);

        // Empty env vars are treated as unset
        env::set_var("SECRET_TOKEN", "");
        let settings = Settings::new()?;
        assert_eq!(settings.secret_token, None);

        env::remove_var("SECRET_TOKEN");
        env::remove_var("PORT");
        env::remove_var("TELEGRAM_TOKEN");
        Ok(())
    }
}
