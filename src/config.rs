//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

/// Model used when `LEX_ASSIST_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Application configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Gemini API key. Absent means every remote call fails with an inline
    /// error; the server itself still starts.
    pub api_key: Option<SecretString>,
    /// Gemini model identifier.
    pub model: String,
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Wizard sessions idle longer than this are swept.
    pub session_idle_timeout: Duration,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::from);

        let model =
            std::env::var("LEX_ASSIST_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let port: u16 = std::env::var("LEX_ASSIST_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        let idle_secs: u64 = std::env::var("LEX_ASSIST_SESSION_IDLE_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .unwrap_or(3600);

        Self {
            api_key,
            model,
            port,
            session_idle_timeout: Duration::from_secs(idle_secs),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            port: 8080,
            session_idle_timeout: Duration::from_secs(3600), // 1 hour
        }
    }
}
