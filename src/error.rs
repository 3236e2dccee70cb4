//! Error types for Lex Assist.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the outbound text-generation call.
///
/// A content-safety refusal is not an error — see
/// [`crate::gemini::Generated::Blocked`]. These variants cover the cases
/// where no usable response came back at all.
#[derive(Debug, thiserror::Error)]
pub enum GenError {
    #[error("API key not configured. Set GEMINI_API_KEY and restart the server.")]
    MissingApiKey,

    #[error("Request to the text-generation service failed: {0}")]
    Transport(String),

    #[error("Text-generation service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response from the text-generation service: {0}")]
    InvalidResponse(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
