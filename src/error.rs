use thiserror::Error;

#[derive(Error, Debug)]
pub enum AddressError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Places library failed to load: {0}")]
    LoadFailure(String),

    #[error("No address could be resolved for input: {input}")]
    ResolutionFailure { input: String },

    #[error("Form field not present: {0}")]
    SynchronizationSkip(String),

    #[error("Widget construction failed: {0}")]
    Widget(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Places API error ({status}): {message}")]
    Api { status: String, message: String },
}

pub type Result<T> = std::result::Result<T, AddressError>;
