use thiserror::Error;

pub type BeaconResult<T> = Result<T, BeaconError>;

#[derive(Error, Debug)]
pub enum BeaconError {
    #[error("AnalyticsConfig: {0}")]
    Config(String),

    #[error("Invalid URL provided. A valid URL must be provided. Original error: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("No apiCallback or url provided for analytics tracking.")]
    NoTransport,

    #[error("HTTP transport error: {0}")]
    Transport(String),

    #[error("API callback failed: {0}")]
    Callback(anyhow::Error),

    #[error("Invalid selector syntax provided: {0}")]
    InvalidSelector(String),

    #[error("useAnalyticsConfig must be used within an AnalyticsConfigProvider")]
    MissingProvider,

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
