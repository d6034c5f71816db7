use thiserror::Error;

/// Failure talking to the weather provider. Kept detailed for logs; the
/// repository collapses it before anything reaches the UI.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to parse {endpoint} JSON: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} response contained no usable data")]
    Empty(&'static str),
}

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("preference file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse preference file: {0}")]
    Decode(#[from] toml::de::Error),

    #[error("failed to serialize preferences: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("could not determine platform data directory")]
    NoDataDir,
}
