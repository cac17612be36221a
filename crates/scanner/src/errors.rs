use thiserror::Error;

/// Typed error hierarchy for the market scanner.
///
/// Library-internal errors use specific variants; application code wraps with
/// `anyhow::Context` for propagation.
#[derive(Error, Debug)]
pub enum ScannerError {
    // -- Data ---------------------------------------------------------------
    #[error("data source unavailable: {name}")]
    DataUnavailable { name: String },

    #[error("request timed out after {seconds}s: {name}")]
    Timeout { name: String, seconds: u64 },

    // -- Configuration ------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),

    // -- Forwarded errors ---------------------------------------------------
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScannerError {
    /// Shorthand for a [`ScannerError::DataUnavailable`] with a formatted name.
    pub fn unavailable(name: impl Into<String>) -> Self {
        Self::DataUnavailable { name: name.into() }
    }
}
